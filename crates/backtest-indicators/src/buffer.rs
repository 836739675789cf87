//! Fixed-capacity ring buffer with a running sum.

/// Sliding window over the last `capacity` values.
///
/// Pushing into a full buffer evicts the oldest value. The sum is kept
/// incrementally so window means cost O(1).
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Vec<f64>,
    capacity: usize,
    head: usize,
    len: usize,
    sum: f64,
}

impl RingBuffer {
    /// Create an empty buffer. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity],
            capacity,
            head: 0,
            len: 0,
            sum: 0.0,
        }
    }

    /// Push a value, returning the evicted one if the buffer was full.
    #[inline]
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.len == self.capacity {
            let old = self.data[self.head];
            self.sum -= old;
            Some(old)
        } else {
            self.len += 1;
            None
        };

        self.data[self.head] = value;
        self.sum += value;
        self.head = (self.head + 1) % self.capacity;
        evicted
    }

    /// Sum of the values currently held.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the values currently held (`None` when empty).
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        if self.len == 0 {
            None
        } else {
            Some(self.sum / self.len as f64)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all values.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut buffer = RingBuffer::new(3);
        assert_eq!(buffer.push(1.0), None);
        assert_eq!(buffer.push(2.0), None);
        assert!(!buffer.is_full());
        assert_eq!(buffer.push(3.0), None);
        assert!(buffer.is_full());
        assert!((buffer.sum() - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_eviction_keeps_running_sum() {
        let mut buffer = RingBuffer::new(3);
        for v in [1.0, 2.0, 3.0] {
            buffer.push(v);
        }
        assert_eq!(buffer.push(4.0), Some(1.0));
        assert_eq!(buffer.push(5.0), Some(2.0));
        assert!((buffer.sum() - 12.0).abs() < 1e-10);
        assert!((buffer.mean().unwrap() - 4.0).abs() < 1e-10);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut buffer = RingBuffer::new(2);
        buffer.push(1.0);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.mean(), None);
        assert_eq!(buffer.push(7.0), None);
        assert!((buffer.sum() - 7.0).abs() < 1e-10);
    }
}
