//! Crossing detection shared by the strategies.

/// Direction of a crossing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    Up,
    Down,
}

/// `true` when a value moves from at-or-below `level` to above it.
#[inline]
pub fn cross_over(prev: f64, curr: f64, level: f64) -> bool {
    prev <= level && curr > level
}

/// `true` when a value moves from at-or-above `level` to below it.
#[inline]
pub fn cross_under(prev: f64, curr: f64, level: f64) -> bool {
    prev >= level && curr < level
}

/// Crossing of `fast` relative to `slow` between two consecutive bars.
///
/// The state is `fast > slow`; an event fires only when that state changes,
/// so successive events always alternate between `Up` and `Down`.
#[inline]
pub fn crossing(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> Option<Cross> {
    let was_above = prev_fast > prev_slow;
    let is_above = fast > slow;
    match (was_above, is_above) {
        (false, true) => Some(Cross::Up),
        (true, false) => Some(Cross::Down),
        _ => None,
    }
}
