//! Composite strategy combining several member strategies.
//!
//! Every member decides on the same view. A member that returns no signal
//! abstains, and abstentions count against agreement: the share of a
//! direction is always measured against the full member weight.

use serde::{Deserialize, Serialize};
use backtest_core::{
    error::ConfigError,
    traits::Strategy,
    types::{Direction, IndicatorSpec, MarketView, Signal},
};

use crate::registry::StrategySpec;

/// How member votes are combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgreementRule {
    /// More than half of the members agree
    Majority,
    /// Every member agrees
    AllAgree,
    /// Weighted share of a direction reaches `threshold`
    Weighted { weights: Vec<f64>, threshold: f64 },
}

impl Default for AgreementRule {
    fn default() -> Self {
        AgreementRule::Majority
    }
}

/// Configuration for a composite strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeConfig {
    pub members: Vec<StrategySpec>,
    #[serde(default)]
    pub rule: AgreementRule,
}

/// Combines member signals with an [`AgreementRule`].
pub struct CompositeStrategy {
    members: Vec<Box<dyn Strategy>>,
    weights: Vec<f64>,
    rule: AgreementRule,
}

impl std::fmt::Debug for CompositeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeStrategy")
            .field("members", &self.members.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("rule", &self.rule)
            .finish()
    }
}

impl CompositeStrategy {
    /// Combine already-built members.
    pub fn new(members: Vec<Box<dyn Strategy>>, rule: AgreementRule) -> Result<Self, ConfigError> {
        if members.len() < 2 {
            return Err(ConfigError::invalid(
                "members",
                format!("composite needs at least 2 members, got {}", members.len()),
            ));
        }

        let weights = match &rule {
            AgreementRule::Weighted { weights, threshold } => {
                if weights.len() != members.len() {
                    return Err(ConfigError::invalid(
                        "weights",
                        format!("expected {} weights, got {}", members.len(), weights.len()),
                    ));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(ConfigError::invalid("weights", "must be finite and non-negative"));
                }
                if weights.iter().sum::<f64>() <= 0.0 {
                    return Err(ConfigError::invalid("weights", "must not all be zero"));
                }
                if !(*threshold > 0.0 && *threshold <= 1.0) {
                    return Err(ConfigError::invalid("threshold", "must be in (0, 1]"));
                }
                weights.clone()
            }
            _ => vec![1.0; members.len()],
        };

        Ok(Self {
            members,
            weights,
            rule,
        })
    }

    /// Build members from their specs and combine them.
    pub fn from_config(config: &CompositeConfig) -> Result<Self, ConfigError> {
        let members = config
            .members
            .iter()
            .map(StrategySpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(members, config.rule.clone())
    }

    /// Winning direction and its weight share, if the rule is satisfied.
    fn tally(&self, votes: &[Option<Direction>]) -> Option<(Direction, f64)> {
        let total: f64 = self.weights.iter().sum();

        let share = |direction: Direction| {
            votes
                .iter()
                .zip(&self.weights)
                .filter(|(vote, _)| **vote == Some(direction))
                .map(|(_, w)| *w)
                .sum::<f64>()
                / total
        };

        let mut best: Option<(Direction, f64)> = None;
        let mut tied = false;
        for direction in [Direction::Long, Direction::Short, Direction::Flat] {
            let s = share(direction);
            if s <= 0.0 {
                continue;
            }
            match best {
                Some((_, b)) if s < b => {}
                Some((_, b)) if s == b => tied = true,
                _ => {
                    best = Some((direction, s));
                    tied = false;
                }
            }
        }
        if tied {
            return None;
        }
        let (direction, s) = best?;

        let agreed = match &self.rule {
            AgreementRule::Majority => s > 0.5,
            AgreementRule::AllAgree => votes.iter().all(|v| *v == Some(direction)),
            AgreementRule::Weighted { threshold, .. } => s >= *threshold,
        };
        agreed.then_some((direction, s))
    }
}

impl Strategy for CompositeStrategy {
    fn name(&self) -> &str {
        "Composite"
    }

    fn description(&self) -> String {
        let names: Vec<&str> = self.members.iter().map(|m| m.name()).collect();
        format!("{:?} of [{}]", self.rule, names.join(", "))
    }

    fn indicators(&self) -> Vec<IndicatorSpec> {
        let mut specs: Vec<IndicatorSpec> = Vec::new();
        for spec in self.members.iter().flat_map(|m| m.indicators()) {
            if !specs.contains(&spec) {
                specs.push(spec);
            }
        }
        specs
    }

    fn warmup_period(&self) -> usize {
        self.members
            .iter()
            .map(|m| m.warmup_period())
            .max()
            .unwrap_or(0)
    }

    fn decide(&self, view: &MarketView<'_>) -> Option<Signal> {
        if !self.is_warmed_up(view.len()) {
            return None;
        }

        let votes: Vec<Option<Direction>> = self
            .members
            .iter()
            .map(|m| m.decide(view).map(|s| s.direction))
            .collect();

        let (direction, share) = self.tally(&votes)?;
        let agreeing = votes.iter().filter(|v| **v == Some(direction)).count();

        Some(
            Signal::new(view.timestamp(), direction)
                .with_strength(share)
                .with_reason(format!(
                    "{}/{} members agree on {}",
                    agreeing,
                    votes.len(),
                    direction
                )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backtest_core::{Bar, IndicatorFrame};

    /// Member that always returns a fixed decision.
    struct Fixed(Option<Direction>);

    impl Strategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn indicators(&self) -> Vec<IndicatorSpec> {
            Vec::new()
        }

        fn warmup_period(&self) -> usize {
            0
        }

        fn decide(&self, view: &MarketView<'_>) -> Option<Signal> {
            self.0.map(|d| Signal::new(view.timestamp(), d))
        }
    }

    fn composite(votes: &[Option<Direction>], rule: AgreementRule) -> CompositeStrategy {
        let members: Vec<Box<dyn Strategy>> = votes
            .iter()
            .map(|v| Box::new(Fixed(*v)) as Box<dyn Strategy>)
            .collect();
        CompositeStrategy::new(members, rule).unwrap()
    }

    fn decide(strategy: &CompositeStrategy) -> Option<Signal> {
        let bars = [Bar::new(0, 1.0, 1.0, 1.0, 1.0, 0.0)];
        let frame = IndicatorFrame::new();
        strategy.decide(&MarketView::new("TEST", &bars, &frame))
    }

    use Direction::{Flat, Long, Short};

    #[test]
    fn test_majority() {
        let s = composite(&[Some(Long), Some(Long), Some(Flat)], AgreementRule::Majority);
        let signal = decide(&s).unwrap();
        assert_eq!(signal.direction, Long);
        assert!((signal.strength - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_abstentions_count_against_majority() {
        let s = composite(&[Some(Long), None, None], AgreementRule::Majority);
        assert!(decide(&s).is_none());

        let s = composite(&[Some(Long), Some(Long), None], AgreementRule::Majority);
        assert_eq!(decide(&s).unwrap().direction, Long);
    }

    #[test]
    fn test_all_agree() {
        let s = composite(&[Some(Short), Some(Short)], AgreementRule::AllAgree);
        let signal = decide(&s).unwrap();
        assert_eq!(signal.direction, Short);
        assert_eq!(signal.strength, 1.0);

        let s = composite(&[Some(Short), None], AgreementRule::AllAgree);
        assert!(decide(&s).is_none());
    }

    #[test]
    fn test_weighted() {
        let rule = AgreementRule::Weighted {
            weights: vec![3.0, 1.0, 1.0],
            threshold: 0.6,
        };
        let s = composite(&[Some(Long), Some(Flat), None], rule.clone());
        let signal = decide(&s).unwrap();
        assert_eq!(signal.direction, Long);
        assert!((signal.strength - 0.6).abs() < 1e-12);

        let s = composite(&[None, Some(Flat), Some(Flat)], rule);
        assert!(decide(&s).is_none());
    }

    #[test]
    fn test_tie_is_no_decision() {
        let s = composite(&[Some(Long), Some(Flat)], AgreementRule::Weighted {
            weights: vec![1.0, 1.0],
            threshold: 0.5,
        });
        assert!(decide(&s).is_none());
    }

    #[test]
    fn test_invalid_configs() {
        let one: Vec<Box<dyn Strategy>> = vec![Box::new(Fixed(None))];
        assert!(CompositeStrategy::new(one, AgreementRule::Majority).is_err());

        let two = || -> Vec<Box<dyn Strategy>> { vec![Box::new(Fixed(None)), Box::new(Fixed(None))] };
        let bad_len = AgreementRule::Weighted {
            weights: vec![1.0],
            threshold: 0.5,
        };
        assert!(CompositeStrategy::new(two(), bad_len).is_err());

        let bad_threshold = AgreementRule::Weighted {
            weights: vec![1.0, 1.0],
            threshold: 0.0,
        };
        assert!(CompositeStrategy::new(two(), bad_threshold).is_err());
    }
}
