//! Strategy registry for dynamic strategy loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use backtest_core::{error::ConfigError, traits::Strategy};

use crate::{
    AgreementRule, CompositeConfig, CompositeStrategy, MACrossoverConfig, MACrossoverStrategy,
    MacdConfig, MacdStrategy, RsiConfig, RsiStrategy,
};

/// Strategy identifier plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    MaCrossover(MACrossoverConfig),
    RsiThreshold(RsiConfig),
    Macd(MacdConfig),
    Composite(CompositeConfig),
}

impl Default for StrategySpec {
    fn default() -> Self {
        StrategySpec::MaCrossover(MACrossoverConfig::default())
    }
}

impl StrategySpec {
    /// Registry id of this variant.
    pub fn id(&self) -> &'static str {
        match self {
            StrategySpec::MaCrossover(_) => "ma_crossover",
            StrategySpec::RsiThreshold(_) => "rsi_threshold",
            StrategySpec::Macd(_) => "macd",
            StrategySpec::Composite(_) => "composite",
        }
    }

    /// Validate parameters and build the strategy.
    pub fn build(&self) -> Result<Box<dyn Strategy>, ConfigError> {
        Ok(match self {
            StrategySpec::MaCrossover(config) => Box::new(MACrossoverStrategy::new(config.clone())?),
            StrategySpec::RsiThreshold(config) => Box::new(RsiStrategy::new(config.clone())?),
            StrategySpec::Macd(config) => Box::new(MacdStrategy::new(config.clone())?),
            StrategySpec::Composite(config) => Box::new(CompositeStrategy::from_config(config)?),
        })
    }
}

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry id, also the `type` tag of [`StrategySpec`]
    pub id: String,
    /// Strategy name
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry for available strategies.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a registry with all built-in strategies.
    pub fn new() -> Self {
        let composite_default = CompositeConfig {
            members: vec![
                StrategySpec::MaCrossover(MACrossoverConfig::default()),
                StrategySpec::RsiThreshold(RsiConfig::default()),
                StrategySpec::Macd(MacdConfig::default()),
            ],
            rule: AgreementRule::Majority,
        };

        let entries = [
            (
                "ma_crossover",
                "MA Crossover",
                "Long when the fast moving average crosses above the slow one",
                serde_json::to_value(MACrossoverConfig::default()),
            ),
            (
                "rsi_threshold",
                "RSI Strategy",
                "Trades RSI crossings of the oversold and overbought levels",
                serde_json::to_value(RsiConfig::default()),
            ),
            (
                "macd",
                "MACD",
                "Trades zero crossings of the MACD histogram or main line",
                serde_json::to_value(MacdConfig::default()),
            ),
            (
                "composite",
                "Composite",
                "Combines member strategies with an agreement rule",
                serde_json::to_value(composite_default),
            ),
        ];

        let strategies = entries
            .into_iter()
            .map(|(id, name, description, config)| {
                (
                    id.to_string(),
                    StrategyInfo {
                        id: id.to_string(),
                        name: name.to_string(),
                        description: description.to_string(),
                        default_config: config.unwrap_or_default(),
                    },
                )
            })
            .collect();

        Self { strategies }
    }

    /// List all available strategies, ordered by id.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by id.
    pub fn get(&self, id: &str) -> Option<&StrategyInfo> {
        self.strategies.get(id)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, id: &str) -> bool {
        self.strategies.contains_key(id)
    }

    /// Parse parameters for `id` into a [`StrategySpec`].
    pub fn spec(&self, id: &str, params: serde_json::Value) -> Result<StrategySpec, ConfigError> {
        if !self.exists(id) {
            return Err(ConfigError::UnknownStrategy(id.to_string()));
        }

        let mut tagged = match params {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(ConfigError::MalformedParameters(format!(
                    "expected an object for '{}', got {}",
                    id, other
                )))
            }
        };
        tagged.insert("type".to_string(), serde_json::Value::String(id.to_string()));

        serde_json::from_value(serde_json::Value::Object(tagged))
            .map_err(|e| ConfigError::MalformedParameters(e.to_string()))
    }

    /// Create a strategy instance from parameters.
    pub fn create(
        &self,
        id: &str,
        params: serde_json::Value,
    ) -> Result<Box<dyn Strategy>, ConfigError> {
        let spec = self.spec(id, params)?;
        let strategy = spec.build()?;
        debug!(id, name = strategy.name(), "Created strategy");
        Ok(strategy)
    }

    /// Create a strategy with its default configuration.
    pub fn create_default(&self, id: &str) -> Result<Box<dyn Strategy>, ConfigError> {
        let info = self
            .get(id)
            .ok_or_else(|| ConfigError::UnknownStrategy(id.to_string()))?;
        self.create(id, info.default_config.clone())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();
        let ids: Vec<&str> = registry.list().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["composite", "ma_crossover", "macd", "rsi_threshold"]);
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();

        assert!(registry.get("ma_crossover").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_create_default() {
        let registry = StrategyRegistry::new();
        for info in registry.list() {
            let strategy = registry.create_default(&info.id).unwrap();
            assert_eq!(strategy.name(), info.name);
        }
    }

    #[test]
    fn test_create_with_partial_params() {
        let registry = StrategyRegistry::new();
        let params = serde_json::json!({ "fast_period": 5, "slow_period": 10, "ma_type": "ema" });

        let strategy = registry.create("ma_crossover", params).unwrap();
        assert_eq!(strategy.warmup_period(), 11);
    }

    #[test]
    fn test_create_errors() {
        let registry = StrategyRegistry::new();

        assert!(matches!(
            registry.create_default("unknown"),
            Err(ConfigError::UnknownStrategy(_))
        ));
        assert!(matches!(
            registry.create("macd", serde_json::json!({ "fast_period": "twelve" })),
            Err(ConfigError::MalformedParameters(_))
        ));
        assert!(matches!(
            registry.create("macd", serde_json::json!([1, 2])),
            Err(ConfigError::MalformedParameters(_))
        ));
        assert!(matches!(
            registry.create("macd", serde_json::json!({ "fast_period": 30 })),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_spec_tagging() {
        let spec: StrategySpec = serde_json::from_value(serde_json::json!({
            "type": "rsi_threshold",
            "period": 7,
            "framing": "trend"
        }))
        .unwrap();

        assert_eq!(spec.id(), "rsi_threshold");
        match &spec {
            StrategySpec::RsiThreshold(config) => {
                assert_eq!(config.period, 7);
                assert_eq!(config.upper, 70.0);
            }
            other => panic!("unexpected spec {:?}", other),
        }
        assert!(spec.build().is_ok());
    }

    #[test]
    fn test_composite_spec_builds_members() {
        let spec: StrategySpec = serde_json::from_value(serde_json::json!({
            "type": "composite",
            "members": [
                { "type": "ma_crossover", "fast_period": 3, "slow_period": 5 },
                { "type": "macd", "fast_period": 3, "slow_period": 6, "signal_period": 3 }
            ],
            "rule": { "kind": "all_agree" }
        }))
        .unwrap();

        let strategy = spec.build().unwrap();
        assert_eq!(strategy.warmup_period(), 9);
        assert_eq!(strategy.indicators().len(), 3);
    }
}
