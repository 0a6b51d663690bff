//! Accrual configuration.
//!
//! Selects which growth function turns a stored index or principal into a
//! current amount. Variable debt always compounds; stable debt and the
//! supply-token total are configurable.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Growth function applied between the last update and the evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexGrowth {
    /// `RAY + rate * dt / SECONDS_PER_YEAR`
    Linear,
    /// Three-term Taylor expansion of `e^(rate * dt)`
    Compounded,
}

/// Accrual settings used by [`crate::reserve::ReserveCalculator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccrualConfig {
    /// Growth applied to the principal stable debt at the average stable rate
    pub stable_debt_growth: IndexGrowth,
    /// Growth applied to the liquidity index at the stored liquidity rate
    pub supply_growth: IndexGrowth,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            stable_debt_growth: IndexGrowth::Linear,
            supply_growth: IndexGrowth::Compounded,
        }
    }
}

impl AccrualConfig {
    /// Token-contract behaviour: stable debt compounds, the liquidity index grows linearly
    pub const fn on_chain() -> Self {
        Self {
            stable_debt_growth: IndexGrowth::Compounded,
            supply_growth: IndexGrowth::Linear,
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// ```rust
    /// use aave_rs_sim::config::{AccrualConfig, IndexGrowth};
    ///
    /// let config = AccrualConfig::from_json(r#"{"supply_growth": "linear"}"#).unwrap();
    /// assert_eq!(config.supply_growth, IndexGrowth::Linear);
    /// assert_eq!(config.stable_debt_growth, IndexGrowth::Linear);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SimError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_growth() {
        let config = AccrualConfig::default();
        assert_eq!(config.stable_debt_growth, IndexGrowth::Linear);
        assert_eq!(config.supply_growth, IndexGrowth::Compounded);
    }

    #[test]
    fn test_on_chain_preset() {
        let config = AccrualConfig::on_chain();
        assert_eq!(config.stable_debt_growth, IndexGrowth::Compounded);
        assert_eq!(config.supply_growth, IndexGrowth::Linear);
    }

    #[test]
    fn test_from_json_empty_object() {
        let config = AccrualConfig::from_json("{}").unwrap();
        assert_eq!(config, AccrualConfig::default());
    }

    #[test]
    fn test_from_json_rejects_unknown_growth() {
        let err = AccrualConfig::from_json(r#"{"supply_growth": "exponential"}"#).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }
}
