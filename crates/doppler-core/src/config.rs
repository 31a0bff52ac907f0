//! Valuation and screening parameters.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DopplerError;
use crate::series::WindowPolicy;
use crate::types::Rate;
use crate::DopplerResult;

/// Parameters of the valuation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Years in the trailing average of return on PPE
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,

    /// Treatment of undefined returns inside the smoothing window
    #[serde(default)]
    pub window_policy: WindowPolicy,

    /// Normalized capital spending as a fraction of prior-year PPE
    #[serde(default = "default_capex_rate")]
    pub capex_rate: Rate,

    /// Multiple applied to smoothed per-share earnings
    #[serde(default = "default_capitalization_multiple")]
    pub capitalization_multiple: Decimal,
}

fn default_smoothing_window() -> usize {
    4
}

fn default_capex_rate() -> Rate {
    dec!(0.1)
}

fn default_capitalization_multiple() -> Decimal {
    dec!(10)
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            smoothing_window: default_smoothing_window(),
            window_policy: WindowPolicy::default(),
            capex_rate: default_capex_rate(),
            capitalization_multiple: default_capitalization_multiple(),
        }
    }
}

impl ValuationConfig {
    pub fn validate(&self) -> DopplerResult<()> {
        if self.smoothing_window == 0 {
            return Err(DopplerError::InvalidInput {
                field: "smoothing_window".into(),
                reason: "Smoothing window must be at least one year".into(),
            });
        }
        if self.capex_rate < Decimal::ZERO {
            return Err(DopplerError::InvalidInput {
                field: "capex_rate".into(),
                reason: "Capital spending rate cannot be negative".into(),
            });
        }
        if self.capitalization_multiple <= Decimal::ZERO {
            return Err(DopplerError::InvalidInput {
                field: "capitalization_multiple".into(),
                reason: "Capitalization multiple must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Thresholds of the pre-screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenCriteria {
    /// Largest tolerated |dB| gap between two independently sourced totals
    #[serde(default = "default_max_cross_check_db")]
    pub max_cross_check_db: Decimal,

    /// Largest tolerated deviation of year-on-year PPE growth, in dB
    #[serde(default = "default_max_ppe_growth_dev_db")]
    pub max_ppe_growth_dev_db: Decimal,

    /// Minimum lowball return on PPE
    #[serde(default = "default_min_lowball_return")]
    pub min_lowball_return: Rate,

    /// Trailing years fed to the lowball and growth statistics
    #[serde(default = "default_lowball_years")]
    pub lowball_years: usize,
}

fn default_max_cross_check_db() -> Decimal {
    dec!(2)
}

fn default_max_ppe_growth_dev_db() -> Decimal {
    dec!(1)
}

fn default_min_lowball_return() -> Rate {
    dec!(0.10)
}

fn default_lowball_years() -> usize {
    4
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            max_cross_check_db: default_max_cross_check_db(),
            max_ppe_growth_dev_db: default_max_ppe_growth_dev_db(),
            min_lowball_return: default_min_lowball_return(),
            lowball_years: default_lowball_years(),
        }
    }
}

impl ScreenCriteria {
    pub fn validate(&self) -> DopplerResult<()> {
        if self.max_cross_check_db <= Decimal::ZERO {
            return Err(DopplerError::InvalidInput {
                field: "max_cross_check_db".into(),
                reason: "Cross-check threshold must be positive".into(),
            });
        }
        if self.max_ppe_growth_dev_db <= Decimal::ZERO {
            return Err(DopplerError::InvalidInput {
                field: "max_ppe_growth_dev_db".into(),
                reason: "PPE growth deviation threshold must be positive".into(),
            });
        }
        if self.lowball_years < 2 {
            return Err(DopplerError::InvalidInput {
                field: "lowball_years".into(),
                reason: "At least two years are needed for a deviation".into(),
            });
        }
        Ok(())
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DopplerConfig {
    #[serde(default)]
    pub valuation: ValuationConfig,
    #[serde(default)]
    pub screen: ScreenCriteria,
}

impl DopplerConfig {
    pub fn validate(&self) -> DopplerResult<()> {
        self.valuation.validate()?;
        self.screen.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DopplerConfig::default();
        assert_eq!(cfg.valuation.smoothing_window, 4);
        assert_eq!(cfg.valuation.window_policy, WindowPolicy::Strict);
        assert_eq!(cfg.valuation.capex_rate, dec!(0.1));
        assert_eq!(cfg.valuation.capitalization_multiple, dec!(10));
        assert_eq!(cfg.screen.max_cross_check_db, dec!(2));
        assert_eq!(cfg.screen.lowball_years, 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: DopplerConfig =
            serde_json::from_str(r#"{"valuation": {"smoothing_window": 3, "window_policy": "skip_missing"}}"#)
                .unwrap();
        assert_eq!(cfg.valuation.smoothing_window, 3);
        assert_eq!(cfg.valuation.window_policy, WindowPolicy::SkipMissing);
        assert_eq!(cfg.valuation.capex_rate, dec!(0.1));
        assert_eq!(cfg.screen, ScreenCriteria::default());
    }

    #[test]
    fn test_zero_window_rejected() {
        let cfg = ValuationConfig {
            smoothing_window: 0,
            ..ValuationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_single_lowball_year_rejected() {
        let cfg = ScreenCriteria {
            lowball_years: 1,
            ..ScreenCriteria::default()
        };
        assert!(cfg.validate().is_err());
    }
}
