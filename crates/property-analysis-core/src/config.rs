use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::{Multiple, Percent};
use crate::AnalysisResult;

/// Thresholds that turn metrics into analysis warnings.
///
/// These never change a computed number; they only decide which warnings the
/// analysis envelope carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// DSCR below this (and above zero) is flagged as lender covenant risk
    pub min_dscr: Multiple,
    /// Loan-to-value above this percent is flagged as high leverage
    pub max_ltv_percent: Percent,
    /// Cap rates outside [min, max] are flagged as unusual for the market
    pub min_cap_rate_percent: Percent,
    pub max_cap_rate_percent: Percent,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_dscr: dec!(1.20),
            max_ltv_percent: dec!(80),
            min_cap_rate_percent: dec!(3),
            max_cap_rate_percent: dec!(12),
        }
    }
}

impl AnalysisConfig {
    /// Parse a config document; absent keys keep their defaults.
    pub fn from_json(json: &str) -> AnalysisResult<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if self.min_dscr < Decimal::ZERO {
            return Err(AnalysisError::invalid(
                "min_dscr",
                "DSCR floor cannot be negative",
            ));
        }
        if self.max_ltv_percent < Decimal::ZERO {
            return Err(AnalysisError::invalid(
                "max_ltv_percent",
                "LTV ceiling cannot be negative",
            ));
        }
        if self.min_cap_rate_percent > self.max_cap_rate_percent {
            return Err(AnalysisError::invalid(
                "min_cap_rate_percent",
                "Cap rate floor exceeds cap rate ceiling",
            ));
        }
        Ok(())
    }
}
