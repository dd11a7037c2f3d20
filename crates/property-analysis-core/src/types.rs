use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::AnalysisResult;

/// All monetary values (USD). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages expressed as plain percent numbers (6.5 = 6.5%). Never as fractions.
pub type Percent = Decimal;

/// Unitless ratios and multiples (e.g. 1.25x DSCR, 10.4x GRM)
pub type Multiple = Decimal;

/// Months in a year; every annual figure is derived from its monthly figure with this.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Largest accepted money amount, size or expense figure on any single input (one trillion).
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

pub(crate) fn ensure_within_ceiling(field: &str, value: Decimal) -> AnalysisResult<()> {
    if value > MAX_AMOUNT {
        return Err(AnalysisError::invalid(
            field,
            format!("{value} exceeds the ceiling of {MAX_AMOUNT}"),
        ));
    }
    Ok(())
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
