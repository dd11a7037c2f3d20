use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::{ensure_within_ceiling, Money};
use crate::AnalysisResult;

/// One rent roll / unit-mix entry (e.g. "Unit 2B", "Parking").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeLine {
    pub name: String,
    /// Gross monthly amount collected for this line
    pub monthly_amount: Money,
}

impl IncomeLine {
    pub fn new(name: impl Into<String>, monthly_amount: Money) -> Self {
        Self {
            name: name.into(),
            monthly_amount,
        }
    }
}

/// Gross monthly income: the plain sum of every income line.
pub fn aggregate_income(lines: &[IncomeLine]) -> AnalysisResult<Money> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        total
            .checked_add(line.monthly_amount)
            .ok_or_else(|| AnalysisError::overflow("income.monthly_amount"))
    })
}

pub(crate) fn validate_income(lines: &[IncomeLine]) -> AnalysisResult<()> {
    for line in lines {
        if line.monthly_amount < Decimal::ZERO {
            return Err(AnalysisError::invalid(
                "income.monthly_amount",
                format!("Income line '{}' has a negative amount", line.name),
            ));
        }
        ensure_within_ceiling("income.monthly_amount", line.monthly_amount)?;
    }
    Ok(())
}
