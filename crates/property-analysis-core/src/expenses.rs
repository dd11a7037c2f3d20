use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AnalysisError;
use crate::types::{ensure_within_ceiling, Money, Percent, MONTHS_PER_YEAR};
use crate::AnalysisResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The value a percentage-based expense is charged against.
///
/// `Rent` and `Income` resolve against the same aggregate (monthly gross
/// income); they are kept apart only so the line can be labelled the way the
/// user entered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PercentageBasis {
    /// Purchase price; the percent is an annual charge spread over 12 months
    PropertyValue,
    /// Monthly gross rent
    Rent,
    /// Monthly gross income
    Income,
}

impl fmt::Display for PercentageBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentageBasis::PropertyValue => write!(f, "property value"),
            PercentageBasis::Rent => write!(f, "rent"),
            PercentageBasis::Income => write!(f, "income"),
        }
    }
}

/// How an expense line's `amount` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseKind {
    /// Flat monthly dollar figure
    Fixed,
    /// Percent of the chosen basis (1 = 1%)
    Percentage { basis: PercentageBasis },
}

/// An operating expense line (taxes, insurance, management, reserves...).
///
/// On the wire this is `{name, amount, is_percentage, percentage_basis?}`; a
/// percentage line without a basis fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExpenseLineRecord", into = "ExpenseLineRecord")]
pub struct ExpenseLine {
    pub name: String,
    pub amount: Decimal,
    pub kind: ExpenseKind,
}

impl ExpenseLine {
    pub fn fixed(name: impl Into<String>, monthly_amount: Money) -> Self {
        Self {
            name: name.into(),
            amount: monthly_amount,
            kind: ExpenseKind::Fixed,
        }
    }

    pub fn percentage(name: impl Into<String>, percent: Percent, basis: PercentageBasis) -> Self {
        Self {
            name: name.into(),
            amount: percent,
            kind: ExpenseKind::Percentage { basis },
        }
    }

    /// Display label, e.g. `fixed` or `8% of rent`.
    pub fn label(&self) -> String {
        match self.kind {
            ExpenseKind::Fixed => "fixed".to_string(),
            ExpenseKind::Percentage { basis } => {
                format!("{}% of {}", self.amount.normalize(), basis)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExpenseLineRecord {
    name: String,
    amount: Decimal,
    #[serde(default)]
    is_percentage: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    percentage_basis: Option<PercentageBasis>,
}

impl TryFrom<ExpenseLineRecord> for ExpenseLine {
    type Error = AnalysisError;

    fn try_from(record: ExpenseLineRecord) -> Result<Self, Self::Error> {
        let kind = if record.is_percentage {
            let basis = record.percentage_basis.ok_or_else(|| {
                AnalysisError::invalid(
                    "percentage_basis",
                    format!(
                        "Expense line '{}' is a percentage but has no basis",
                        record.name
                    ),
                )
            })?;
            ExpenseKind::Percentage { basis }
        } else {
            // A stray basis on a fixed line carries no meaning.
            ExpenseKind::Fixed
        };
        Ok(ExpenseLine {
            name: record.name,
            amount: record.amount,
            kind,
        })
    }
}

impl From<ExpenseLine> for ExpenseLineRecord {
    fn from(line: ExpenseLine) -> Self {
        let (is_percentage, percentage_basis) = match line.kind {
            ExpenseKind::Fixed => (false, None),
            ExpenseKind::Percentage { basis } => (true, Some(basis)),
        };
        ExpenseLineRecord {
            name: line.name,
            amount: line.amount,
            is_percentage,
            percentage_basis,
        }
    }
}

/// A single expense line converted to dollars per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedExpense {
    pub name: String,
    pub label: String,
    pub monthly_amount: Money,
}

/// Output of the expense resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseResolution {
    /// Sum of all resolved lines, per month
    pub monthly_total: Money,
    /// Per-line monthly amounts, in input order
    pub lines: Vec<ResolvedExpense>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve every expense line to a monthly dollar amount.
///
/// * Fixed: `amount`
/// * Percent of property value: `purchase_price * amount / 100 / 12`
/// * Percent of rent or income: `monthly_gross_income * amount / 100`
pub fn resolve_monthly_expenses(
    lines: &[ExpenseLine],
    purchase_price: Money,
    monthly_gross_income: Money,
) -> AnalysisResult<ExpenseResolution> {
    let mut monthly_total = Decimal::ZERO;
    let mut resolved = Vec::with_capacity(lines.len());

    for line in lines {
        let monthly_amount = resolve_line(line, purchase_price, monthly_gross_income)?;
        monthly_total = monthly_total
            .checked_add(monthly_amount)
            .ok_or_else(|| AnalysisError::overflow("monthly_expenses"))?;
        resolved.push(ResolvedExpense {
            name: line.name.clone(),
            label: line.label(),
            monthly_amount,
        });
    }

    Ok(ExpenseResolution {
        monthly_total,
        lines: resolved,
    })
}

fn resolve_line(
    line: &ExpenseLine,
    purchase_price: Money,
    monthly_gross_income: Money,
) -> AnalysisResult<Money> {
    let share = line.amount / dec!(100);
    let amount = match line.kind {
        ExpenseKind::Fixed => Some(line.amount),
        ExpenseKind::Percentage {
            basis: PercentageBasis::PropertyValue,
        } => purchase_price
            .checked_mul(share)
            .map(|annual| annual / Decimal::from(MONTHS_PER_YEAR)),
        ExpenseKind::Percentage {
            basis: PercentageBasis::Rent | PercentageBasis::Income,
        } => monthly_gross_income.checked_mul(share),
    };
    amount.ok_or_else(|| {
        AnalysisError::invalid(
            "expenses.amount",
            format!("Expense line '{}' resolves outside the decimal range", line.name),
        )
    })
}

pub(crate) fn validate_expenses(lines: &[ExpenseLine]) -> AnalysisResult<()> {
    for line in lines {
        if line.amount < Decimal::ZERO {
            return Err(AnalysisError::invalid(
                "expenses.amount",
                format!("Expense line '{}' has a negative amount", line.name),
            ));
        }
        ensure_within_ceiling("expenses.amount", line.amount)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
