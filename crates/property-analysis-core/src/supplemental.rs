use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::expenses::{resolve_monthly_expenses, ExpenseLine, ResolvedExpense};
use crate::income::{aggregate_income, IncomeLine};
use crate::metrics::{annualize, percent_or_zero, ratio_or_zero, DerivedMetrics, PropertyInputs};
use crate::types::{Money, Percent};
use crate::AnalysisResult;

/// Ratios shown beside the core metrics on the property panel.
///
/// These are recomputed on every analysis and are not part of the stored
/// `DerivedMetrics`, so unit-count or size edits show up here immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementalMetrics {
    pub monthly_gross_income: Money,
    pub annual_gross_income: Money,
    /// Loan / purchase price
    pub loan_to_value_percent: Percent,
    pub price_per_sqft: Money,
    pub price_per_unit: Money,
    /// Operating expenses / gross income
    pub operating_expense_ratio_percent: Percent,
    /// (Operating expenses + debt service) / gross income
    pub break_even_occupancy_percent: Percent,
    /// Each expense line resolved to dollars per month
    pub expense_breakdown: Vec<ResolvedExpense>,
}

pub fn compute_supplemental(
    inputs: &PropertyInputs,
    income: &[IncomeLine],
    expenses: &[ExpenseLine],
    metrics: &DerivedMetrics,
) -> AnalysisResult<SupplementalMetrics> {
    let monthly_gross_income = aggregate_income(income)?;
    let expense_breakdown =
        resolve_monthly_expenses(expenses, inputs.purchase_price, monthly_gross_income)?.lines;
    let carrying_cost = metrics
        .monthly_expenses
        .checked_add(metrics.monthly_payment)
        .ok_or_else(|| AnalysisError::overflow("break_even_occupancy_percent"))?;

    Ok(SupplementalMetrics {
        monthly_gross_income,
        annual_gross_income: annualize("annual_gross_income", monthly_gross_income)?,
        loan_to_value_percent: percent_or_zero(
            "loan_to_value_percent",
            metrics.loan_amount,
            inputs.purchase_price,
        )?,
        price_per_sqft: ratio_or_zero(
            "price_per_sqft",
            inputs.purchase_price,
            inputs.property_size_sqft,
        )?,
        price_per_unit: ratio_or_zero(
            "price_per_unit",
            inputs.purchase_price,
            Decimal::from(inputs.total_units),
        )?,
        operating_expense_ratio_percent: percent_or_zero(
            "operating_expense_ratio_percent",
            metrics.monthly_expenses,
            monthly_gross_income,
        )?,
        break_even_occupancy_percent: percent_or_zero(
            "break_even_occupancy_percent",
            carrying_cost,
            monthly_gross_income,
        )?,
        expense_breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expenses::PercentageBasis;
    use crate::metrics::{compute_metrics, Financing};
    use crate::reconcile::PropertySnapshot;
    use rust_decimal_macros::dec;

    fn snapshot() -> PropertySnapshot {
        PropertySnapshot::new(
            PropertyInputs {
                address: "77 Birch St".into(),
                city: "Boise".into(),
                state: "ID".into(),
                zip_code: "83702".into(),
                purchase_price: dec!(800000),
                property_size_sqft: dec!(6400),
                total_units: 4,
                financing: Financing::Financed {
                    down_payment: dec!(200000),
                    loan_term_years: 30,
                    interest_rate_percent: dec!(6),
                },
            },
            vec![
                IncomeLine::new("Unit A", dec!(1500)),
                IncomeLine::new("Unit B", dec!(1500)),
                IncomeLine::new("Unit C", dec!(1500)),
                IncomeLine::new("Unit D", dec!(1500)),
            ],
            vec![
                ExpenseLine::fixed("Insurance", dec!(300)),
                ExpenseLine::percentage("Mgmt", dec!(10), PercentageBasis::Income),
            ],
        )
    }

    #[test]
    fn test_ratios() {
        let snap = snapshot();
        let metrics =
            compute_metrics(&snap.inputs, &snap.income, &snap.expenses, None).unwrap();
        let s = compute_supplemental(&snap.inputs, &snap.income, &snap.expenses, &metrics)
            .unwrap();

        assert_eq!(s.monthly_gross_income, dec!(6000));
        assert_eq!(s.annual_gross_income, dec!(72000));
        assert_eq!(s.loan_to_value_percent, dec!(75));
        assert_eq!(s.price_per_sqft, dec!(125));
        assert_eq!(s.price_per_unit, dec!(200000));
        // (300 + 600) / 6000
        assert_eq!(s.operating_expense_ratio_percent, dec!(15));
        assert_eq!(
            s.break_even_occupancy_percent,
            (dec!(900) + metrics.monthly_payment) / dec!(6000) * dec!(100)
        );
        assert_eq!(s.expense_breakdown.len(), 2);
        assert_eq!(s.expense_breakdown[1].monthly_amount, dec!(600));
        assert_eq!(s.expense_breakdown[1].label, "10% of income");
    }

    #[test]
    fn test_empty_property_sentinels() {
        let mut snap = snapshot();
        snap.inputs.property_size_sqft = Decimal::ZERO;
        snap.inputs.total_units = 0;
        snap.income.clear();
        let metrics =
            compute_metrics(&snap.inputs, &snap.income, &snap.expenses, None).unwrap();
        let s = compute_supplemental(&snap.inputs, &snap.income, &snap.expenses, &metrics)
            .unwrap();

        assert_eq!(s.price_per_sqft, Decimal::ZERO);
        assert_eq!(s.price_per_unit, Decimal::ZERO);
        assert_eq!(s.operating_expense_ratio_percent, Decimal::ZERO);
        assert_eq!(s.break_even_occupancy_percent, Decimal::ZERO);
    }
}
