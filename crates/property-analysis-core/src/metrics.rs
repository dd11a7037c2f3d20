use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::{compute_debt_service, validate_term, DebtService, MAX_INTEREST_RATE_PERCENT};
use crate::error::AnalysisError;
use crate::expenses::{resolve_monthly_expenses, validate_expenses, ExpenseLine};
use crate::income::{aggregate_income, validate_income, IncomeLine};
use crate::types::{ensure_within_ceiling, Money, Multiple, Percent, MONTHS_PER_YEAR};
use crate::AnalysisResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the acquisition is paid for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "financing_type", rename_all = "lowercase")]
pub enum Financing {
    /// All-cash purchase: no loan, no debt service
    Cash,
    /// Fixed-rate mortgage on `purchase_price - down_payment`
    Financed {
        down_payment: Money,
        loan_term_years: u32,
        /// Annual rate as a percent (6.5 = 6.5%)
        interest_rate_percent: Percent,
    },
}

impl Financing {
    /// Cash put down at closing (zero for an all-cash deal: the price is not
    /// counted as invested equity).
    pub fn down_payment(&self) -> Money {
        match self {
            Financing::Cash => Decimal::ZERO,
            Financing::Financed { down_payment, .. } => *down_payment,
        }
    }

    pub fn loan_amount(&self, purchase_price: Money) -> Money {
        match self {
            Financing::Cash => Decimal::ZERO,
            Financing::Financed { down_payment, .. } => purchase_price - *down_payment,
        }
    }
}

/// Purchase terms and physical description of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInputs {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    pub purchase_price: Money,
    #[serde(default)]
    pub property_size_sqft: Decimal,
    #[serde(default)]
    pub total_units: u32,
    pub financing: Financing,
}

/// The full investment metric set for one property snapshot.
///
/// Every annual figure is exactly twelve times its monthly counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub monthly_noi: Money,
    pub annual_noi: Money,
    pub monthly_expenses: Money,
    pub annual_expenses: Money,
    pub monthly_cash_flow: Money,
    pub annual_cash_flow: Money,
    /// Down payment plus closing costs
    pub total_investment: Money,
    pub cap_rate_percent: Percent,
    pub gross_rent_multiplier: Multiple,
    pub cash_on_cash_return_percent: Percent,
    pub debt_service_coverage_ratio: Multiple,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute NOI, cash flow, cap rate, GRM, cash-on-cash and DSCR.
///
/// Ratios with a zero denominator resolve to zero so an incomplete draft
/// (no price yet, no rent yet, cash deal) still produces a full metric set.
pub fn compute_metrics(
    inputs: &PropertyInputs,
    income: &[IncomeLine],
    expenses: &[ExpenseLine],
    closing_costs: Option<Money>,
) -> AnalysisResult<DerivedMetrics> {
    validate_inputs(inputs, income, expenses, closing_costs)?;

    // --- Income and operating expenses ---
    let monthly_gross_income = aggregate_income(income)?;
    let annual_gross_income = annualize("annual_gross_income", monthly_gross_income)?;

    let monthly_expenses =
        resolve_monthly_expenses(expenses, inputs.purchase_price, monthly_gross_income)?
            .monthly_total;

    // Annual figures always come from monthly ones, never the other way round
    let monthly_noi = monthly_gross_income - monthly_expenses;
    let annual_noi = annualize("annual_noi", monthly_noi)?;

    // --- Debt service ---
    let loan_amount = inputs.financing.loan_amount(inputs.purchase_price);
    let debt_service = match &inputs.financing {
        Financing::Cash => DebtService::NONE,
        Financing::Financed {
            loan_term_years,
            interest_rate_percent,
            ..
        } => compute_debt_service(loan_amount, *interest_rate_percent, *loan_term_years)?,
    };

    let monthly_cash_flow = monthly_noi
        .checked_sub(debt_service.monthly_payment)
        .ok_or_else(|| AnalysisError::overflow("monthly_cash_flow"))?;
    let annual_cash_flow = annualize("annual_cash_flow", monthly_cash_flow)?;
    let total_investment =
        inputs.financing.down_payment() + closing_costs.unwrap_or(Decimal::ZERO);

    Ok(DerivedMetrics {
        loan_amount,
        monthly_payment: debt_service.monthly_payment,
        annual_debt_service: debt_service.annual_debt_service,
        monthly_noi,
        annual_noi,
        monthly_expenses,
        annual_expenses: annualize("annual_expenses", monthly_expenses)?,
        monthly_cash_flow,
        annual_cash_flow,
        total_investment,
        cap_rate_percent: percent_or_zero("cap_rate_percent", annual_noi, inputs.purchase_price)?,
        gross_rent_multiplier: ratio_or_zero(
            "gross_rent_multiplier",
            inputs.purchase_price,
            annual_gross_income,
        )?,
        cash_on_cash_return_percent: percent_or_zero(
            "cash_on_cash_return_percent",
            annual_cash_flow,
            total_investment,
        )?,
        debt_service_coverage_ratio: ratio_or_zero(
            "debt_service_coverage_ratio",
            annual_noi,
            debt_service.annual_debt_service,
        )?,
    })
}

/// `monthly * 12`, or `InvalidInput` naming `field` if that leaves the decimal range.
pub(crate) fn annualize(field: &str, monthly: Money) -> AnalysisResult<Money> {
    monthly
        .checked_mul(Decimal::from(MONTHS_PER_YEAR))
        .ok_or_else(|| AnalysisError::overflow(field))
}

/// `numerator / denominator`, or zero when the denominator is not positive.
pub(crate) fn ratio_or_zero(
    field: &str,
    numerator: Decimal,
    denominator: Decimal,
) -> AnalysisResult<Decimal> {
    if denominator > Decimal::ZERO {
        numerator
            .checked_div(denominator)
            .ok_or_else(|| AnalysisError::overflow(field))
    } else {
        Ok(Decimal::ZERO)
    }
}

/// `ratio_or_zero` expressed in percent.
pub(crate) fn percent_or_zero(
    field: &str,
    numerator: Decimal,
    denominator: Decimal,
) -> AnalysisResult<Percent> {
    ratio_or_zero(field, numerator, denominator)?
        .checked_mul(dec!(100))
        .ok_or_else(|| AnalysisError::overflow(field))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub(crate) fn validate_inputs(
    inputs: &PropertyInputs,
    income: &[IncomeLine],
    expenses: &[ExpenseLine],
    closing_costs: Option<Money>,
) -> AnalysisResult<()> {
    if inputs.purchase_price < Decimal::ZERO {
        return Err(AnalysisError::invalid(
            "purchase_price",
            "Purchase price cannot be negative",
        ));
    }

    ensure_within_ceiling("purchase_price", inputs.purchase_price)?;

    if inputs.property_size_sqft < Decimal::ZERO {
        return Err(AnalysisError::invalid(
            "property_size_sqft",
            "Property size cannot be negative",
        ));
    }
    ensure_within_ceiling("property_size_sqft", inputs.property_size_sqft)?;

    if let Financing::Financed {
        down_payment,
        loan_term_years,
        interest_rate_percent,
    } = &inputs.financing
    {
        if *down_payment < Decimal::ZERO {
            return Err(AnalysisError::invalid(
                "down_payment",
                "Down payment cannot be negative",
            ));
        }
        if *down_payment > inputs.purchase_price {
            return Err(AnalysisError::invalid(
                "down_payment",
                format!(
                    "Down payment {down_payment} exceeds purchase price {}",
                    inputs.purchase_price
                ),
            ));
        }
        validate_term(*loan_term_years)?;
        if *interest_rate_percent < Decimal::ZERO {
            return Err(AnalysisError::invalid(
                "interest_rate_percent",
                "Interest rate cannot be negative",
            ));
        }
        if *interest_rate_percent > MAX_INTEREST_RATE_PERCENT {
            return Err(AnalysisError::invalid(
                "interest_rate_percent",
                format!("Interest rate cannot exceed {MAX_INTEREST_RATE_PERCENT}%"),
            ));
        }
    }

    if let Some(cc) = closing_costs {
        if cc < Decimal::ZERO {
            return Err(AnalysisError::invalid(
                "closing_costs",
                "Closing costs cannot be negative",
            ));
        }
        ensure_within_ceiling("closing_costs", cc)?;
    }

    validate_income(income)?;
    validate_expenses(expenses)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expenses::PercentageBasis;
    use crate::types::MAX_AMOUNT;

    fn financed_inputs() -> PropertyInputs {
        PropertyInputs {
            address: "1200 Harbor Blvd".into(),
            city: "Oxnard".into(),
            state: "CA".into(),
            zip_code: "93035".into(),
            purchase_price: dec!(1000000),
            property_size_sqft: dec!(9600),
            total_units: 8,
            financing: Financing::Financed {
                down_payment: dec!(250000),
                loan_term_years: 30,
                interest_rate_percent: dec!(6.5),
            },
        }
    }

    fn rent_roll() -> Vec<IncomeLine> {
        vec![IncomeLine::new("Rent roll", dec!(8000))]
    }

    fn fixed_expenses() -> Vec<ExpenseLine> {
        vec![ExpenseLine::fixed("Operating", dec!(3000))]
    }

    #[test]
    fn test_financed_reference_deal() {
        let m = compute_metrics(&financed_inputs(), &rent_roll(), &fixed_expenses(), None).unwrap();

        assert_eq!(m.loan_amount, dec!(750000));
        assert!((m.monthly_payment - dec!(4740.51)).abs() < dec!(0.01));
        assert_eq!(m.monthly_noi, dec!(5000));
        assert_eq!(m.annual_noi, dec!(60000));
        assert!((m.monthly_cash_flow - dec!(259.49)).abs() < dec!(0.01));
        assert_eq!(m.cap_rate_percent, dec!(6));
        assert_eq!(m.total_investment, dec!(250000));
        assert!((m.cash_on_cash_return_percent - dec!(1.25)).abs() < dec!(0.01));
        // GRM = 1,000,000 / 96,000
        assert_eq!(m.gross_rent_multiplier, dec!(1000000) / dec!(96000));
        assert_eq!(m.debt_service_coverage_ratio, dec!(60000) / m.annual_debt_service);
    }

    #[test]
    fn test_cash_purchase_dscr_sentinel() {
        let inputs = PropertyInputs {
            purchase_price: dec!(500000),
            financing: Financing::Cash,
            ..financed_inputs()
        };
        let income = vec![IncomeLine::new("Rent", dec!(4000))];
        let expenses = vec![ExpenseLine::fixed("Opex", dec!(1200))];
        let m = compute_metrics(&inputs, &income, &expenses, None).unwrap();

        assert_eq!(m.loan_amount, Decimal::ZERO);
        assert_eq!(m.annual_debt_service, Decimal::ZERO);
        assert_eq!(m.debt_service_coverage_ratio, Decimal::ZERO);
        assert_eq!(m.cap_rate_percent, dec!(6.72));
        // No cash outlay recorded for a cash deal without closing costs
        assert_eq!(m.total_investment, Decimal::ZERO);
        assert_eq!(m.cash_on_cash_return_percent, Decimal::ZERO);
    }

    #[test]
    fn test_closing_costs_add_to_investment() {
        let m = compute_metrics(
            &financed_inputs(),
            &rent_roll(),
            &fixed_expenses(),
            Some(dec!(15000)),
        )
        .unwrap();
        assert_eq!(m.total_investment, dec!(265000));
    }

    #[test]
    fn test_zero_price_draft_renders() {
        let inputs = PropertyInputs {
            purchase_price: Decimal::ZERO,
            financing: Financing::Cash,
            ..financed_inputs()
        };
        let m = compute_metrics(&inputs, &[], &[], None).unwrap();
        assert_eq!(m.cap_rate_percent, Decimal::ZERO);
        assert_eq!(m.gross_rent_multiplier, Decimal::ZERO);
        assert_eq!(m.cash_on_cash_return_percent, Decimal::ZERO);
        assert_eq!(m.debt_service_coverage_ratio, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_loan_has_no_debt_service() {
        let inputs = PropertyInputs {
            financing: Financing::Financed {
                down_payment: dec!(250000),
                loan_term_years: 30,
                interest_rate_percent: Decimal::ZERO,
            },
            ..financed_inputs()
        };
        let m = compute_metrics(&inputs, &rent_roll(), &fixed_expenses(), None).unwrap();
        assert_eq!(m.loan_amount, dec!(750000));
        assert_eq!(m.monthly_payment, Decimal::ZERO);
        assert_eq!(m.debt_service_coverage_ratio, Decimal::ZERO);
        assert_eq!(m.monthly_cash_flow, m.monthly_noi);
    }

    #[test]
    fn test_property_value_expense_feeds_noi() {
        let expenses = vec![
            ExpenseLine::fixed("Insurance", dec!(500)),
            ExpenseLine::percentage("Tax", dec!(1.2), PercentageBasis::PropertyValue),
            ExpenseLine::percentage("Mgmt", dec!(5), PercentageBasis::Rent),
        ];
        let m = compute_metrics(&financed_inputs(), &rent_roll(), &expenses, None).unwrap();
        // 500 + 1000 + 400
        assert_eq!(m.monthly_expenses, dec!(1900));
        assert_eq!(m.annual_expenses, dec!(22800));
        assert_eq!(m.monthly_noi, dec!(6100));
    }

    #[test]
    fn test_annual_is_twelve_times_monthly() {
        let expenses = vec![ExpenseLine::percentage(
            "Tax",
            dec!(1),
            PercentageBasis::PropertyValue,
        )];
        let m = compute_metrics(&financed_inputs(), &rent_roll(), &expenses, None).unwrap();
        assert_eq!(m.annual_noi, m.monthly_noi * dec!(12));
        assert_eq!(m.annual_expenses, m.monthly_expenses * dec!(12));
        assert_eq!(m.annual_cash_flow, m.monthly_cash_flow * dec!(12));
        assert_eq!(m.annual_debt_service, m.monthly_payment * dec!(12));
    }

    #[test]
    fn test_down_payment_exceeds_price() {
        let inputs = PropertyInputs {
            financing: Financing::Financed {
                down_payment: dec!(1000001),
                loan_term_years: 30,
                interest_rate_percent: dec!(6.5),
            },
            ..financed_inputs()
        };
        let err = compute_metrics(&inputs, &[], &[], None).unwrap_err();
        assert!(err.to_string().contains("down_payment"));
    }

    #[test]
    fn test_full_down_payment_is_valid() {
        let inputs = PropertyInputs {
            financing: Financing::Financed {
                down_payment: dec!(1000000),
                loan_term_years: 30,
                interest_rate_percent: dec!(6.5),
            },
            ..financed_inputs()
        };
        let m = compute_metrics(&inputs, &rent_roll(), &fixed_expenses(), None).unwrap();
        assert_eq!(m.loan_amount, Decimal::ZERO);
        assert_eq!(m.monthly_payment, Decimal::ZERO);
    }

    #[test]
    fn test_negative_price_rejected() {
        let inputs = PropertyInputs {
            purchase_price: dec!(-1),
            financing: Financing::Cash,
            ..financed_inputs()
        };
        assert!(compute_metrics(&inputs, &[], &[], None).is_err());
    }

    #[test]
    fn test_zero_term_financed_rejected() {
        let inputs = PropertyInputs {
            financing: Financing::Financed {
                down_payment: dec!(250000),
                loan_term_years: 0,
                interest_rate_percent: dec!(6.5),
            },
            ..financed_inputs()
        };
        let err = compute_metrics(&inputs, &[], &[], None).unwrap_err();
        assert!(err.to_string().contains("loan_term_years"));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let inputs = PropertyInputs {
            financing: Financing::Financed {
                down_payment: dec!(250000),
                loan_term_years: 30,
                interest_rate_percent: dec!(-0.5),
            },
            ..financed_inputs()
        };
        assert!(compute_metrics(&inputs, &[], &[], None).is_err());
    }

    #[test]
    fn test_negative_closing_costs_rejected() {
        let err = compute_metrics(&financed_inputs(), &[], &[], Some(dec!(-1))).unwrap_err();
        assert!(err.to_string().contains("closing_costs"));
    }

    #[test]
    fn test_negative_income_rejected() {
        let income = vec![IncomeLine::new("Rent", dec!(-100))];
        assert!(compute_metrics(&financed_inputs(), &income, &[], None).is_err());
    }

    #[test]
    fn test_financing_wire_shape() {
        let json = r#"{
            "purchase_price": "500000",
            "financing": {"financing_type": "cash"}
        }"#;
        let inputs: PropertyInputs = serde_json::from_str(json).unwrap();
        assert_eq!(inputs.financing, Financing::Cash);
        assert_eq!(inputs.total_units, 0);

        let json = r#"{
            "address": "9 Elm",
            "purchase_price": 400000,
            "total_units": 4,
            "financing": {
                "financing_type": "financed",
                "down_payment": 80000,
                "loan_term_years": 30,
                "interest_rate_percent": 7.25
            }
        }"#;
        let inputs: PropertyInputs = serde_json::from_str(json).unwrap();
        assert_eq!(inputs.financing.down_payment(), dec!(80000));
        assert_eq!(inputs.financing.loan_amount(inputs.purchase_price), dec!(320000));
    }

    #[test]
    fn test_ratio_overflow_is_invalid_input() {
        // A near-zero price blows the cap rate past the decimal range
        let mut inputs = financed_inputs();
        inputs.purchase_price = Decimal::new(1, 28);
        inputs.financing = Financing::Cash;
        let err = compute_metrics(
            &inputs,
            &[IncomeLine::new("Rent", dec!(1000000))],
            &[],
            None,
        )
        .unwrap_err();
        assert!(
            matches!(err, AnalysisError::InvalidInput { ref field, .. } if field == "cap_rate_percent"),
            "{err}"
        );
    }

    #[test]
    fn test_price_above_ceiling_rejected() {
        let mut inputs = financed_inputs();
        inputs.purchase_price = MAX_AMOUNT + Decimal::ONE;
        let err = compute_metrics(&inputs, &[], &[], None).unwrap_err();
        assert!(err.to_string().contains("purchase_price"));
    }

    #[test]
    fn test_rate_above_ceiling_rejected() {
        let mut inputs = financed_inputs();
        inputs.financing = Financing::Financed {
            down_payment: dec!(250000),
            loan_term_years: 30,
            interest_rate_percent: dec!(250),
        };
        let err = compute_metrics(&inputs, &[], &[], None).unwrap_err();
        assert!(err.to_string().contains("interest_rate_percent"));
    }
}
