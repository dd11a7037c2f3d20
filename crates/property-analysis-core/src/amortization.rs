use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::{ensure_within_ceiling, Money, Percent, MONTHS_PER_YEAR};
use crate::AnalysisResult;

/// Longest loan term accepted, in years.
pub const MAX_LOAN_TERM_YEARS: u32 = 50;

/// Highest annual interest rate accepted, in percent.
pub const MAX_INTEREST_RATE_PERCENT: Percent = dec!(100);

/// Scheduled payment on a fixed-rate loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtService {
    pub monthly_payment: Money,
    /// Always `monthly_payment * 12`
    pub annual_debt_service: Money,
}

impl DebtService {
    pub const NONE: DebtService = DebtService {
        monthly_payment: Decimal::ZERO,
        annual_debt_service: Decimal::ZERO,
    };
}

/// One year of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
}

/// A standalone fixed-rate loan, independent of any property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub loan_amount: Money,
    pub interest_rate_percent: Percent,
    pub loan_term_years: u32,
}

/// Monthly payment and annual debt service for a fixed-rate loan.
///
/// A non-positive loan amount or rate is a cash purchase or an interest-free
/// loan and services at zero. `term_years` must be positive for any loan that
/// actually amortizes.
pub fn compute_debt_service(
    loan_amount: Money,
    annual_rate_percent: Percent,
    term_years: u32,
) -> AnalysisResult<DebtService> {
    if loan_amount <= Decimal::ZERO || annual_rate_percent <= Decimal::ZERO {
        return Ok(DebtService::NONE);
    }
    validate_loan(loan_amount, annual_rate_percent)?;

    let months = term_months(term_years)?;
    let monthly_payment = monthly_payment(loan_amount, monthly_rate(annual_rate_percent), months)?;

    Ok(DebtService {
        monthly_payment,
        annual_debt_service: monthly_payment
            .checked_mul(Decimal::from(MONTHS_PER_YEAR))
            .ok_or_else(|| AnalysisError::overflow("annual_debt_service"))?,
    })
}

/// Year-by-year principal, interest and remaining balance.
///
/// A zero loan has no schedule. A zero rate repays principal straight-line.
pub fn amortization_schedule(
    loan_amount: Money,
    annual_rate_percent: Percent,
    term_years: u32,
) -> AnalysisResult<Vec<AmortizationYear>> {
    if loan_amount <= Decimal::ZERO {
        return Ok(Vec::new());
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(AnalysisError::invalid(
            "interest_rate_percent",
            "Interest rate cannot be negative",
        ));
    }
    validate_loan(loan_amount, annual_rate_percent)?;

    let months = term_months(term_years)?;
    let rate = monthly_rate(annual_rate_percent);
    let payment = if rate.is_zero() {
        loan_amount / Decimal::from(months)
    } else {
        monthly_payment(loan_amount, rate, months)?
    };

    let mut schedule = Vec::with_capacity(term_years as usize);
    let mut balance = loan_amount;

    for year in 1..=term_years {
        let mut paid = Decimal::ZERO;
        let mut interest_paid = Decimal::ZERO;
        let mut principal_paid = Decimal::ZERO;

        for month in 0..MONTHS_PER_YEAR {
            let interest = balance * rate;
            let last = year == term_years && month == MONTHS_PER_YEAR - 1;
            // The final installment clears whatever rounding left behind.
            let principal = if last {
                balance
            } else {
                (payment - interest).min(balance)
            };
            balance -= principal;
            paid += interest + principal;
            interest_paid += interest;
            principal_paid += principal;
        }

        schedule.push(AmortizationYear {
            year,
            payment: paid,
            interest: interest_paid,
            principal: principal_paid,
            ending_balance: balance,
        });
    }

    Ok(schedule)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn monthly_rate(annual_rate_percent: Percent) -> Decimal {
    annual_rate_percent / dec!(100) / Decimal::from(MONTHS_PER_YEAR)
}

fn validate_loan(loan_amount: Money, annual_rate_percent: Percent) -> AnalysisResult<()> {
    ensure_within_ceiling("loan_amount", loan_amount)?;
    if annual_rate_percent > MAX_INTEREST_RATE_PERCENT {
        return Err(AnalysisError::invalid(
            "interest_rate_percent",
            format!("Interest rate cannot exceed {MAX_INTEREST_RATE_PERCENT}%"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_term(term_years: u32) -> AnalysisResult<()> {
    if term_years == 0 {
        return Err(AnalysisError::invalid(
            "loan_term_years",
            "Loan term must be at least 1 year",
        ));
    }
    if term_years > MAX_LOAN_TERM_YEARS {
        return Err(AnalysisError::invalid(
            "loan_term_years",
            format!("Loan term cannot exceed {MAX_LOAN_TERM_YEARS} years"),
        ));
    }
    Ok(())
}

fn term_months(term_years: u32) -> AnalysisResult<u32> {
    validate_term(term_years)?;
    term_years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| AnalysisError::overflow("loan_term_years"))
}

/// Standard fixed-rate payment: P * r(1+r)^n / ((1+r)^n - 1)
fn monthly_payment(
    principal: Money,
    monthly_rate: Decimal,
    total_months: u32,
) -> AnalysisResult<Money> {
    let compound = (Decimal::ONE + monthly_rate)
        .checked_powu(u64::from(total_months))
        .ok_or_else(|| {
            AnalysisError::invalid(
                "interest_rate_percent",
                "Interest rate and term compound beyond representable range",
            )
        })?;

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(AnalysisError::invalid(
            "interest_rate_percent",
            "Interest rate too small to amortize over the term",
        ));
    }

    // Divide first: compound / (compound - 1) stays near 1 for long terms
    (compound / denominator)
        .checked_mul(monthly_rate)
        .and_then(|factor| factor.checked_mul(principal))
        .ok_or_else(|| AnalysisError::overflow("monthly_payment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirty_year_payment() {
        // $750k at 6.5% over 30 years
        let ds = compute_debt_service(dec!(750000), dec!(6.5), 30).unwrap();
        assert!(
            (ds.monthly_payment - dec!(4740.51)).abs() < dec!(0.01),
            "Monthly payment {} outside one-cent tolerance",
            ds.monthly_payment
        );
        assert_eq!(ds.annual_debt_service, ds.monthly_payment * dec!(12));
    }

    #[test]
    fn test_fifteen_year_payment() {
        // $200k at 5% over 15 years, reference ~$1,581.59
        let ds = compute_debt_service(dec!(200000), dec!(5), 15).unwrap();
        assert!((ds.monthly_payment - dec!(1581.59)).abs() < dec!(0.01));
    }

    #[test]
    fn test_zero_loan_services_at_zero() {
        let ds = compute_debt_service(Decimal::ZERO, dec!(6.5), 30).unwrap();
        assert_eq!(ds, DebtService::NONE);
    }

    #[test]
    fn test_zero_rate_services_at_zero() {
        let ds = compute_debt_service(dec!(300000), Decimal::ZERO, 30).unwrap();
        assert_eq!(ds.monthly_payment, Decimal::ZERO);
        assert_eq!(ds.annual_debt_service, Decimal::ZERO);
    }

    #[test]
    fn test_zero_term_rejected() {
        let err = compute_debt_service(dec!(300000), dec!(6), 0).unwrap_err();
        assert!(err.to_string().contains("loan_term_years"));
    }

    #[test]
    fn test_oversized_term_rejected() {
        for term in [MAX_LOAN_TERM_YEARS + 1, 400_000_000, u32::MAX] {
            let err = compute_debt_service(dec!(100000), dec!(5), term).unwrap_err();
            assert!(
                matches!(err, AnalysisError::InvalidInput { ref field, .. } if field == "loan_term_years"),
                "term {term}: {err}"
            );
            assert!(amortization_schedule(dec!(100000), dec!(5), term).is_err());
        }
    }

    #[test]
    fn test_longest_term_amortizes() {
        let ds = compute_debt_service(dec!(100000), dec!(5), MAX_LOAN_TERM_YEARS).unwrap();
        assert!(ds.monthly_payment > Decimal::ZERO);
        let schedule = amortization_schedule(dec!(100000), dec!(5), MAX_LOAN_TERM_YEARS).unwrap();
        assert_eq!(schedule.len(), MAX_LOAN_TERM_YEARS as usize);
    }

    #[test]
    fn test_rate_above_ceiling_rejected() {
        let err = compute_debt_service(dec!(100000), dec!(100.01), 30).unwrap_err();
        assert!(err.to_string().contains("interest_rate_percent"));
    }

    #[test]
    fn test_loan_above_ceiling_rejected() {
        let err = compute_debt_service(Decimal::MAX, dec!(5), 30).unwrap_err();
        assert!(err.to_string().contains("loan_amount"));
        assert!(amortization_schedule(Decimal::MAX, dec!(5), 30).is_err());
    }

    #[test]
    fn test_zero_term_ignored_without_loan() {
        assert!(compute_debt_service(Decimal::ZERO, dec!(6), 0).is_ok());
    }

    #[test]
    fn test_schedule_pays_off_loan() {
        let schedule = amortization_schedule(dec!(750000), dec!(6.5), 30).unwrap();
        assert_eq!(schedule.len(), 30);
        assert_eq!(schedule.last().unwrap().ending_balance, Decimal::ZERO);

        let principal: Decimal = schedule.iter().map(|y| y.principal).sum();
        assert!((principal - dec!(750000)).abs() < dec!(0.000001));

        // Interest share shrinks as the balance amortizes
        assert!(schedule[0].interest > schedule[29].interest);
        assert!(schedule[0].principal < schedule[29].principal);
    }

    #[test]
    fn test_schedule_first_year_matches_payment() {
        let ds = compute_debt_service(dec!(750000), dec!(6.5), 30).unwrap();
        let schedule = amortization_schedule(dec!(750000), dec!(6.5), 30).unwrap();
        let first = &schedule[0];
        assert!((first.payment - ds.annual_debt_service).abs() < dec!(0.0001));
        assert!((first.interest + first.principal - first.payment).abs() < dec!(0.000001));
        assert!((first.ending_balance - (dec!(750000) - first.principal)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_schedule_zero_rate_is_straight_line() {
        let schedule = amortization_schedule(dec!(120000), Decimal::ZERO, 10).unwrap();
        assert_eq!(schedule.len(), 10);
        for year in &schedule {
            assert_eq!(year.interest, Decimal::ZERO);
            assert_eq!(year.principal, dec!(12000));
        }
        assert_eq!(schedule[4].ending_balance, dec!(60000));
    }

    #[test]
    fn test_schedule_no_loan_is_empty() {
        assert!(amortization_schedule(Decimal::ZERO, dec!(6), 30)
            .unwrap()
            .is_empty());
    }
}
