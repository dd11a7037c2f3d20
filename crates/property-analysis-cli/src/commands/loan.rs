use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_analysis_core::amortization::{self, LoanTerms};

use crate::input;

/// Loan parameters shared by `debt-service` and `schedule`
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON/YAML loan terms (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal borrowed
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub term: u32,
}

pub fn run_debt_service(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = loan_terms(args)?;
    let result = amortization::compute_debt_service(
        terms.loan_amount,
        terms.interest_rate_percent,
        terms.loan_term_years,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = loan_terms(args)?;
    let schedule = amortization::amortization_schedule(
        terms.loan_amount,
        terms.interest_rate_percent,
        terms.loan_term_years,
    )?;
    tracing::debug!(years = schedule.len(), "built amortization schedule");
    Ok(serde_json::to_value(schedule)?)
}

fn loan_terms(args: LoanArgs) -> Result<LoanTerms, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_document(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Ok(LoanTerms {
        loan_amount: args
            .loan
            .ok_or("--loan is required (or provide --input)")?,
        interest_rate_percent: args
            .rate
            .ok_or("--rate is required (or provide --input)")?,
        loan_term_years: args.term,
    })
}
