use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_analysis_core::analysis::{self, AnalysisRequest};
use property_analysis_core::config::AnalysisConfig;
use property_analysis_core::expenses::{ExpenseLine, PercentageBasis};
use property_analysis_core::income::IncomeLine;
use property_analysis_core::metrics::{Financing, PropertyInputs};
use property_analysis_core::reconcile::PropertySnapshot;

use crate::input;

/// Arguments for a full property analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a JSON/YAML snapshot or analysis request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Street address
    #[arg(long)]
    pub address: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment; omit for an all-cash purchase
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub term: u32,

    /// Gross monthly rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Fixed monthly operating expenses
    #[arg(long)]
    pub expenses: Option<Decimal>,

    /// Annual property tax as a percent of purchase price
    #[arg(long)]
    pub property_tax_percent: Option<Decimal>,

    /// Management fee as a percent of rent
    #[arg(long)]
    pub management_percent: Option<Decimal>,

    /// One-time closing costs
    #[arg(long)]
    pub closing_costs: Option<Decimal>,

    /// Number of rentable units
    #[arg(long, default_value = "1")]
    pub units: u32,

    /// Building size in square feet
    #[arg(long)]
    pub sqft: Option<Decimal>,
}

/// Arguments for applying an edit to a stored snapshot
#[derive(Args)]
pub struct UpdateArgs {
    /// Path to an analysis request carrying both `snapshot` and `changes`
    #[arg(long, conflicts_with_all = ["snapshot", "changes"])]
    pub input: Option<String>,

    /// Path to the stored snapshot
    #[arg(long, requires = "changes")]
    pub snapshot: Option<String>,

    /// Path to the edit to apply
    #[arg(long, requires = "snapshot")]
    pub changes: Option<String>,
}

pub fn run_analyze(
    args: AnalyzeArgs,
    config: &AnalysisConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = if let Some(ref path) = args.input {
        request_from_value(input::file::read_document(path)?)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        request_from_value(data)?
    } else {
        AnalysisRequest::full(snapshot_from_flags(&args)?)
    };

    tracing::debug!(
        address = %request.snapshot.inputs.address,
        has_changes = request.changes.is_some(),
        "running analysis"
    );
    let result = analysis::analyze_with_config(&request, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_update(
    args: UpdateArgs,
    config: &AnalysisConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: AnalysisRequest = match (args.input, args.snapshot, args.changes) {
        (Some(path), _, _) => input::file::read_document(&path)?,
        (None, Some(snapshot), Some(changes)) => AnalysisRequest::update(
            input::file::read_document(&snapshot)?,
            input::file::read_document(&changes)?,
        ),
        _ => match input::stdin::read_stdin()? {
            Some(data) => serde_json::from_value(data)?,
            None => {
                return Err(
                    "--input <request>, --snapshot with --changes, or stdin required for update"
                        .into(),
                )
            }
        },
    };

    if request.changes.is_none() {
        return Err("update request has no `changes`".into());
    }

    let result = analysis::analyze_with_config(&request, config)?;
    tracing::debug!(
        recalculated = result.result.recalculated,
        "applied partial update"
    );
    Ok(serde_json::to_value(result)?)
}

/// Accept either a full request (`{snapshot, changes}`) or a bare snapshot.
fn request_from_value(value: Value) -> Result<AnalysisRequest, Box<dyn std::error::Error>> {
    if value.get("snapshot").is_some() {
        Ok(serde_json::from_value(value)?)
    } else {
        let snapshot: PropertySnapshot = serde_json::from_value(value)?;
        Ok(AnalysisRequest::full(snapshot))
    }
}

fn snapshot_from_flags(args: &AnalyzeArgs) -> Result<PropertySnapshot, Box<dyn std::error::Error>> {
    let purchase_price = args
        .price
        .ok_or("--price is required (or provide --input)")?;

    let financing = match args.down_payment {
        Some(down_payment) => Financing::Financed {
            down_payment,
            loan_term_years: args.term,
            interest_rate_percent: args
                .rate
                .ok_or("--rate is required when --down-payment is given")?,
        },
        None => Financing::Cash,
    };

    let income = args
        .rent
        .map(|rent| vec![IncomeLine::new("Rent", rent)])
        .unwrap_or_default();

    let mut expenses = Vec::new();
    if let Some(amount) = args.expenses {
        expenses.push(ExpenseLine::fixed("Operating expenses", amount));
    }
    if let Some(pct) = args.property_tax_percent {
        expenses.push(ExpenseLine::percentage(
            "Property tax",
            pct,
            PercentageBasis::PropertyValue,
        ));
    }
    if let Some(pct) = args.management_percent {
        expenses.push(ExpenseLine::percentage(
            "Management",
            pct,
            PercentageBasis::Rent,
        ));
    }

    let mut snapshot = PropertySnapshot::new(
        PropertyInputs {
            address: args.address.clone().unwrap_or_default(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            purchase_price,
            property_size_sqft: args.sqft.unwrap_or(Decimal::ZERO),
            total_units: args.units,
            financing,
        },
        income,
        expenses,
    );
    snapshot.closing_costs = args.closing_costs;
    Ok(snapshot)
}
