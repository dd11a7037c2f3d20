use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use property_analysis_core::amortization::{self, LoanTerms};
use property_analysis_core::analysis::{self, AnalysisRequest};
use property_analysis_core::config::AnalysisConfig;
use property_analysis_core::reconcile::{self, PartialInputs, PropertySnapshot};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_property(input_json: String) -> NapiResult<String> {
    let input: AnalysisRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = analysis::analyze(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_property_with_config(input_json: String, config_json: String) -> NapiResult<String> {
    let input: AnalysisRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = AnalysisConfig::from_json(&config_json).map_err(to_napi_error)?;
    let output = analysis::analyze_with_config(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct PartialUpdateInput {
    snapshot: PropertySnapshot,
    changes: PartialInputs,
}

/// Merge an edit into a stored snapshot and return the snapshot to persist.
#[napi]
pub fn apply_partial_update(input_json: String) -> NapiResult<String> {
    let input: PartialUpdateInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let reconciled =
        reconcile::apply_partial_update(&input.snapshot, &input.changes).map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({
        "recalculated": reconciled.recalculated,
        "snapshot": reconciled.into_snapshot(),
    }))
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn debt_service(input_json: String) -> NapiResult<String> {
    let input: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::compute_debt_service(
        input.loan_amount,
        input.interest_rate_percent,
        input.loan_term_years,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::amortization_schedule(
        input.loan_amount,
        input.interest_rate_percent,
        input.loan_term_years,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
