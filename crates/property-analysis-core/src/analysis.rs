use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::AnalysisConfig;
use crate::reconcile::{apply_partial_update, PartialInputs, PropertySnapshot, Reconciled};
use crate::supplemental::{compute_supplemental, SupplementalMetrics};
use crate::types::{with_metadata, ComputationOutput};
use crate::AnalysisResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A stored snapshot plus, optionally, the edit being applied to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub snapshot: PropertySnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<PartialInputs>,
}

impl AnalysisRequest {
    /// First full analysis of a property with no prior metrics.
    pub fn full(snapshot: PropertySnapshot) -> Self {
        Self {
            snapshot,
            changes: None,
        }
    }

    pub fn update(snapshot: PropertySnapshot, changes: PartialInputs) -> Self {
        Self {
            snapshot,
            changes: Some(changes),
        }
    }
}

/// Result of one analysis: the snapshot to persist and the panel extras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Merged snapshot; `metrics` is always present
    pub snapshot: PropertySnapshot,
    /// True if `DerivedMetrics` were rebuilt rather than carried over
    pub recalculated: bool,
    pub supplemental: SupplementalMetrics,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyze a property with the default warning thresholds.
pub fn analyze(request: &AnalysisRequest) -> AnalysisResult<ComputationOutput<AnalysisOutput>> {
    analyze_with_config(request, &AnalysisConfig::default())
}

/// Analyze a property: full analysis when the snapshot has no metrics, a
/// reconciled update when `changes` are supplied, and a pass-through of the
/// stored metrics otherwise.
pub fn analyze_with_config(
    request: &AnalysisRequest,
    config: &AnalysisConfig,
) -> AnalysisResult<ComputationOutput<AnalysisOutput>> {
    let start = Instant::now();
    config.validate()?;

    let no_changes = PartialInputs::default();
    let changes = request.changes.as_ref().unwrap_or(&no_changes);
    let reconciled = apply_partial_update(&request.snapshot, changes)?;

    let supplemental = compute_supplemental(
        &reconciled.inputs,
        &reconciled.income,
        &reconciled.expenses,
        &reconciled.metrics,
    )?;
    let warnings = collect_warnings(&reconciled, &supplemental, config);
    let recalculated = reconciled.recalculated;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Rental Property Investment Analysis (NOI, Cap Rate, Cash-on-Cash, DSCR, GRM)",
        request,
        warnings,
        elapsed,
        AnalysisOutput {
            snapshot: reconciled.into_snapshot(),
            recalculated,
            supplemental,
        },
    ))
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn collect_warnings(
    reconciled: &Reconciled,
    supplemental: &SupplementalMetrics,
    config: &AnalysisConfig,
) -> Vec<String> {
    let metrics = &reconciled.metrics;
    let mut warnings = Vec::new();

    let dscr = metrics.debt_service_coverage_ratio;
    if dscr > Decimal::ZERO && dscr < config.min_dscr {
        warnings.push(format!(
            "DSCR of {dscr:.2} is below {:.2}x — lender covenant risk",
            config.min_dscr
        ));
    }

    if supplemental.loan_to_value_percent > config.max_ltv_percent {
        warnings.push(format!(
            "LTV of {:.1}% exceeds {}% — high leverage",
            supplemental.loan_to_value_percent,
            config.max_ltv_percent.normalize()
        ));
    }

    if metrics.monthly_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Negative monthly cash flow of {:.2} — income does not cover expenses and debt service",
            metrics.monthly_cash_flow
        ));
    }

    if reconciled.inputs.purchase_price > Decimal::ZERO {
        let cap = metrics.cap_rate_percent;
        if cap < config.min_cap_rate_percent {
            warnings.push(format!(
                "Cap rate {cap:.2}% is below {}% — unusually low, verify price and rents",
                config.min_cap_rate_percent.normalize()
            ));
        } else if cap > config.max_cap_rate_percent {
            warnings.push(format!(
                "Cap rate {cap:.2}% exceeds {}% — unusually high, may indicate elevated risk",
                config.max_cap_rate_percent.normalize()
            ));
        }
    }

    let monthly_income = supplemental.monthly_gross_income;
    if monthly_income > Decimal::ZERO && metrics.monthly_expenses > monthly_income {
        warnings.push("Operating expenses exceed gross income".into());
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
