//! Partial updates against a stored property snapshot.
//!
//! An edit either touches an input of the metric engine, in which case the
//! whole `DerivedMetrics` is rebuilt from the merged inputs, or it does not,
//! in which case the stored metrics are handed back untouched. There is no
//! third outcome and no field-level patching of metrics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::expenses::ExpenseLine;
use crate::income::IncomeLine;
use crate::metrics::{compute_metrics, validate_inputs, DerivedMetrics, Financing, PropertyInputs};
use crate::types::{Money, Percent};
use crate::AnalysisResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A persisted property record: everything the engine reads, plus the
/// metrics last computed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub inputs: PropertyInputs,
    #[serde(default)]
    pub income: Vec<IncomeLine>,
    #[serde(default)]
    pub expenses: Vec<ExpenseLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_costs: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DerivedMetrics>,
}

impl PropertySnapshot {
    pub fn new(
        inputs: PropertyInputs,
        income: Vec<IncomeLine>,
        expenses: Vec<ExpenseLine>,
    ) -> Self {
        Self {
            inputs,
            income,
            expenses,
            closing_costs: None,
            metrics: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancingType {
    Cash,
    Financed,
}

/// A sparse edit: every present field replaces the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialInputs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_size_sqft: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_units: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financing_type: Option<FinancingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate_percent: Option<Percent>,
    /// Replacement income lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<Vec<IncomeLine>>,
    /// Replacement expense lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expenses: Option<Vec<ExpenseLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_costs: Option<Money>,
}

/// Whether stored metrics still describe the stored inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Stale,
    Fresh,
}

/// Outcome of a partial update: the merged inputs and their current metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciled {
    pub inputs: PropertyInputs,
    pub income: Vec<IncomeLine>,
    pub expenses: Vec<ExpenseLine>,
    pub closing_costs: Option<Money>,
    pub metrics: DerivedMetrics,
    /// True if the metrics were rebuilt, false if carried over
    pub recalculated: bool,
}

impl Reconciled {
    /// The snapshot to persist in place of the prior one.
    pub fn into_snapshot(self) -> PropertySnapshot {
        PropertySnapshot {
            inputs: self.inputs,
            income: self.income,
            expenses: self.expenses,
            closing_costs: self.closing_costs,
            metrics: Some(self.metrics),
        }
    }
}

impl PartialInputs {
    /// Purchase price or any financing term.
    pub fn touches_financing(&self) -> bool {
        self.purchase_price.is_some()
            || self.down_payment.is_some()
            || self.interest_rate_percent.is_some()
            || self.loan_term_years.is_some()
            || self.financing_type.is_some()
    }

    /// Income lines, expense lines or closing costs.
    pub fn touches_cash_flows(&self) -> bool {
        self.income.is_some() || self.expenses.is_some() || self.closing_costs.is_some()
    }

    fn touches_loan_terms(&self) -> bool {
        self.down_payment.is_some()
            || self.interest_rate_percent.is_some()
            || self.loan_term_years.is_some()
    }

    /// Evaluate what applying this edit to `prior` leaves the metrics as.
    pub fn freshness(&self, prior: &PropertySnapshot) -> Freshness {
        if prior.metrics.is_none() || self.touches_financing() || self.touches_cash_flows() {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Merge `changes` onto `prior` and bring the metrics up to date.
///
/// Closing costs and line lists carry over unless replaced. Because
/// property-value expenses are resolved from the merged price, a price change
/// moves `monthly_expenses` even when no expense line was edited.
pub fn apply_partial_update(
    prior: &PropertySnapshot,
    changes: &PartialInputs,
) -> AnalysisResult<Reconciled> {
    let freshness = changes.freshness(prior);

    let inputs = merge_inputs(&prior.inputs, changes)?;
    let income = changes.income.clone().unwrap_or_else(|| prior.income.clone());
    let expenses = changes
        .expenses
        .clone()
        .unwrap_or_else(|| prior.expenses.clone());
    let closing_costs = changes.closing_costs.or(prior.closing_costs);

    let (metrics, recalculated) = match (freshness, prior.metrics.as_ref()) {
        (Freshness::Fresh, Some(current)) => {
            validate_inputs(&inputs, &income, &expenses, closing_costs)?;
            (current.clone(), false)
        }
        _ => (
            compute_metrics(&inputs, &income, &expenses, closing_costs)?,
            true,
        ),
    };

    Ok(Reconciled {
        inputs,
        income,
        expenses,
        closing_costs,
        metrics,
        recalculated,
    })
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

fn merge_inputs(prior: &PropertyInputs, changes: &PartialInputs) -> AnalysisResult<PropertyInputs> {
    Ok(PropertyInputs {
        address: changes
            .address
            .clone()
            .unwrap_or_else(|| prior.address.clone()),
        city: changes.city.clone().unwrap_or_else(|| prior.city.clone()),
        state: changes.state.clone().unwrap_or_else(|| prior.state.clone()),
        zip_code: changes
            .zip_code
            .clone()
            .unwrap_or_else(|| prior.zip_code.clone()),
        purchase_price: changes.purchase_price.unwrap_or(prior.purchase_price),
        property_size_sqft: changes
            .property_size_sqft
            .unwrap_or(prior.property_size_sqft),
        total_units: changes.total_units.unwrap_or(prior.total_units),
        financing: merge_financing(&prior.financing, changes)?,
    })
}

fn merge_financing(prior: &Financing, changes: &PartialInputs) -> AnalysisResult<Financing> {
    let target = changes.financing_type.unwrap_or(match prior {
        Financing::Cash => FinancingType::Cash,
        Financing::Financed { .. } => FinancingType::Financed,
    });

    match target {
        FinancingType::Cash => {
            if changes.touches_loan_terms() {
                return Err(AnalysisError::invalid(
                    "financing_type",
                    "Loan terms supplied for a cash purchase",
                ));
            }
            Ok(Financing::Cash)
        }
        FinancingType::Financed => {
            let (down, term, rate) = match prior {
                Financing::Financed {
                    down_payment,
                    loan_term_years,
                    interest_rate_percent,
                } => (
                    Some(*down_payment),
                    Some(*loan_term_years),
                    Some(*interest_rate_percent),
                ),
                Financing::Cash => (None, None, None),
            };

            Ok(Financing::Financed {
                down_payment: changes
                    .down_payment
                    .or(down)
                    .ok_or_else(|| missing_loan_term("down_payment"))?,
                loan_term_years: changes
                    .loan_term_years
                    .or(term)
                    .ok_or_else(|| missing_loan_term("loan_term_years"))?,
                interest_rate_percent: changes
                    .interest_rate_percent
                    .or(rate)
                    .ok_or_else(|| missing_loan_term("interest_rate_percent"))?,
            })
        }
    }
}

fn missing_loan_term(field: &str) -> AnalysisError {
    AnalysisError::invalid(
        field,
        "Required when switching a cash purchase to financed",
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
