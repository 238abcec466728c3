use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use realty_eval_core::amortization;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct LoanTerms {
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
}

#[derive(Serialize)]
struct PaymentOutput {
    payment: Decimal,
    monthly_rate: Decimal,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Full evaluation envelope. Accepts typed inputs or the stored string form.
#[napi]
pub fn evaluate_deal(input_json: String) -> NapiResult<String> {
    let document: serde_json::Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let inputs = realty_eval_core::evaluation::EvaluationInputs::from_json_value(document)
        .map_err(to_napi_error)?;
    let output = realty_eval_core::evaluation::evaluate(&inputs).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// The four stored metrics only, rounded to cents for persistence.
#[napi]
pub fn evaluation_metrics(input_json: String) -> NapiResult<String> {
    let raw: realty_eval_core::evaluation::RawEvaluationInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let inputs = raw.parse().map_err(to_napi_error)?;
    let outputs = realty_eval_core::evaluation::compute_evaluation_metrics(&inputs)
        .map_err(to_napi_error)?
        .rounded_to_cents();
    serde_json::to_string(&outputs).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortisation
// ---------------------------------------------------------------------------

#[napi]
pub fn amortized_payment(input_json: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let monthly_rate = amortization::monthly_rate_from_annual_percent(terms.annual_rate_percent);
    let payment =
        amortization::compute_amortized_payment(terms.term_months, monthly_rate, terms.principal)
            .map_err(to_napi_error)?;
    serde_json::to_string(&PaymentOutput {
        payment,
        monthly_rate,
    })
    .map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let monthly_rate = amortization::monthly_rate_from_annual_percent(terms.annual_rate_percent);
    let schedule =
        amortization::amortization_schedule(terms.principal, monthly_rate, terms.term_months)
            .map_err(to_napi_error)?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparable sales
// ---------------------------------------------------------------------------

#[napi]
pub fn search_comparables(input_json: String) -> NapiResult<String> {
    let input: realty_eval_core::comps::CompSearchInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = realty_eval_core::comps::search_comparables(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
