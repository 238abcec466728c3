use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::inputs::{validate_inputs, EvaluationInputs};
use crate::amortization::{compute_amortized_payment, monthly_rate_from_annual_percent, to_cents};
use crate::arith;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::EvalResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The four headline metrics stored on an evaluation.
///
/// Ratios are `None` when their denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutputs {
    /// Value created between all-in acquisition cost and ARV
    pub equity_capture: Money,
    /// Yearly rent less carrying costs and refinance debt service
    pub annual_cash_flow: Money,
    /// annual_cash_flow / equity_capture, as a percentage
    pub return_on_equity_capture: Option<Percent>,
    /// annual_cash_flow / cash out of pocket, as a percentage
    pub cash_on_cash_return: Option<Percent>,
}

/// Every intermediate figure of the model, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationBreakdown {
    pub insurance_monthly: Money,
    pub property_tax_monthly: Money,
    pub hoa_monthly: Money,
    pub mortgage_insurance_monthly: Money,
    pub refi_interest_rate_monthly: Rate,
    pub refi_loan_term_months: u32,
    pub refi_loan_amount: Money,
    /// Monthly principal and interest on the refinance loan
    pub note_payment: Money,
    pub monthly_cash_flow: Money,
    pub hard_loan_amount: Money,
    pub hard_cash_to_close: Money,
    pub hard_closing_costs: Money,
    pub hard_cash_out_of_pocket: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub outputs: EvaluationOutputs,
    pub breakdown: EvaluationBreakdown,
}

impl EvaluationOutputs {
    /// Cent-rounded copy, the form written back to a stored evaluation.
    pub fn rounded_to_cents(&self) -> Self {
        EvaluationOutputs {
            equity_capture: to_cents(self.equity_capture),
            annual_cash_flow: to_cents(self.annual_cash_flow),
            return_on_equity_capture: self.return_on_equity_capture.map(to_cents),
            cash_on_cash_return: self.cash_on_cash_return.map(to_cents),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the four evaluation metrics from a deal's inputs.
///
/// Inputs are validated first; a zero denominator yields `None` for the
/// affected ratio rather than an error.
pub fn compute_evaluation_metrics(inputs: &EvaluationInputs) -> EvalResult<EvaluationOutputs> {
    let mut warnings = Vec::new();
    Ok(run_model(inputs, &mut warnings)?.outputs)
}

/// Full evaluation wrapped in the standard output envelope, with the
/// intermediate breakdown and any warnings about degenerate ratios.
pub fn evaluate(inputs: &EvaluationInputs) -> EvalResult<ComputationOutput<EvaluationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = run_model(inputs, &mut warnings)?;

    if result.outputs.annual_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Annual cash flow is negative ({:.2}) — rent does not cover carrying costs",
            result.outputs.annual_cash_flow
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Fix-and-Refinance Evaluation (hard money acquisition, amortised refinance)",
        inputs,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

fn run_model(
    inputs: &EvaluationInputs,
    warnings: &mut Vec<String>,
) -> EvalResult<EvaluationResult> {
    validate_inputs(inputs)?;

    // --- Normalise annual figures and percentages ---
    let insurance_monthly = inputs.insurance_annual / MONTHS_PER_YEAR;
    let property_tax_monthly = inputs.property_tax_annual / MONTHS_PER_YEAR;
    let hoa_monthly = inputs.hoa_annual / MONTHS_PER_YEAR;
    let mortgage_insurance_monthly = inputs.refi_mortgage_insurance_annual / MONTHS_PER_YEAR;

    let hard_ltv = inputs.hard_loan_to_value_percent / HUNDRED;
    let refi_ltv = inputs.refi_loan_to_value_percent / HUNDRED;
    let refi_interest_rate_monthly =
        monthly_rate_from_annual_percent(inputs.refi_interest_rate_percent_annual);
    let refi_loan_term_months = inputs.refi_loan_term_years * 12;

    // --- Refinance debt service ---
    let refi_loan_amount = arith::mul(
        inputs.estimated_sale_price,
        refi_ltv,
        "refinance loan amount",
    )?;
    let note_payment = compute_amortized_payment(
        refi_loan_term_months,
        refi_interest_rate_monthly,
        refi_loan_amount,
    )?;

    // --- Cash flow ---
    let outgoings = arith::sum(
        &[
            note_payment,
            property_tax_monthly,
            insurance_monthly,
            hoa_monthly,
            mortgage_insurance_monthly,
            inputs.miscellaneous_monthly,
        ],
        "monthly cash flow",
    )?;
    let monthly_cash_flow = arith::sub(inputs.rent_monthly, outgoings, "monthly cash flow")?;
    let annual_cash_flow = arith::mul(monthly_cash_flow, MONTHS_PER_YEAR, "annual cash flow")?;

    // --- Equity capture ---
    let all_in_cost = arith::sum(
        &[
            inputs.purchase_price,
            inputs.repairs,
            inputs.hard_lender_fees,
            inputs.refi_lender_fees,
        ],
        "equity capture",
    )?;
    let equity_capture = arith::sub(inputs.estimated_sale_price, all_in_cost, "equity capture")?;
    let return_on_equity_capture = percent_of(
        annual_cash_flow,
        equity_capture,
        "Return on equity capture",
        "equity capture",
        warnings,
    )?;

    // --- Cash invested under the hard-money loan ---
    let hard_loan_amount = arith::mul(
        hard_ltv,
        inputs.estimated_sale_price,
        "hard-money loan amount",
    )?;
    let hard_cash_to_close = arith::sub(
        arith::add(inputs.purchase_price, inputs.repairs, "cash to close")?,
        hard_loan_amount,
        "cash to close",
    )?;
    let hard_closing_costs = arith::sum(
        &[
            inputs.hard_lender_fees,
            inputs.refi_lender_fees,
            inputs.appraisal,
            inputs.survey,
            inputs.inspection,
        ],
        "closing costs",
    )?;
    let hard_cash_out_of_pocket = arith::sum(
        &[
            hard_cash_to_close,
            hard_closing_costs,
            inputs.hard_first_phase_costs,
        ],
        "cash out of pocket",
    )?;
    let cash_on_cash_return = percent_of(
        annual_cash_flow,
        hard_cash_out_of_pocket,
        "Cash-on-cash return",
        "cash out of pocket",
        warnings,
    )?;

    Ok(EvaluationResult {
        outputs: EvaluationOutputs {
            equity_capture,
            annual_cash_flow,
            return_on_equity_capture,
            cash_on_cash_return,
        },
        breakdown: EvaluationBreakdown {
            insurance_monthly,
            property_tax_monthly,
            hoa_monthly,
            mortgage_insurance_monthly,
            refi_interest_rate_monthly,
            refi_loan_term_months,
            refi_loan_amount,
            note_payment,
            monthly_cash_flow,
            hard_loan_amount,
            hard_cash_to_close,
            hard_closing_costs,
            hard_cash_out_of_pocket,
        },
    })
}

/// `numerator / denominator * 100`; `None` on a zero denominator.
fn percent_of(
    numerator: Money,
    denominator: Money,
    metric: &str,
    denominator_name: &str,
    warnings: &mut Vec<String>,
) -> EvalResult<Option<Percent>> {
    if denominator.is_zero() {
        warnings.push(format!(
            "{metric} is undefined: {denominator_name} is zero"
        ));
        return Ok(None);
    }
    if denominator < Decimal::ZERO {
        warnings.push(format!(
            "{metric} uses a negative {denominator_name} ({denominator:.2}) — sign of the ratio is inverted"
        ));
    }
    let ratio = arith::div(numerator, denominator, metric)?;
    Ok(Some(arith::mul(ratio, HUNDRED, metric)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::evaluation::inputs::{EvaluationField, MAX_AMOUNT};
    use rust_decimal_macros::dec;

    fn sample_inputs() -> EvaluationInputs {
        EvaluationInputs {
            estimated_sale_price: dec!(300000),
            purchase_price: dec!(180000),
            repairs: dec!(40000),
            insurance_annual: dec!(1200),
            property_tax_annual: dec!(3600),
            hoa_annual: dec!(0),
            miscellaneous_monthly: dec!(50),
            rent_monthly: dec!(2200),
            survey: dec!(400),
            inspection: dec!(350),
            appraisal: dec!(500),
            hard_loan_to_value_percent: dec!(70),
            hard_lender_fees: dec!(3000),
            hard_first_phase_costs: dec!(5000),
            refi_loan_to_value_percent: dec!(75),
            refi_interest_rate_percent_annual: dec!(5),
            refi_loan_term_years: 30,
            refi_lender_fees: dec!(2000),
            refi_mortgage_insurance_annual: dec!(0),
        }
    }

    #[test]
    fn test_note_payment_and_cash_flow() {
        let out = evaluate(&sample_inputs()).unwrap();
        let b = &out.result.breakdown;

        assert_eq!(b.refi_loan_amount, dec!(225000));
        assert_eq!(b.refi_loan_term_months, 360);
        assert_eq!(to_cents(b.note_payment), dec!(1207.85));
        // 2200 - 1207.85 - 300 - 100 - 0 - 0 - 50
        assert_eq!(to_cents(b.monthly_cash_flow), dec!(542.15));
        assert_eq!(to_cents(out.result.outputs.annual_cash_flow), dec!(6505.82));
    }

    #[test]
    fn test_equity_capture() {
        let out = compute_evaluation_metrics(&sample_inputs()).unwrap();
        // 300000 - (180000 + 40000 + 3000 + 2000)
        assert_eq!(out.equity_capture, dec!(75000));
    }

    #[test]
    fn test_cash_out_of_pocket() {
        let out = evaluate(&sample_inputs()).unwrap();
        let b = &out.result.breakdown;
        // 180000 + 40000 - 0.70 * 300000
        assert_eq!(b.hard_cash_to_close, dec!(10000));
        assert_eq!(b.hard_closing_costs, dec!(6250));
        assert_eq!(b.hard_cash_out_of_pocket, dec!(21250));
    }

    #[test]
    fn test_return_percentages() {
        let out = compute_evaluation_metrics(&sample_inputs()).unwrap();
        let roe = out.return_on_equity_capture.unwrap();
        let coc = out.cash_on_cash_return.unwrap();
        assert_eq!(roe, out.annual_cash_flow / dec!(75000) * dec!(100));
        assert_eq!(coc, out.annual_cash_flow / dec!(21250) * dec!(100));
        assert_eq!(to_cents(roe), dec!(8.67));
        assert_eq!(to_cents(coc), dec!(30.62));
    }

    #[test]
    fn test_idempotent() {
        let inputs = sample_inputs();
        let a = compute_evaluation_metrics(&inputs).unwrap();
        let b = compute_evaluation_metrics(&inputs).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_equity_capture_yields_none() {
        let mut inputs = sample_inputs();
        inputs.estimated_sale_price = dec!(225000);
        let out = evaluate(&inputs).unwrap();
        assert_eq!(out.result.outputs.equity_capture, Decimal::ZERO);
        assert!(out.result.outputs.return_on_equity_capture.is_none());
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("Return on equity capture is undefined")));
    }

    #[test]
    fn test_zero_cash_out_of_pocket_yields_none() {
        let mut inputs = sample_inputs();
        // Hard loan covers everything: 0.8 * 300000 = 240000 = 180000 + 40000 + 20000
        inputs.hard_loan_to_value_percent = dec!(80);
        inputs.hard_first_phase_costs = dec!(13750);
        let out = compute_evaluation_metrics(&inputs).unwrap();
        assert!(out.cash_on_cash_return.is_none());
        assert!(out.return_on_equity_capture.is_some());
    }

    #[test]
    fn test_negative_cash_flow_propagates() {
        let mut inputs = sample_inputs();
        inputs.rent_monthly = dec!(1000);
        let out = evaluate(&inputs).unwrap();
        let outputs = &out.result.outputs;
        assert!(outputs.annual_cash_flow < Decimal::ZERO);
        assert!(outputs.return_on_equity_capture.unwrap() < Decimal::ZERO);
        assert!(outputs.cash_on_cash_return.unwrap() < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("negative")));
    }

    #[test]
    fn test_negative_equity_capture_warns() {
        let mut inputs = sample_inputs();
        inputs.purchase_price = dec!(280000);
        let out = evaluate(&inputs).unwrap();
        assert!(out.result.outputs.equity_capture < Decimal::ZERO);
        assert!(out.result.outputs.return_on_equity_capture.is_some());
        assert!(out.warnings.iter().any(|w| w.contains("negative equity capture")));
    }

    #[test]
    fn test_zero_interest_refinance() {
        let mut inputs = sample_inputs();
        inputs.refi_interest_rate_percent_annual = Decimal::ZERO;
        let out = evaluate(&inputs).unwrap();
        assert_eq!(out.result.breakdown.note_payment, dec!(225000) / dec!(360));
    }

    #[test]
    fn test_invalid_term_rejected() {
        let mut inputs = sample_inputs();
        inputs.refi_loan_term_years = 0;
        let err = compute_evaluation_metrics(&inputs).unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput { .. }));
    }

    #[test]
    fn test_rounded_outputs() {
        let out = compute_evaluation_metrics(&sample_inputs()).unwrap().rounded_to_cents();
        assert_eq!(out.annual_cash_flow, dec!(6505.82));
        assert_eq!(out.equity_capture, dec!(75000));
    }

    #[test]
    fn test_methodology_string() {
        let out = evaluate(&sample_inputs()).unwrap();
        assert!(out.methodology.contains("Fix-and-Refinance"));
    }

    #[test]
    fn test_largest_accepted_deal_stays_in_range() {
        let mut inputs = sample_inputs();
        for field in EvaluationField::ALL {
            if field == EvaluationField::RefiLoanTermYears {
                continue;
            }
            let value = if field.is_percent() { dec!(100) } else { MAX_AMOUNT };
            inputs.set(field, value).unwrap();
        }
        inputs.refi_loan_term_years = 50;

        let out = compute_evaluation_metrics(&inputs).unwrap();
        assert_eq!(out.equity_capture, dec!(-3000000000000));
        assert!(out.annual_cash_flow < Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_amount_is_an_error() {
        let mut inputs = sample_inputs();
        inputs.rent_monthly = dec!(10000000000000000000000000000);
        assert!(compute_evaluation_metrics(&inputs).is_err());
        assert!(evaluate(&inputs).is_err());
    }

    #[test]
    fn test_vanishing_equity_overflows_the_ratio() {
        let inputs = tiny_equity_inputs();
        let err = compute_evaluation_metrics(&inputs).unwrap_err();
        assert!(
            matches!(err, EvalError::Overflow { ref context } if context == "Return on equity capture"),
            "unexpected error: {err:?}"
        );
    }

    /// Equity capture of 1e-28 against a positive cash flow.
    fn tiny_equity_inputs() -> EvaluationInputs {
        EvaluationInputs {
            estimated_sale_price: dec!(1.0000000000000000000000000001),
            purchase_price: dec!(1),
            rent_monthly: dec!(1000000),
            refi_loan_term_years: 30,
            ..Default::default()
        }
    }
}
