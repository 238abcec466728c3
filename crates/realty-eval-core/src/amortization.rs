use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::arith;
use crate::error::EvalError;
use crate::types::{Money, Percent, Rate};
use crate::EvalResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Longest accepted loan term (50 years).
pub const MAX_TERM_MONTHS: u32 = 600;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of a fixed-rate amortisation schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

/// Totals over a full schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSummary {
    pub scheduled_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub rows: Vec<AmortizationRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert an annual percentage rate (5 = 5%) to a monthly decimal fraction.
pub fn monthly_rate_from_annual_percent(annual_percent: Percent) -> Rate {
    annual_percent / dec!(100) / MONTHS_PER_YEAR
}

/// Fixed-rate amortised payment: `P * r(1+r)^n / ((1+r)^n - 1)`.
///
/// A zero rate degenerates to straight-line repayment, `P / n`. No rounding is
/// applied; callers round at the point of persistence.
pub fn compute_amortized_payment(
    term_months: u32,
    monthly_rate: Rate,
    principal: Money,
) -> EvalResult<Money> {
    validate_loan(term_months, monthly_rate, principal)?;

    if monthly_rate.is_zero() {
        return arith::div(principal, Decimal::from(term_months), "amortised payment");
    }

    let growth = compound_factor(monthly_rate, term_months)?;
    let denominator = growth - Decimal::ONE;

    if denominator.is_zero() {
        return Err(EvalError::DivisionByZero {
            context: "amortised payment denominator".into(),
        });
    }

    // P * r scaled by the annuity factor g / (g - 1)
    let annuity = arith::div(growth, denominator, "amortised payment")?;
    let interest = arith::mul(principal, monthly_rate, "amortised payment")?;
    arith::mul(interest, annuity, "amortised payment")
}

/// Outstanding balance after `payments_made` scheduled payments.
pub fn remaining_balance(
    principal: Money,
    monthly_rate: Rate,
    term_months: u32,
    payments_made: u32,
) -> EvalResult<Money> {
    validate_loan(term_months, monthly_rate, principal)?;

    if payments_made > term_months {
        return Err(EvalError::invalid(
            "payments_made",
            format!("Cannot exceed the loan term of {term_months} months"),
        ));
    }

    let context = "remaining balance";
    let balance = if monthly_rate.is_zero() {
        let repaid_share = Decimal::from(payments_made) / Decimal::from(term_months);
        principal - arith::mul(principal, repaid_share, context)?
    } else {
        let payment = compute_amortized_payment(term_months, monthly_rate, principal)?;
        let growth = compound_factor(monthly_rate, payments_made)?;
        let accrued = arith::mul(principal, growth, context)?;
        let annuity_factor = arith::div(growth - Decimal::ONE, monthly_rate, context)?;
        let repaid = arith::mul(payment, annuity_factor, context)?;
        arith::sub(accrued, repaid, context)?
    };

    Ok(balance.max(Decimal::ZERO))
}

/// Month-by-month schedule with cent-rounded rows.
///
/// The last row absorbs residual rounding so the closing balance is exactly zero.
pub fn amortization_schedule(
    principal: Money,
    monthly_rate: Rate,
    term_months: u32,
) -> EvalResult<AmortizationSummary> {
    let scheduled_payment = to_cents(compute_amortized_payment(
        term_months,
        monthly_rate,
        principal,
    )?);

    let context = "amortisation schedule";
    let mut rows = Vec::with_capacity(term_months as usize);
    let mut balance = principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;

    for month in 1..=term_months {
        let interest = to_cents(arith::mul(balance, monthly_rate, context)?);
        let mut principal_part = arith::sub(scheduled_payment, interest, context)?;
        if month == term_months || principal_part > balance {
            principal_part = balance;
        }
        balance -= principal_part;
        total_interest = arith::add(total_interest, interest, context)?;
        total_principal = arith::add(total_principal, principal_part, context)?;

        rows.push(AmortizationRow {
            month,
            payment: arith::add(interest, principal_part, context)?,
            interest,
            principal: principal_part,
            balance,
        });

        if balance.is_zero() {
            break;
        }
    }

    Ok(AmortizationSummary {
        scheduled_payment,
        total_paid: arith::add(total_interest, total_principal, context)?,
        total_interest,
        total_principal,
        rows,
    })
}

/// Round half away from zero to whole cents.
pub fn to_cents(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_loan(term_months: u32, monthly_rate: Rate, principal: Money) -> EvalResult<()> {
    if term_months == 0 {
        return Err(EvalError::invalid(
            "term_months",
            "Loan term must be at least one month",
        ));
    }
    if term_months > MAX_TERM_MONTHS {
        return Err(EvalError::invalid(
            "term_months",
            format!("Loan term cannot exceed {MAX_TERM_MONTHS} months"),
        ));
    }
    if monthly_rate < Decimal::ZERO {
        return Err(EvalError::invalid(
            "monthly_rate",
            "Interest rate cannot be negative",
        ));
    }
    if principal < Decimal::ZERO {
        return Err(EvalError::invalid(
            "principal",
            "Loan principal cannot be negative",
        ));
    }
    Ok(())
}

/// `(1 + r)^n`
fn compound_factor(monthly_rate: Rate, months: u32) -> EvalResult<Decimal> {
    (Decimal::ONE + monthly_rate)
        .checked_powu(u64::from(months))
        .ok_or_else(|| arith::overflow("compound growth"))
}
