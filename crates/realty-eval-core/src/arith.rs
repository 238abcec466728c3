//! Overflow-checked decimal arithmetic.
//!
//! `Decimal`'s operators panic when a result leaves the 96-bit mantissa range.
//! Model code goes through these helpers so that an out-of-range deal comes
//! back as `EvalError::Overflow` naming the quantity being computed.

use rust_decimal::Decimal;

use crate::error::EvalError;
use crate::EvalResult;

pub(crate) fn mul(a: Decimal, b: Decimal, context: &str) -> EvalResult<Decimal> {
    match a.checked_mul(b) {
        Some(v) => Ok(v),
        None => Err(overflow(context)),
    }
}

pub(crate) fn div(a: Decimal, b: Decimal, context: &str) -> EvalResult<Decimal> {
    if b.is_zero() {
        return Err(EvalError::DivisionByZero {
            context: context.to_string(),
        });
    }
    match a.checked_div(b) {
        Some(v) => Ok(v),
        None => Err(overflow(context)),
    }
}

pub(crate) fn add(a: Decimal, b: Decimal, context: &str) -> EvalResult<Decimal> {
    match a.checked_add(b) {
        Some(v) => Ok(v),
        None => Err(overflow(context)),
    }
}

pub(crate) fn sub(a: Decimal, b: Decimal, context: &str) -> EvalResult<Decimal> {
    match a.checked_sub(b) {
        Some(v) => Ok(v),
        None => Err(overflow(context)),
    }
}

/// Sum of `terms`, failing on the first partial sum that overflows.
pub(crate) fn sum(terms: &[Decimal], context: &str) -> EvalResult<Decimal> {
    terms
        .iter()
        .try_fold(Decimal::ZERO, |acc, term| add(acc, *term, context))
}

pub(crate) fn overflow(context: &str) -> EvalError {
    EvalError::Overflow {
        context: context.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_in_range_values_pass_through() {
        assert_eq!(mul(dec!(1.5), dec!(4), "x").unwrap(), dec!(6.0));
        assert_eq!(div(dec!(9), dec!(3), "x").unwrap(), dec!(3));
        assert_eq!(sub(dec!(1), dec!(3), "x").unwrap(), dec!(-2));
        assert_eq!(sum(&[dec!(1), dec!(2), dec!(3)], "x").unwrap(), dec!(6));
    }

    #[test]
    fn test_overflow_names_context() {
        match mul(Decimal::MAX, dec!(2), "loan amount") {
            Err(EvalError::Overflow { context }) => assert_eq!(context, "loan amount"),
            other => panic!("expected overflow, got {other:?}"),
        }
        assert!(matches!(
            add(Decimal::MAX, Decimal::ONE, "x"),
            Err(EvalError::Overflow { .. })
        ));
        assert!(matches!(
            sub(Decimal::MIN, Decimal::ONE, "x"),
            Err(EvalError::Overflow { .. })
        ));
        assert!(matches!(
            sum(&[Decimal::MAX, Decimal::MAX], "x"),
            Err(EvalError::Overflow { .. })
        ));
    }

    #[test]
    fn test_division_by_zero_is_reported() {
        assert!(matches!(
            div(dec!(1), Decimal::ZERO, "ratio"),
            Err(EvalError::DivisionByZero { .. })
        ));
        assert!(matches!(
            div(Decimal::MAX, dec!(0.5), "x"),
            Err(EvalError::Overflow { .. })
        ));
    }
}
