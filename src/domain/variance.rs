//! Variance of a current amount against its baseline, in percent.

use rust_decimal::Decimal;

use crate::domain::error::{DomainError, DomainResult};

/// Signed percentage deviation of `current` from `baseline`.
///
/// `(current - baseline) / baseline * 100`, computed in decimal fixed point.
/// A zero baseline has no defined variance and yields `DivisionByZero`;
/// the caller decides whether to surface or record that.
pub fn variance(current: Decimal, baseline: Decimal) -> DomainResult<Decimal> {
    if baseline.is_zero() {
        return Err(DomainError::DivisionByZero(String::new()));
    }
    current
        .checked_sub(baseline)
        .and_then(|delta| delta.checked_div(baseline))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| DomainError::ArithmeticOverflow(String::new()))
}

/// Variance for a named node, with the node id attached to any error.
pub fn node_variance(id: &str, current: Decimal, baseline: Decimal) -> DomainResult<Decimal> {
    variance(current, baseline).map_err(|e| match e {
        DomainError::DivisionByZero(_) => DomainError::DivisionByZero(id.to_string()),
        DomainError::ArithmeticOverflow(_) => DomainError::ArithmeticOverflow(id.to_string()),
        other => other,
    })
}
