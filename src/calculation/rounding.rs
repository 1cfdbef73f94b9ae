//! Currency truncation.
//!
//! Every computed amount is truncated toward zero to the smallest currency
//! unit as soon as it is computed, never after summation. Totals can
//! therefore differ by a unit or two from a sum-then-round approach.
//!
//! Products and sums of employee-supplied figures go through the checked
//! helpers here, so an out-of-range wage or hour count fails that one line
//! instead of overflowing.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};

/// Truncates `amount` toward zero to `scale` decimal places.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::truncate_to_unit;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let amount = Decimal::from_str("112500.999").unwrap();
/// assert_eq!(truncate_to_unit(amount, 0), Decimal::from(112_500));
///
/// let refund = Decimal::from_str("-10.75").unwrap();
/// assert_eq!(truncate_to_unit(refund, 1), Decimal::from_str("-10.7").unwrap());
/// ```
pub fn truncate_to_unit(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::ToZero)
}

/// Multiplies `factors` left to right, failing with a
/// [`EngineError::CalculationError`] naming `what` on overflow.
pub(crate) fn checked_product(what: &str, factors: &[Decimal]) -> EngineResult<Decimal> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, factor| acc.checked_mul(*factor))
        .ok_or_else(|| overflow(what))
}

/// Sums `terms`, failing with a [`EngineError::CalculationError`] naming
/// `what` on overflow.
pub(crate) fn checked_sum(
    what: &str,
    terms: impl IntoIterator<Item = Decimal>,
) -> EngineResult<Decimal> {
    terms
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, term| acc.checked_add(term))
        .ok_or_else(|| overflow(what))
}

fn overflow(what: &str) -> EngineError {
    EngineError::CalculationError {
        message: format!("{} is out of range", what),
    }
}
