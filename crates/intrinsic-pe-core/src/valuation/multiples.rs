use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::{Amount, Multiple, Rate};
use crate::ValuationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Direction of the gap between the market multiple and the intrinsic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationVerdict {
    Overvalued,
    FairlyValued,
    Undervalued,
}

impl ValuationVerdict {
    pub fn from_overvaluation(fraction: Rate) -> Self {
        if fraction > Decimal::ZERO {
            ValuationVerdict::Overvalued
        } else if fraction < Decimal::ZERO {
            ValuationVerdict::Undervalued
        } else {
            ValuationVerdict::FairlyValued
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Market capitalisation over full-year net profit, 2dp half-even.
///
/// A loss-making company yields a negative P/E, which is returned as is.
pub fn compute_fy_pe(market_cap: Amount, net_profit: Amount) -> ValuationResult<Multiple> {
    if net_profit == 0 {
        return Err(ValuationError::undefined(
            "net profit is zero; FY P/E is undefined",
        ));
    }
    let pe = Decimal::from(market_cap) / Decimal::from(net_profit);
    Ok(pe.round_dp(2))
}

/// Degree of over-valuation as a fraction: lower market P/E over intrinsic P/E, minus one.
///
/// The lower of the quoted and full-year multiples is used so that a stale
/// profit figure or a stale quote does not overstate the gap.
pub fn compute_overvaluation(
    current_pe: Multiple,
    fy_pe: Multiple,
    intrinsic_pe: Multiple,
) -> ValuationResult<Rate> {
    if intrinsic_pe.is_zero() {
        return Err(ValuationError::undefined(
            "intrinsic P/E is zero; over-valuation is undefined",
        ));
    }
    let comparison = current_pe.min(fy_pe);
    comparison
        .checked_div(intrinsic_pe)
        .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
        .ok_or_else(|| {
            ValuationError::undefined(format!(
                "over-valuation of {comparison} against {intrinsic_pe} overflowed"
            ))
        })
}

/// Display form of an over-valuation fraction: rounded to 2dp, then scaled to percent.
pub fn overvaluation_pct(fraction: Rate) -> ValuationResult<Decimal> {
    fraction
        .round_dp(2)
        .checked_mul(dec!(100))
        .ok_or_else(|| ValuationError::undefined("over-valuation percentage overflowed"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_fy_pe_basic() {
        assert_eq!(compute_fy_pe(1000, 100).unwrap(), dec!(10.00));
    }

    #[test]
    fn test_fy_pe_rounds_half_even() {
        // 1 / 8 = 0.125 -> 0.12 under banker's rounding
        assert_eq!(compute_fy_pe(1, 8).unwrap(), dec!(0.12));
        // 3 / 8 = 0.375 -> 0.38
        assert_eq!(compute_fy_pe(3, 8).unwrap(), dec!(0.38));
        assert_eq!(compute_fy_pe(100_000, 3).unwrap(), dec!(33333.33));
    }

    #[test]
    fn test_fy_pe_zero_profit_is_undefined() {
        for market_cap in [0, 1, -5, 1_000_000] {
            let err = compute_fy_pe(market_cap, 0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Undefined);
        }
    }

    #[test]
    fn test_fy_pe_loss_maker_is_negative() {
        assert_eq!(compute_fy_pe(5000, -250).unwrap(), dec!(-20.00));
    }

    #[test]
    fn test_overvaluation_uses_lower_multiple() {
        assert_eq!(
            compute_overvaluation(dec!(15), dec!(12), dec!(10)).unwrap(),
            dec!(0.2)
        );
        assert_eq!(
            compute_overvaluation(dec!(12), dec!(15), dec!(10)).unwrap(),
            dec!(0.2)
        );
    }

    #[test]
    fn test_undervaluation_is_negative() {
        let v = compute_overvaluation(dec!(20), dec!(18), dec!(24)).unwrap();
        assert_eq!(v, dec!(-0.25));
        assert_eq!(ValuationVerdict::from_overvaluation(v), ValuationVerdict::Undervalued);
    }

    #[test]
    fn test_overvaluation_zero_intrinsic_is_undefined() {
        let err = compute_overvaluation(dec!(15), dec!(12), Decimal::ZERO).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_overvaluation_pct_rounds_before_scaling() {
        assert_eq!(overvaluation_pct(dec!(0.2049)).unwrap(), dec!(20));
        assert_eq!(overvaluation_pct(dec!(-0.256)).unwrap(), dec!(-26));
    }

    #[test]
    fn test_overvaluation_overflow_is_undefined() {
        let err = compute_overvaluation(Decimal::MAX, Decimal::MAX, dec!(0.5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Undefined);

        let err = compute_overvaluation(Decimal::MIN, Decimal::MAX, dec!(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_overvaluation_pct_overflow_is_undefined() {
        let err = overvaluation_pct(Decimal::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_verdict() {
        assert_eq!(
            ValuationVerdict::from_overvaluation(dec!(0.01)),
            ValuationVerdict::Overvalued
        );
        assert_eq!(
            ValuationVerdict::from_overvaluation(Decimal::ZERO),
            ValuationVerdict::FairlyValued
        );
    }
}
