//! Multi-phase intrinsic P/E model.
//!
//! A tax-adjusted return-on-capital base is grown through a high-growth
//! phase and a linear fade phase, followed by a Gordon-growth terminal
//! value. The present value of that earnings stream divided by the base is
//! the intrinsic (fair) P/E multiple.
//!
//! The fade phase compounds each year's interpolated rate over the
//! *absolute* year index, not the number of years since the fade began.
//! This produces a step at the phase boundary and is kept deliberately so
//! results match the established model output.
//!
//! All arithmetic uses `rust_decimal::Decimal` with checked operations; an
//! overflow is reported as an undefined result rather than a panic.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::types::{with_metadata, ComputationOutput, Multiple, Rate};
use crate::ValuationResult;

use super::params::{ParameterBounds, ValuationParameters};

/// Longest explicit projection (high growth + fade) the model will schedule.
pub const MAX_HORIZON_YEARS: u32 = 10_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Phase of the earnings projection a year belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPhase {
    HighGrowth,
    Fade,
}

/// One projected year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearProjection {
    /// Absolute year index (1-based)
    pub year: u32,
    pub phase: GrowthPhase,
    /// Growth rate compounded over `year` periods to reach this year's earnings
    pub growth_rate: Rate,
    /// adjusted_base * (1 + growth_rate)^year
    pub earnings: Decimal,
    /// 1 / (1 + cost_of_capital)^year
    pub discount_factor: Decimal,
    /// earnings / (1 + cost_of_capital)^year
    pub pv: Decimal,
}

/// Full output of the intrinsic P/E model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrinsicPeOutput {
    /// roce * (1 - tax_rate)
    pub adjusted_base: Decimal,
    pub projections: Vec<YearProjection>,
    /// Sum of PVs in the high-growth phase
    pub pv_high_growth: Decimal,
    /// Sum of PVs in the fade phase
    pub pv_fade: Decimal,
    /// Undiscounted Gordon-growth terminal value
    pub terminal_value: Decimal,
    /// Terminal value discounted over the whole explicit horizon
    pub pv_terminal: Decimal,
    /// pv_terminal as a fraction of intrinsic_value
    pub terminal_value_pct: Rate,
    /// Present value of all future earnings
    pub intrinsic_value: Decimal,
    /// intrinsic_value / adjusted_base before rounding
    pub intrinsic_pe_unrounded: Multiple,
    /// intrinsic_value / adjusted_base, 2dp half-even
    pub intrinsic_pe: Multiple,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Intrinsic P/E for the given assumptions, rounded to 2dp (half-even).
pub fn compute_intrinsic_pe(params: &ValuationParameters) -> ValuationResult<Multiple> {
    Ok(build_intrinsic_pe_model(params)?.intrinsic_pe)
}

/// Run the model and keep the year-by-year schedule.
pub fn build_intrinsic_pe_model(params: &ValuationParameters) -> ValuationResult<IntrinsicPeOutput> {
    let adjusted_base = checked(
        Decimal::ONE
            .checked_sub(params.tax_rate)
            .and_then(|kept| params.roce.checked_mul(kept)),
        "adjusted base",
    )?;
    check_preconditions(params, adjusted_base)?;

    let one_plus_coc = checked(
        Decimal::ONE.checked_add(params.cost_of_capital),
        "discount base",
    )?;
    let high = params.high_growth_years;
    let fade = params.fade_years;

    let horizon = high
        .checked_add(fade)
        .filter(|h| *h <= MAX_HORIZON_YEARS)
        .ok_or_else(|| ValuationError::InvalidInput {
            field: "high_growth_years + fade_years".into(),
            reason: format!(
                "projection horizon of {high} + {fade} years exceeds {MAX_HORIZON_YEARS}"
            ),
        })?;

    let mut projections = Vec::with_capacity(horizon as usize);
    let mut intrinsic_value = Decimal::ZERO;
    let mut pv_high_growth = Decimal::ZERO;
    let mut pv_fade = Decimal::ZERO;

    for year in 1..=high {
        let projection = project_year(
            adjusted_base,
            params.growth_rate,
            one_plus_coc,
            year,
            GrowthPhase::HighGrowth,
        )?;
        intrinsic_value = add(intrinsic_value, projection.pv)?;
        pv_high_growth = add(pv_high_growth, projection.pv)?;
        projections.push(projection);
    }

    // An empty fade phase never reaches the interpolation, so `fade` is
    // non-zero whenever it is used as a divisor.
    for year in (high + 1)..=horizon {
        let rate = fade_growth_rate(params, year, high, fade)?;
        let projection = project_year(adjusted_base, rate, one_plus_coc, year, GrowthPhase::Fade)?;
        intrinsic_value = add(intrinsic_value, projection.pv)?;
        pv_fade = add(pv_fade, projection.pv)?;
        projections.push(projection);
    }

    let spread = checked(
        params.cost_of_capital.checked_sub(params.terminal_growth_rate),
        "terminal spread",
    )?;
    let terminal_value = checked(
        Decimal::ONE
            .checked_add(params.terminal_growth_rate)
            .and_then(|g| adjusted_base.checked_mul(g))
            .and_then(|v| v.checked_div(spread)),
        "terminal value",
    )?;
    let horizon_compounding = powi(one_plus_coc, horizon, "terminal discounting")?;
    let pv_terminal = checked(
        terminal_value.checked_div(horizon_compounding),
        "terminal value discounting",
    )?;
    intrinsic_value = add(intrinsic_value, pv_terminal)?;

    let intrinsic_pe_unrounded = checked(
        intrinsic_value.checked_div(adjusted_base),
        "intrinsic P/E",
    )?;
    let intrinsic_pe = intrinsic_pe_unrounded.round_dp(2);

    let terminal_value_pct = if intrinsic_value.is_zero() {
        Decimal::ZERO
    } else {
        checked(pv_terminal.checked_div(intrinsic_value), "terminal share")?
    };

    tracing::debug!(
        %adjusted_base,
        %pv_high_growth,
        %pv_fade,
        %terminal_value,
        %pv_terminal,
        horizon,
        %intrinsic_pe,
        "intrinsic P/E model evaluated"
    );

    Ok(IntrinsicPeOutput {
        adjusted_base,
        projections,
        pv_high_growth,
        pv_fade,
        terminal_value,
        pv_terminal,
        terminal_value_pct,
        intrinsic_value,
        intrinsic_pe_unrounded,
        intrinsic_pe,
    })
}

/// Model output wrapped in the standard envelope, with range warnings.
pub fn calculate_intrinsic_pe(
    params: &ValuationParameters,
) -> ValuationResult<ComputationOutput<IntrinsicPeOutput>> {
    let start = Instant::now();
    params.validate()?;

    let mut warnings = ParameterBounds::recommended().check(params);
    let output = build_intrinsic_pe_model(params)?;

    if output.terminal_value_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of intrinsic value; the result is dominated by the perpetuity assumption",
            output.terminal_value_pct * dec!(100)
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Multi-phase intrinsic P/E (high growth, linear fade, Gordon terminal)",
        params,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_preconditions(params: &ValuationParameters, adjusted_base: Decimal) -> ValuationResult<()> {
    if adjusted_base.is_zero() {
        return Err(ValuationError::undefined(
            "tax-adjusted return on capital is zero; intrinsic P/E has no base",
        ));
    }
    if params.cost_of_capital <= params.terminal_growth_rate {
        return Err(ValuationError::undefined(format!(
            "cost of capital ({}) must exceed terminal growth rate ({}) for a finite terminal value",
            params.cost_of_capital, params.terminal_growth_rate
        )));
    }
    if params.cost_of_capital <= Decimal::NEGATIVE_ONE {
        return Err(ValuationError::undefined(format!(
            "cost of capital ({}) must be above -100% to discount",
            params.cost_of_capital
        )));
    }
    Ok(())
}

/// growth - (growth - terminal) * (year - high) / fade
fn fade_growth_rate(
    params: &ValuationParameters,
    year: u32,
    high: u32,
    fade: u32,
) -> ValuationResult<Rate> {
    let step = Decimal::from(year - high);
    checked(
        params
            .growth_rate
            .checked_sub(params.terminal_growth_rate)
            .and_then(|gap| gap.checked_mul(step))
            .and_then(|v| v.checked_div(Decimal::from(fade)))
            .and_then(|drop| params.growth_rate.checked_sub(drop)),
        "fade interpolation",
    )
}

fn project_year(
    adjusted_base: Decimal,
    growth_rate: Rate,
    one_plus_coc: Decimal,
    year: u32,
    phase: GrowthPhase,
) -> ValuationResult<YearProjection> {
    let one_plus_growth = checked(Decimal::ONE.checked_add(growth_rate), "growth base")?;
    let growth_factor = powi(one_plus_growth, year, "earnings growth")?;
    let earnings = checked(adjusted_base.checked_mul(growth_factor), "earnings")?;
    let compounding = powi(one_plus_coc, year, "discounting")?;
    let pv = checked(earnings.checked_div(compounding), "present value")?;
    let discount_factor = checked(Decimal::ONE.checked_div(compounding), "discount factor")?;

    Ok(YearProjection {
        year,
        phase,
        growth_rate,
        earnings,
        discount_factor,
        pv,
    })
}

/// Checked integer power (square-and-multiply).
fn powi(base: Decimal, n: u32, context: &str) -> ValuationResult<Decimal> {
    checked(base.checked_powu(u64::from(n)), context)
}

fn add(a: Decimal, b: Decimal) -> ValuationResult<Decimal> {
    checked(a.checked_add(b), "accumulation")
}

fn checked(value: Option<Decimal>, context: &str) -> ValuationResult<Decimal> {
    value.ok_or_else(|| ValuationError::undefined(format!("{context} overflowed or divided by zero")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn reference_params() -> ValuationParameters {
        ValuationParameters {
            cost_of_capital: dec!(0.12),
            roce: dec!(0.20),
            growth_rate: dec!(0.12),
            high_growth_years: 15,
            fade_years: 15,
            terminal_growth_rate: dec!(0.05),
            tax_rate: dec!(0.25),
        }
    }

    #[test]
    fn test_reference_scenario() {
        assert_eq!(compute_intrinsic_pe(&reference_params()).unwrap(), dec!(22.87));
    }

    #[test]
    fn test_reference_scenario_unrounded() {
        let out = build_intrinsic_pe_model(&reference_params()).unwrap();
        assert!((out.intrinsic_pe_unrounded - dec!(22.871190545985613925510022)).abs() < dec!(0.000000001));
        assert_eq!(out.adjusted_base, dec!(0.15));
        assert_eq!(out.projections.len(), 30);
    }

    #[test]
    fn test_no_explicit_phases_is_gordon_multiple() {
        // (1 + 0.05) / (0.12 - 0.05) = 15
        let params = ValuationParameters {
            high_growth_years: 0,
            fade_years: 0,
            ..reference_params()
        };
        assert_eq!(compute_intrinsic_pe(&params).unwrap(), dec!(15.00));
    }

    #[test]
    fn test_zero_fade_years_skips_fade_phase() {
        let params = ValuationParameters {
            fade_years: 0,
            ..reference_params()
        };
        let out = build_intrinsic_pe_model(&params).unwrap();
        assert_eq!(out.intrinsic_pe, dec!(17.74));
        assert_eq!(out.pv_fade, Decimal::ZERO);
        assert!(out.projections.iter().all(|p| p.phase == GrowthPhase::HighGrowth));
    }

    #[test]
    fn test_high_growth_year_values() {
        let out = build_intrinsic_pe_model(&reference_params()).unwrap();
        let y1 = &out.projections[0];
        // 0.15 * 1.12 = 0.168, discounted by 1.12 gives back 0.15
        assert_eq!(y1.earnings, dec!(0.168));
        assert_eq!(y1.pv, dec!(0.15));
        assert_eq!(y1.phase, GrowthPhase::HighGrowth);
    }

    #[test]
    fn test_fade_uses_absolute_year_exponent() {
        let out = build_intrinsic_pe_model(&reference_params()).unwrap();
        let first_fade = &out.projections[15];
        assert_eq!(first_fade.year, 16);
        assert_eq!(first_fade.phase, GrowthPhase::Fade);
        // 0.12 - (0.12 - 0.05) * 1 / 15
        let expected_rate = dec!(0.12) - dec!(0.07) / dec!(15);
        assert_eq!(first_fade.growth_rate, expected_rate);
        let expected_earnings = out.adjusted_base * powi(Decimal::ONE + expected_rate, 16, "t").unwrap();
        assert_eq!(first_fade.earnings, expected_earnings);
        // Last fade year lands exactly on the terminal rate
        assert_eq!(out.projections[29].growth_rate, dec!(0.05));
    }

    #[test]
    fn test_equal_cost_of_capital_and_terminal_growth_is_undefined() {
        let params = ValuationParameters {
            cost_of_capital: dec!(0.05),
            ..reference_params()
        };
        let err = compute_intrinsic_pe(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_terminal_growth_above_cost_of_capital_is_undefined() {
        let params = ValuationParameters {
            terminal_growth_rate: dec!(0.15),
            ..reference_params()
        };
        assert!(compute_intrinsic_pe(&params).is_err());
    }

    #[test]
    fn test_zero_roce_is_undefined() {
        let params = ValuationParameters {
            roce: Decimal::ZERO,
            ..reference_params()
        };
        let err = compute_intrinsic_pe(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_negative_growth_fade() {
        let params = ValuationParameters {
            growth_rate: dec!(-0.05),
            terminal_growth_rate: dec!(0.02),
            ..reference_params()
        };
        let pe = compute_intrinsic_pe(&params).unwrap();
        assert!(pe > Decimal::ZERO);
        assert!(pe < compute_intrinsic_pe(&reference_params()).unwrap());
    }

    #[test]
    fn test_overflow_is_reported_not_panicking() {
        let params = ValuationParameters {
            growth_rate: dec!(50),
            high_growth_years: 200,
            ..reference_params()
        };
        let err = compute_intrinsic_pe(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_extreme_parameters_are_undefined_not_panicking() {
        let huge_cost = ValuationParameters {
            cost_of_capital: Decimal::MAX,
            terminal_growth_rate: dec!(-1),
            ..reference_params()
        };
        assert_eq!(compute_intrinsic_pe(&huge_cost).unwrap_err().kind(), ErrorKind::Undefined);

        let huge_tax = ValuationParameters {
            tax_rate: Decimal::MIN,
            ..reference_params()
        };
        assert_eq!(compute_intrinsic_pe(&huge_tax).unwrap_err().kind(), ErrorKind::Undefined);

        let huge_growth = ValuationParameters {
            growth_rate: Decimal::MAX,
            ..reference_params()
        };
        assert_eq!(compute_intrinsic_pe(&huge_growth).unwrap_err().kind(), ErrorKind::Undefined);

        let deep_terminal = ValuationParameters {
            growth_rate: Decimal::MAX,
            terminal_growth_rate: Decimal::MIN,
            high_growth_years: 0,
            ..reference_params()
        };
        assert_eq!(compute_intrinsic_pe(&deep_terminal).unwrap_err().kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_cost_of_capital_at_minus_one_is_undefined() {
        let params = ValuationParameters {
            cost_of_capital: dec!(-1),
            terminal_growth_rate: dec!(-2),
            ..reference_params()
        };
        assert_eq!(compute_intrinsic_pe(&params).unwrap_err().kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_horizon_beyond_cap_is_rejected() {
        let params = ValuationParameters {
            high_growth_years: u32::MAX,
            ..reference_params()
        };
        assert_eq!(compute_intrinsic_pe(&params).unwrap_err().kind(), ErrorKind::Invalid);

        let params = ValuationParameters {
            high_growth_years: MAX_HORIZON_YEARS,
            fade_years: 1,
            ..reference_params()
        };
        assert_eq!(compute_intrinsic_pe(&params).unwrap_err().kind(), ErrorKind::Invalid);
    }

    #[test]
    fn test_long_flat_horizon_completes() {
        // Nothing compounds, so nothing overflows over the full horizon
        let params = ValuationParameters {
            cost_of_capital: Decimal::ZERO,
            growth_rate: Decimal::ZERO,
            terminal_growth_rate: dec!(-0.5),
            high_growth_years: MAX_HORIZON_YEARS,
            fade_years: 0,
            ..reference_params()
        };
        let out = build_intrinsic_pe_model(&params).unwrap();
        assert_eq!(out.projections.len(), MAX_HORIZON_YEARS as usize);
        // 10_000 years at 1x, plus terminal 0.5 / 0.5 = 1
        assert_eq!(out.intrinsic_pe, dec!(10001.00));
    }

    #[test]
    fn test_deterministic() {
        let p = reference_params();
        assert_eq!(
            compute_intrinsic_pe(&p).unwrap(),
            compute_intrinsic_pe(&p).unwrap()
        );
    }

    #[test]
    fn test_calculate_envelope_warns_on_terminal_dominance() {
        let params = ValuationParameters {
            high_growth_years: 0,
            fade_years: 0,
            ..reference_params()
        };
        let out = calculate_intrinsic_pe(&params).unwrap();
        assert_eq!(out.result.terminal_value_pct, Decimal::ONE);
        assert!(out.warnings.iter().any(|w| w.contains("Terminal value")));
        // Years outside the recommended ranges are flagged too
        assert!(out.warnings.iter().any(|w| w.starts_with("high_growth_years")));
    }

    #[test]
    fn test_calculate_rejects_invalid_tax_rate() {
        let params = ValuationParameters {
            tax_rate: dec!(1.5),
            ..reference_params()
        };
        let err = calculate_intrinsic_pe(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }
}
