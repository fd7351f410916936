use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::Rate;
use crate::ValuationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Assumptions driving the multi-phase intrinsic P/E model.
///
/// All rates are fractions (0.12 = 12%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationParameters {
    /// Discount rate applied to every future year
    pub cost_of_capital: Rate,
    /// Return on capital employed, the base earnings yield
    pub roce: Rate,
    /// Growth rate during the high-growth phase
    pub growth_rate: Rate,
    /// Length of the high-growth phase in years
    pub high_growth_years: u32,
    /// Length of the fade phase in years
    pub fade_years: u32,
    /// Perpetual growth rate after the fade phase
    pub terminal_growth_rate: Rate,
    /// Tax rate applied once to the base, in [0, 1)
    pub tax_rate: Rate,
}

impl Default for ValuationParameters {
    fn default() -> Self {
        Self {
            cost_of_capital: dec!(0.12),
            roce: dec!(0.20),
            growth_rate: dec!(0.12),
            high_growth_years: 15,
            fade_years: 15,
            terminal_growth_rate: dec!(0.05),
            tax_rate: dec!(0.25),
        }
    }
}

impl ValuationParameters {
    /// Build parameters from percentage inputs (12 = 12%).
    pub fn from_percentages(
        cost_of_capital_pct: Decimal,
        roce_pct: Decimal,
        growth_rate_pct: Decimal,
        high_growth_years: u32,
        fade_years: u32,
        terminal_growth_rate_pct: Decimal,
        tax_rate_pct: Decimal,
    ) -> Self {
        Self {
            cost_of_capital: cost_of_capital_pct / dec!(100),
            roce: roce_pct / dec!(100),
            growth_rate: growth_rate_pct / dec!(100),
            high_growth_years,
            fade_years,
            terminal_growth_rate: terminal_growth_rate_pct / dec!(100),
            tax_rate: tax_rate_pct / dec!(100),
        }
    }

    /// Structural checks only. Recommended ranges live in [`ParameterBounds`].
    pub fn validate(&self) -> ValuationResult<()> {
        if self.tax_rate < Decimal::ZERO || self.tax_rate >= Decimal::ONE {
            return Err(ValuationError::InvalidInput {
                field: "tax_rate".into(),
                reason: format!("Tax rate must be in [0, 1), got {}", self.tax_rate),
            });
        }
        Ok(())
    }
}

/// Names one of the seven valuation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    CostOfCapital,
    Roce,
    GrowthRate,
    HighGrowthYears,
    FadeYears,
    TerminalGrowthRate,
    TaxRate,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 7] = [
        ParameterKind::CostOfCapital,
        ParameterKind::Roce,
        ParameterKind::GrowthRate,
        ParameterKind::HighGrowthYears,
        ParameterKind::FadeYears,
        ParameterKind::TerminalGrowthRate,
        ParameterKind::TaxRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParameterKind::CostOfCapital => "cost_of_capital",
            ParameterKind::Roce => "roce",
            ParameterKind::GrowthRate => "growth_rate",
            ParameterKind::HighGrowthYears => "high_growth_years",
            ParameterKind::FadeYears => "fade_years",
            ParameterKind::TerminalGrowthRate => "terminal_growth_rate",
            ParameterKind::TaxRate => "tax_rate",
        }
    }

    pub fn is_years(self) -> bool {
        matches!(
            self,
            ParameterKind::HighGrowthYears | ParameterKind::FadeYears
        )
    }

    /// Read the parameter as a decimal (year counts are widened).
    pub fn get(self, params: &ValuationParameters) -> Decimal {
        match self {
            ParameterKind::CostOfCapital => params.cost_of_capital,
            ParameterKind::Roce => params.roce,
            ParameterKind::GrowthRate => params.growth_rate,
            ParameterKind::HighGrowthYears => Decimal::from(params.high_growth_years),
            ParameterKind::FadeYears => Decimal::from(params.fade_years),
            ParameterKind::TerminalGrowthRate => params.terminal_growth_rate,
            ParameterKind::TaxRate => params.tax_rate,
        }
    }

    /// Overwrite the parameter. Year counts must be whole and non-negative.
    pub fn set(self, params: &mut ValuationParameters, value: Decimal) -> ValuationResult<()> {
        match self {
            ParameterKind::CostOfCapital => params.cost_of_capital = value,
            ParameterKind::Roce => params.roce = value,
            ParameterKind::GrowthRate => params.growth_rate = value,
            ParameterKind::HighGrowthYears => params.high_growth_years = whole_years(self, value)?,
            ParameterKind::FadeYears => params.fade_years = whole_years(self, value)?,
            ParameterKind::TerminalGrowthRate => params.terminal_growth_rate = value,
            ParameterKind::TaxRate => params.tax_rate = value,
        }
        Ok(())
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParameterKind {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace('-', "_");
        ParameterKind::ALL
            .into_iter()
            .find(|k| k.name() == normalised)
            .ok_or_else(|| ValuationError::InvalidInput {
                field: "parameter".into(),
                reason: format!("Unknown valuation parameter '{s}'"),
            })
    }
}

fn whole_years(kind: ParameterKind, value: Decimal) -> ValuationResult<u32> {
    if value < Decimal::ZERO || value.fract() != Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: kind.name().into(),
            reason: format!("Year counts must be whole and non-negative, got {value}"),
        });
    }
    value.to_u32().ok_or_else(|| ValuationError::InvalidInput {
        field: kind.name().into(),
        reason: format!("Year count {value} is too large"),
    })
}

// ---------------------------------------------------------------------------
// Recommended ranges
// ---------------------------------------------------------------------------

/// Inclusive recommended range for one parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bound {
    pub parameter: ParameterKind,
    pub min: Decimal,
    pub max: Decimal,
}

/// Recommended operating ranges. Advisory: the model accepts values outside them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterBounds {
    pub bounds: Vec<Bound>,
}

impl ParameterBounds {
    pub fn recommended() -> Self {
        let b = |parameter, min, max| Bound { parameter, min, max };
        Self {
            bounds: vec![
                b(ParameterKind::CostOfCapital, dec!(0.08), dec!(0.16)),
                b(ParameterKind::Roce, dec!(0.10), dec!(1.00)),
                b(ParameterKind::GrowthRate, dec!(0.08), dec!(0.20)),
                b(ParameterKind::HighGrowthYears, dec!(11), dec!(25)),
                b(ParameterKind::FadeYears, dec!(5), dec!(20)),
                b(ParameterKind::TerminalGrowthRate, dec!(0.0), dec!(0.075)),
                b(ParameterKind::TaxRate, dec!(0.25), dec!(0.25)),
            ],
        }
    }

    /// One warning per parameter outside its range.
    pub fn check(&self, params: &ValuationParameters) -> Vec<String> {
        let mut warnings = Vec::new();
        for bound in &self.bounds {
            let value = bound.parameter.get(params);
            if value < bound.min || value > bound.max {
                tracing::warn!(
                    parameter = bound.parameter.name(),
                    %value,
                    min = %bound.min,
                    max = %bound.max,
                    "parameter outside recommended range"
                );
                warnings.push(format!(
                    "{} = {} is outside the recommended range [{}, {}]",
                    bound.parameter, value, bound.min, bound.max
                ));
            }
        }
        warnings
    }

    /// Like [`check`](Self::check) but fails on the first violation.
    pub fn enforce(&self, params: &ValuationParameters) -> ValuationResult<()> {
        match self.check(params).into_iter().next() {
            Some(reason) => Err(ValuationError::InvalidInput {
                field: "parameters".into(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self::recommended()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
