//! Valuation parameter layering.
//!
//! Later layers win: built-in defaults, then `IPE_*` environment variables
//! (a `.env` file is loaded at startup), then a `--params` JSON/YAML file,
//! then individual flags.

use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use intrinsic_pe_core::valuation::{ParameterBounds, ParameterKind, ValuationParameters};

use crate::input;

/// Valuation parameter flags shared by every subcommand that runs the model
#[derive(Args, Debug, Default, Clone)]
pub struct ParamArgs {
    /// Cost of capital (fraction, e.g. 0.12)
    #[arg(long)]
    pub cost_of_capital: Option<Decimal>,

    /// Return on capital employed (fraction)
    #[arg(long)]
    pub roce: Option<Decimal>,

    /// High-growth phase growth rate (fraction)
    #[arg(long)]
    pub growth_rate: Option<Decimal>,

    /// Length of the high-growth phase in years
    #[arg(long)]
    pub high_growth_years: Option<u32>,

    /// Length of the fade phase in years
    #[arg(long)]
    pub fade_years: Option<u32>,

    /// Terminal growth rate (fraction)
    #[arg(long)]
    pub terminal_growth_rate: Option<Decimal>,

    /// Tax rate (fraction)
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// JSON or YAML file with any subset of the parameters
    #[arg(long)]
    pub params: Option<String>,

    /// Read rate flags as percentages (12 = 12%)
    #[arg(long)]
    pub percent: bool,

    /// Reject parameters outside the recommended ranges instead of warning
    #[arg(long)]
    pub strict: bool,
}

/// Any subset of the parameters, as read from a `--params` file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterOverrides {
    pub cost_of_capital: Option<Decimal>,
    pub roce: Option<Decimal>,
    pub growth_rate: Option<Decimal>,
    pub high_growth_years: Option<u32>,
    pub fade_years: Option<u32>,
    pub terminal_growth_rate: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
}

impl ParameterOverrides {
    fn entries(&self) -> Vec<(ParameterKind, Decimal)> {
        let pairs = [
            (ParameterKind::CostOfCapital, self.cost_of_capital),
            (ParameterKind::Roce, self.roce),
            (ParameterKind::GrowthRate, self.growth_rate),
            (ParameterKind::HighGrowthYears, self.high_growth_years.map(Decimal::from)),
            (ParameterKind::FadeYears, self.fade_years.map(Decimal::from)),
            (ParameterKind::TerminalGrowthRate, self.terminal_growth_rate),
            (ParameterKind::TaxRate, self.tax_rate),
        ];
        pairs
            .into_iter()
            .filter_map(|(kind, value)| value.map(|v| (kind, v)))
            .collect()
    }
}

impl From<&ParamArgs> for ParameterOverrides {
    fn from(args: &ParamArgs) -> Self {
        Self {
            cost_of_capital: args.cost_of_capital,
            roce: args.roce,
            growth_rate: args.growth_rate,
            high_growth_years: args.high_growth_years,
            fade_years: args.fade_years,
            terminal_growth_rate: args.terminal_growth_rate,
            tax_rate: args.tax_rate,
        }
    }
}

/// Name of the environment variable for a parameter, e.g. `IPE_COST_OF_CAPITAL`.
pub fn env_key(kind: ParameterKind) -> String {
    format!("IPE_{}", kind.name().to_ascii_uppercase())
}

/// Scale a percentage flag value to a fraction. Year counts pass through.
pub fn scale_percent(kind: ParameterKind, value: Decimal, percent: bool) -> Decimal {
    if percent && !kind.is_years() {
        value / dec!(100)
    } else {
        value
    }
}

/// Resolve the parameters from the process environment and the flags.
pub fn resolve_parameters(
    args: &ParamArgs,
) -> Result<ValuationParameters, Box<dyn std::error::Error>> {
    resolve_with_env(args, |key| std::env::var(key).ok())
}

/// Layering with an injectable environment lookup.
pub fn resolve_with_env<F>(
    args: &ParamArgs,
    lookup: F,
) -> Result<ValuationParameters, Box<dyn std::error::Error>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut params = ValuationParameters::default();

    for kind in ParameterKind::ALL {
        let key = env_key(kind);
        if let Some(raw) = lookup(&key) {
            let value: Decimal = raw
                .trim()
                .parse()
                .map_err(|e| format!("Invalid {key}='{raw}': {e}"))?;
            tracing::debug!(%key, %value, "parameter from environment");
            kind.set(&mut params, value)?;
        }
    }

    if let Some(path) = &args.params {
        let file: ParameterOverrides = input::file::read_input(path)?;
        for (kind, value) in file.entries() {
            tracing::debug!(parameter = %kind, %value, %path, "parameter from file");
            kind.set(&mut params, value)?;
        }
    }

    for (kind, value) in ParameterOverrides::from(args).entries() {
        kind.set(&mut params, scale_percent(kind, value, args.percent))?;
    }

    params.validate()?;
    if args.strict {
        ParameterBounds::recommended().enforce(&params)?;
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let params = resolve_with_env(&ParamArgs::default(), env(&[])).unwrap();
        assert_eq!(params, ValuationParameters::default());
    }

    #[test]
    fn test_env_then_flag_precedence() {
        let lookup = env(&[("IPE_COST_OF_CAPITAL", "0.10"), ("IPE_FADE_YEARS", "5")]);
        let args = ParamArgs {
            cost_of_capital: Some(dec!(0.14)),
            ..Default::default()
        };
        let params = resolve_with_env(&args, lookup).unwrap();
        assert_eq!(params.cost_of_capital, dec!(0.14));
        assert_eq!(params.fade_years, 5);
    }

    #[test]
    fn test_file_layer_between_env_and_flags() {
        let path = std::env::temp_dir().join(format!("ipe-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "roce": "0.30", "growth_rate": "0.15" }"#).unwrap();
        let args = ParamArgs {
            params: Some(path.to_string_lossy().into_owned()),
            growth_rate: Some(dec!(0.10)),
            ..Default::default()
        };
        let params = resolve_with_env(&args, env(&[("IPE_ROCE", "0.25")])).unwrap();
        assert_eq!(params.roce, dec!(0.30));
        assert_eq!(params.growth_rate, dec!(0.10));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_percent_flags_scale_rates_only() {
        let args = ParamArgs {
            cost_of_capital: Some(dec!(12)),
            high_growth_years: Some(10),
            percent: true,
            ..Default::default()
        };
        let params = resolve_with_env(&args, env(&[])).unwrap();
        assert_eq!(params.cost_of_capital, dec!(0.12));
        assert_eq!(params.high_growth_years, 10);
    }

    #[test]
    fn test_bad_env_value_is_error() {
        let result = resolve_with_env(&ParamArgs::default(), env(&[("IPE_TAX_RATE", "lots")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_strict_rejects_out_of_range() {
        let args = ParamArgs {
            growth_rate: Some(dec!(0.40)),
            strict: true,
            ..Default::default()
        };
        assert!(resolve_with_env(&args, env(&[])).is_err());

        let lenient = ParamArgs {
            strict: false,
            ..args
        };
        assert_eq!(
            resolve_with_env(&lenient, env(&[])).unwrap().growth_rate,
            dec!(0.40)
        );
    }

    #[test]
    fn test_env_key_names() {
        assert_eq!(env_key(ParameterKind::TerminalGrowthRate), "IPE_TERMINAL_GROWTH_RATE");
    }
}
