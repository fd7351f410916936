use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use intrinsic_pe_core::scenarios::sensitivity::{self, SensitivityInput, SweepVariable};
use intrinsic_pe_core::valuation::ParameterKind;

use crate::config::{self, scale_percent, ParamArgs};
use crate::input;

/// Arguments for the intrinsic P/E sensitivity grid
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SensitivityArgs {
    /// Row variable in format name:min:max:step
    /// (e.g. "growth_rate:0.08:0.20:0.02")
    #[arg(long, requires = "column")]
    pub row: Option<String>,

    /// Column variable in format name:min:max:step
    #[arg(long, requires = "row")]
    pub column: Option<String>,

    /// Path to a JSON or YAML file with the full sensitivity input
    #[arg(long, conflicts_with_all = ["row", "column"])]
    pub input: Option<String>,

    #[command(flatten)]
    pub params: ParamArgs,
}

/// Parse `name:min:max:step`. With `percent`, rate bounds are read as percentages.
pub fn parse_sweep(sweep: &str, percent: bool) -> Result<SweepVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = sweep.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            sweep
        )
        .into());
    }
    let parameter: ParameterKind = parts[0].parse()?;
    let number = |raw: &str| -> Result<Decimal, Box<dyn std::error::Error>> {
        let value: Decimal = raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid number '{raw}' in '{sweep}': {e}"))?;
        Ok(scale_percent(parameter, value, percent))
    };
    Ok(SweepVariable {
        parameter,
        min: number(parts[1])?,
        max: number(parts[2])?,
        step: number(parts[3])?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input: SensitivityInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let (Some(row), Some(column)) = (&args.row, &args.column) {
        SensitivityInput {
            base: config::resolve_parameters(&args.params)?,
            row: parse_sweep(row, args.params.percent)?,
            column: parse_sweep(column, args.params.percent)?,
        }
    } else if let Some(data) = input::stdin::read_stdin::<SensitivityInput>()? {
        data
    } else {
        return Err("--row and --column, --input <file>, or stdin required".into());
    };

    let output = sensitivity::calculate_sensitivity(&input)?;
    Ok(serde_json::to_value(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_sweep() {
        let v = parse_sweep("growth-rate:0.08:0.20:0.02", false).unwrap();
        assert_eq!(v.parameter, ParameterKind::GrowthRate);
        assert_eq!(v.min, dec!(0.08));
        assert_eq!(v.step, dec!(0.02));
    }

    #[test]
    fn test_parse_sweep_percent_leaves_years() {
        let rate = parse_sweep("cost_of_capital:8:16:2", true).unwrap();
        assert_eq!(rate.max, dec!(0.16));
        let years = parse_sweep("fade_years:5:20:5", true).unwrap();
        assert_eq!(years.max, dec!(20));
    }

    #[test]
    fn test_parse_sweep_rejects_bad_specs() {
        assert!(parse_sweep("growth_rate:0.08:0.20", false).is_err());
        assert!(parse_sweep("beta:0:1:0.1", false).is_err());
        assert!(parse_sweep("roce:a:b:c", false).is_err());
    }
}
