use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::time::Instant;

use intrinsic_pe_core::types::with_metadata;
use intrinsic_pe_core::units;
use intrinsic_pe_core::valuation::{
    self, compute_fy_pe, compute_overvaluation, overvaluation_pct, ValuationVerdict,
};

use crate::config::{self, ParamArgs};

/// Arguments for the full-year P/E
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FyPeArgs {
    /// Market capitalisation as displayed, e.g. "1,03,456"
    #[arg(long)]
    pub market_cap: String,

    /// Full-year net profit as displayed
    #[arg(long)]
    pub net_profit: String,
}

/// Arguments for the intrinsic P/E model
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct IntrinsicPeArgs {
    #[command(flatten)]
    pub params: ParamArgs,

    /// Include the year-by-year projection schedule
    #[arg(long)]
    pub schedule: bool,
}

/// Arguments for the over-valuation comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct OvervaluationArgs {
    /// Quoted current P/E
    #[arg(long)]
    pub current_pe: Decimal,

    /// Full-year P/E
    #[arg(long)]
    pub fy_pe: Decimal,

    /// Intrinsic P/E
    #[arg(long)]
    pub intrinsic_pe: Decimal,
}

pub fn run_fy_pe(args: FyPeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let market_cap = units::parse_amount(&args.market_cap)?;
    let net_profit = units::parse_amount(&args.net_profit)?;
    let fy_pe = compute_fy_pe(market_cap, net_profit)?;

    let mut warnings = Vec::new();
    if fy_pe < Decimal::ZERO {
        warnings.push("Net profit is negative; FY P/E reflects a loss".to_string());
    }
    let output = with_metadata(
        "Full-year P/E (market cap / net profit)",
        &json!({ "market_cap": market_cap, "net_profit": net_profit }),
        warnings,
        start.elapsed().as_micros() as u64,
        json!({ "market_cap": market_cap, "net_profit": net_profit, "fy_pe": fy_pe }),
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_intrinsic_pe(args: IntrinsicPeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = config::resolve_parameters(&args.params)?;
    let output = valuation::calculate_intrinsic_pe(&params)?;
    let mut value = serde_json::to_value(output)?;
    if !args.schedule {
        if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
            result.remove("projections");
        }
    }
    Ok(value)
}

pub fn run_overvaluation(args: OvervaluationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let fraction = compute_overvaluation(args.current_pe, args.fy_pe, args.intrinsic_pe)?;
    let output = with_metadata(
        "Degree of over-valuation (lower of current and FY P/E over intrinsic P/E, minus one)",
        &json!({
            "current_pe": args.current_pe,
            "fy_pe": args.fy_pe,
            "intrinsic_pe": args.intrinsic_pe,
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        json!({
            "comparison_pe": args.current_pe.min(args.fy_pe),
            "overvaluation": fraction,
            "overvaluation_pct": overvaluation_pct(fraction)?,
            "verdict": ValuationVerdict::from_overvaluation(fraction),
        }),
    );
    Ok(serde_json::to_value(output)?)
}
