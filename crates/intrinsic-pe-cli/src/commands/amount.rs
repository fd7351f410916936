use clap::Args;
use serde_json::{json, Value};
use std::time::Instant;

use intrinsic_pe_core::types::with_metadata;
use intrinsic_pe_core::units;

/// Arguments for amount parsing
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ParseAmountArgs {
    /// Amount as displayed, e.g. "1,03,456" or "-2,500"
    pub raw: String,
}

pub fn run_parse_amount(args: ParseAmountArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let amount = units::parse_amount(&args.raw)?;
    let output = with_metadata(
        "Grouped-digit amount parsing",
        &json!({ "raw": args.raw }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        json!({ "amount": amount }),
    );
    Ok(serde_json::to_value(output)?)
}
