use clap::Args;
use serde_json::Value;

use intrinsic_pe_core::analysis::{self, AnalysisInput};
use intrinsic_pe_core::metrics::RawMetrics;

use crate::config::{self, ParamArgs};
use crate::input;
use crate::input::provider::DirectoryMetricsProvider;

/// Arguments for a full company analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnalyzeArgs {
    /// Raw metrics file (JSON or YAML); read from stdin when omitted
    #[arg(long, conflicts_with = "symbol")]
    pub metrics: Option<String>,

    /// Symbol to look up in --metrics-dir
    #[arg(long, requires = "metrics_dir")]
    pub symbol: Option<String>,

    /// Directory of <SYMBOL>.json / .yaml metrics files
    #[arg(long)]
    pub metrics_dir: Option<String>,

    /// Use the company's median ROCE instead of --roce when available
    #[arg(long)]
    pub use_median_roce: bool,

    #[command(flatten)]
    pub params: ParamArgs,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let parameters = config::resolve_parameters(&args.params)?;

    if let (Some(symbol), Some(dir)) = (&args.symbol, &args.metrics_dir) {
        let provider = DirectoryMetricsProvider::new(dir);
        let output =
            analysis::analyze_symbol(&provider, symbol, parameters, args.use_median_roce)?;
        return Ok(serde_json::to_value(output)?);
    }

    let metrics: RawMetrics = if let Some(ref path) = args.metrics {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin::<RawMetrics>()? {
        data
    } else {
        return Err("--metrics <file>, --symbol with --metrics-dir, or stdin required".into());
    };

    let output = analysis::run_analysis(&AnalysisInput {
        metrics,
        parameters,
        use_median_roce: args.use_median_roce,
    });
    Ok(serde_json::to_value(output)?)
}
