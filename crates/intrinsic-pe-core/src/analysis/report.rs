//! Single-symbol valuation report: raw fundamentals in, display-ready
//! figures out.
//!
//! Each derived figure is computed independently. A missing net profit
//! stops the FY P/E and the over-valuation, but the intrinsic P/E is still
//! reported, mirroring how a reader would see "unable to calculate" next to
//! the numbers that did work.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ErrorKind;
use crate::metrics::{GrowthPeriod, Metric, MetricsProvider, MetricsRecord, RawMetrics};
use crate::types::{with_metadata, Amount, ComputationOutput, Multiple, Rate};
use crate::valuation::{
    compute_fy_pe, compute_intrinsic_pe, compute_overvaluation, overvaluation_pct,
    ParameterBounds, ValuationParameters, ValuationVerdict,
};
use crate::ValuationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a full single-symbol analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub metrics: RawMetrics,
    #[serde(default)]
    pub parameters: ValuationParameters,
    /// Use the reported median ROCE as the model base instead of `parameters.roce`
    #[serde(default)]
    pub use_median_roce: bool,
}

/// Result of one computation inside the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok { value: T },
    Unavailable { kind: ErrorKind, reason: String },
}

impl<T> Outcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Ok { value } => Some(value),
            Outcome::Unavailable { .. } => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }
}

impl<T> From<ValuationResult<T>> for Outcome<T> {
    fn from(result: ValuationResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::Ok { value },
            Err(e) => Outcome::Unavailable {
                kind: e.kind(),
                reason: e.to_string(),
            },
        }
    }
}

/// Where the model's return-on-capital base came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoceSource {
    Parameter,
    MedianRoce,
}

/// Growth table row in percent, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthTableRow {
    pub period: String,
    pub sales_growth_pct: Option<Decimal>,
    pub profit_growth_pct: Option<Decimal>,
}

/// The three headline numbers, available when every computation succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub fy_pe: Multiple,
    pub intrinsic_pe: Multiple,
    /// Fraction; multiply by 100 for percent
    pub overvaluation: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReport {
    pub company_name: String,
    pub nse_symbol: Option<String>,
    pub current_pe: Option<Multiple>,
    pub market_cap_raw: String,
    pub market_cap: Option<Amount>,
    pub net_profit_raw: String,
    pub net_profit: Option<Amount>,
    pub median_roce_pct: Option<Decimal>,
    pub growth_table: Vec<GrowthTableRow>,
    pub roce_used: Rate,
    pub roce_source: RoceSource,
    pub fy_pe: Outcome<Multiple>,
    pub intrinsic_pe: Outcome<Multiple>,
    pub overvaluation: Outcome<Rate>,
    /// round(overvaluation, 2) * 100
    pub overvaluation_pct: Option<Decimal>,
    pub verdict: Option<ValuationVerdict>,
}

impl ValuationReport {
    pub fn summary(&self) -> Option<ValuationSummary> {
        Some(ValuationSummary {
            fy_pe: *self.fy_pe.value()?,
            intrinsic_pe: *self.intrinsic_pe.value()?,
            overvaluation: *self.overvaluation.value()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse, compute and assemble the report. Degenerate or missing fields
/// surface as `Unavailable` outcomes and warnings, never as a failure of
/// the whole analysis.
pub fn run_analysis(input: &AnalysisInput) -> ComputationOutput<ValuationReport> {
    let start = Instant::now();
    let record = MetricsRecord::from_raw(&input.metrics);
    let mut warnings = record_warnings(&record);

    let (params, roce_source) = effective_parameters(input, &record, &mut warnings);
    warnings.extend(ParameterBounds::recommended().check(&params));

    let fy_pe = fy_pe_for(&record);
    let intrinsic_pe = params.validate().and_then(|_| compute_intrinsic_pe(&params));
    let overvaluation = overvaluation_for(&record, &fy_pe, &intrinsic_pe);

    let overvaluation_display = overvaluation
        .as_ref()
        .ok()
        .and_then(|v| overvaluation_pct(*v).ok());
    let verdict = overvaluation
        .as_ref()
        .ok()
        .map(|v| ValuationVerdict::from_overvaluation(*v));

    tracing::debug!(
        company = %record.company_name,
        fy_pe_ok = fy_pe.is_ok(),
        intrinsic_pe_ok = intrinsic_pe.is_ok(),
        overvaluation_ok = overvaluation.is_ok(),
        "analysis complete"
    );

    let report = ValuationReport {
        company_name: record.company_name.clone(),
        nse_symbol: record.nse_symbol.value().cloned(),
        current_pe: available(&record.current_pe),
        market_cap_raw: record.market_cap_raw.clone(),
        market_cap: available(&record.market_cap),
        net_profit_raw: record.net_profit_raw.clone(),
        net_profit: available(&record.net_profit),
        median_roce_pct: available(&record.median_roce_pct),
        growth_table: growth_table(&record),
        roce_used: params.roce,
        roce_source,
        fy_pe: fy_pe.into(),
        intrinsic_pe: intrinsic_pe.into(),
        overvaluation: overvaluation.into(),
        overvaluation_pct: overvaluation_display,
        verdict,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "FY P/E vs multi-phase intrinsic P/E (lower market multiple)",
        &serde_json::json!({
            "parameters": params,
            "use_median_roce": input.use_median_roce,
        }),
        warnings,
        elapsed,
        report,
    )
}

/// Fetch a symbol through a provider, then run the analysis.
pub fn analyze_symbol<P: MetricsProvider + ?Sized>(
    provider: &P,
    symbol: &str,
    parameters: ValuationParameters,
    use_median_roce: bool,
) -> ValuationResult<ComputationOutput<ValuationReport>> {
    let metrics = provider.fetch(symbol)?;
    Ok(run_analysis(&AnalysisInput {
        metrics,
        parameters,
        use_median_roce,
    }))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn fy_pe_for(record: &MetricsRecord) -> ValuationResult<Multiple> {
    let market_cap = record.require("market_cap", &record.market_cap)?;
    let net_profit = record.require("net_profit", &record.net_profit)?;
    compute_fy_pe(market_cap, net_profit)
}

fn overvaluation_for(
    record: &MetricsRecord,
    fy_pe: &ValuationResult<Multiple>,
    intrinsic_pe: &ValuationResult<Multiple>,
) -> ValuationResult<Rate> {
    let current_pe = record.require("current_pe", &record.current_pe)?;
    let fy_pe = fy_pe.clone()?;
    let intrinsic_pe = intrinsic_pe.clone()?;
    compute_overvaluation(current_pe, fy_pe, intrinsic_pe)
}

fn effective_parameters(
    input: &AnalysisInput,
    record: &MetricsRecord,
    warnings: &mut Vec<String>,
) -> (ValuationParameters, RoceSource) {
    let mut params = input.parameters.clone();
    if !input.use_median_roce {
        return (params, RoceSource::Parameter);
    }
    match record.median_roce_pct.as_ref().and_then(Metric::value) {
        Some(pct) => {
            params.roce = *pct / dec!(100);
            (params, RoceSource::MedianRoce)
        }
        None => {
            warnings.push(format!(
                "Median ROCE unavailable; using parameter ROCE {}",
                params.roce
            ));
            (params, RoceSource::Parameter)
        }
    }
}

fn record_warnings(record: &MetricsRecord) -> Vec<String> {
    let mut warnings: Vec<String> = record
        .missing_fields()
        .into_iter()
        .map(|field| format!("{field} not reported by the data source"))
        .collect();
    warnings.extend(
        record
            .field_errors
            .iter()
            .map(|e| format!("{} could not be parsed from {:?}: {}", e.field, e.value, e.reason)),
    );
    warnings
}

fn available<T: Clone>(metric: &Option<Metric<T>>) -> Option<T> {
    metric.as_ref().and_then(Metric::value).cloned()
}

fn growth_table(record: &MetricsRecord) -> Vec<GrowthTableRow> {
    let mut rows: Vec<_> = record.growth.iter().collect();
    rows.sort_by_key(|row| GrowthPeriod::ALL.iter().position(|p| *p == row.period));
    rows.into_iter()
        .map(|row| GrowthTableRow {
            period: row.label.clone(),
            sales_growth_pct: available(&row.sales_growth).map(|v| v * dec!(100)),
            profit_growth_pct: available(&row.profit_growth).map(|v| v * dec!(100)),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
