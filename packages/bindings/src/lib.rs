use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use intrinsic_pe_core::analysis::{self, AnalysisInput};
use intrinsic_pe_core::scenarios::sensitivity::{self, SensitivityInput};
use intrinsic_pe_core::units;
use intrinsic_pe_core::valuation::{self, ValuationParameters};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Parse a grouped-digit amount. Returned as a string to keep i64 precision in JS.
#[napi]
pub fn parse_amount(raw: String) -> NapiResult<String> {
    let amount = units::parse_amount(&raw).map_err(to_napi_error)?;
    Ok(amount.to_string())
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Full-year P/E from displayed market cap and net profit, as a decimal string.
#[napi]
pub fn fy_pe(market_cap: String, net_profit: String) -> NapiResult<String> {
    let market_cap = units::parse_amount(&market_cap).map_err(to_napi_error)?;
    let net_profit = units::parse_amount(&net_profit).map_err(to_napi_error)?;
    let pe = valuation::compute_fy_pe(market_cap, net_profit).map_err(to_napi_error)?;
    Ok(pe.to_string())
}

/// Intrinsic P/E only, as a decimal string.
#[napi]
pub fn intrinsic_pe(params_json: String) -> NapiResult<String> {
    let params = parse_params(&params_json)?;
    let pe = valuation::compute_intrinsic_pe(&params).map_err(to_napi_error)?;
    Ok(pe.to_string())
}

/// Full model with schedule and envelope, as JSON.
#[napi]
pub fn intrinsic_pe_model(params_json: String) -> NapiResult<String> {
    let params = parse_params(&params_json)?;
    let output = valuation::calculate_intrinsic_pe(&params).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn overvaluation(current_pe: String, fy_pe: String, intrinsic_pe: String) -> NapiResult<String> {
    let current_pe = parse_decimal("current_pe", &current_pe)?;
    let fy_pe = parse_decimal("fy_pe", &fy_pe)?;
    let intrinsic_pe = parse_decimal("intrinsic_pe", &intrinsic_pe)?;
    let fraction = valuation::compute_overvaluation(current_pe, fy_pe, intrinsic_pe)
        .map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({
        "overvaluation": fraction,
        "overvaluation_pct": valuation::overvaluation_pct(fraction).map_err(to_napi_error)?,
        "verdict": valuation::ValuationVerdict::from_overvaluation(fraction),
    }))
    .map_err(to_napi_error)
}

/// Missing fields fall back to the defaults.
fn parse_params(params_json: &str) -> NapiResult<ValuationParameters> {
    if params_json.trim().is_empty() {
        return Ok(ValuationParameters::default());
    }
    let mut value: serde_json::Value = serde_json::from_str(params_json).map_err(to_napi_error)?;
    let mut merged = serde_json::to_value(ValuationParameters::default()).map_err(to_napi_error)?;
    if let (Some(base), Some(overrides)) = (merged.as_object_mut(), value.as_object_mut()) {
        base.append(overrides);
    }
    serde_json::from_value(merged).map_err(to_napi_error)
}

fn parse_decimal(field: &str, raw: &str) -> NapiResult<Decimal> {
    raw.trim()
        .parse()
        .map_err(|e| to_napi_error(format!("{field}: {e}")))
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze(input_json: String) -> NapiResult<String> {
    let input: AnalysisInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = analysis::run_analysis(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn sensitivity(input_json: String) -> NapiResult<String> {
    let input: SensitivityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sensitivity::calculate_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
