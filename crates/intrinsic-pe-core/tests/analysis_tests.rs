use intrinsic_pe_core::analysis::{analyze_symbol, run_analysis, AnalysisInput, Outcome, ValuationSummary};
use intrinsic_pe_core::error::ErrorKind;
use intrinsic_pe_core::metrics::{RawMetrics, StaticMetricsProvider};
use intrinsic_pe_core::valuation::ValuationParameters;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn metrics(json: serde_json::Value) -> RawMetrics {
    serde_json::from_value(json).unwrap()
}

fn complete_metrics() -> RawMetrics {
    metrics(serde_json::json!({
        "company_name": "Example Industries Ltd",
        "current_pe": "30",
        "nse_symbol": "EXAMPLE",
        "market_cap_raw": "45,740",
        "net_profit_raw": "1,000",
        "median_roce": "24",
        "growth": [
            { "period": "10yr", "sales_growth_pct": "12", "profit_growth_pct": "14" },
            { "period": "5yr", "sales_growth_pct": "10", "profit_growth_pct": "13" },
            { "period": "3yr", "sales_growth_pct": "15", "profit_growth_pct": "18" },
            { "period": "TTM", "sales_growth_pct": "8", "profit_growth_pct": "6" }
        ]
    }))
}

// ===========================================================================
// End-to-end
// ===========================================================================

#[test]
fn test_end_to_end_summary() {
    let out = run_analysis(&AnalysisInput {
        metrics: complete_metrics(),
        parameters: ValuationParameters::default(),
        use_median_roce: false,
    });
    // FY P/E = 45740 / 1000 = 45.74; lower of (30, 45.74) is 30
    let expected = ValuationSummary {
        fy_pe: dec!(45.74),
        intrinsic_pe: dec!(22.87),
        overvaluation: dec!(30) / dec!(22.87) - dec!(1),
    };
    assert_eq!(out.result.summary(), Some(expected));
    assert_eq!(out.result.overvaluation_pct, Some(dec!(31)));
    assert_eq!(out.result.growth_table.len(), 4);
}

#[test]
fn test_partial_report_with_sentinels() {
    let out = run_analysis(&AnalysisInput {
        metrics: metrics(serde_json::json!({
            "company_name": "Sparse Corp",
            "current_pe": "Stock P/E not found.",
            "nse_symbol": "NSE symbol not found.",
            "market_cap_raw": "Market Cap not found.",
            "net_profit_raw": "950",
            "median_roce": "ROCE table not found."
        })),
        parameters: ValuationParameters::default(),
        use_median_roce: false,
    });
    let r = out.result;
    assert_eq!(r.nse_symbol, None);
    assert_eq!(r.net_profit, Some(950));
    assert!(matches!(r.fy_pe, Outcome::Unavailable { kind: ErrorKind::Missing, .. }));
    assert_eq!(r.intrinsic_pe.value(), Some(&dec!(22.87)));
    assert!(matches!(
        r.overvaluation,
        Outcome::Unavailable { kind: ErrorKind::Missing, .. }
    ));
    assert_eq!(r.verdict, None);
    assert_eq!(out.warnings.len(), 4);
}

#[test]
fn test_unparseable_amount_is_parse_error() {
    let mut m = complete_metrics();
    m.market_cap_raw = Some(intrinsic_pe_core::metrics::RawField::text("45,740.5"));
    let r = run_analysis(&AnalysisInput {
        metrics: m,
        parameters: ValuationParameters::default(),
        use_median_roce: false,
    })
    .result;
    assert!(matches!(r.fy_pe, Outcome::Unavailable { kind: ErrorKind::Parse, .. }));
    assert_eq!(r.market_cap_raw, "45,740.5");
}

#[test]
fn test_analysis_input_json_defaults() {
    let input: AnalysisInput = serde_json::from_value(serde_json::json!({
        "metrics": { "company_name": "Only Name" }
    }))
    .unwrap();
    assert_eq!(input.parameters, ValuationParameters::default());
    assert!(!input.use_median_roce);
}

#[test]
fn test_provider_pipeline() {
    let provider = StaticMetricsProvider::new().with_record("EXAMPLE", complete_metrics());
    let out = analyze_symbol(&provider, "example", ValuationParameters::default(), true).unwrap();
    assert_eq!(out.result.roce_used, dec!(0.24));
    assert_eq!(out.result.fy_pe.value(), Some(&dec!(45.74)));
}
