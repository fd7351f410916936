pub mod report;

pub use report::{
    analyze_symbol, run_analysis, AnalysisInput, GrowthTableRow, Outcome, RoceSource,
    ValuationReport, ValuationSummary,
};
