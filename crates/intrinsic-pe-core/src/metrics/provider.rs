use std::collections::HashMap;

use crate::error::ValuationError;
use crate::ValuationResult;

use super::record::RawMetrics;

/// Source of raw fundamentals for one symbol.
///
/// Implementations do the fetching and extraction; they hand over fields
/// exactly as displayed, sentinels included. Parsing happens downstream in
/// [`MetricsRecord::from_raw`](super::record::MetricsRecord::from_raw).
pub trait MetricsProvider {
    fn fetch(&self, symbol: &str) -> ValuationResult<RawMetrics>;
}

/// In-memory provider keyed by upper-cased symbol.
#[derive(Debug, Clone, Default)]
pub struct StaticMetricsProvider {
    records: HashMap<String, RawMetrics>,
}

impl StaticMetricsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, symbol: &str, record: RawMetrics) -> Self {
        self.insert(symbol, record);
        self
    }

    pub fn insert(&mut self, symbol: &str, record: RawMetrics) {
        self.records.insert(normalise(symbol), record);
    }
}

impl MetricsProvider for StaticMetricsProvider {
    fn fetch(&self, symbol: &str) -> ValuationResult<RawMetrics> {
        self.records
            .get(&normalise(symbol))
            .cloned()
            .ok_or_else(|| ValuationError::MissingInput {
                field: "symbol".into(),
                sentinel: format!("no metrics for {symbol}"),
            })
    }
}

fn normalise(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}
