pub mod provider;
pub mod record;

pub use provider::{MetricsProvider, StaticMetricsProvider};
pub use record::{
    FieldError, GrowthPeriod, GrowthRow, Metric, MetricsRecord, RawField, RawGrowthRow, RawMetrics,
};
