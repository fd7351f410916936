pub mod error;
pub mod types;
pub mod units;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "analysis")]
pub mod metrics;

#[cfg(feature = "analysis")]
pub mod analysis;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::ValuationError;
pub use types::*;

/// Standard result type for all valuation operations
pub type ValuationResult<T> = Result<T, ValuationError>;
