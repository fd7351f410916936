pub mod amount;
pub mod analysis;
pub mod scenarios;
pub mod valuation;
