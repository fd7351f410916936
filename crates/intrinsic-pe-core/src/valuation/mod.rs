pub mod intrinsic_pe;
pub mod multiples;
pub mod params;

pub use intrinsic_pe::{build_intrinsic_pe_model, calculate_intrinsic_pe, compute_intrinsic_pe};
pub use multiples::{compute_fy_pe, compute_overvaluation, overvaluation_pct, ValuationVerdict};
pub use params::{ParameterBounds, ParameterKind, ValuationParameters};
