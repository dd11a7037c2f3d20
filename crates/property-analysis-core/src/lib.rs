pub mod amortization;
pub mod analysis;
pub mod config;
pub mod error;
pub mod expenses;
pub mod income;
pub mod metrics;
pub mod reconcile;
pub mod supplemental;
pub mod types;

pub use error::AnalysisError;
pub use types::*;

/// Standard result type for all property-analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
