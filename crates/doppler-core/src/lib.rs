pub mod capital;
pub mod codes;
pub mod config;
pub mod error;
pub mod report;
pub mod series;
pub mod statement;
pub mod stock;
pub mod types;
pub mod valuation;

#[cfg(feature = "screening")]
pub mod screening;

pub use error::DopplerError;
pub use types::*;

/// Standard result type for all Doppler computations
pub type DopplerResult<T> = Result<T, DopplerError>;
