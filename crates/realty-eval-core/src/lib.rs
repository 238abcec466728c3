pub mod amortization;
mod arith;
pub mod error;
pub mod types;

#[cfg(feature = "evaluation")]
pub mod evaluation;

#[cfg(feature = "comps")]
pub mod comps;

pub use error::EvalError;
pub use types::*;

/// Standard result type for all realty-eval operations
pub type EvalResult<T> = Result<T, EvalError>;
