//! Shared types for the redeem workspace
//!
//! Holds the unified error model (codes, `AppError`, `ApiResponse`) used by
//! the server and any future clients, plus small utilities.

pub mod error;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
