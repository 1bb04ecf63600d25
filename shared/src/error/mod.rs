//! Unified error handling for the redeem workspace
//!
//! - [`ErrorCode`]: stable u16 codes organized by category
//! - [`AppError`]: structured application error with message and details
//! - [`ApiResponse`]: uniform JSON envelope for all endpoints

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
