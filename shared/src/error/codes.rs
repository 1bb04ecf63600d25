//! Unified error codes for the redeem service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Package errors
//! - 3xxx: Stock errors
//! - 4xxx: Share-code / redemption errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Codes are represented as u16 values for efficient serialization and
/// cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Package ====================
    /// Package not found
    PackageNotFound = 2001,

    // ==================== 3xxx: Stock ====================
    /// Stock record not found
    StockNotFound = 3001,
    /// Redemption code already exists on another stock record
    DuplicateStockCode = 3002,
    /// Order number does not match the expected format
    InvalidOrderNumber = 3003,
    /// Validity-days value is not a positive integer
    InvalidValidDays = 3004,
    /// Serial number is not a positive integer
    InvalidSerialNumber = 3005,
    /// No unused, unbound stock is available for the package
    NoStockAvailable = 3006,

    // ==================== 4xxx: Share code ====================
    /// Share code not found
    ShareCodeNotFound = 4001,
    /// Share code is inactive or past its expiry
    ShareCodeInvalid = 4002,
    /// Share code value already exists
    DuplicateShareCode = 4003,
    /// Could not allocate a free share code within the attempt bound
    AllocationExhausted = 4004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Package
            ErrorCode::PackageNotFound => "Package not found",

            // Stock
            ErrorCode::StockNotFound => "Stock record not found",
            ErrorCode::DuplicateStockCode => "Redemption code already exists",
            ErrorCode::InvalidOrderNumber => "Order number format is invalid",
            ErrorCode::InvalidValidDays => "Validity days must be a positive integer",
            ErrorCode::InvalidSerialNumber => "Serial number must be a positive integer",
            ErrorCode::NoStockAvailable => "No unused stock available",

            // Share code
            ErrorCode::ShareCodeNotFound => "Share code not found",
            ErrorCode::ShareCodeInvalid => "Share code is invalid or expired",
            ErrorCode::DuplicateShareCode => "Share code already exists",
            ErrorCode::AllocationExhausted => "Could not allocate a free code, please retry",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Package
            2001 => Ok(ErrorCode::PackageNotFound),

            // Stock
            3001 => Ok(ErrorCode::StockNotFound),
            3002 => Ok(ErrorCode::DuplicateStockCode),
            3003 => Ok(ErrorCode::InvalidOrderNumber),
            3004 => Ok(ErrorCode::InvalidValidDays),
            3005 => Ok(ErrorCode::InvalidSerialNumber),
            3006 => Ok(ErrorCode::NoStockAvailable),

            // Share code
            4001 => Ok(ErrorCode::ShareCodeNotFound),
            4002 => Ok(ErrorCode::ShareCodeInvalid),
            4003 => Ok(ErrorCode::DuplicateShareCode),
            4004 => Ok(ErrorCode::AllocationExhausted),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PackageNotFound.code(), 2001);
        assert_eq!(ErrorCode::StockNotFound.code(), 3001);
        assert_eq!(ErrorCode::DuplicateStockCode.code(), 3002);
        assert_eq!(ErrorCode::InvalidOrderNumber.code(), 3003);
        assert_eq!(ErrorCode::InvalidValidDays.code(), 3004);
        assert_eq!(ErrorCode::NoStockAvailable.code(), 3006);
        assert_eq!(ErrorCode::ShareCodeInvalid.code(), 4002);
        assert_eq!(ErrorCode::AllocationExhausted.code(), 4004);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
        assert!(!ErrorCode::InternalError.is_success());
    }

    #[test]
    fn test_try_from_roundtrip() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::InvalidCredentials,
            ErrorCode::PackageNotFound,
            ErrorCode::DuplicateStockCode,
            ErrorCode::ShareCodeInvalid,
            ErrorCode::AllocationExhausted,
            ErrorCode::DatabaseError,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(5001), Err(InvalidErrorCode(5001)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize_as_u16() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::ShareCodeNotFound).unwrap(),
            "4001"
        );
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");

        let code: ErrorCode = serde_json::from_str("3002").unwrap();
        assert_eq!(code, ErrorCode::DuplicateStockCode);
        assert!(serde_json::from_str::<ErrorCode>("999").is_err());
    }

    #[test]
    fn test_display_and_message() {
        assert_eq!(format!("{}", ErrorCode::ShareCodeInvalid), "4002");
        assert_eq!(
            ErrorCode::ShareCodeInvalid.message(),
            "Share code is invalid or expired"
        );
        assert_eq!(ErrorCode::PackageNotFound.message(), "Package not found");
    }
}
