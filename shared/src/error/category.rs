//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category, determined by the error code range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Package errors (2xxx)
    Package,
    /// Stock errors (3xxx)
    Stock,
    /// Share-code / redemption errors (4xxx)
    ShareCode,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Package,
            3000..4000 => Self::Stock,
            4000..5000 => Self::ShareCode,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Package => "package",
            Self::Stock => "stock",
            Self::ShareCode => "share_code",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Package);
        assert_eq!(ErrorCategory::from_code(3002), ErrorCategory::Stock);
        assert_eq!(ErrorCategory::from_code(4004), ErrorCategory::ShareCode);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::NotFound.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::TokenInvalid.category(), ErrorCategory::Auth);
        assert_eq!(
            ErrorCode::PackageNotFound.category(),
            ErrorCategory::Package
        );
        assert_eq!(
            ErrorCode::NoStockAvailable.category(),
            ErrorCategory::Stock
        );
        assert_eq!(
            ErrorCode::AllocationExhausted.category(),
            ErrorCategory::ShareCode
        );
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serde() {
        assert_eq!(
            serde_json::to_string(&ErrorCategory::ShareCode).unwrap(),
            "\"share_code\""
        );
        let cat: ErrorCategory = serde_json::from_str("\"stock\"").unwrap();
        assert_eq!(cat, ErrorCategory::Stock);
    }
}
