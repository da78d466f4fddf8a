//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Sales errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
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
    /// Invalid request
    InvalidRequest = 4,
    /// Required field missing
    RequiredField = 5,

    // ==================== 4xxx: Sales ====================
    /// Not enough stock to satisfy the requested quantity
    InsufficientStock = 4001,
    /// Requested quantity is zero or negative
    InvalidQuantity = 4002,
    /// Item has no batches to allocate from
    NoBatches = 4003,

    // ==================== 6xxx: Catalog ====================
    /// Shop not found
    ShopNotFound = 6001,
    /// Item not found
    ItemNotFound = 6002,
    /// Batch not found
    BatchNotFound = 6003,
    /// Selling unit not found
    SellingUnitNotFound = 6004,
    /// Category not found
    CategoryNotFound = 6005,
    /// Catalog cache has not been populated yet
    CacheEmpty = 6006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Upstream document store unreachable or failing
    UpstreamStore = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            // 0xxx: General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // 4xxx: Sales
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::InvalidQuantity => "Quantity must be greater than zero",
            ErrorCode::NoBatches => "No batches available",

            // 6xxx: Catalog
            ErrorCode::ShopNotFound => "Shop not found",
            ErrorCode::ItemNotFound => "Item not found",
            ErrorCode::BatchNotFound => "Batch not found",
            ErrorCode::SellingUnitNotFound => "Selling unit not found",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CacheEmpty => "Catalog cache is empty",

            // 9xxx: System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::UpstreamStore => "Document store unavailable",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
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
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::InvalidRequest,
            5 => ErrorCode::RequiredField,

            4001 => ErrorCode::InsufficientStock,
            4002 => ErrorCode::InvalidQuantity,
            4003 => ErrorCode::NoBatches,

            6001 => ErrorCode::ShopNotFound,
            6002 => ErrorCode::ItemNotFound,
            6003 => ErrorCode::BatchNotFound,
            6004 => ErrorCode::SellingUnitNotFound,
            6005 => ErrorCode::CategoryNotFound,
            6006 => ErrorCode::CacheEmpty,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::UpstreamStore,
            9003 => ErrorCode::ConfigError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::InsufficientStock,
            ErrorCode::ItemNotFound,
            ErrorCode::UpstreamStore,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
    }

    #[test]
    fn test_serde_as_u16() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "4001");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::InsufficientStock);
    }
}
