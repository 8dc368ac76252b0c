//! # Error Types
//!
//! Domain error types for torque-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  torque-core (this file)                                               │
//! │  └── ValidationError  - Rejected shop settings updates                 │
//! │                                                                         │
//! │  torque-client (separate crate)                                        │
//! │  ├── RequestError     - Remote operation failures (retry-classified)   │
//! │  └── ConfigError      - Client configuration load/save failures        │
//! │                                                                         │
//! │  The billing computation itself has NO error type: malformed numbers   │
//! │  are defaulted at the deserialization boundary.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for settings updates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value is outside the accepted range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: Decimal,
        max: Decimal,
    },

    /// The update carried no fields.
    #[error("settings update contains no changes")]
    EmptyUpdate,
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Negative {
            field: "taxRate".to_string(),
        };
        assert_eq!(err.to_string(), "taxRate must not be negative");

        let err = ValidationError::OutOfRange {
            field: "shopSuppliesRate".to_string(),
            min: dec!(0),
            max: dec!(1),
        };
        assert_eq!(err.to_string(), "shopSuppliesRate must be between 0 and 1");
    }
}
