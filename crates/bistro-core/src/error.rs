//! # Error Types
//!
//! Domain-specific error types for bistro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bistro-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bistro-client errors (separate crate)                                 │
//! │  └── ClientError      - Network, storage, config failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Front End           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (group ids, limits, etc.)
//! 3. Errors are enum variants, never String
//! 4. Every variant except `CatalogUnavailable` is recoverable by the user

use thiserror::Error;

use crate::money::Money;
use crate::types::GroupId;
use crate::validation::CardinalityViolation;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The options payload for an item could not be parsed.
    ///
    /// ## When This Occurs
    /// - The catalog answered with something that is not a JSON object
    /// - The payload text is not JSON at all
    ///
    /// The caller must not open a configuration session.
    #[error("Item options unavailable: {reason}")]
    CatalogUnavailable { reason: String },

    /// The configured item cannot be committed to the basket yet.
    ///
    /// ## User Workflow
    /// ```text
    /// Click "Add to basket"
    ///      │
    ///      ▼
    /// validate_selections() ── required group "Size" empty
    ///      │
    ///      ▼
    /// SelectionIncomplete { missing_groups: [4], .. }
    ///      │
    ///      ▼
    /// UI highlights "Size", selections are kept
    /// ```
    #[error(
        "{} required option group(s) missing, {} group(s) outside their limits",
        .missing_groups.len(),
        .violations.len()
    )]
    SelectionIncomplete {
        missing_groups: Vec<GroupId>,
        violations: Vec<CardinalityViolation>,
    },

    /// Basket has reached the maximum number of lines.
    #[error("Basket cannot have more than {max} lines")]
    BasketTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// No basket line at the given position.
    #[error("Basket line {0} not found")]
    LineNotFound(usize),

    /// Operation needs at least one basket line.
    #[error("Basket is empty")]
    EmptyBasket,

    /// A restored basket breaks a basket invariant.
    #[error("Stored basket rejected: {reason}")]
    InvalidBasket { reason: String },

    /// Delivery orders must reach the area's minimum order value.
    #[error("Minimum order value for this area is {minimum}, basket total is {total}")]
    BelowMinimumOrder { minimum: Money, total: Money },

    /// Checkout details failed validation (one entry per field).
    #[error("Checkout details incomplete: {} field(s) invalid", .0.len())]
    CheckoutIncomplete(Vec<ValidationError>),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email address).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
