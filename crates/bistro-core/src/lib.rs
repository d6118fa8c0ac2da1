//! # bistro-core: Pure Business Logic for the Bistro Storefront
//!
//! This crate is the **heart** of Bistro. It holds the item customization
//! pricing engine and everything around it as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser Front End                            │   │
//! │  │    Menu ──► Item Popup ──► Basket ──► Checkout                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 bistro-client (Storefront)                      │   │
//! │  │    open_item, add_to_basket, apply_coupon, prepare_checkout     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bistro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌───────────┐ ┌──────────┐ ┌────────────────┐   │   │
//! │  │   │ catalog  │ │ selection │ │ pricing  │ │  validation    │   │   │
//! │  │   │normalize │─►│  state   │─►│ engine  │ │ required/card. │   │   │
//! │  │   └──────────┘ └───────────┘ └──────────┘ └────────────────┘   │   │
//! │  │          session ──► basket ──► checkout                        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO STORAGE • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (MenuOption, SelectionGroup, SelectedOption, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`catalog`] - Raw options payload normalization
//! - [`selection`] - Selection state store for one configuration session
//! - [`pricing`] - Line pricing and free-unit allocation
//! - [`validation`] - Group constraint checks and input validation
//! - [`session`] - One item configuration session
//! - [`basket`] - Basket lines, merging, coupons, totals
//! - [`checkout`] - Checkout validation and order drafts
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bistro_core::money::Money;
//! use bistro_core::types::DiscountRate;
//!
//! let price = Money::from_cents(800); // €8.00
//! let discounted = price.apply_discount(DiscountRate::from_bps(2000)); // 20%
//! assert_eq!(discounted.cents(), 640);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod basket;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod pricing;
pub mod selection;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use basket::{AppliedCoupon, Basket, BasketNotice, BasketTotals, ConfiguredLineItem, SelectionKey};
pub use checkout::{CustomerDetails, DeliveryAddress, OrderDraft, OrderMethod, PaymentMethod};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{PriceQuote, PricingEngine, PricingPolicy};
pub use selection::{SelectionChange, SelectionState};
pub use session::{ConfigurationSession, SessionToken};
pub use types::*;
pub use validation::{CardinalityMode, SelectionVerdict};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of distinct lines in a basket.
pub const MAX_BASKET_LINES: usize = 100;

/// Maximum quantity of a single basket line (and of the item stepper).
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Maximum length of a free-text note attached to a configured item.
pub const MAX_NOTE_LENGTH: usize = 500;
