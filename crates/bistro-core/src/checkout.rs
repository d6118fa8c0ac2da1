//! # Checkout Preparation
//!
//! Validates customer details against the basket and builds the
//! [`OrderDraft`] that is handed to the order/payment backend.
//!
//! ## Checkout Flow
//! ```text
//! ┌──────────┐   validate_checkout   ┌──────────────┐   from_basket   ┌────────────┐
//! │  Basket  │ ────────────────────► │  Details OK  │ ──────────────► │ OrderDraft │
//! └──────────┘                       └──────────────┘                 └────────────┘
//!       │                                   │
//!       │ empty                             │ delivery below minimum
//!       ▼                                   ▼
//!   EmptyBasket                     BelowMinimumOrder
//! ```
//!
//! Payment itself happens outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::basket::Basket;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ItemId, OptionId};
use crate::validation::{validate_email, validate_note, validate_phone, validate_required};

// =============================================================================
// Order and Payment Method
// =============================================================================

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum OrderMethod {
    #[default]
    Delivery,
    SelfCollection,
}

impl OrderMethod {
    #[inline]
    pub const fn is_delivery(&self) -> bool {
        matches!(self, OrderMethod::Delivery)
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
}

// =============================================================================
// Customer Details
// =============================================================================

/// Delivery address, required for [`OrderMethod::Delivery`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub postal_code: String,
    pub street: String,
    pub house: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub stairs: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub door: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub bell: Option<String>,
}

/// Contact details entered on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub address: Option<DeliveryAddress>,

    /// Free-text instructions for the kitchen or the driver.
    #[serde(default)]
    pub special_notes: String,
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a checkout attempt.
///
/// ## Rules
/// - The basket must not be empty
/// - First name, last name, email and phone are required and well-formed
/// - Delivery needs postal code, street and house number
/// - Delivery orders must reach `minimum_order`, measured on the basket total
///   BEFORE any coupon
///
/// Field errors are collected together so the form can mark every field at
/// once.
pub fn validate_checkout(
    basket: &Basket,
    details: &CustomerDetails,
    method: OrderMethod,
    minimum_order: Option<Money>,
) -> CoreResult<()> {
    if basket.is_empty() {
        return Err(CoreError::EmptyBasket);
    }

    let mut errors: Vec<ValidationError> = Vec::new();
    let mut check = |result: Result<(), ValidationError>| {
        if let Err(e) = result {
            errors.push(e);
        }
    };

    check(validate_required("firstName", &details.first_name));
    check(validate_required("lastName", &details.last_name));
    check(validate_email(&details.email));
    check(validate_phone(&details.phone));
    check(validate_note(&details.special_notes).map(|_| ()));

    if method.is_delivery() {
        match &details.address {
            Some(address) => {
                check(validate_required("postalCode", &address.postal_code));
                check(validate_required("street", &address.street));
                check(validate_required("house", &address.house));
            }
            None => {
                for field in ["postalCode", "street", "house"] {
                    check(validate_required(field, ""));
                }
            }
        }
    }

    if !errors.is_empty() {
        return Err(CoreError::CheckoutIncomplete(errors));
    }

    if method.is_delivery() {
        if let Some(minimum) = minimum_order {
            let total = basket.original_total();
            if total < minimum {
                return Err(CoreError::BelowMinimumOrder { minimum, total });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Order Draft
// =============================================================================

/// An option as sent with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineOption {
    pub id: OptionId,
    pub name: String,
    pub quantity: u32,
    pub price: Money,
}

/// One basket line as sent with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: ItemId,
    pub name: String,
    /// Unit price actually charged.
    pub price: Money,
    pub quantity: u32,
    pub note: String,
    pub selected_items: Vec<OrderLineOption>,
}

/// The hand-off to the order/payment backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[ts(as = "String")]
    pub id: Uuid,

    pub lines: Vec<OrderLine>,

    pub customer: CustomerDetails,

    pub order_method: OrderMethod,

    pub payment_method: PaymentMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub coupon_code: Option<String>,

    pub total_amount: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderDraft {
    /// Validates the checkout and freezes the basket into a draft.
    pub fn from_basket(
        basket: &Basket,
        customer: CustomerDetails,
        order_method: OrderMethod,
        payment_method: PaymentMethod,
        minimum_order: Option<Money>,
    ) -> CoreResult<Self> {
        validate_checkout(basket, &customer, order_method, minimum_order)?;

        let lines: Vec<OrderLine> = basket
            .lines()
            .iter()
            .map(|line| OrderLine {
                id: line.id,
                name: line.name.clone(),
                price: line.unit_price(),
                quantity: line.quantity,
                note: line.note.clone(),
                selected_items: line
                    .selected_items
                    .iter()
                    .map(|o| OrderLineOption {
                        id: o.id,
                        name: o.name.clone(),
                        quantity: o.quantity,
                        price: o.unit_price,
                    })
                    .collect(),
            })
            .collect();

        let total_amount = lines.iter().map(|l| l.price * l.quantity).sum();

        // pickup orders carry no address
        let customer = if order_method.is_delivery() {
            customer
        } else {
            CustomerDetails {
                address: None,
                ..customer
            }
        };

        Ok(OrderDraft {
            id: Uuid::new_v4(),
            lines,
            customer,
            order_method,
            payment_method,
            coupon_code: basket.coupon().map(|c| c.code.clone()),
            total_amount,
            created_at: Utc::now(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::ConfiguredLineItem;
    use crate::pricing::PriceQuote;
    use crate::types::{DiscountRate, MenuItem};

    fn basket_with(cents: i64, quantity: u32) -> Basket {
        let item = MenuItem::new(1, "Burger", Money::from_cents(cents));
        let quote = PriceQuote {
            original_price: Money::from_cents(cents),
            discounted_price: Money::from_cents(cents),
            discount: DiscountRate::zero(),
            single_item_price: Money::from_cents(cents),
            quantity,
        };
        let mut basket = Basket::new();
        basket
            .add(ConfiguredLineItem::new(&item, vec![], &quote, quantity, ""))
            .unwrap();
        basket
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+43 660 1234567".to_string(),
            address: Some(DeliveryAddress {
                postal_code: "1010".to_string(),
                street: "Ringstrasse".to_string(),
                house: "1".to_string(),
                ..Default::default()
            }),
            special_notes: String::new(),
        }
    }

    #[test]
    fn test_valid_delivery_checkout() {
        let basket = basket_with(1000, 2);
        assert!(validate_checkout(&basket, &customer(), OrderMethod::Delivery, None).is_ok());
    }

    #[test]
    fn test_empty_basket_rejected() {
        let basket = Basket::new();
        assert_eq!(
            validate_checkout(&basket, &customer(), OrderMethod::SelfCollection, None),
            Err(CoreError::EmptyBasket)
        );
    }

    #[test]
    fn test_field_errors_collected() {
        let basket = basket_with(1000, 1);
        let details = CustomerDetails {
            email: "not-an-email".to_string(),
            address: None,
            ..customer()
        };

        let err = validate_checkout(&basket, &details, OrderMethod::Delivery, None).unwrap_err();
        let CoreError::CheckoutIncomplete(errors) = &err else {
            panic!("expected CheckoutIncomplete, got {err:?}");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["email", "postalCode", "street", "house"]);
    }

    #[test]
    fn test_self_collection_needs_no_address() {
        let basket = basket_with(1000, 1);
        let details = CustomerDetails {
            address: None,
            ..customer()
        };
        assert!(validate_checkout(&basket, &details, OrderMethod::SelfCollection, None).is_ok());
    }

    #[test]
    fn test_minimum_order_uses_original_total() {
        let mut basket = basket_with(1000, 1);
        basket
            .apply_coupon("HALF", DiscountRate::from_bps(5000))
            .unwrap();
        assert_eq!(basket.total().cents(), 500);

        // €10 before the coupon reaches a €10 minimum
        let minimum = Some(Money::from_cents(1000));
        assert!(validate_checkout(&basket, &customer(), OrderMethod::Delivery, minimum).is_ok());

        let minimum = Some(Money::from_cents(1500));
        assert_eq!(
            validate_checkout(&basket, &customer(), OrderMethod::Delivery, minimum),
            Err(CoreError::BelowMinimumOrder {
                minimum: Money::from_cents(1500),
                total: Money::from_cents(1000),
            })
        );

        // pickup ignores the minimum
        assert!(validate_checkout(&basket, &customer(), OrderMethod::SelfCollection, minimum).is_ok());
    }

    #[test]
    fn test_order_draft_uses_discounted_prices() {
        let mut basket = basket_with(1000, 3);
        basket
            .apply_coupon("SAVE10", DiscountRate::from_bps(1000))
            .unwrap();

        let draft = OrderDraft::from_basket(
            &basket,
            customer(),
            OrderMethod::SelfCollection,
            PaymentMethod::Cash,
            None,
        )
        .unwrap();

        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].price.cents(), 900);
        assert_eq!(draft.total_amount.cents(), 2700);
        assert_eq!(draft.coupon_code.as_deref(), Some("SAVE10"));
        assert!(draft.customer.address.is_none());

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["orderMethod"], "selfCollection");
        assert_eq!(json["paymentMethod"], "cash");
        assert_eq!(json["totalAmount"], 2700);
    }
}
