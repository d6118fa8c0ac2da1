//! # Basket
//!
//! Basket lines, line merging, coupon application and totals.
//!
//! ## Basket Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Basket Operations                                  │
//! │                                                                         │
//! │  Customer Action          Basket Method            Coupon              │
//! │  ───────────────          ─────────────            ──────              │
//! │                                                                         │
//! │  Add to basket ─────────► add(line) ──────────────► stripped + notice   │
//! │    same item, same options and note ► quantity += n                     │
//! │                                                                         │
//! │  + / − stepper ─────────► increase/decrease ──────► stripped + notice   │
//! │                                                                         │
//! │  Remove ────────────────► remove(index) ──────────► stripped + notice   │
//! │                                                                         │
//! │  Apply coupon ──────────► apply_coupon(code, rate) ► every line priced  │
//! │                                                                         │
//! │  View ──────────────────► totals() ───────────────► (read only)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Coupon Invalidation
//! A coupon is validated against the basket contents, so any change to the
//! contents removes it from every line and leaves a [`BasketNotice`] for the
//! front end to show. The customer re-applies the code if they want it.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::PriceQuote;
use crate::types::{DiscountRate, ItemId, MenuItem, SelectedOption};
use crate::validation::validate_coupon_code;
use crate::{MAX_BASKET_LINES, MAX_ITEM_QUANTITY};

// =============================================================================
// Selection Key
// =============================================================================

/// Order-independent fingerprint of an item's options and note.
///
/// Two configurations of the same item merge into one basket line exactly
/// when their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct SelectionKey(String);

impl SelectionKey {
    /// Builds the key from `(kind, id, quantity)` of every selection plus
    /// the trimmed note.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::basket::SelectionKey;
    ///
    /// let key = SelectionKey::compute(&[], "  no onions ");
    /// assert_eq!(key.as_str(), "|no onions");
    /// ```
    pub fn compute(selections: &[SelectedOption], note: &str) -> Self {
        let mut parts: Vec<_> = selections
            .iter()
            .map(|s| (s.kind, s.id, s.quantity))
            .collect();
        parts.sort_unstable();

        let mut key = String::new();
        for (index, (kind, id, quantity)) in parts.iter().enumerate() {
            if index > 0 {
                key.push(',');
            }
            // writing to a String cannot fail
            let _ = write!(key, "{kind}:{id}x{quantity}");
        }
        key.push('|');
        key.push_str(note.trim());

        SelectionKey(key)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Configured Line Item
// =============================================================================

/// A priced, validated item in the basket.
///
/// ## Price Fields
/// - `original_price`: one unit with options, before any discount
/// - `offer_price`: one unit after the item's best offer
/// - `discounted_price`: `offer_price` after the coupon, present only while
///   a coupon is applied
///
/// All prices are frozen when the line is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredLineItem {
    /// Menu item id.
    pub id: ItemId,

    pub name: String,

    pub base_price: Money,

    #[serde(default)]
    pub single_item_price: Money,

    /// Best offer discount that was selected for this item.
    #[serde(default)]
    pub offer_discount: DiscountRate,

    pub original_price: Money,

    pub offer_price: Money,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub discounted_price: Option<Money>,

    /// Coupon rate behind `discounted_price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub coupon_discount: Option<DiscountRate>,

    pub quantity: u32,

    #[serde(default)]
    pub note: String,

    pub selected_items: Vec<SelectedOption>,

    pub selection_key: SelectionKey,

    /// Names of the option groups in display order.
    #[serde(default)]
    pub group_order: Vec<String>,
}

impl ConfiguredLineItem {
    /// Freezes a configuration into a basket line.
    pub fn new(
        item: &MenuItem,
        selected_items: Vec<SelectedOption>,
        quote: &PriceQuote,
        quantity: u32,
        note: &str,
    ) -> Self {
        let note = note.trim().to_string();
        let selection_key = SelectionKey::compute(&selected_items, &note);

        let mut grouped: Vec<(i64, &str)> = selected_items
            .iter()
            .filter_map(|s| {
                let name = s.group_name.as_deref()?;
                Some((s.group_display_order.unwrap_or(0), name))
            })
            .collect();
        grouped.sort();
        let mut group_order: Vec<String> = Vec::new();
        for (_, name) in grouped {
            if !group_order.iter().any(|existing| existing == name) {
                group_order.push(name.to_string());
            }
        }

        ConfiguredLineItem {
            id: item.id,
            name: item.name.clone(),
            base_price: item.price,
            single_item_price: quote.single_item_price,
            offer_discount: quote.discount,
            original_price: quote.original_price,
            offer_price: quote.discounted_price,
            discounted_price: None,
            coupon_discount: None,
            quantity,
            note,
            selected_items,
            selection_key,
            group_order,
        }
    }

    /// Unit price actually charged: the offer price, less the coupon if any.
    #[inline]
    pub fn unit_price(&self) -> Money {
        self.discounted_price.unwrap_or(self.offer_price)
    }

    /// Line total before offers and coupons.
    #[inline]
    pub fn line_original(&self) -> Money {
        self.original_price * self.quantity
    }

    /// Line total actually charged.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }

    /// Same item, same options and same note.
    pub fn same_configuration(&self, other: &ConfiguredLineItem) -> bool {
        self.id == other.id && self.selection_key == other.selection_key && self.note == other.note
    }

    fn strip_coupon(&mut self) {
        self.discounted_price = None;
        self.coupon_discount = None;
    }
}

// =============================================================================
// Display Helpers
// =============================================================================

/// Selected options of one group, for the basket details view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedSelections<'a> {
    pub name: String,
    pub display_order: i64,
    pub options: Vec<&'a SelectedOption>,
}

/// Label for options that belong to no group.
pub const UNGROUPED_LABEL: &str = "Other";

/// Display order used when an option carries none.
const FALLBACK_DISPLAY_ORDER: i64 = 9999;

/// Groups a line's options by group name.
///
/// Groups listed in `group_order` come first, in that order; the rest
/// follow by display order, then name.
pub fn grouped_selections(line: &ConfiguredLineItem) -> Vec<GroupedSelections<'_>> {
    let mut groups: Vec<GroupedSelections<'_>> = Vec::new();
    for option in &line.selected_items {
        let name = option.group_name.as_deref().unwrap_or(UNGROUPED_LABEL);
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.options.push(option),
            None => groups.push(GroupedSelections {
                name: name.to_string(),
                display_order: option.group_display_order.unwrap_or(FALLBACK_DISPLAY_ORDER),
                options: vec![option],
            }),
        }
    }

    let rank = |group: &GroupedSelections<'_>| {
        line.group_order
            .iter()
            .position(|name| *name == group.name)
            .unwrap_or(usize::MAX)
    };
    groups.sort_by(|a, b| {
        rank(a)
            .cmp(&rank(b))
            .then(a.display_order.cmp(&b.display_order))
            .then_with(|| a.name.cmp(&b.name))
    });
    groups
}

/// One-line summary such as `"Bacon x2, Cheese"`.
pub fn summarize_options<'a, I>(options: I) -> String
where
    I: IntoIterator<Item = &'a SelectedOption>,
{
    options
        .into_iter()
        .map(|o| {
            if o.quantity > 1 {
                format!("{} x{}", o.name, o.quantity)
            } else {
                o.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Basket
// =============================================================================

/// A coupon currently applied to the basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: String,
    pub rate: DiscountRate,
}

/// Non-blocking message for the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BasketNotice {
    /// The basket changed after a coupon was applied, so it was removed.
    CouponRemoved { code: String },
}

/// The customer's basket.
///
/// ## Invariants
/// - Lines are unique by (item id, selection key, note)
/// - Quantity of every line is within 1..=MAX_ITEM_QUANTITY
/// - At most MAX_BASKET_LINES lines
/// - A line has `discounted_price` only while `coupon` is set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    #[serde(default)]
    lines: Vec<ConfiguredLineItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    coupon: Option<AppliedCoupon>,

    #[serde(skip)]
    notice: Option<BasketNotice>,
}

impl Basket {
    /// Creates a new empty basket.
    pub fn new() -> Self {
        Basket::default()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[inline]
    pub fn lines(&self) -> &[ConfiguredLineItem] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> CoreResult<&ConfiguredLineItem> {
        self.lines.get(index).ok_or(CoreError::LineNotFound(index))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[inline]
    pub fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().fold(0, |sum, l| sum.saturating_add(l.quantity))
    }

    /// Sum of line totals before offers and coupons.
    pub fn original_total(&self) -> Money {
        self.lines.iter().map(ConfiguredLineItem::line_original).sum()
    }

    /// Sum of line totals actually charged.
    pub fn total(&self) -> Money {
        self.lines.iter().map(ConfiguredLineItem::line_total).sum()
    }

    pub fn totals(&self) -> BasketTotals {
        BasketTotals::from(self)
    }

    /// Returns and clears the pending notice.
    pub fn take_notice(&mut self) -> Option<BasketNotice> {
        self.notice.take()
    }

    /// Checks the invariants of a basket read back from storage.
    ///
    /// ## Errors
    /// - `BasketTooLarge` with more than MAX_BASKET_LINES lines
    /// - `QuantityTooLarge` or `Validation` for a quantity outside
    ///   1..=MAX_ITEM_QUANTITY
    /// - `InvalidBasket` when prices or coupon state disagree, or two lines
    ///   hold the same configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.len() > MAX_BASKET_LINES {
            return Err(CoreError::BasketTooLarge { max: MAX_BASKET_LINES });
        }
        if self.coupon.is_some() && self.lines.is_empty() {
            return Err(CoreError::InvalidBasket {
                reason: "coupon applied to an empty basket".to_string(),
            });
        }

        for (index, line) in self.lines.iter().enumerate() {
            check_quantity(line.quantity)?;

            let invalid = |reason: &str| CoreError::InvalidBasket {
                reason: format!("line {index} {reason}"),
            };
            if line.offer_price.cents() < 0 || line.offer_price > line.original_price {
                return Err(invalid("has an offer price outside 0..=original price"));
            }
            let coupon_price = self.coupon.as_ref().map(|c| line.offer_price.apply_discount(c.rate));
            match (coupon_price, line.discounted_price) {
                (None, Some(_)) => {
                    return Err(invalid("has a coupon price but no coupon is applied"));
                }
                (Some(_), None) => return Err(invalid("is missing its coupon price")),
                (Some(expected), Some(price)) if expected != price => {
                    return Err(invalid("has a coupon price that does not match the coupon"));
                }
                _ => {}
            }
            if self.lines[..index].iter().any(|l| l.same_configuration(line)) {
                return Err(invalid("duplicates an earlier line"));
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Line Mutations
    // -------------------------------------------------------------------------

    /// Adds a line or increases the quantity of an identical one.
    ///
    /// ## Returns
    /// Index of the line that now holds the configuration.
    pub fn add(&mut self, mut line: ConfiguredLineItem) -> CoreResult<usize> {
        check_quantity(line.quantity)?;

        if let Some(index) = self.lines.iter().position(|l| l.same_configuration(&line)) {
            let merged = self.lines[index].quantity.saturating_add(line.quantity);
            check_quantity(merged)?;
            self.lines[index].quantity = merged;
            debug!(index, quantity = merged, "Merged identical configuration");
            self.contents_changed();
            return Ok(index);
        }

        if self.lines.len() >= MAX_BASKET_LINES {
            return Err(CoreError::BasketTooLarge { max: MAX_BASKET_LINES });
        }

        line.strip_coupon();
        debug!(item_id = line.id, quantity = line.quantity, "Line added");
        self.lines.push(line);
        self.contents_changed();
        Ok(self.lines.len() - 1)
    }

    /// Stepper "+": quantity + 1.
    pub fn increase_quantity(&mut self, index: usize) -> CoreResult<u32> {
        let quantity = self.line(index)?.quantity;
        let increased = quantity.checked_add(1).ok_or(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        })?;
        self.update_quantity(index, increased)?;
        Ok(increased)
    }

    /// Stepper "−": quantity − 1, never below 1.
    pub fn decrease_quantity(&mut self, index: usize) -> CoreResult<u32> {
        let quantity = self.line(index)?.quantity;
        if quantity <= 1 {
            return Ok(quantity);
        }
        self.update_quantity(index, quantity - 1)?;
        Ok(quantity - 1)
    }

    /// Sets a line's quantity; `0` removes the line.
    pub fn update_quantity(&mut self, index: usize, quantity: u32) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(index).map(|_| ());
        }
        check_quantity(quantity)?;

        let line = self
            .lines
            .get_mut(index)
            .ok_or(CoreError::LineNotFound(index))?;
        if line.quantity != quantity {
            line.quantity = quantity;
            self.contents_changed();
        }
        Ok(())
    }

    /// Removes a line and returns it.
    pub fn remove(&mut self, index: usize) -> CoreResult<ConfiguredLineItem> {
        if index >= self.lines.len() {
            return Err(CoreError::LineNotFound(index));
        }
        let line = self.lines.remove(index);
        debug!(index, item_id = line.id, "Line removed");
        self.contents_changed();
        Ok(line)
    }

    /// Empties the basket (after checkout or on request).
    pub fn clear(&mut self) {
        self.lines.clear();
        self.coupon = None;
        self.notice = None;
    }

    // -------------------------------------------------------------------------
    // Coupons
    // -------------------------------------------------------------------------

    /// Prices every line with a validated coupon rate.
    ///
    /// The rate is applied to each line's offer price per unit and rounded
    /// once, like offer discounts.
    pub fn apply_coupon(&mut self, code: &str, rate: DiscountRate) -> CoreResult<()> {
        let code = validate_coupon_code(code)?;
        if self.lines.is_empty() {
            return Err(CoreError::EmptyBasket);
        }

        for line in &mut self.lines {
            line.discounted_price = Some(line.offer_price.apply_discount(rate));
            line.coupon_discount = Some(rate);
        }
        info!(code = %code, rate = %rate, lines = self.lines.len(), "Coupon applied");
        self.coupon = Some(AppliedCoupon { code, rate });
        self.notice = None;
        Ok(())
    }

    /// Removes the coupon without a notice (customer's own action).
    pub fn remove_coupon(&mut self) {
        self.lines.iter_mut().for_each(ConfiguredLineItem::strip_coupon);
        self.coupon = None;
    }

    fn contents_changed(&mut self) {
        let had_discount = self.lines.iter().any(|l| l.discounted_price.is_some());
        if let Some(coupon) = self.coupon.take() {
            info!(code = %coupon.code, "Basket changed, coupon removed");
            self.notice = Some(BasketNotice::CouponRemoved { code: coupon.code });
        }
        if had_discount {
            self.lines.iter_mut().for_each(ConfiguredLineItem::strip_coupon);
        }
    }
}

fn check_quantity(quantity: u32) -> CoreResult<()> {
    if quantity == 0 {
        return Err(CoreError::Validation(crate::error::ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }));
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Basket Totals
// =============================================================================

/// Basket totals summary for the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BasketTotals {
    pub line_count: u32,
    pub total_quantity: u32,
    /// Before offers and coupon.
    pub original_total: Money,
    /// Offer and coupon savings.
    pub discount_total: Money,
    /// Amount to pay.
    pub total: Money,
}

impl From<&Basket> for BasketTotals {
    fn from(basket: &Basket) -> Self {
        let original_total = basket.original_total();
        let total = basket.total();
        BasketTotals {
            line_count: u32::try_from(basket.len()).unwrap_or(u32::MAX),
            total_quantity: basket.total_quantity(),
            original_total,
            discount_total: original_total - total,
            total,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
