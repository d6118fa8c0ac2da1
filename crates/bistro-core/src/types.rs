//! # Domain Types
//!
//! Core domain types used throughout Bistro.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ItemOptions   │   │ SelectionGroup  │   │ SelectedOption  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  ingredients    │   │  id, name       │   │  id + kind      │       │
//! │  │  drink_options  │   │  group_type     │   │  quantity       │       │
//! │  │  side_options   │   │  free_threshold │   │  unit_price     │       │
//! │  │  item_offers    │   │  min/max_select │   │  (frozen copy)  │       │
//! │  │  groups ────────┼──►│  options ───────┼──►│  group_id       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountRate   │   │   GroupType     │   │   OptionKind    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  SINGLE         │   │  ingredient     │       │
//! │  │  2000 = 20%     │   │  MULTIPLE       │   │  drink / side   │       │
//! │  └─────────────────┘   │  EXCLUSIONS     │   │  offer          │       │
//! │                        └─────────────────┘   │  selection      │       │
//! │                                              │  exclusion      │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! An option id is only unique together with its [`OptionKind`]: the same
//! numeric id can appear as an ingredient and as a group selection.
//! [`OptionKey`] carries both.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{parse_fixed_point, Money};

/// Catalog identifier of a menu item.
pub type ItemId = i64;

/// Catalog identifier of an option (unique per kind).
pub type OptionId = i64;

/// Catalog identifier of a selection group.
pub type GroupId = i64;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2000 bps = 20% (a typical lunch offer)
/// 1250 bps = 12.5% (a coupon ratio of 0.125)
///
/// Rates are capped at 100% so a discounted price can never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100% expressed in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a discount rate from basis points (capped at 100%).
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > Self::MAX_BPS {
            DiscountRate(Self::MAX_BPS)
        } else {
            DiscountRate(bps)
        }
    }

    /// Parses a percentage such as `"20"` or `"12.5"`.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::types::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::from_percentage_str("12.5").unwrap().bps(), 1250);
    /// assert!(DiscountRate::from_percentage_str("-5").is_none());
    /// ```
    pub fn from_percentage_str(text: &str) -> Option<Self> {
        let bps = parse_fixed_point(text, 2)?;
        Some(Self::from_bps(u32::try_from(bps).unwrap_or(u32::MAX)))
    }

    /// Parses a ratio such as `"0.15"` (as returned by coupon validation).
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::types::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::from_ratio_str("0.15").unwrap().bps(), 1500);
    /// ```
    pub fn from_ratio_str(text: &str) -> Option<Self> {
        let bps = parse_fixed_point(text, 4)?;
        Some(Self::from_bps(u32::try_from(bps).unwrap_or(u32::MAX)))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

/// Renders `20%`, `12.5%`, `7.25%`.
impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let fraction = self.0 % 100;
        if fraction == 0 {
            write!(f, "{whole}%")
        } else if fraction % 10 == 0 {
            write!(f, "{whole}.{}%", fraction / 10)
        } else {
            write!(f, "{whole}.{fraction:02}%")
        }
    }
}

// =============================================================================
// Option Kind & Key
// =============================================================================

/// What an option is, which decides how it is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    /// Extra (or mandatory) ingredient of the item.
    Ingredient,
    /// Drink added to the item, always charged per unit.
    Drink,
    /// Side dish added to the item, always charged per unit.
    Side,
    /// Promotional offer; carries a discount, never a price.
    Offer,
    /// Option chosen inside a SINGLE or MULTIPLE selection group.
    Selection,
    /// Opt-out choice inside an EXCLUSIONS group ("no onions").
    Exclusion,
}

impl OptionKind {
    /// Stable lowercase name, as used on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Ingredient => "ingredient",
            OptionKind::Drink => "drink",
            OptionKind::Side => "side",
            OptionKind::Offer => "offer",
            OptionKind::Selection => "selection",
            OptionKind::Exclusion => "exclusion",
        }
    }

    /// Kinds that belong to a selection group.
    pub const fn is_grouped(&self) -> bool {
        matches!(self, OptionKind::Selection | OptionKind::Exclusion)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an option inside one item's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OptionKey {
    pub id: OptionId,
    pub kind: OptionKind,
}

impl OptionKey {
    #[inline]
    pub const fn new(id: OptionId, kind: OptionKind) -> Self {
        OptionKey { id, kind }
    }
}

// =============================================================================
// Group Type
// =============================================================================

/// Cardinality rule of a selection group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupType {
    /// Radio-button semantics: at most one option selected.
    Single,
    /// Checkbox semantics with per-option quantities.
    #[default]
    Multiple,
    /// Opt-out removals; never required, never priced.
    Exclusions,
}

impl GroupType {
    /// Parses the catalog's `Type` field (case-insensitive).
    pub fn from_wire(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "SINGLE" => Some(GroupType::Single),
            "MULTIPLE" => Some(GroupType::Multiple),
            "EXCLUSIONS" => Some(GroupType::Exclusions),
            _ => None,
        }
    }

    /// The option kind carried by groups of this type.
    pub const fn option_kind(&self) -> OptionKind {
        match self {
            GroupType::Exclusions => OptionKind::Exclusion,
            GroupType::Single | GroupType::Multiple => OptionKind::Selection,
        }
    }
}

// =============================================================================
// Menu Item
// =============================================================================

/// A menu item the customer can open and configure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Catalog id.
    pub id: ItemId,

    /// Display name.
    pub name: String,

    /// Base price of one unit before any option.
    pub price: Money,

    /// Optional description shown in the configuration popup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub description: Option<String>,
}

impl MenuItem {
    pub fn new(id: ItemId, name: impl Into<String>, price: Money) -> Self {
        MenuItem {
            id,
            name: name.into(),
            price,
            description: None,
        }
    }
}

// =============================================================================
// Menu Option
// =============================================================================

/// One selectable option as normalized from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuOption {
    pub id: OptionId,
    pub name: String,
    pub kind: OptionKind,

    /// Price of a single unit (zero for offers and most exclusions).
    pub unit_price: Money,

    /// Ingredient is pre-selected and cannot be removed.
    #[serde(default)]
    pub is_mandatory: bool,

    /// Ingredient may be removed by the customer.
    #[serde(default)]
    pub can_exclude: bool,

    /// Owning group for `Selection` / `Exclusion` options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub group_id: Option<GroupId>,

    /// Stable sort key within the owning list.
    #[serde(default)]
    pub display_order: i64,

    /// Offer discount (zero for every other kind).
    #[serde(default)]
    pub discount: DiscountRate,

    /// Offer description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl MenuOption {
    /// Creates a plain option with no group, flags or discount.
    pub fn new(id: OptionId, name: impl Into<String>, kind: OptionKind, unit_price: Money) -> Self {
        MenuOption {
            id,
            name: name.into(),
            kind,
            unit_price,
            is_mandatory: false,
            can_exclude: false,
            group_id: None,
            display_order: 0,
            discount: DiscountRate::zero(),
            description: String::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> OptionKey {
        OptionKey::new(self.id, self.kind)
    }
}

// =============================================================================
// Selection Group
// =============================================================================

/// A named set of related options with a cardinality rule.
///
/// ## Free Threshold
/// ```text
/// free_threshold = 2, selected: Bacon ×2, Cheese ×1 (€1.00 each)
///
///   unit:    Bacon  Bacon  Cheese
///   counted:   0      1      2
///   price:   Free   Free   €1.00   → group charges €1.00
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SelectionGroup {
    pub id: GroupId,
    pub name: String,
    pub group_type: GroupType,

    /// At least one option must be selected before the item can be committed.
    pub is_required: bool,

    /// Minimum selected units (enforced only in strict cardinality mode).
    pub min_select: u32,

    /// Maximum selected units, `0` = unbounded (strict mode only).
    pub max_select: u32,

    /// Units priced at zero before the per-unit price applies.
    pub free_threshold: u32,

    pub display_order: i64,

    /// Options, sorted by display order.
    pub options: Vec<MenuOption>,
}

impl SelectionGroup {
    /// Looks up one of this group's options by id.
    pub fn option(&self, id: OptionId) -> Option<&MenuOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Checks whether an option id belongs to this group.
    pub fn contains_option(&self, id: OptionId) -> bool {
        self.options.iter().any(|o| o.id == id)
    }

    /// Option kind carried by this group.
    #[inline]
    pub fn option_kind(&self) -> OptionKind {
        self.group_type.option_kind()
    }
}

// =============================================================================
// Item Options
// =============================================================================

/// Normalized options of one menu item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemOptions {
    pub ingredients: Vec<MenuOption>,
    pub drink_options: Vec<MenuOption>,
    pub side_options: Vec<MenuOption>,
    pub item_offers: Vec<MenuOption>,

    /// Groups, deduplicated by id and sorted by display order.
    pub selection_groups: Vec<SelectionGroup>,
}

impl ItemOptions {
    /// Looks up a group by id.
    pub fn group(&self, id: GroupId) -> Option<&SelectionGroup> {
        self.selection_groups.iter().find(|g| g.id == id)
    }

    /// Finds the group owning a `Selection` or `Exclusion` option.
    pub fn group_of(&self, key: OptionKey) -> Option<&SelectionGroup> {
        if !key.kind.is_grouped() {
            return None;
        }
        self.selection_groups
            .iter()
            .find(|g| g.option_kind() == key.kind && g.contains_option(key.id))
    }

    /// Looks up any option by id and kind.
    pub fn find_option(&self, key: OptionKey) -> Option<&MenuOption> {
        let list = match key.kind {
            OptionKind::Ingredient => &self.ingredients,
            OptionKind::Drink => &self.drink_options,
            OptionKind::Side => &self.side_options,
            OptionKind::Offer => &self.item_offers,
            OptionKind::Selection | OptionKind::Exclusion => {
                return self.group_of(key).and_then(|g| g.option(key.id));
            }
        };
        list.iter().find(|o| o.id == key.id)
    }

    /// Ingredients that are pre-selected when a session opens.
    pub fn mandatory_ingredients(&self) -> impl Iterator<Item = &MenuOption> {
        self.ingredients.iter().filter(|i| i.is_mandatory)
    }
}

// =============================================================================
// Selected Option
// =============================================================================

/// A chosen option with its quantity.
///
/// The unit price is copied when the option is selected and never
/// re-fetched, so a basket line keeps the price the customer saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOption {
    pub id: OptionId,
    pub kind: OptionKind,
    pub name: String,

    /// Units selected (always ≥ 1 while present).
    pub quantity: u32,

    pub unit_price: Money,

    #[serde(default)]
    pub is_mandatory: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub group_id: Option<GroupId>,

    /// Owning group's name, kept for basket summaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub group_name: Option<String>,

    /// Owning group's display order, kept for basket summaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub group_display_order: Option<i64>,

    #[serde(default)]
    pub display_order: i64,

    /// Offer discount (zero for every other kind).
    #[serde(default)]
    pub discount: DiscountRate,
}

impl SelectedOption {
    /// Selects one unit of a catalog option.
    pub fn from_option(option: &MenuOption, group: Option<&SelectionGroup>) -> Self {
        SelectedOption {
            id: option.id,
            kind: option.kind,
            name: option.name.clone(),
            quantity: 1,
            unit_price: option.unit_price,
            is_mandatory: option.is_mandatory,
            group_id: group.map(|g| g.id).or(option.group_id),
            group_name: group.map(|g| g.name.clone()),
            group_display_order: group.map(|g| g.display_order),
            display_order: option.display_order,
            discount: option.discount,
        }
    }

    #[inline]
    pub fn key(&self) -> OptionKey {
        OptionKey::new(self.id, self.kind)
    }

    /// Price of all units, ignoring any free threshold.
    #[inline]
    pub fn full_price(&self) -> Money {
        self.unit_price * self.quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
