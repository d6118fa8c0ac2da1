//! # Pricing Engine
//!
//! Computes the price of one configured item from its base price and the
//! selected options.
//!
//! ## Price Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Item Price Calculation                           │
//! │                                                                         │
//! │  selections ──┬── ingredient/selection with group ──► per group:        │
//! │               │                                      allocate_threshold │
//! │               │                                      (free units first) │
//! │               ├── drink / side ───────────────────► unit × quantity     │
//! │               ├── offer ──────────────────────────► max(discount)       │
//! │               └── exclusion / ungrouped extra ────► nothing (policy)    │
//! │                                                                         │
//! │  single_item_price = base + Σ groups + Σ drinks + Σ sides              │
//! │  discounted_price  = single_item_price − discount (rounded once)       │
//! │  line totals       = per-unit values × item quantity                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Free Threshold Allocation
//! Within a group the options with the highest quantity consume the free
//! allowance first (ties keep selection order). The same routine,
//! [`allocate_threshold`], drives the price and the per-option "Free" label,
//! so the two can never disagree.

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    DiscountRate, GroupId, ItemOptions, MenuOption, OptionKey, OptionKind, SelectedOption,
    SelectionGroup,
};

// =============================================================================
// Threshold Allocation
// =============================================================================

/// How the free allowance of a group was spread over one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionAllocation {
    pub key: OptionKey,
    pub unit_price: Money,
    pub free_units: u32,
    pub charged_units: u32,
}

impl OptionAllocation {
    /// The option's first unit fell inside the free allowance.
    #[inline]
    pub fn first_unit_free(&self) -> bool {
        self.free_units > 0
    }

    #[inline]
    pub fn charged(&self) -> Money {
        self.unit_price * self.charged_units
    }
}

/// Result of spreading a free threshold over a group's selections.
///
/// Entries are in allocation order (quantity descending, stable).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThresholdAllocation {
    entries: Vec<OptionAllocation>,
}

impl ThresholdAllocation {
    pub fn entries(&self) -> &[OptionAllocation] {
        &self.entries
    }

    pub fn for_option(&self, key: OptionKey) -> Option<&OptionAllocation> {
        self.entries.iter().find(|a| a.key == key)
    }

    /// Amount charged for the whole group.
    pub fn charged_total(&self) -> Money {
        self.entries.iter().map(OptionAllocation::charged).sum()
    }

    pub fn free_units(&self) -> u32 {
        self.entries.iter().map(|a| a.free_units).sum()
    }

    pub fn charged_units(&self) -> u32 {
        self.entries.iter().map(|a| a.charged_units).sum()
    }
}

/// Spreads `threshold` free units over the selections of one group.
///
/// Walks the options by descending quantity (stable for ties). A unit is
/// free while fewer than `threshold` units have been counted; every unit
/// after that is charged its unit price. A threshold of `0` charges all.
///
/// ## Example
/// ```rust
/// use bistro_core::money::Money;
/// use bistro_core::pricing::allocate_threshold;
/// use bistro_core::types::{MenuOption, OptionKind, SelectedOption};
///
/// let bacon = MenuOption::new(1, "Bacon", OptionKind::Selection, Money::from_cents(100));
/// let mut selected = SelectedOption::from_option(&bacon, None);
/// selected.quantity = 3;
///
/// let allocation = allocate_threshold(2, &[&selected]);
/// assert_eq!(allocation.free_units(), 2);
/// assert_eq!(allocation.charged_total().cents(), 100);
/// ```
pub fn allocate_threshold(threshold: u32, selections: &[&SelectedOption]) -> ThresholdAllocation {
    let mut ordered: Vec<&SelectedOption> = selections.to_vec();
    // sort_by is stable: equal quantities keep selection order
    ordered.sort_by(|a, b| b.quantity.cmp(&a.quantity));

    let mut counted: u32 = 0;
    let entries = ordered
        .into_iter()
        .map(|selection| {
            let free_units = threshold.saturating_sub(counted).min(selection.quantity);
            counted = counted.saturating_add(selection.quantity);
            OptionAllocation {
                key: selection.key(),
                unit_price: selection.unit_price,
                free_units,
                charged_units: selection.quantity - free_units,
            }
        })
        .collect();

    ThresholdAllocation { entries }
}

/// Group whose free allowance a selection counts toward.
///
/// Quotes and price labels both go through this, so a group holding mixed
/// option kinds is charged and labelled the same way.
fn threshold_group(selection: &SelectedOption) -> Option<GroupId> {
    match selection.kind {
        OptionKind::Ingredient | OptionKind::Selection => selection.group_id,
        _ => None,
    }
}

// =============================================================================
// Price Quote
// =============================================================================

/// Price of one configured item.
///
/// `original_price`, `discounted_price` and `single_item_price` are per
/// unit; multiply by `quantity` only at the basket boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Unit price before the offer discount.
    pub original_price: Money,
    /// Unit price after the best offer discount.
    pub discounted_price: Money,
    /// Best offer discount among the selected offers.
    pub discount: DiscountRate,
    /// Unit price before discount (same value as `original_price`).
    pub single_item_price: Money,
    /// Item quantity from the stepper (≥ 1).
    pub quantity: u32,
}

impl PriceQuote {
    /// Original price of the whole line.
    #[inline]
    pub fn line_original(&self) -> Money {
        self.original_price * self.quantity
    }

    /// Discounted price of the whole line.
    #[inline]
    pub fn line_discounted(&self) -> Money {
        self.discounted_price * self.quantity
    }

    #[inline]
    pub fn has_discount(&self) -> bool {
        !self.discount.is_zero()
    }
}

// =============================================================================
// Option Price Label
// =============================================================================

/// What to show next to a group option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "price", rename_all = "camelCase")]
pub enum OptionPriceLabel {
    /// Option has no price, show nothing.
    Hidden,
    /// The option's next unit is inside the free allowance.
    Free,
    /// The option costs its unit price.
    Charged(Money),
}

// =============================================================================
// Pricing Policy
// =============================================================================

/// Pricing switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Charge ingredient extras that belong to no group.
    ///
    /// Off by default: the storefront historically prices only grouped
    /// selections, drinks and sides.
    #[serde(default)]
    pub charge_ungrouped_extras: bool,
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Prices selections against one item's normalized options.
#[derive(Debug, Clone, Copy)]
pub struct PricingEngine<'a> {
    options: &'a ItemOptions,
    policy: PricingPolicy,
}

impl<'a> PricingEngine<'a> {
    pub fn new(options: &'a ItemOptions, policy: PricingPolicy) -> Self {
        PricingEngine { options, policy }
    }

    /// Prices one configured item.
    ///
    /// Pure: the same inputs always produce the same quote.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::money::Money;
    /// use bistro_core::pricing::{PricingEngine, PricingPolicy};
    /// use bistro_core::types::ItemOptions;
    ///
    /// let options = ItemOptions::default();
    /// let engine = PricingEngine::new(&options, PricingPolicy::default());
    /// let quote = engine.quote(Money::from_cents(899), &[], 2);
    /// assert_eq!(quote.line_original().cents(), 1798);
    /// ```
    pub fn quote(
        &self,
        base: Money,
        selections: &[SelectedOption],
        item_quantity: u32,
    ) -> PriceQuote {
        let mut groups: Vec<(GroupId, Vec<&SelectedOption>)> = Vec::new();
        let mut extras = Money::zero();
        let mut discount = DiscountRate::zero();

        for selection in selections {
            match selection.kind {
                OptionKind::Ingredient | OptionKind::Selection => match threshold_group(selection) {
                    Some(group_id) => match groups.iter_mut().find(|(id, _)| *id == group_id) {
                        Some((_, members)) => members.push(selection),
                        None => groups.push((group_id, vec![selection])),
                    },
                    None if self.policy.charge_ungrouped_extras => {
                        extras += selection.full_price();
                    }
                    None => {}
                },
                OptionKind::Drink | OptionKind::Side => extras += selection.full_price(),
                OptionKind::Offer => discount = discount.max(selection.discount),
                OptionKind::Exclusion => {}
            }
        }

        for (group_id, members) in &groups {
            match self.options.group(*group_id) {
                Some(group) => {
                    extras += allocate_threshold(group.free_threshold, members).charged_total();
                }
                None => {
                    warn!(group_id = *group_id, "Selections reference an unknown group, not charged");
                }
            }
        }

        let single_item_price = base + extras;
        PriceQuote {
            original_price: single_item_price,
            discounted_price: single_item_price.apply_discount(discount),
            discount,
            single_item_price,
            quantity: item_quantity.max(1),
        }
    }

    /// Allocation of a group's free allowance over the current selections.
    pub fn allocation(
        &self,
        group: &SelectionGroup,
        selections: &[SelectedOption],
    ) -> ThresholdAllocation {
        let members: Vec<&SelectedOption> = selections
            .iter()
            .filter(|s| threshold_group(s) == Some(group.id))
            .collect();
        allocate_threshold(group.free_threshold, &members)
    }

    /// Whether an option of `group` is (or would be) free.
    ///
    /// A selected option is free when its first unit is inside the allowance.
    /// An unselected option is free when the group has not used it up yet.
    pub fn is_item_free(
        &self,
        key: OptionKey,
        group: &SelectionGroup,
        selections: &[SelectedOption],
    ) -> bool {
        let allocation = self.allocation(group, selections);
        match allocation.for_option(key) {
            Some(entry) => entry.first_unit_free(),
            None => {
                let used = allocation.free_units() + allocation.charged_units();
                used < group.free_threshold
            }
        }
    }

    /// Label shown next to a group option.
    pub fn option_price_label(
        &self,
        option: &MenuOption,
        group: &SelectionGroup,
        selections: &[SelectedOption],
    ) -> OptionPriceLabel {
        if option.unit_price.is_zero() {
            OptionPriceLabel::Hidden
        } else if self.is_item_free(option.key(), group, selections) {
            OptionPriceLabel::Free
        } else {
            OptionPriceLabel::Charged(option.unit_price)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GroupType;

    fn selected(
        id: i64,
        kind: OptionKind,
        cents: i64,
        quantity: u32,
        group_id: Option<GroupId>,
    ) -> SelectedOption {
        let mut option = MenuOption::new(id, format!("Option {id}"), kind, Money::from_cents(cents));
        option.group_id = group_id;
        let mut selection = SelectedOption::from_option(&option, None);
        selection.quantity = quantity;
        selection
    }

    fn offer(id: i64, bps: u32) -> SelectedOption {
        let mut option = MenuOption::new(id, format!("Offer {id}"), OptionKind::Offer, Money::zero());
        option.discount = DiscountRate::from_bps(bps);
        SelectedOption::from_option(&option, None)
    }

    fn extras_group(threshold: u32, prices: &[i64]) -> SelectionGroup {
        SelectionGroup {
            id: 1,
            name: "Extras".to_string(),
            group_type: GroupType::Multiple,
            is_required: false,
            min_select: 0,
            max_select: 0,
            free_threshold: threshold,
            display_order: 0,
            options: prices
                .iter()
                .enumerate()
                .map(|(i, cents)| {
                    let mut option = MenuOption::new(
                        i as i64 + 1,
                        format!("Extra {i}"),
                        OptionKind::Selection,
                        Money::from_cents(*cents),
                    );
                    option.group_id = Some(1);
                    option
                })
                .collect(),
        }
    }

    fn catalog(groups: Vec<SelectionGroup>) -> ItemOptions {
        ItemOptions {
            selection_groups: groups,
            ..Default::default()
        }
    }

    #[test]
    fn test_threshold_scenario_single_option() {
        // €10 base, threshold 2, three €1 units → one charged unit
        let options = catalog(vec![extras_group(2, &[100])]);
        let engine = PricingEngine::new(&options, PricingPolicy::default());
        let selections = vec![selected(1, OptionKind::Selection, 100, 3, Some(1))];

        let quote = engine.quote(Money::from_cents(1000), &selections, 1);
        assert_eq!(quote.single_item_price.cents(), 1100);
        assert_eq!(quote.discounted_price.cents(), 1100);
    }

    #[test]
    fn test_threshold_scenario_three_options() {
        let options = catalog(vec![extras_group(2, &[100, 100, 100])]);
        let engine = PricingEngine::new(&options, PricingPolicy::default());
        let selections: Vec<_> = (1..=3)
            .map(|id| selected(id, OptionKind::Selection, 100, 1, Some(1)))
            .collect();

        let quote = engine.quote(Money::from_cents(1000), &selections, 1);
        assert_eq!(quote.original_price.cents(), 1100);
    }

    #[test]
    fn test_offer_discount_scenario() {
        let options = ItemOptions::default();
        let engine = PricingEngine::new(&options, PricingPolicy::default());

        let quote = engine.quote(Money::from_cents(800), &[offer(1, 2000)], 1);
        assert_eq!(quote.original_price.cents(), 800);
        assert_eq!(quote.discounted_price.cents(), 640);
        assert_eq!(quote.discount.bps(), 2000);
    }

    #[test]
    fn test_offers_do_not_stack() {
        let options = ItemOptions::default();
        let engine = PricingEngine::new(&options, PricingPolicy::default());

        let offers = [offer(1, 1000), offer(2, 2500), offer(3, 500)];
        let quote = engine.quote(Money::from_cents(1000), &offers, 1);
        assert_eq!(quote.discount.bps(), 2500);
        assert_eq!(quote.discounted_price.cents(), 750);
    }

    #[test]
    fn test_drinks_and_sides_charge_per_unit() {
        let options = catalog(vec![extras_group(5, &[100])]);
        let engine = PricingEngine::new(&options, PricingPolicy::default());
        let selections = vec![
            selected(1, OptionKind::Drink, 250, 2, None),
            selected(2, OptionKind::Side, 300, 1, None),
            selected(3, OptionKind::Exclusion, 0, 1, Some(9)),
        ];

        let quote = engine.quote(Money::from_cents(500), &selections, 1);
        assert_eq!(quote.original_price.cents(), 500 + 500 + 300);
    }

    #[test]
    fn test_ungrouped_extras_follow_policy() {
        let options = ItemOptions::default();
        let selections = vec![selected(1, OptionKind::Ingredient, 150, 2, None)];

        let lenient = PricingEngine::new(&options, PricingPolicy::default());
        assert_eq!(lenient.quote(Money::from_cents(500), &selections, 1).original_price.cents(), 500);

        let strict = PricingEngine::new(&options, PricingPolicy { charge_ungrouped_extras: true });
        assert_eq!(strict.quote(Money::from_cents(500), &selections, 1).original_price.cents(), 800);
    }

    #[test]
    fn test_unknown_group_is_not_charged() {
        let options = catalog(vec![extras_group(0, &[100])]);
        let engine = PricingEngine::new(&options, PricingPolicy::default());
        let selections = vec![selected(1, OptionKind::Selection, 100, 2, Some(42))];

        assert_eq!(engine.quote(Money::from_cents(500), &selections, 1).original_price.cents(), 500);
    }

    #[test]
    fn test_zero_threshold_charges_every_unit() {
        let options = catalog(vec![extras_group(0, &[100, 50])]);
        let engine = PricingEngine::new(&options, PricingPolicy::default());
        let selections = vec![
            selected(1, OptionKind::Selection, 100, 2, Some(1)),
            selected(2, OptionKind::Selection, 50, 1, Some(1)),
        ];

        assert_eq!(engine.quote(Money::zero(), &selections, 1).original_price.cents(), 250);
    }

    #[test]
    fn test_highest_quantity_consumes_allowance_first() {
        // €2 option ×1 selected first, €1 option ×3 after: the ×3 option is
        // walked first, so with threshold 3 only the €2 unit is charged.
        let selections = vec![
            selected(1, OptionKind::Selection, 200, 1, Some(1)),
            selected(2, OptionKind::Selection, 100, 3, Some(1)),
        ];
        let refs: Vec<_> = selections.iter().collect();
        let allocation = allocate_threshold(3, &refs);

        assert_eq!(allocation.entries()[0].key.id, 2);
        assert_eq!(allocation.charged_total().cents(), 200);
    }

    #[test]
    fn test_quantity_round_trip() {
        let options = catalog(vec![extras_group(1, &[120, 80])]);
        let engine = PricingEngine::new(&options, PricingPolicy::default());
        let selections = vec![
            selected(1, OptionKind::Selection, 120, 2, Some(1)),
            selected(2, OptionKind::Selection, 80, 1, Some(1)),
            offer(9, 1250),
        ];
        let base = Money::from_cents(999);

        let one = engine.quote(base, &selections, 1);
        for qty in 1..=12 {
            let many = engine.quote(base, &selections, qty);
            assert_eq!(many.single_item_price * qty, one.single_item_price * qty);
            assert_eq!(many.line_discounted(), one.discounted_price * qty);
        }
    }

    #[test]
    fn test_option_price_label() {
        let group = extras_group(1, &[100, 0]);
        let options = catalog(vec![group.clone()]);
        let engine = PricingEngine::new(&options, PricingPolicy::default());

        // nothing selected yet: allowance available
        assert_eq!(engine.option_price_label(&group.options[0], &group, &[]), OptionPriceLabel::Free);
        // zero price never shows a label
        assert_eq!(engine.option_price_label(&group.options[1], &group, &[]), OptionPriceLabel::Hidden);

        let selections = vec![selected(1, OptionKind::Selection, 100, 2, Some(1))];
        assert_eq!(
            engine.option_price_label(&group.options[0], &group, &selections),
            OptionPriceLabel::Free
        );

        let selections = vec![
            selected(2, OptionKind::Selection, 0, 1, Some(1)),
            selected(1, OptionKind::Selection, 100, 1, Some(1)),
        ];
        assert_eq!(
            engine.option_price_label(&group.options[0], &group, &selections),
            OptionPriceLabel::Charged(Money::from_cents(100))
        );
    }

    #[test]
    fn test_mixed_kind_group_label_matches_quote() {
        let group = extras_group(2, &[100]);
        let options = catalog(vec![group.clone()]);
        let engine = PricingEngine::new(&options, PricingPolicy::default());

        // an ingredient filed under the group uses up the allowance first
        let selections = vec![
            selected(1, OptionKind::Selection, 100, 1, Some(1)),
            selected(10, OptionKind::Ingredient, 200, 2, Some(1)),
        ];

        let quote = engine.quote(Money::from_cents(1000), &selections, 1);
        assert_eq!(quote.single_item_price.cents(), 1100);
        assert_eq!(
            engine.option_price_label(&group.options[0], &group, &selections),
            OptionPriceLabel::Charged(Money::from_cents(100))
        );
        assert_eq!(engine.allocation(&group, &selections).charged_total().cents(), 100);
    }

    /// Unit-by-unit walk used as the reference for the allocation routine.
    fn reference_walk(threshold: u32, selections: &[SelectedOption]) -> (Money, Vec<(OptionKey, bool)>) {
        let mut order: Vec<&SelectedOption> = selections.iter().collect();
        order.sort_by(|a, b| b.quantity.cmp(&a.quantity));

        let mut counted = 0;
        let mut total = Money::zero();
        let mut first_units = Vec::new();
        for selection in order {
            first_units.push((selection.key(), counted < threshold));
            for _ in 0..selection.quantity {
                if counted < threshold {
                    counted += 1;
                } else {
                    total += selection.unit_price;
                }
            }
        }
        (total, first_units)
    }

    #[test]
    fn test_allocation_agrees_with_free_label_exhaustively() {
        // distinct prices make the charged total identify the charged units
        let prices = [10_000, 100, 1];
        let group = extras_group(0, &prices);

        for threshold in 0..=5 {
            let mut group = group.clone();
            group.free_threshold = threshold;
            let options = catalog(vec![group.clone()]);
            let engine = PricingEngine::new(&options, PricingPolicy::default());

            for a in 0..=3u32 {
                for b in 0..=3u32 {
                    for c in 0..=3u32 {
                        let selections: Vec<SelectedOption> = [a, b, c]
                            .iter()
                            .zip(prices.iter())
                            .enumerate()
                            .filter(|(_, (qty, _))| **qty > 0)
                            .map(|(i, (qty, cents))| {
                                selected(i as i64 + 1, OptionKind::Selection, *cents, *qty, Some(1))
                            })
                            .collect();

                        let (expected_total, first_units) = reference_walk(threshold, &selections);
                        let allocation = engine.allocation(&group, &selections);
                        assert_eq!(allocation.charged_total(), expected_total);

                        let units = a + b + c;
                        assert_eq!(allocation.free_units(), units.min(threshold));
                        assert_eq!(allocation.charged_units(), units.saturating_sub(threshold));

                        for (key, first_free) in first_units {
                            assert_eq!(engine.is_item_free(key, &group, &selections), first_free);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_free_unit_count_ignores_call_order() {
        let selections = vec![
            selected(1, OptionKind::Selection, 100, 2, Some(1)),
            selected(2, OptionKind::Selection, 100, 3, Some(1)),
            selected(3, OptionKind::Selection, 100, 1, Some(1)),
        ];
        let forward: Vec<_> = selections.iter().collect();
        let backward: Vec<_> = selections.iter().rev().collect();

        for threshold in 0..=7 {
            let a = allocate_threshold(threshold, &forward);
            let b = allocate_threshold(threshold, &backward);
            assert_eq!(a.free_units(), b.free_units());
            assert_eq!(a.charged_total(), b.charged_total());
        }
    }
}
