//! # Selection State
//!
//! Holds the options chosen for the item currently being configured.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Selected Option Lifecycle                         │
//! │                                                                         │
//! │   (absent) ──select/toggle──► qty 1 ──set_quantity(n)──► qty n          │
//! │       ▲                         │                          │            │
//! │       │                         │ deselect/toggle          │ qty → 0    │
//! │       └─────────────────────────┴──────────────────────────┘            │
//! │                                                                         │
//! │   Mandatory ingredient: seeded at qty 1, never leaves, never changes.   │
//! │   SINGLE group:         selecting B removes A from the same group.      │
//! │   Exclusion / Offer:    always qty 1.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation reports what it did through [`SelectionChange`], so the
//! owning session knows when pricing and validation must be re-run.

use std::collections::HashMap;
use tracing::debug;

use crate::types::{
    GroupId, GroupType, ItemOptions, MenuOption, OptionKey, OptionKind, SelectedOption,
    SelectionGroup,
};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Selection Change
// =============================================================================

/// Outcome of a selection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// Option was added with quantity 1.
    Added(OptionKey),
    /// Option was removed.
    Removed(OptionKey),
    /// Option quantity changed.
    Updated { key: OptionKey, quantity: u32 },
    /// Nothing changed (no-op or rejected operation).
    Unchanged,
}

impl SelectionChange {
    #[inline]
    pub fn is_change(&self) -> bool {
        !matches!(self, SelectionChange::Unchanged)
    }
}

// =============================================================================
// Selection State
// =============================================================================

/// The customer's current choices for one item.
#[derive(Debug, Clone)]
pub struct SelectionState {
    entries: Vec<SelectedOption>,
    /// Mandatory ingredients, restored by `reset`.
    seed: Vec<SelectedOption>,
    group_types: HashMap<GroupId, GroupType>,
}

impl SelectionState {
    /// Creates the initial state: only mandatory ingredients, quantity 1.
    pub fn new(options: &ItemOptions) -> Self {
        let seed: Vec<SelectedOption> = options
            .mandatory_ingredients()
            .map(|ingredient| SelectedOption::from_option(ingredient, None))
            .collect();

        let group_types = options
            .selection_groups
            .iter()
            .map(|g| (g.id, g.group_type))
            .collect();

        SelectionState {
            entries: seed.clone(),
            seed,
            group_types,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Current selections in selection order.
    #[inline]
    pub fn selections(&self) -> &[SelectedOption] {
        &self.entries
    }

    /// Owned copy of the current selections.
    pub fn snapshot(&self) -> Vec<SelectedOption> {
        self.entries.clone()
    }

    pub fn contains(&self, key: OptionKey) -> bool {
        self.position(key).is_some()
    }

    /// Quantity of an option, `0` when not selected.
    pub fn quantity_of(&self, key: OptionKey) -> u32 {
        self.position(key).map_or(0, |i| self.entries[i].quantity)
    }

    pub fn get(&self, key: OptionKey) -> Option<&SelectedOption> {
        self.position(key).map(|i| &self.entries[i])
    }

    /// Total selected units belonging to a group.
    pub fn units_in_group(&self, group_id: GroupId) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.group_id == Some(group_id) && e.kind.is_grouped())
            .map(|e| e.quantity)
            .sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Selects one unit of an option.
    ///
    /// Already selected options are left untouched. In a SINGLE group every
    /// other option of that group is removed first.
    pub fn select(&mut self, option: &MenuOption, group: Option<&SelectionGroup>) -> SelectionChange {
        let key = option.key();
        if self.contains(key) {
            return SelectionChange::Unchanged;
        }

        if let Some(group) = group.filter(|g| g.group_type == GroupType::Single) {
            let before = self.entries.len();
            self.entries
                .retain(|e| !(e.kind == OptionKind::Selection && e.group_id == Some(group.id)));
            if self.entries.len() != before {
                debug!(group_id = group.id, "Replaced previous choice in single-choice group");
            }
        }

        self.entries.push(SelectedOption::from_option(option, group));
        debug!(option_id = key.id, kind = %key.kind, "Option selected");
        SelectionChange::Added(key)
    }

    /// Checkbox behaviour: removes a selected option, selects an absent one.
    ///
    /// Mandatory ingredients stay selected.
    pub fn toggle(&mut self, option: &MenuOption, group: Option<&SelectionGroup>) -> SelectionChange {
        if self.contains(option.key()) {
            self.deselect(option.key())
        } else {
            self.select(option, group)
        }
    }

    /// Removes an option. Rejected (no-op) for mandatory ingredients.
    pub fn deselect(&mut self, key: OptionKey) -> SelectionChange {
        let Some(index) = self.position(key) else {
            return SelectionChange::Unchanged;
        };
        if self.entries[index].is_mandatory {
            debug!(option_id = key.id, "Mandatory ingredient cannot be removed");
            return SelectionChange::Unchanged;
        }

        self.entries.remove(index);
        debug!(option_id = key.id, kind = %key.kind, "Option deselected");
        SelectionChange::Removed(key)
    }

    /// Sets the quantity of a selected option.
    ///
    /// `0` removes the option. Options with a fixed quantity of one (SINGLE
    /// group choices, exclusions, offers, mandatory ingredients) ignore any
    /// other value. Quantities above [`MAX_ITEM_QUANTITY`] are capped.
    pub fn set_quantity(&mut self, key: OptionKey, quantity: u32) -> SelectionChange {
        let Some(index) = self.position(key) else {
            return SelectionChange::Unchanged;
        };

        if quantity == 0 {
            return self.deselect(key);
        }
        if self.is_fixed_single(&self.entries[index]) {
            return SelectionChange::Unchanged;
        }

        let quantity = quantity.min(MAX_ITEM_QUANTITY);
        let entry = &mut self.entries[index];
        if entry.quantity == quantity {
            return SelectionChange::Unchanged;
        }

        entry.quantity = quantity;
        debug!(option_id = key.id, kind = %key.kind, quantity, "Option quantity updated");
        SelectionChange::Updated { key, quantity }
    }

    /// Quantity stepper: adds `delta` (may be negative), clamping at zero.
    pub fn adjust_quantity(&mut self, key: OptionKey, delta: i32) -> SelectionChange {
        if delta == 0 {
            return SelectionChange::Unchanged;
        }
        let current = i64::from(self.quantity_of(key));
        let target = (current + i64::from(delta)).max(0);
        self.set_quantity(key, u32::try_from(target).unwrap_or(u32::MAX))
    }

    /// Back to the initial state (mandatory ingredients only).
    pub fn reset(&mut self) {
        self.entries = self.seed.clone();
        debug!(mandatory = self.seed.len(), "Selection reset");
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn position(&self, key: OptionKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key() == key)
    }

    fn is_fixed_single(&self, entry: &SelectedOption) -> bool {
        if entry.is_mandatory {
            return true;
        }
        match entry.kind {
            OptionKind::Exclusion | OptionKind::Offer => true,
            OptionKind::Selection => entry
                .group_id
                .and_then(|id| self.group_types.get(&id))
                .is_some_and(|t| *t == GroupType::Single),
            OptionKind::Ingredient | OptionKind::Drink | OptionKind::Side => false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
