//! # Configuration Session
//!
//! One open item popup: the item, its normalized options, the current
//! selections, the item quantity stepper and the note.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Configuration Session                               │
//! │                                                                         │
//! │  open(token, item, options)                                            │
//! │       │  selections = mandatory ingredients                            │
//! │       ▼                                                                 │
//! │  toggle / select / set_option_quantity / set_quantity / set_note       │
//! │       │  each real change: revision += 1, re-price, re-validate        │
//! │       ▼                                                                 │
//! │  quote() / verdict()  (cached, never stale)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commit() ──► ConfiguredLineItem      or SelectionIncomplete           │
//! │               (session stays usable)     (selections kept)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::basket::ConfiguredLineItem;
use crate::catalog::display_groups;
use crate::error::CoreResult;
use crate::pricing::{OptionPriceLabel, PriceQuote, PricingEngine, PricingPolicy};
use crate::selection::{SelectionChange, SelectionState};
use crate::types::{GroupId, ItemOptions, MenuItem, OptionKey, SelectedOption, SelectionGroup};
use crate::validation::{validate_note, validate_quantity, validate_selections, CardinalityMode, SelectionVerdict};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Session Token
// =============================================================================

/// Identifies one "open item" action.
///
/// Tokens grow monotonically; a response carrying an older token than the
/// current one belongs to a superseded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionToken(u64);

impl SessionToken {
    #[inline]
    pub const fn new(value: u64) -> Self {
        SessionToken(value)
    }

    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The token issued after this one.
    #[inline]
    pub const fn next(&self) -> Self {
        SessionToken(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Configuration Session
// =============================================================================

/// The single state object of an open item popup.
#[derive(Debug, Clone)]
pub struct ConfigurationSession {
    token: SessionToken,
    item: MenuItem,
    options: ItemOptions,
    selection: SelectionState,
    quantity: u32,
    note: String,
    policy: PricingPolicy,
    mode: CardinalityMode,
    revision: u64,
    quote: PriceQuote,
    verdict: SelectionVerdict,
}

impl ConfigurationSession {
    /// Opens a session with default pricing and validation rules.
    pub fn open(token: SessionToken, item: MenuItem, options: ItemOptions) -> Self {
        Self::with_rules(token, item, options, PricingPolicy::default(), CardinalityMode::default())
    }

    /// Opens a session with explicit rules.
    pub fn with_rules(
        token: SessionToken,
        item: MenuItem,
        options: ItemOptions,
        policy: PricingPolicy,
        mode: CardinalityMode,
    ) -> Self {
        let selection = SelectionState::new(&options);
        let quote = PricingEngine::new(&options, policy).quote(item.price, selection.selections(), 1);
        let verdict = validate_selections(&options, selection.selections(), mode);

        debug!(%token, item_id = item.id, "Configuration session opened");

        ConfigurationSession {
            token,
            item,
            options,
            selection,
            quantity: 1,
            note: String::new(),
            policy,
            mode,
            revision: 0,
            quote,
            verdict,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[inline]
    pub fn token(&self) -> SessionToken {
        self.token
    }

    #[inline]
    pub fn item(&self) -> &MenuItem {
        &self.item
    }

    #[inline]
    pub fn options(&self) -> &ItemOptions {
        &self.options
    }

    #[inline]
    pub fn selections(&self) -> &[SelectedOption] {
        self.selection.selections()
    }

    #[inline]
    pub fn selection_state(&self) -> &SelectionState {
        &self.selection
    }

    /// Item quantity from the stepper (≥ 1).
    #[inline]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    #[inline]
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Bumped on every change that affects price or validity.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current price (per unit values plus the stepper quantity).
    #[inline]
    pub fn quote(&self) -> &PriceQuote {
        &self.quote
    }

    #[inline]
    pub fn verdict(&self) -> &SelectionVerdict {
        &self.verdict
    }

    #[inline]
    pub fn can_commit(&self) -> bool {
        self.verdict.is_satisfied()
    }

    /// Required groups still empty.
    pub fn missing_groups(&self) -> &[GroupId] {
        self.verdict.missing_groups()
    }

    /// Groups to render, with same-name duplicates collapsed.
    pub fn display_groups(&self) -> Vec<&SelectionGroup> {
        display_groups(&self.options)
    }

    /// Price label for a group option, `None` for options outside any group.
    pub fn option_label(&self, key: OptionKey) -> Option<OptionPriceLabel> {
        let group = self.options.group_of(key)?;
        let option = group.option(key.id)?;
        let engine = PricingEngine::new(&self.options, self.policy);
        Some(engine.option_price_label(option, group, self.selection.selections()))
    }

    // -------------------------------------------------------------------------
    // Selection Mutations
    // -------------------------------------------------------------------------

    /// Selects an option of this item's catalog.
    pub fn select(&mut self, key: OptionKey) -> SelectionChange {
        let Some(option) = self.options.find_option(key) else {
            warn!(option_id = key.id, kind = %key.kind, "Option not in catalog");
            return SelectionChange::Unchanged;
        };
        let change = self.selection.select(option, self.options.group_of(key));
        self.after_change(change)
    }

    /// Checkbox behaviour, see [`SelectionState::toggle`].
    pub fn toggle(&mut self, key: OptionKey) -> SelectionChange {
        let Some(option) = self.options.find_option(key) else {
            warn!(option_id = key.id, kind = %key.kind, "Option not in catalog");
            return SelectionChange::Unchanged;
        };
        let change = self.selection.toggle(option, self.options.group_of(key));
        self.after_change(change)
    }

    pub fn deselect(&mut self, key: OptionKey) -> SelectionChange {
        let change = self.selection.deselect(key);
        self.after_change(change)
    }

    pub fn set_option_quantity(&mut self, key: OptionKey, quantity: u32) -> SelectionChange {
        let change = self.selection.set_quantity(key, quantity);
        self.after_change(change)
    }

    pub fn adjust_option_quantity(&mut self, key: OptionKey, delta: i32) -> SelectionChange {
        let change = self.selection.adjust_quantity(key, delta);
        self.after_change(change)
    }

    /// Back to mandatory ingredients, quantity 1 and no note.
    pub fn reset(&mut self) {
        self.selection.reset();
        self.quantity = 1;
        self.note.clear();
        self.refresh();
    }

    // -------------------------------------------------------------------------
    // Stepper & Note
    // -------------------------------------------------------------------------

    /// Sets the item quantity (1..=MAX_ITEM_QUANTITY).
    pub fn set_quantity(&mut self, quantity: u32) -> CoreResult<()> {
        validate_quantity(i64::from(quantity))?;
        if quantity != self.quantity {
            self.quantity = quantity;
            self.refresh();
        }
        Ok(())
    }

    /// Item stepper: the quantity never drops below 1 nor exceeds the maximum.
    pub fn adjust_quantity(&mut self, delta: i32) -> u32 {
        let target = (i64::from(self.quantity) + i64::from(delta)).clamp(1, i64::from(MAX_ITEM_QUANTITY));
        let target = u32::try_from(target).unwrap_or(1);
        if target != self.quantity {
            self.quantity = target;
            self.refresh();
        }
        self.quantity
    }

    /// Sets the free-text note (trimmed).
    pub fn set_note(&mut self, note: &str) -> CoreResult<()> {
        self.note = validate_note(note)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Commit
    // -------------------------------------------------------------------------

    /// Produces the basket line for the current configuration.
    ///
    /// Fails with `SelectionIncomplete` while required groups are empty; the
    /// session and its selections are left untouched either way.
    pub fn commit(&self) -> CoreResult<ConfiguredLineItem> {
        self.verdict.clone().into_result()?;

        let line = ConfiguredLineItem::new(
            &self.item,
            self.selection.snapshot(),
            &self.quote,
            self.quantity,
            &self.note,
        );
        debug!(
            token = %self.token,
            item_id = self.item.id,
            quantity = self.quantity,
            "Configuration committed"
        );
        Ok(line)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn after_change(&mut self, change: SelectionChange) -> SelectionChange {
        if change.is_change() {
            self.refresh();
        }
        change
    }

    fn refresh(&mut self) {
        let engine = PricingEngine::new(&self.options, self.policy);
        self.quote = engine.quote(self.item.price, self.selection.selections(), self.quantity);
        self.verdict = validate_selections(&self.options, self.selection.selections(), self.mode);
        self.revision += 1;
        debug!(
            revision = self.revision,
            unit = %self.quote.discounted_price,
            line = %self.quote.line_discounted(),
            committable = self.verdict.is_satisfied(),
            "Configuration re-priced"
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
