//! # Validation Module
//!
//! Selection constraint checks and input validation for Bistro.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Item popup                                                   │
//! │  ├── validate_selections(): required groups (+ min/max when strict)    │
//! │  └── Gates "Add to basket"; selections are never discarded             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Basket & checkout forms                                      │
//! │  ├── validate_quantity / validate_note / validate_coupon_code          │
//! │  └── validate_email / validate_phone / validate_required               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Restaurant API                                               │
//! │  └── Coupon schedule, minimum order value, payment                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bistro_core::validation::{validate_coupon_code, validate_quantity};
//!
//! assert!(validate_coupon_code(" LUNCH-20 ").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{GroupId, GroupType, ItemOptions, OptionKind, SelectedOption, SelectionGroup};
use crate::{MAX_ITEM_QUANTITY, MAX_NOTE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a coupon code.
const MAX_COUPON_CODE_LENGTH: usize = 50;

// =============================================================================
// Selection Constraints
// =============================================================================

/// How strictly group cardinality is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardinalityMode {
    /// A required group needs at least one selected option. Min/max are
    /// informational.
    #[default]
    Presence,
    /// Presence, plus `min_select` / `max_select` on selected units.
    Strict,
}

/// A group whose selected units fall outside its limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CardinalityViolation {
    pub group_id: GroupId,
    pub group_name: String,
    pub selected: u32,
    pub min: u32,
    /// `0` means unbounded.
    pub max: u32,
}

/// Whether the configured item may be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SelectionVerdict {
    Satisfied,
    #[serde(rename_all = "camelCase")]
    Blocked {
        missing_groups: Vec<GroupId>,
        violations: Vec<CardinalityViolation>,
    },
}

impl SelectionVerdict {
    #[inline]
    pub fn is_satisfied(&self) -> bool {
        matches!(self, SelectionVerdict::Satisfied)
    }

    /// Required groups with nothing selected.
    pub fn missing_groups(&self) -> &[GroupId] {
        match self {
            SelectionVerdict::Satisfied => &[],
            SelectionVerdict::Blocked { missing_groups, .. } => missing_groups.as_slice(),
        }
    }

    /// Converts a blocked verdict into [`CoreError::SelectionIncomplete`].
    pub fn into_result(self) -> CoreResult<()> {
        match self {
            SelectionVerdict::Satisfied => Ok(()),
            SelectionVerdict::Blocked {
                missing_groups,
                violations,
            } => Err(CoreError::SelectionIncomplete {
                missing_groups,
                violations,
            }),
        }
    }
}

/// Checks every selection group against the current selections.
///
/// A group counts an option as present when one of its option ids is
/// selected as a group selection. EXCLUSIONS groups are always satisfied.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Item popup: "Add to basket"                                           │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_selections() ← THIS FUNCTION                                 │
/// │       │                                                                 │
/// │       ├── required group empty? → Blocked { missing_groups: [id] }     │
/// │       │                                                                 │
/// │       ├── strict and outside min/max? → Blocked { violations }         │
/// │       │                                                                 │
/// │       └── Satisfied → price and commit line item                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_selections(
    options: &ItemOptions,
    selections: &[SelectedOption],
    mode: CardinalityMode,
) -> SelectionVerdict {
    let mut missing_groups = Vec::new();
    let mut violations = Vec::new();

    for group in &options.selection_groups {
        if group.group_type == GroupType::Exclusions {
            continue;
        }

        let selected = selected_units(group, selections);
        if selected == 0 {
            if group.is_required {
                missing_groups.push(group.id);
            }
            continue;
        }

        if mode == CardinalityMode::Strict {
            let below = selected < group.min_select;
            let above = group.max_select > 0 && selected > group.max_select;
            if below || above {
                violations.push(CardinalityViolation {
                    group_id: group.id,
                    group_name: group.name.clone(),
                    selected,
                    min: group.min_select,
                    max: group.max_select,
                });
            }
        }
    }

    if missing_groups.is_empty() && violations.is_empty() {
        SelectionVerdict::Satisfied
    } else {
        SelectionVerdict::Blocked {
            missing_groups,
            violations,
        }
    }
}

fn selected_units(group: &SelectionGroup, selections: &[SelectedOption]) -> u32 {
    selections
        .iter()
        .filter(|s| s.kind == OptionKind::Selection && group.contains_option(s.id))
        .map(|s| s.quantity)
        .sum()
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a required text field is filled in.
///
/// ## Example
/// ```rust
/// use bistro_core::validation::validate_required;
///
/// assert!(validate_required("firstName", "Ada").is_ok());
/// assert!(validate_required("firstName", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an item note.
///
/// ## Rules
/// - Can be empty
/// - Maximum MAX_NOTE_LENGTH (500) characters
///
/// ## Returns
/// The trimmed note.
pub fn validate_note(note: &str) -> ValidationResult<String> {
    let note = note.trim();

    if note.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }

    Ok(note.to_string())
}

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Returns
/// The trimmed code.
pub fn validate_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "coupon code".to_string(),
        });
    }

    if code.chars().count() > MAX_COUPON_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "coupon code".to_string(),
            max: MAX_COUPON_CODE_LENGTH,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "coupon code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_string())
}

/// Validates an email address.
///
/// Structural check only: one `@`, a non-empty local part, a dotted domain
/// and no whitespace. Deliverability is the restaurant's concern.
///
/// ## Example
/// ```rust
/// use bistro_core::validation::validate_email;
///
/// assert!(validate_email("ada@example.com").is_ok());
/// assert!(validate_email("ada@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid("must contain @"));
    };

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must contain exactly one @ after a name"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid("domain must look like example.com"));
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Digits, spaces, `+`, `-`, `(`, `)` and `/` only
/// - Between 6 and 20 digits
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '/'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits and + - ( ) /".to_string(),
        });
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(6..=20).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must have between 6 and 20 digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item or basket line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > i64::from(MAX_ITEM_QUANTITY) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::from(MAX_ITEM_QUANTITY),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::MenuOption;

    fn group(
        id: GroupId,
        group_type: GroupType,
        required: bool,
        min: u32,
        max: u32,
    ) -> SelectionGroup {
        let options = (1..=3)
            .map(|n| {
                let option_id = id * 10 + n;
                let mut option = MenuOption::new(
                    option_id,
                    format!("Option {option_id}"),
                    group_type.option_kind(),
                    Money::zero(),
                );
                option.group_id = Some(id);
                option
            })
            .collect();
        SelectionGroup {
            id,
            name: format!("Group {id}"),
            group_type,
            is_required: required,
            min_select: min,
            max_select: max,
            free_threshold: 0,
            display_order: 0,
            options,
        }
    }

    fn pick(group: &SelectionGroup, index: usize, quantity: u32) -> SelectedOption {
        let mut selected = SelectedOption::from_option(&group.options[index], Some(group));
        selected.quantity = quantity;
        selected
    }

    fn catalog() -> ItemOptions {
        ItemOptions {
            selection_groups: vec![
                group(1, GroupType::Single, true, 1, 1),
                group(2, GroupType::Multiple, false, 1, 3),
                group(3, GroupType::Exclusions, true, 0, 0),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_required_group_missing() {
        let options = catalog();
        let verdict = validate_selections(&options, &[], CardinalityMode::Presence);

        assert!(!verdict.is_satisfied());
        assert_eq!(verdict.missing_groups(), &[1]);

        let err = verdict.into_result().unwrap_err();
        assert!(matches!(err, CoreError::SelectionIncomplete { .. }));
    }

    #[test]
    fn test_required_group_satisfied() {
        let options = catalog();
        let selections = vec![pick(&options.selection_groups[0], 1, 1)];
        let verdict = validate_selections(&options, &selections, CardinalityMode::Presence);
        assert_eq!(verdict, SelectionVerdict::Satisfied);
    }

    #[test]
    fn test_exclusion_group_never_required() {
        let mut options = catalog();
        options.selection_groups.retain(|g| g.group_type == GroupType::Exclusions);
        let verdict = validate_selections(&options, &[], CardinalityMode::Strict);
        assert!(verdict.is_satisfied());
    }

    #[test]
    fn test_ingredient_with_same_id_does_not_satisfy_group() {
        let options = catalog();
        let ingredient = MenuOption::new(11, "Lookalike", OptionKind::Ingredient, Money::zero());
        let selections = vec![SelectedOption::from_option(&ingredient, None)];

        let verdict = validate_selections(&options, &selections, CardinalityMode::Presence);
        assert_eq!(verdict.missing_groups(), &[1]);
    }

    #[test]
    fn test_presence_mode_ignores_limits() {
        let options = catalog();
        let selections = vec![
            pick(&options.selection_groups[0], 0, 1),
            pick(&options.selection_groups[1], 0, 4),
        ];
        let verdict = validate_selections(&options, &selections, CardinalityMode::Presence);
        assert!(verdict.is_satisfied());
    }

    #[test]
    fn test_strict_mode_enforces_max() {
        let options = catalog();
        let selections = vec![
            pick(&options.selection_groups[0], 0, 1),
            pick(&options.selection_groups[1], 0, 2),
            pick(&options.selection_groups[1], 1, 2),
        ];

        match validate_selections(&options, &selections, CardinalityMode::Strict) {
            SelectionVerdict::Blocked {
                missing_groups,
                violations,
            } => {
                assert!(missing_groups.is_empty());
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].group_id, 2);
                assert_eq!(violations[0].selected, 4);
            }
            SelectionVerdict::Satisfied => panic!("expected a max_select violation"),
        }
    }

    #[test]
    fn test_strict_mode_enforces_min_on_touched_groups() {
        let mut options = catalog();
        options.selection_groups[1].min_select = 2;

        // untouched optional group: no violation
        let selections = vec![pick(&options.selection_groups[0], 0, 1)];
        assert!(validate_selections(&options, &selections, CardinalityMode::Strict).is_satisfied());

        // one unit selected, two needed
        let mut selections = selections;
        selections.push(pick(&options.selection_groups[1], 2, 1));
        assert!(!validate_selections(&options, &selections, CardinalityMode::Strict).is_satisfied());
    }

    #[test]
    fn test_strict_mode_zero_max_is_unbounded() {
        let mut options = catalog();
        options.selection_groups[1].max_select = 0;
        let selections = vec![
            pick(&options.selection_groups[0], 0, 1),
            pick(&options.selection_groups[1], 0, 50),
        ];
        assert!(validate_selections(&options, &selections, CardinalityMode::Strict).is_satisfied());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("lastName", "Lovelace").is_ok());
        let err = validate_required("lastName", "").unwrap_err();
        assert_eq!(err.field(), "lastName");
    }

    #[test]
    fn test_validate_note() {
        assert_eq!(validate_note("  no onions ").unwrap(), "no onions");
        assert_eq!(validate_note("").unwrap(), "");
        assert!(validate_note(&"x".repeat(MAX_NOTE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_coupon_code() {
        assert_eq!(validate_coupon_code(" SUMMER_10 ").unwrap(), "SUMMER_10");
        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("WITH SPACE").is_err());
        assert!(validate_coupon_code(&"A".repeat(60)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.de").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@@example.com").is_err());
        assert!(validate_email("ada@example.").is_err());
        assert!(validate_email("ada @example.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+49 (0)30 123456").is_ok());
        assert!(validate_phone("030/1234567").is_ok());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }
}
