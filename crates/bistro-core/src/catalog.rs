//! # Catalog Normalizer
//!
//! Turns the raw per-item options payload returned by the restaurant API
//! into [`ItemOptions`].
//!
//! ## Payload Shape
//! ```text
//! {
//!   "Ingredients":             [{ Id, Name, ExtraCost, IsMandatory, CanExclude }],
//!   "DrinkOptions":            [{ Id, Name, Price }],
//!   "SideOptions":             [{ Id, Name, Price }],
//!   "ItemOffers":              [{ Id, Offer: { Name, Description, DiscountPercentage } }],
//!   "SelectionGroups":         [{ Id, Name, Type, IsRequired, MinSelect, MaxSelect,
//!                                 Threshold, DisplayOrder, Options: [{ Id, Name, Price,
//!                                 DisplayOrder }] }],
//!   "CategorySelectionGroups": [ ...same as SelectionGroups... ]
//! }
//! ```
//!
//! ## Parsing Policy
//! The catalog is edited by hand in the restaurant back office, so parsing
//! is permissive: a bad field degrades to a default and is logged, it never
//! fails the whole fetch. Only a payload that is not a JSON object is
//! rejected with [`CoreError::CatalogUnavailable`].
//!
//! | Field            | Missing / malformed   |
//! |------------------|-----------------------|
//! | price            | `0`                   |
//! | `Threshold`      | `0` (every unit paid) |
//! | `DisplayOrder`   | `0`                   |
//! | `Type`           | `MULTIPLE`            |
//! | `Id`             | entry dropped         |
//! | list field       | empty list            |

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DiscountRate, GroupType, ItemOptions, MenuOption, OptionKind, SelectionGroup};

// =============================================================================
// Entry Points
// =============================================================================

/// Parses payload text and normalizes it.
pub fn parse_item_options(text: &str) -> CoreResult<ItemOptions> {
    let payload: Value = serde_json::from_str(text).map_err(|e| CoreError::CatalogUnavailable {
        reason: format!("invalid JSON: {e}"),
    })?;
    normalize(&payload)
}

/// Normalizes a raw options payload.
///
/// Item-level groups are read before category-level groups, so when both
/// lists carry the same group id the item-level entry wins.
pub fn normalize(payload: &Value) -> CoreResult<ItemOptions> {
    let Some(root) = payload.as_object() else {
        return Err(CoreError::CatalogUnavailable {
            reason: format!("expected a JSON object, got {}", kind_of(payload)),
        });
    };

    let ingredients = entries(root, "Ingredients")
        .iter()
        .filter_map(|raw| {
            let mut option =
                simple_option(raw, OptionKind::Ingredient, "ExtraCost", "Unknown Ingredient")?;
            option.is_mandatory = bool_field(raw, "IsMandatory");
            option.can_exclude = bool_field(raw, "CanExclude");
            Some(option)
        })
        .collect();

    let drink_options = entries(root, "DrinkOptions")
        .iter()
        .filter_map(|raw| simple_option(raw, OptionKind::Drink, "Price", "Unknown Drink"))
        .collect();

    let side_options = entries(root, "SideOptions")
        .iter()
        .filter_map(|raw| simple_option(raw, OptionKind::Side, "Price", "Unknown Side"))
        .collect();

    let item_offers = entries(root, "ItemOffers").iter().filter_map(offer).collect();

    let mut seen = HashSet::new();
    let mut selection_groups: Vec<SelectionGroup> = entries(root, "SelectionGroups")
        .iter()
        .chain(entries(root, "CategorySelectionGroups"))
        .filter_map(group)
        .filter(|g| seen.insert(g.id))
        .collect();
    // stable: equal display orders keep payload order
    selection_groups.sort_by_key(|g| g.display_order);

    let options = ItemOptions {
        ingredients,
        drink_options,
        side_options,
        item_offers,
        selection_groups,
    };

    debug!(
        ingredients = options.ingredients.len(),
        drinks = options.drink_options.len(),
        sides = options.side_options.len(),
        offers = options.item_offers.len(),
        groups = options.selection_groups.len(),
        "Normalized item options"
    );

    Ok(options)
}

/// Groups to render, with same-name duplicates collapsed.
///
/// Among groups sharing a name only the one with the highest display order
/// is kept (the first one on a tie). This is a presentation filter: pricing
/// and validation always work on the id-deduplicated list.
pub fn display_groups(options: &ItemOptions) -> Vec<&SelectionGroup> {
    let mut winner: HashMap<&str, (i64, usize)> = HashMap::new();
    for (index, group) in options.selection_groups.iter().enumerate() {
        winner
            .entry(group.name.as_str())
            .and_modify(|best| {
                if group.display_order > best.0 {
                    *best = (group.display_order, index);
                }
            })
            .or_insert((group.display_order, index));
    }

    options
        .selection_groups
        .iter()
        .enumerate()
        .filter(|(index, group)| winner.get(group.name.as_str()).map(|w| w.1) == Some(*index))
        .map(|(_, group)| group)
        .collect()
}

// =============================================================================
// Entry Mapping
// =============================================================================

fn simple_option(
    raw: &Value,
    kind: OptionKind,
    price_field: &str,
    fallback_name: &str,
) -> Option<MenuOption> {
    let id = id_field(raw, kind.as_str())?;
    let name = text_field(raw, "Name", fallback_name);
    let mut option = MenuOption::new(id, name, kind, price_field_of(raw, price_field));
    option.display_order = int_field(raw, "DisplayOrder");
    Some(option)
}

fn offer(raw: &Value) -> Option<MenuOption> {
    let id = id_field(raw, "offer")?;
    let details = raw.get("Offer").unwrap_or(&Value::Null);

    let name = text_field(details, "Name", "Unknown Offer");
    let mut option = MenuOption::new(id, name, OptionKind::Offer, Money::zero());
    option.description = text_field(details, "Description", "");
    option.discount = discount_field(details, "DiscountPercentage");
    option.display_order = int_field(raw, "DisplayOrder");
    Some(option)
}

fn group(raw: &Value) -> Option<SelectionGroup> {
    let id = id_field(raw, "group")?;

    let group_type = match raw.get("Type").and_then(Value::as_str) {
        Some(text) => GroupType::from_wire(text).unwrap_or_else(|| {
            warn!(group_id = id, group_type = text, "Unknown group type, treating as MULTIPLE");
            GroupType::Multiple
        }),
        None => {
            warn!(group_id = id, "Group without type, treating as MULTIPLE");
            GroupType::Multiple
        }
    };
    let kind = group_type.option_kind();

    let mut options: Vec<MenuOption> = entries_of(raw, "Options")
        .iter()
        .filter_map(|raw_option| {
            let option_id = id_field(raw_option, kind.as_str())?;
            let mut option = MenuOption::new(
                option_id,
                text_field(raw_option, "Name", "Unknown Option"),
                kind,
                price_field_of(raw_option, "Price"),
            );
            option.group_id = Some(id);
            option.display_order = int_field(raw_option, "DisplayOrder");
            Some(option)
        })
        .collect();
    options.sort_by_key(|o| o.display_order);

    Some(SelectionGroup {
        id,
        name: text_field(raw, "Name", ""),
        group_type,
        is_required: bool_field(raw, "IsRequired"),
        min_select: count_field(raw, "MinSelect"),
        max_select: count_field(raw, "MaxSelect"),
        free_threshold: count_field(raw, "Threshold"),
        display_order: int_field(raw, "DisplayOrder"),
        options,
    })
}

// =============================================================================
// Field Coercion
// =============================================================================

fn entries<'a>(root: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match root.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) | None => &[],
        Some(other) => {
            warn!(field = key, found = kind_of(other), "List field is not an array, ignoring");
            &[]
        }
    }
}

fn entries_of<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.as_object().map(|object| entries(object, key)).unwrap_or(&[])
}

/// Ids arrive as numbers, occasionally as numeric strings.
fn id_field(raw: &Value, what: &str) -> Option<i64> {
    let id = match raw.get("Id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    if id.is_none() {
        warn!(entry = what, "Catalog entry without a usable Id, dropping it");
    }
    id
}

fn price_field_of(raw: &Value, key: &str) -> Money {
    let parsed = match raw.get(key) {
        None | Some(Value::Null) => return Money::zero(),
        Some(Value::Number(n)) => Money::parse_decimal(&n.to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => return Money::zero(),
        Some(Value::String(s)) => Money::parse_decimal(s),
        Some(_) => None,
    };
    parsed.unwrap_or_else(|| {
        warn!(field = key, value = %raw[key], "Unusable price, defaulting to 0");
        Money::zero()
    })
}

fn discount_field(raw: &Value, key: &str) -> DiscountRate {
    let parsed = match raw.get(key) {
        None | Some(Value::Null) => return DiscountRate::zero(),
        Some(Value::Number(n)) => DiscountRate::from_percentage_str(&n.to_string()),
        Some(Value::String(s)) => DiscountRate::from_percentage_str(s),
        Some(_) => None,
    };
    parsed.unwrap_or_else(|| {
        warn!(field = key, value = %raw[key], "Unusable discount, defaulting to 0");
        DiscountRate::zero()
    })
}

fn int_field(raw: &Value, key: &str) -> i64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn count_field(raw: &Value, key: &str) -> u32 {
    u32::try_from(int_field(raw, key).max(0)).unwrap_or(u32::MAX)
}

fn bool_field(raw: &Value, key: &str) -> bool {
    match raw.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        _ => false,
    }
}

fn text_field(raw: &Value, key: &str, fallback: &str) -> String {
    match raw.get(key).and_then(Value::as_str) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => fallback.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn burger_payload() -> Value {
        json!({
            "Ingredients": [
                { "Id": 1, "Name": "Bun", "ExtraCost": 0, "IsMandatory": true },
                { "Id": 2, "Name": "Bacon", "ExtraCost": "1.5" },
                { "Id": 3, "ExtraCost": "n/a" }
            ],
            "DrinkOptions": [{ "Id": 10, "Name": "Cola", "Price": 2.5 }],
            "SideOptions": [{ "Id": 20, "Name": "Fries" }],
            "ItemOffers": [
                {
                    "Id": 30,
                    "Offer": { "Name": "Lunch", "Description": "Noon deal", "DiscountPercentage": 20 }
                }
            ],
            "SelectionGroups": [
                {
                    "Id": 100, "Name": "Toppings", "Type": "MULTIPLE", "IsRequired": false,
                    "MinSelect": 0, "MaxSelect": 5, "Threshold": 2, "DisplayOrder": 2,
                    "Options": [
                        { "Id": 2, "Name": "Cheese", "Price": 1, "DisplayOrder": 2 },
                        { "Id": 1, "Name": "Onion", "Price": 0.5, "DisplayOrder": 1 }
                    ]
                },
                {
                    "Id": 101, "Name": "Size", "Type": "SINGLE", "IsRequired": true,
                    "MinSelect": 1, "MaxSelect": 1, "DisplayOrder": 1,
                    "Options": [{ "Id": 5, "Name": "Large", "Price": "2.00" }]
                }
            ],
            "CategorySelectionGroups": [
                { "Id": 100, "Name": "Category toppings", "Type": "MULTIPLE", "DisplayOrder": 9 },
                {
                    "Id": 102, "Name": "Remove", "Type": "EXCLUSIONS", "DisplayOrder": 3,
                    "Options": [{ "Id": 1, "Name": "No pickles" }]
                }
            ]
        })
    }

    #[test]
    fn test_normalize_lists() {
        let options = normalize(&burger_payload()).unwrap();

        assert_eq!(options.ingredients.len(), 3);
        assert!(options.ingredients[0].is_mandatory);
        assert_eq!(options.ingredients[1].unit_price.cents(), 150);
        assert_eq!(options.ingredients[2].name, "Unknown Ingredient");
        assert_eq!(options.ingredients[2].unit_price, Money::zero());

        assert_eq!(options.drink_options[0].unit_price.cents(), 250);
        assert_eq!(options.side_options[0].unit_price, Money::zero());

        let lunch = &options.item_offers[0];
        assert_eq!(lunch.name, "Lunch");
        assert_eq!(lunch.description, "Noon deal");
        assert_eq!(lunch.discount.bps(), 2000);
    }

    #[test]
    fn test_groups_deduplicated_and_sorted() {
        let options = normalize(&burger_payload()).unwrap();
        let ids: Vec<_> = options.selection_groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![101, 100, 102]);

        // item-level entry wins over the category-level one with the same id
        let toppings = options.group(100).unwrap();
        assert_eq!(toppings.name, "Toppings");
        assert_eq!(toppings.free_threshold, 2);
        assert_eq!(toppings.max_select, 5);

        // options sorted by display order, tagged with their group
        let names: Vec<_> = toppings.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Onion", "Cheese"]);
        assert!(toppings.options.iter().all(|o| o.group_id == Some(100)));
        assert!(toppings.options.iter().all(|o| o.kind == OptionKind::Selection));

        let size = options.group(101).unwrap();
        assert_eq!(size.free_threshold, 0);
        assert_eq!(size.options[0].unit_price.cents(), 200);
    }

    #[test]
    fn test_exclusion_group_options() {
        let options = normalize(&burger_payload()).unwrap();
        let remove = options.group(102).unwrap();
        assert_eq!(remove.group_type, GroupType::Exclusions);
        assert_eq!(remove.options[0].kind, OptionKind::Exclusion);
    }

    #[test]
    fn test_unknown_group_type_defaults_to_multiple() {
        let payload = json!({
            "SelectionGroups": [{ "Id": 1, "Name": "Odd", "Type": "PICK_TWO", "Options": [] }]
        });
        let options = normalize(&payload).unwrap();
        assert_eq!(options.selection_groups[0].group_type, GroupType::Multiple);
    }

    #[test]
    fn test_malformed_lists_and_entries() {
        let payload = json!({
            "Ingredients": "oops",
            "DrinkOptions": [{ "Name": "No id" }, { "Id": "11", "Name": "Water", "Price": -1 }]
        });
        let options = normalize(&payload).unwrap();
        assert!(options.ingredients.is_empty());
        assert_eq!(options.drink_options.len(), 1);
        assert_eq!(options.drink_options[0].id, 11);
        assert_eq!(options.drink_options[0].unit_price, Money::zero());
        assert!(options.selection_groups.is_empty());
    }

    #[test]
    fn test_non_object_payload_is_unavailable() {
        let err = normalize(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, CoreError::CatalogUnavailable { .. }));

        let err = parse_item_options("<html>502</html>").unwrap_err();
        assert!(matches!(err, CoreError::CatalogUnavailable { .. }));
    }

    #[test]
    fn test_parse_item_options_from_text() {
        let text = r#"{"SideOptions":[{"Id":1,"Name":"Salad","Price":"3.2"}]}"#;
        let options = parse_item_options(text).unwrap();
        assert_eq!(options.side_options[0].unit_price.cents(), 320);
    }

    #[test]
    fn test_display_groups_keeps_highest_order_per_name() {
        let payload = json!({
            "SelectionGroups": [
                { "Id": 1, "Name": "Sauce", "Type": "SINGLE", "DisplayOrder": 1 },
                { "Id": 2, "Name": "Size", "Type": "SINGLE", "DisplayOrder": 2 }
            ],
            "CategorySelectionGroups": [
                { "Id": 3, "Name": "Sauce", "Type": "SINGLE", "DisplayOrder": 5 }
            ]
        });
        let options = normalize(&payload).unwrap();
        assert_eq!(options.selection_groups.len(), 3);

        let shown: Vec<_> = display_groups(&options).iter().map(|g| g.id).collect();
        assert_eq!(shown, vec![2, 3]);
    }
}
