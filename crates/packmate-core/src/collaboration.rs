//! Collaboration rules layered on top of the store.
//!
//! These are derived rules, not separately stored state: ownership and
//! visibility live on [`Trip`](crate::models::Trip); the helpers here cover
//! the view-level filters the trip detail page needs.

use crate::models::PackingItem;
use crate::models::Trip;

/// Category options for display: the trip's declared categories in order,
/// followed by any category actually present on its items but not declared.
///
/// The second half covers legacy items whose category predates category-list
/// tracking on the trip document.
pub fn category_options(trip: &Trip, items: &[PackingItem]) -> Vec<String> {
    let mut options = trip.categories.clone();
    for item in items {
        if !options.iter().any(|c| c == &item.category) {
            options.push(item.category.clone());
        }
    }
    options
}

/// Filter items by an exact match on the attributed display name.
///
/// Pure view-level operation over the already-fetched list, not a store
/// query. Items without attribution never match.
pub fn filter_by_contributor<'a>(
    items: &'a [PackingItem],
    display_name: &str,
) -> Vec<&'a PackingItem> {
    items
        .iter()
        .filter(|item| item.added_by_name.as_deref() == Some(display_name))
        .collect()
}

/// Group items by category, preserving item order within each group and
/// first-seen category order across groups.
pub fn group_by_category(items: &[PackingItem]) -> Vec<(String, Vec<&PackingItem>)> {
    let mut groups: Vec<(String, Vec<&PackingItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(cat, _)| cat == &item.category) {
            Some((_, members)) => members.push(item),
            None => groups.push((item.category.clone(), vec![item])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_categories;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(category: &str, added_by: Option<&str>) -> PackingItem {
        PackingItem {
            id: Uuid::new_v4(),
            trip_id: Uuid::nil(),
            text: "thing".to_string(),
            category: category.to_string(),
            is_completed: false,
            note: None,
            added_by_email: None,
            added_by_name: added_by.map(|s| s.to_string()),
            created_at_utc: Some(Utc::now()),
            created_at_display: None,
        }
    }

    fn trip_with_defaults() -> Trip {
        Trip {
            id: Uuid::new_v4(),
            user_id: "sub-1".to_string(),
            owner_email: None,
            name: "Trek".to_string(),
            location: None,
            start_date: None,
            end_date: None,
            categories: default_categories(),
            shared_with: Vec::new(),
            created_at_utc: Utc::now(),
        }
    }

    #[test]
    fn test_category_options_union_with_item_categories() {
        let trip = trip_with_defaults();
        let items = vec![item("Clothing", None), item("Camping Gear", None)];
        let options = category_options(&trip, &items);
        // Declared order first, legacy extras after.
        assert_eq!(&options[..5], &default_categories()[..]);
        assert_eq!(options[5], "Camping Gear");
        assert_eq!(options.len(), 6);
    }

    #[test]
    fn test_category_options_no_duplicates() {
        let trip = trip_with_defaults();
        let items = vec![item("Clothing", None), item("Clothing", None)];
        let options = category_options(&trip, &items);
        assert_eq!(options.len(), 5);
    }

    #[test]
    fn test_filter_by_contributor_exact_match() {
        let items = vec![
            item("General", Some("Asha")),
            item("General", Some("Ravi")),
            item("General", None),
        ];
        let filtered = filter_by_contributor(&items, "Asha");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].added_by_name.as_deref(), Some("Asha"));

        // Unattributed items never match, even on empty string.
        assert!(filter_by_contributor(&items, "").is_empty());
    }

    #[test]
    fn test_group_by_category_preserves_order() {
        let items = vec![
            item("Clothing", None),
            item("General", None),
            item("Clothing", None),
        ];
        let groups = group_by_category(&items);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Clothing");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "General");
    }
}
