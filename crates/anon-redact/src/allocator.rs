//! Placeholder allocation.
//!
//! Turns a raw value of some entity type into its placeholder, recording the
//! pair in the cycle's [`MappingStore`]. Unknown entity types are created on
//! demand; allocation only fails when an argument is missing.

use crate::placeholder::format_placeholder;
use crate::{MappingStore, RedactionError, Result};

/// Allocate (or look up) the placeholder for `raw_value` under `entity_type`.
///
/// - First value of a type gets index 0.
/// - A raw value seen before returns its existing placeholder; no index is consumed.
/// - Every new distinct value gets the next index for its type.
///
/// `None` or an empty entity type, or a `None` store, is a configuration error.
pub fn allocate(
    raw_value: &str,
    entity_type: Option<&str>,
    store: Option<&mut MappingStore>,
) -> Result<String> {
    let store = store.ok_or(RedactionError::missing("entity_mapping"))?;
    let entity_type = require_entity_type(entity_type)?;
    Ok(allocate_in(store, raw_value, entity_type))
}

/// Infallible allocation once the arguments are known to be present.
pub(crate) fn allocate_in(store: &mut MappingStore, raw_value: &str, entity_type: &str) -> String {
    let table = store.table_or_insert(entity_type);
    if let Some(existing) = table.placeholder_for(raw_value) {
        return existing.to_string();
    }

    let placeholder = format_placeholder(entity_type, table.next_index());
    table.push(raw_value.to_string(), placeholder.clone());
    placeholder
}

/// Validate the entity-type argument shared by allocator and resolver.
pub(crate) fn require_entity_type(entity_type: Option<&str>) -> Result<&str> {
    match entity_type {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(RedactionError::missing("entity_type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_allocate_single_entity() {
        let mut store = MappingStore::new();
        let result = allocate("12345", Some("TEST"), Some(&mut store)).unwrap();
        assert_eq!(result, "<TEST_0>");
        assert_eq!(
            store.table("TEST").unwrap().placeholder_for("12345"),
            Some("<TEST_0>")
        );
    }

    #[test]
    fn test_allocate_multiple_entities() {
        let mut store = MappingStore::new();
        allocate("12345", Some("TEST"), Some(&mut store)).unwrap();
        let result = allocate("67890", Some("TEST"), Some(&mut store)).unwrap();
        assert_eq!(result, "<TEST_1>");
        assert_eq!(
            store.table("TEST").unwrap().placeholder_for("67890"),
            Some("<TEST_1>")
        );
    }

    #[test]
    fn test_allocate_duplicate_entity() {
        let mut store = MappingStore::new();
        allocate("12345", Some("TEST"), Some(&mut store)).unwrap();
        allocate("67890", Some("TEST"), Some(&mut store)).unwrap();
        let result = allocate("12345", Some("TEST"), Some(&mut store)).unwrap();
        assert_eq!(result, "<TEST_0>");
        assert_eq!(store.table("TEST").unwrap().len(), 2);
    }

    #[test]
    fn test_duplicates_do_not_consume_indices() {
        let mut store = MappingStore::new();
        allocate("a", Some("T"), Some(&mut store)).unwrap();
        allocate("a", Some("T"), Some(&mut store)).unwrap();
        allocate("a", Some("T"), Some(&mut store)).unwrap();
        let second = allocate("b", Some("T"), Some(&mut store)).unwrap();
        assert_eq!(second, "<T_1>");
    }

    #[test]
    fn test_types_are_indexed_independently() {
        let mut store = MappingStore::new();
        assert_eq!(
            allocate("Ada", Some("PERSON"), Some(&mut store)).unwrap(),
            "<PERSON_0>"
        );
        assert_eq!(
            allocate("12-34-56", Some("SORTCODE"), Some(&mut store)).unwrap(),
            "<SORTCODE_0>"
        );
        assert_eq!(
            allocate("Grace", Some("PERSON"), Some(&mut store)).unwrap(),
            "<PERSON_1>"
        );
    }

    #[test]
    fn test_same_value_different_types() {
        let mut store = MappingStore::new();
        let a = allocate("123456", Some("SORTCODE"), Some(&mut store)).unwrap();
        let b = allocate("123456", Some("ACCOUNT"), Some(&mut store)).unwrap();
        assert_eq!(a, "<SORTCODE_0>");
        assert_eq!(b, "<ACCOUNT_0>");
    }

    #[test]
    fn test_no_normalization() {
        let mut store = MappingStore::new();
        let a = allocate("Ada", Some("PERSON"), Some(&mut store)).unwrap();
        let b = allocate("ada", Some("PERSON"), Some(&mut store)).unwrap();
        let c = allocate("Ada ", Some("PERSON"), Some(&mut store)).unwrap();
        assert_eq!(a, "<PERSON_0>");
        assert_eq!(b, "<PERSON_1>");
        assert_eq!(c, "<PERSON_2>");
    }

    #[test]
    fn test_label_kept_verbatim() {
        let mut store = MappingStore::new();
        let p = allocate("x", Some("person"), Some(&mut store)).unwrap();
        assert_eq!(p, "<person_0>");
    }

    #[test]
    fn test_trailing_digit_label_indexes_correctly() {
        // Labels ending in `_<digits>` must not disturb index assignment.
        let mut store = MappingStore::new();
        assert_eq!(
            allocate("a", Some("CODE_9"), Some(&mut store)).unwrap(),
            "<CODE_9_0>"
        );
        assert_eq!(
            allocate("b", Some("CODE_9"), Some(&mut store)).unwrap(),
            "<CODE_9_1>"
        );
    }

    #[test]
    fn test_missing_store() {
        let err = allocate("12345", Some("TEST"), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("entity_mapping"));
    }

    #[test]
    fn test_missing_entity_type() {
        let mut store = MappingStore::new();
        let err = allocate("12345", None, Some(&mut store)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("entity_type"));

        let err = allocate("12345", Some(""), Some(&mut store)).unwrap_err();
        assert!(err.to_string().contains("entity_type"));
        assert!(store.is_empty());
    }
}
