//! Property-based tests for the placeholder mapping invariants.

use anon_redact::{allocate, parse_placeholder, resolve, MappingStore};
use proptest::prelude::*;
use std::collections::HashSet;

fn entity_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("PERSON".to_string()),
        Just("SORTCODE".to_string()),
        Just("CREDIT_CARD".to_string()),
        Just("ID_9".to_string()),
        "[A-Za-z][A-Za-z0-9_]{0,12}",
    ]
}

fn raw_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{6}",
        "[A-Za-z ]{1,12}",
        any::<String>().prop_filter("non-empty", |s| !s.is_empty()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Allocating the same value twice returns the same token and adds one entry.
    #[test]
    fn allocation_is_idempotent(raw in raw_value_strategy(), ty in entity_type_strategy()) {
        let mut store = MappingStore::new();
        let first = allocate(&raw, Some(&ty), Some(&mut store)).unwrap();
        let second = allocate(&raw, Some(&ty), Some(&mut store)).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(store.table(&ty).unwrap().len(), 1);
    }

    /// Resolving an allocated token yields the exact raw value.
    #[test]
    fn allocate_then_resolve_round_trips(
        values in prop::collection::vec((raw_value_strategy(), entity_type_strategy()), 1..40)
    ) {
        let mut store = MappingStore::new();
        let tokens: Vec<(String, String, String)> = values
            .into_iter()
            .map(|(raw, ty)| {
                let token = allocate(&raw, Some(&ty), Some(&mut store)).unwrap();
                (raw, ty, token)
            })
            .collect();

        for (raw, ty, token) in &tokens {
            let back = resolve(token, Some(ty), Some(&store)).unwrap();
            prop_assert_eq!(back, raw.as_str());
        }
    }

    /// Distinct raw values never share a placeholder within a type.
    #[test]
    fn distinct_values_get_distinct_tokens(
        raws in prop::collection::hash_set(raw_value_strategy(), 1..30),
        ty in entity_type_strategy(),
    ) {
        let mut store = MappingStore::new();
        let mut seen = HashSet::new();
        for raw in &raws {
            let token = allocate(raw, Some(&ty), Some(&mut store)).unwrap();
            prop_assert!(seen.insert(token), "placeholder reused for a new raw value");
        }
        prop_assert_eq!(store.table(&ty).unwrap().len(), raws.len());
    }

    /// The k-th distinct value of a type gets index k-1, whatever duplicates came between.
    #[test]
    fn indices_follow_first_appearance(
        sequence in prop::collection::vec(0usize..8, 1..60),
        ty in entity_type_strategy(),
    ) {
        let mut store = MappingStore::new();
        let mut first_seen: Vec<usize> = Vec::new();
        for id in sequence {
            let raw = format!("value-{}", id);
            let token = allocate(&raw, Some(&ty), Some(&mut store)).unwrap();
            let expected = match first_seen.iter().position(|&x| x == id) {
                Some(pos) => pos,
                None => {
                    first_seen.push(id);
                    first_seen.len() - 1
                }
            };
            let (parsed_ty, index) = parse_placeholder(&token).unwrap();
            prop_assert_eq!(parsed_ty, ty.as_str());
            prop_assert_eq!(index, expected);
        }
    }

    /// A never-allocated index under a known type fails to resolve.
    #[test]
    fn unallocated_tokens_fail(count in 1usize..10, extra in 0usize..5) {
        let mut store = MappingStore::new();
        for i in 0..count {
            allocate(&format!("v{}", i), Some("TEST"), Some(&mut store)).unwrap();
        }
        let token = format!("<TEST_{}>", count + extra);
        let err = resolve(&token, Some("TEST"), Some(&store)).unwrap_err();
        prop_assert!(err.is_lookup());
        prop_assert!(err.to_string().contains(&token));
    }
}
