//! Per-cycle mapping store.
//!
//! Entity type -> per-type table, each table a bijection between raw values
//! and placeholder tokens. Only the allocator inserts; everything else reads.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap};

/// One raw value and the placeholder assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub raw_value: String,
    pub placeholder: String,
}

/// Raw value <-> placeholder table for a single entity type.
///
/// Entries are kept in allocation order, so an entry's position is its index.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: Vec<MappingEntry>,
    by_raw: HashMap<String, usize>,
    by_placeholder: HashMap<String, usize>,
}

impl TypeTable {
    /// Placeholder already assigned to `raw_value`, if any.
    pub fn placeholder_for(&self, raw_value: &str) -> Option<&str> {
        self.by_raw
            .get(raw_value)
            .map(|&i| self.entries[i].placeholder.as_str())
    }

    /// Raw value that produced `placeholder`, if any.
    pub fn raw_value_for(&self, placeholder: &str) -> Option<&str> {
        self.by_placeholder
            .get(placeholder)
            .map(|&i| self.entries[i].raw_value.as_str())
    }

    /// Index the next distinct raw value will receive.
    pub fn next_index(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in index order.
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Append a new entry. The caller guarantees `raw_value` is not yet present
    /// and that `placeholder` carries index `next_index()`.
    pub(crate) fn push(&mut self, raw_value: String, placeholder: String) {
        debug_assert!(!self.by_raw.contains_key(&raw_value));
        debug_assert!(!self.by_placeholder.contains_key(&placeholder));
        let index = self.entries.len();
        self.by_raw.insert(raw_value.clone(), index);
        self.by_placeholder.insert(placeholder.clone(), index);
        self.entries.push(MappingEntry {
            raw_value,
            placeholder,
        });
    }
}

impl Serialize for TypeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.raw_value, &entry.placeholder)?;
        }
        map.end()
    }
}

/// Mapping state for one redact -> transform -> restore cycle.
///
/// Create a fresh store per cycle; never share one between requests.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    tables: BTreeMap<String, TypeTable>,
}

impl MappingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for `entity_type`, if one has been created.
    pub fn table(&self, entity_type: &str) -> Option<&TypeTable> {
        self.tables.get(entity_type)
    }

    /// Table for `entity_type`, creating an empty one on first use.
    pub(crate) fn table_or_insert(&mut self, entity_type: &str) -> &mut TypeTable {
        self.tables.entry(entity_type.to_string()).or_default()
    }

    /// Every table, sorted by entity type.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TypeTable)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entity types seen so far, sorted.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of entity types with a table.
    pub fn type_count(&self) -> usize {
        self.tables.len()
    }

    /// Total number of raw values across all types.
    pub fn len(&self) -> usize {
        self.tables.values().map(TypeTable::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Per-type counts, for logging without exposing raw values.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.tables
            .iter()
            .map(|(k, v)| (k.clone(), v.len()))
            .collect()
    }
}

impl Serialize for MappingStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tables.serialize(serializer)
    }
}
