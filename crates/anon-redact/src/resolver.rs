//! Placeholder resolution.
//!
//! Strict counterpart of the allocator: a placeholder either maps back to the
//! exact raw value that produced it, or resolution fails. No fuzzy or
//! case-insensitive matching.

use crate::allocator::require_entity_type;
use crate::{MappingStore, RedactionError, Result};

/// Resolve `placeholder` under `entity_type` back to its raw value.
///
/// Fails with a lookup error when the entity type is unknown to `store` or the
/// placeholder has no entry under it. Never mutates the store.
pub fn resolve<'s>(
    placeholder: &str,
    entity_type: Option<&str>,
    store: Option<&'s MappingStore>,
) -> Result<&'s str> {
    let store = store.ok_or(RedactionError::missing("entity_mapping"))?;
    let entity_type = require_entity_type(entity_type)?;
    resolve_in(store, placeholder, entity_type)
}

pub(crate) fn resolve_in<'s>(
    store: &'s MappingStore,
    placeholder: &str,
    entity_type: &str,
) -> Result<&'s str> {
    let table = store
        .table(entity_type)
        .ok_or_else(|| RedactionError::UnknownEntityType {
            entity_type: entity_type.to_string(),
        })?;

    table
        .raw_value_for(placeholder)
        .ok_or_else(|| RedactionError::PlaceholderNotFound {
            placeholder: placeholder.to_string(),
            entity_type: entity_type.to_string(),
        })
}
