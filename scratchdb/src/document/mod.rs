// In-memory view of the datastore: collection name -> JSON value.
// Only array-shaped values are CRUD-addressable; anything else is
// carried through load/save untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The whole datastore as loaded from disk. Key order is insertion
/// order and is preserved on save (serde_json `preserve_order`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    collections: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Item sequence for a collection, if it exists and is array-shaped.
    pub fn items(&self, name: &str) -> Option<&Vec<Value>> {
        self.collections.get(name).and_then(Value::as_array)
    }

    pub fn items_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.collections.get_mut(name).and_then(Value::as_array_mut)
    }

    /// Bind an empty item sequence if the name was never referenced
    /// before. Returns whether it was just created so the caller can
    /// decide to persist. An existing non-array value is left alone;
    /// `items`/`items_mut` will report it as not CRUD-addressable.
    pub fn ensure_collection(&mut self, name: &str) -> bool {
        let created = !self.collections.contains_key(name);
        if created {
            self.collections
                .insert(name.to_string(), Value::Array(Vec::new()));
        }
        created
    }

    /// Adopt a key verbatim. Only used by structure merging; existing
    /// keys must be checked by the caller first.
    pub fn adopt(&mut self, name: &str, value: Value) {
        self.collections.insert(name.to_string(), value);
    }

    /// Every top-level key with its item count (0 for non-array values).
    pub fn summaries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.collections.iter().map(|(name, value)| {
            let count = value.as_array().map_or(0, Vec::len);
            (name.as_str(), count)
        })
    }
}

/// Numeric id of an item, with non-numeric or missing ids reading as 0.
pub fn item_id(item: &Value) -> i64 {
    item.get("id").and_then(Value::as_i64).unwrap_or(0)
}

/// Next free id for a collection: 1 for an empty sequence, otherwise
/// one past the largest numeric id present. Deleted ids are never
/// reused and gaps are tolerated.
pub fn next_id(items: &[Value]) -> i64 {
    items.iter().map(item_id).max().unwrap_or(0) + 1
}
