use crate::document;
use crate::error::{Result, ScratchDbError};
use crate::store::JsonStore;
use crate::validation;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The CRUD engine. Composes the persistent store, collection
/// accessor, id allocator, and item validator into the operation set
/// exposed over HTTP and the CLI.
///
/// Every operation is a full load-mutate-save cycle against the
/// backing file; the internal mutex serializes those cycles so
/// concurrent callers cannot interleave a stale load with a save
/// (at-most-one-writer).
#[derive(Debug)]
pub struct Engine {
    store: JsonStore,
    write_lock: Mutex<()>,
}

/// One top-level key of the document with its item count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub name: String,
    pub count: usize,
}

/// A whole collection as returned by get_all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionContents {
    pub collection: String,
    pub data: Vec<Value>,
    pub count: usize,
}

/// Confirmation of a delete, carrying the removed numeric id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReceipt {
    pub message: String,
    pub deleted_id: i64,
}

/// Outcome of a structure merge: which keys were adopted, which were
/// already present (and therefore left untouched), and the resulting
/// collection count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    pub added: Vec<String>,
    pub existing: Vec<String>,
    pub collections: usize,
}

impl Engine {
    pub fn new(store: JsonStore) -> Self {
        Engine {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Convenience constructor over a backing file path.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Engine::new(JsonStore::new(path))
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // A poisoned lock only means a prior operation panicked; no
        // in-memory state outlives an operation (each one reloads from
        // disk), so recovering the guard is sound.
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every top-level key with its item count. Non-array values count
    /// as 0. No mutation.
    pub fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        let _guard = self.lock();
        let doc = self.store.load()?;
        Ok(doc
            .summaries()
            .map(|(name, count)| CollectionSummary {
                name: name.to_string(),
                count,
            })
            .collect())
    }

    /// All items of a collection. An unknown name is bound to an empty
    /// sequence and persisted before returning, so the first read of a
    /// new collection materializes it.
    pub fn get_all(&self, collection: &str) -> Result<CollectionContents> {
        let _guard = self.lock();
        let mut doc = self.store.load()?;

        if doc.ensure_collection(collection) {
            log::debug!("Auto-created collection '{collection}'");
            self.store.save(&doc)?;
        }

        let data = doc
            .items(collection)
            .cloned()
            .ok_or_else(|| not_a_list(collection))?;
        Ok(CollectionContents {
            collection: collection.to_string(),
            count: data.len(),
            data,
        })
    }

    /// A single item by id. The id arrives as a raw path segment; a
    /// non-numeric segment never matches any item (ids are always
    /// integers), so it reports ItemNotFound rather than a parse error.
    pub fn get_one(&self, collection: &str, id: &str) -> Result<Value> {
        let _guard = self.lock();
        let doc = self.store.load()?;

        if !doc.exists(collection) {
            return Err(collection_not_found(collection));
        }
        let items = doc.items(collection).ok_or_else(|| not_a_list(collection))?;

        parse_id(id)
            .and_then(|wanted| find_item(items, wanted))
            .map(|idx| items[idx].clone())
            .ok_or_else(|| item_not_found(collection, id))
    }

    /// Insert a new item. The collection is created on demand. A falsy
    /// id in the payload (missing, null, 0, or non-integer) triggers
    /// auto-assignment; an explicit integer id that collides with an
    /// existing item is a conflict. `createdAt`/`updatedAt` are stamped
    /// here and the appended item is returned as stored.
    pub fn create(&self, collection: &str, payload: Value) -> Result<Value> {
        let mut item = validation::into_object(payload)?;

        let _guard = self.lock();
        let mut doc = self.store.load()?;
        if doc.ensure_collection(collection) {
            log::debug!("Auto-created collection '{collection}'");
        }
        let items = doc
            .items_mut(collection)
            .ok_or_else(|| not_a_list(collection))?;

        let id = match supplied_id(&item) {
            Some(requested) => {
                if find_item(items, requested).is_some() {
                    return Err(ScratchDbError::IdConflict {
                        collection: collection.to_string(),
                        id: requested,
                    });
                }
                requested
            }
            None => document::next_id(items),
        };

        let now = timestamp();
        item.insert("id".into(), Value::from(id));
        item.insert("createdAt".into(), Value::String(now.clone()));
        item.insert("updatedAt".into(), Value::String(now));

        let stored = Value::Object(item);
        items.push(stored.clone());
        self.store.save(&doc)?;
        Ok(stored)
    }

    /// Merge a payload into an existing item. Payload fields overlay
    /// existing fields, then `id` and `createdAt` are forced back to
    /// their stored values and `updatedAt` is refreshed. The item keeps
    /// its position in the sequence.
    pub fn update(&self, collection: &str, id: &str, payload: Value) -> Result<Value> {
        let patch = validation::into_object(payload)?;

        let _guard = self.lock();
        let mut doc = self.store.load()?;
        if !doc.exists(collection) {
            return Err(collection_not_found(collection));
        }
        let items = doc
            .items_mut(collection)
            .ok_or_else(|| not_a_list(collection))?;

        let idx = parse_id(id)
            .and_then(|wanted| find_item(items, wanted))
            .ok_or_else(|| item_not_found(collection, id))?;

        let mut merged = match &items[idx] {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let original_id = merged.get("id").cloned();
        let original_created_at = merged.get("createdAt").cloned();

        for (key, value) in patch {
            merged.insert(key, value);
        }

        // id and createdAt are immutable, whatever the payload says
        if let Some(original) = original_id {
            merged.insert("id".into(), original);
        }
        match original_created_at {
            Some(original) => {
                merged.insert("createdAt".into(), original);
            }
            None => {
                merged.remove("createdAt");
            }
        }
        merged.insert("updatedAt".into(), Value::String(timestamp()));

        let stored = Value::Object(merged);
        items[idx] = stored.clone();
        self.store.save(&doc)?;
        Ok(stored)
    }

    /// Remove the first item matching the id. Deleting an absent id
    /// (including one already deleted) is ItemNotFound, never a no-op.
    pub fn delete(&self, collection: &str, id: &str) -> Result<DeleteReceipt> {
        let _guard = self.lock();
        let mut doc = self.store.load()?;
        if !doc.exists(collection) {
            return Err(collection_not_found(collection));
        }
        let items = doc
            .items_mut(collection)
            .ok_or_else(|| not_a_list(collection))?;

        let wanted = parse_id(id).ok_or_else(|| item_not_found(collection, id))?;
        let idx = find_item(items, wanted).ok_or_else(|| item_not_found(collection, id))?;
        items.remove(idx);

        self.store.save(&doc)?;
        Ok(DeleteReceipt {
            message: format!("Item {wanted} deleted from '{collection}'"),
            deleted_id: wanted,
        })
    }

    /// Adopt collections from a caller-supplied structure. Keys absent
    /// from the document are bound verbatim, with no id or timestamp
    /// post-processing of the sample data. Keys already present are
    /// left untouched: existing data always wins and the colliding
    /// sample is dropped, reported under `existing`.
    pub fn merge_structure(&self, new_structure: Value) -> Result<MergeReport> {
        let incoming = validation::into_object(new_structure)?;

        let _guard = self.lock();
        let mut doc = self.store.load()?;

        let mut added = Vec::new();
        let mut existing = Vec::new();
        for (key, value) in incoming {
            if doc.exists(&key) {
                log::debug!("Structure merge: '{key}' already exists, keeping current data");
                existing.push(key);
            } else {
                doc.adopt(&key, value);
                added.push(key);
            }
        }

        self.store.save(&doc)?;
        Ok(MergeReport {
            added,
            existing,
            collections: doc.len(),
        })
    }
}

/// RFC 3339 timestamp for createdAt/updatedAt. Microsecond precision
/// so consecutive updates get distinct values.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Lenient path-segment parse: a non-numeric segment is "no such id".
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok()
}

/// Position of the first item whose id field is exactly the wanted
/// integer. Items with missing or non-numeric ids never match.
fn find_item(items: &[Value], wanted: i64) -> Option<usize> {
    items
        .iter()
        .position(|item| item.get("id").and_then(Value::as_i64) == Some(wanted))
}

/// Caller-supplied id, if it counts as one: any falsy id (missing,
/// null, 0) or non-integer value is treated as "assign me one".
fn supplied_id(item: &Map<String, Value>) -> Option<i64> {
    item.get("id").and_then(Value::as_i64).filter(|&id| id != 0)
}

fn collection_not_found(name: &str) -> ScratchDbError {
    ScratchDbError::CollectionNotFound {
        name: name.to_string(),
    }
}

fn item_not_found(collection: &str, id: &str) -> ScratchDbError {
    ScratchDbError::ItemNotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn not_a_list(name: &str) -> ScratchDbError {
    ScratchDbError::Other(format!("Collection '{name}' is not a list"))
}
