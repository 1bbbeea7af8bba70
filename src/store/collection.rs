//! Concurrent in-memory document collections.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::features::ApiFeatures;

/// A record that can live in a [`Collection`].
pub trait Document: Serialize + Clone + Send + Sync + 'static {
    /// Singular resource name used in error messages.
    const NAME: &'static str;

    fn id(&self) -> Uuid;

    /// `(field, value)` pairs that must be unique across the collection.
    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Hidden documents are excluded from queries (secret tours, inactive users).
    fn visible(&self) -> bool {
        true
    }
}

/// Parse a document id taken from a path or body.
pub fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw.trim()).map_err(|_| StoreError::InvalidId {
        path: "id",
        value: raw.to_string(),
    })
}

/// A thread-safe collection keyed by document id.
///
/// Reads go straight to the map. Writes take `write_lock`, so the uniqueness
/// check and the insert happen atomically, and [`Collection::update`] runs
/// its whole read-modify-write under the same lock.
pub struct Collection<T: Document> {
    docs: Arc<DashMap<Uuid, T>>,
    write_lock: Arc<Mutex<()>>,
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            docs: self.docs.clone(),
            write_lock: self.write_lock.clone(),
        }
    }
}

impl<T: Document> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> Collection<T> {
    pub fn new() -> Self {
        Self {
            docs: Arc::new(DashMap::new()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Result<T, StoreError> {
        self.docs
            .get(&id)
            .map(|doc| doc.value().clone())
            .ok_or(StoreError::NotFound(T::NAME))
    }

    /// Every document matching `predicate`, hidden ones included.
    pub fn find<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.docs
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn find_visible<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.find(|doc| doc.visible() && predicate(doc))
    }

    pub fn insert(&self, doc: T) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().expect("collection write lock poisoned");
        self.check_unique(&doc)?;
        self.docs.insert(doc.id(), doc.clone());
        Ok(doc)
    }

    /// Modify a document in place.
    ///
    /// The document is read, passed to `modify`, checked for uniqueness and
    /// stored while `write_lock` is held, so concurrent writers never
    /// overwrite each other's changes. Nothing is stored if `modify` fails.
    pub fn update<F>(&self, id: Uuid, modify: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut T) -> Result<(), StoreError>,
    {
        let _guard = self.write_lock.lock().expect("collection write lock poisoned");
        let mut doc = self
            .docs
            .get(&id)
            .map(|doc| doc.value().clone())
            .ok_or(StoreError::NotFound(T::NAME))?;
        modify(&mut doc)?;
        if doc.id() != id {
            return Err(StoreError::Validation(vec![format!(
                "The {} id cannot be changed",
                T::NAME
            )]));
        }
        self.check_unique(&doc)?;
        self.docs.insert(id, doc.clone());
        Ok(doc)
    }

    pub fn remove(&self, id: Uuid) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().expect("collection write lock poisoned");
        self.docs
            .remove(&id)
            .map(|(_, doc)| doc)
            .ok_or(StoreError::NotFound(T::NAME))
    }

    /// Run list-endpoint query features over the visible documents matching `base`.
    pub fn query<F>(&self, features: &ApiFeatures, base: F) -> Result<Vec<Value>, StoreError>
    where
        F: Fn(&T) -> bool,
    {
        let docs = self
            .find_visible(base)
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Validation(vec![e.to_string()]))?;
        Ok(features.apply(docs))
    }

    fn check_unique(&self, doc: &T) -> Result<(), StoreError> {
        let fields = doc.unique_fields();
        if fields.is_empty() {
            return Ok(());
        }
        for entry in self.docs.iter() {
            let other = entry.value();
            if other.id() == doc.id() {
                continue;
            }
            for ((field, value), (_, other_value)) in fields.iter().zip(other.unique_fields()) {
                if *value == other_value {
                    return Err(StoreError::Duplicate {
                        field: *field,
                        value: format!("\"{}\"", value),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct Item {
        id: Uuid,
        name: String,
        hidden: bool,
    }

    impl Document for Item {
        const NAME: &'static str = "item";

        fn id(&self) -> Uuid {
            self.id
        }

        fn unique_fields(&self) -> Vec<(&'static str, String)> {
            vec![("name", self.name.clone())]
        }

        fn visible(&self) -> bool {
            !self.hidden
        }
    }

    fn item(name: &str, hidden: bool) -> Item {
        Item {
            id: Uuid::new_v4(),
            name: name.to_string(),
            hidden,
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let items = Collection::new();
        let a = items.insert(item("a", false)).unwrap();
        assert_eq!(items.get(a.id).unwrap().name, "a");
        items.remove(a.id).unwrap();
        assert_eq!(items.get(a.id).unwrap_err(), StoreError::NotFound("item"));
    }

    #[test]
    fn test_unique_fields() {
        let items = Collection::new();
        let a = items.insert(item("a", false)).unwrap();
        let err = items.insert(item("a", false)).unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                field: "name",
                value: "\"a\"".into()
            }
        );

        // Keeping its own unique value is fine.
        assert!(items.update(a.id, |_| Ok(())).is_ok());
    }

    #[test]
    fn test_update_in_place() {
        let items = Collection::new();
        let a = items.insert(item("a", false)).unwrap();
        items.insert(item("b", false)).unwrap();

        let renamed = items.update(a.id, |doc| {
            doc.name = "c".into();
            Ok(())
        });
        assert_eq!(renamed.unwrap().name, "c");
        assert_eq!(items.get(a.id).unwrap().name, "c");

        // A failed modification or a uniqueness clash leaves the stored document alone.
        let err = items
            .update(a.id, |doc| {
                doc.name = "changed".into();
                Err(StoreError::Validation(vec!["nope".into()]))
            })
            .unwrap_err();
        assert_eq!(err, StoreError::Validation(vec!["nope".into()]));
        assert!(items
            .update(a.id, |doc| {
                doc.name = "b".into();
                Ok(())
            })
            .is_err());
        assert_eq!(items.get(a.id).unwrap().name, "c");

        assert_eq!(
            items.update(Uuid::new_v4(), |_| Ok(())).unwrap_err(),
            StoreError::NotFound("item")
        );
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        #[derive(Debug, Clone, Serialize)]
        struct Counter {
            id: Uuid,
            hits: u64,
        }

        impl Document for Counter {
            const NAME: &'static str = "counter";

            fn id(&self) -> Uuid {
                self.id
            }
        }

        let counters = Collection::new();
        let counter = counters.insert(Counter { id: Uuid::new_v4(), hits: 0 }).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = counters.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        counters
                            .update(counter.id, |c| {
                                let seen = c.hits;
                                std::thread::yield_now();
                                c.hits = seen + 1;
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counters.get(counter.id).unwrap().hits, 2000);
    }

    #[test]
    fn test_hidden_documents_skipped() {
        let items = Collection::new();
        items.insert(item("a", false)).unwrap();
        items.insert(item("b", true)).unwrap();
        assert_eq!(items.find_visible(|_| true).len(), 1);
        assert_eq!(items.find(|_| true).len(), 2);
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert_eq!(
            parse_id("wrong").unwrap_err(),
            StoreError::InvalidId {
                path: "id",
                value: "wrong".into()
            }
        );
    }
}
