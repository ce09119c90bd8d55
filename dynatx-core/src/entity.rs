//! Entity mapping trait and mutated-entity handles
//!
//! [`Entity`] is the seam to the object-mapping layer: it names the table
//! an entity type lives in, resolves the entity's primary key, and
//! converts between the domain type and raw typed-JSON items. Key
//! resolution is infallible by contract - a type that cannot always
//! produce its keys should not implement the trait.

use crate::error::Result;
use crate::value::{Item, KeyValue};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A domain entity stored in one table of the key-value store
pub trait Entity: Clone + Send + Sync + 'static {
    /// Table that stores this entity type
    fn table_name() -> &'static str;

    /// Attribute name of the primary (hash) key
    fn hash_key_name() -> &'static str;

    /// Attribute name of the sort (range) key, if the table has one
    fn range_key_name() -> Option<&'static str> {
        None
    }

    /// This entity's resolved hash key
    fn hash_key(&self) -> KeyValue;

    /// This entity's resolved range key, if any
    fn range_key(&self) -> Option<KeyValue> {
        None
    }

    /// Serialize to a raw item for a put operation
    fn to_item(&self) -> Item;

    /// Hydrate from a raw item
    fn from_item(item: &Item) -> Result<Self>;

    /// Build a `Key` attribute map from key values
    fn key_item(hash_key: &KeyValue, range_key: Option<&KeyValue>) -> Item {
        let mut key = Item::new();
        key.insert(Self::hash_key_name().to_string(), hash_key.to_attr());
        if let (Some(name), Some(value)) = (Self::range_key_name(), range_key) {
            key.insert(name.to_string(), value.to_attr());
        }
        key
    }

    /// Build this entity's own `Key` attribute map
    fn key_attributes(&self) -> Item {
        Self::key_item(&self.hash_key(), self.range_key().as_ref())
    }
}

/// A shared, refreshable reference to a caller-owned entity
///
/// Write transactions hold a clone of the handle for every put/update
/// operation and overwrite its contents from the store after a
/// successful commit. Cloning shares the underlying entity.
pub struct EntityHandle<M> {
    inner: Arc<RwLock<M>>,
}

impl<M> Clone for EntityHandle<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for EntityHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityHandle").field(&*self.inner.read()).finish()
    }
}

impl<M: Entity> EntityHandle<M> {
    /// Wrap an entity in a handle
    pub fn new(entity: M) -> Self {
        Self {
            inner: Arc::new(RwLock::new(entity)),
        }
    }

    /// Clone of the current entity state
    pub fn snapshot(&self) -> M {
        self.inner.read().clone()
    }

    /// Replace the entity state (used by post-commit refresh)
    pub fn replace(&self, entity: M) {
        *self.inner.write() = entity;
    }

    /// Run a closure against the current entity state
    pub fn with<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.inner.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::value;

    #[derive(Clone, Debug, PartialEq)]
    struct Line {
        user_id: i64,
        created_at: String,
    }

    impl Entity for Line {
        fn table_name() -> &'static str {
            "line-item"
        }

        fn hash_key_name() -> &'static str {
            "user_id"
        }

        fn range_key_name() -> Option<&'static str> {
            Some("created_at")
        }

        fn hash_key(&self) -> KeyValue {
            KeyValue::n(self.user_id)
        }

        fn range_key(&self) -> Option<KeyValue> {
            Some(KeyValue::s(self.created_at.clone()))
        }

        fn to_item(&self) -> Item {
            let mut item = Item::new();
            item.insert("user_id".to_string(), value::n(self.user_id));
            item.insert("created_at".to_string(), value::s(self.created_at.clone()));
            item
        }

        fn from_item(item: &Item) -> Result<Self> {
            Ok(Self {
                user_id: item
                    .get("user_id")
                    .and_then(value::as_n)
                    .ok_or_else(|| StoreError::invalid_item("line-item missing user_id"))?,
                created_at: item
                    .get("created_at")
                    .and_then(value::as_s)
                    .ok_or_else(|| StoreError::invalid_item("line-item missing created_at"))?
                    .to_string(),
            })
        }
    }

    #[test]
    fn test_key_attributes_include_range_key() {
        let line = Line {
            user_id: 1,
            created_at: "2026-08-06T00:00:00Z".to_string(),
        };
        let key = line.key_attributes();
        assert_eq!(key.get("user_id"), Some(&value::n(1)));
        assert_eq!(
            key.get("created_at"),
            Some(&value::s("2026-08-06T00:00:00Z"))
        );
    }

    #[test]
    fn test_handle_replace_is_visible_through_clones() {
        let handle = EntityHandle::new(Line {
            user_id: 1,
            created_at: "t0".to_string(),
        });
        let alias = handle.clone();
        handle.replace(Line {
            user_id: 1,
            created_at: "t1".to_string(),
        });
        assert_eq!(alias.snapshot().created_at, "t1");
    }
}
