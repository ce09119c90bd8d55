//! Entity identity and per-transaction deduplication
//!
//! The store rejects transactions that touch the same item twice, so we
//! do the same client-side, before any network call. Identity is the
//! tuple (entity type, hash key, range key) with value-based equality -
//! never a formatted string, which could collide on adversarial key
//! values.

use crate::error::{Result, TransactError};
use dynatx_core::{Entity, KeyValue};
use std::any::TypeId;
use std::collections::HashSet;

/// Canonical identity of one entity within a transaction
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityKey {
    type_id: TypeId,
    type_name: &'static str,
    hash_key: KeyValue,
    range_key: Option<KeyValue>,
}

impl EntityKey {
    /// Identity from an entity type and explicit key values
    pub fn of<M: Entity>(hash_key: KeyValue, range_key: Option<KeyValue>) -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            hash_key,
            range_key,
        }
    }

    /// Identity from an entity instance's own resolved keys
    pub fn for_entity<M: Entity>(entity: &M) -> Self {
        Self::of::<M>(entity.hash_key(), entity.range_key())
    }

    /// Type name, for error reporting
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Set of identities already claimed by operations in one transaction
#[derive(Debug, Default)]
pub struct IdentitySet {
    seen: HashSet<EntityKey>,
}

impl IdentitySet {
    /// Claim an identity, failing if it was already claimed
    pub fn register(&mut self, key: EntityKey) -> Result<()> {
        let entity = key.type_name();
        if !self.seen.insert(key) {
            return Err(TransactError::DuplicateItem { entity });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynatx_core::{Item, StoreError};

    #[derive(Clone, Debug)]
    struct User;

    #[derive(Clone, Debug)]
    struct Statement;

    impl Entity for User {
        fn table_name() -> &'static str {
            "user"
        }
        fn hash_key_name() -> &'static str {
            "user_id"
        }
        fn hash_key(&self) -> KeyValue {
            KeyValue::n(1)
        }
        fn to_item(&self) -> Item {
            Item::new()
        }
        fn from_item(_item: &Item) -> std::result::Result<Self, StoreError> {
            Ok(User)
        }
    }

    impl Entity for Statement {
        fn table_name() -> &'static str {
            "statement"
        }
        fn hash_key_name() -> &'static str {
            "user_id"
        }
        fn hash_key(&self) -> KeyValue {
            KeyValue::n(1)
        }
        fn to_item(&self) -> Item {
            Item::new()
        }
        fn from_item(_item: &Item) -> std::result::Result<Self, StoreError> {
            Ok(Statement)
        }
    }

    #[test]
    fn test_same_keys_different_types_both_register() {
        let mut set = IdentitySet::default();
        set.register(EntityKey::of::<User>(KeyValue::n(1), Some(KeyValue::n(2))))
            .unwrap();
        set.register(EntityKey::of::<Statement>(KeyValue::n(1), Some(KeyValue::n(2))))
            .unwrap();
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let mut set = IdentitySet::default();
        set.register(EntityKey::of::<User>(KeyValue::n(1), Some(KeyValue::n(2))))
            .unwrap();
        let err = set
            .register(EntityKey::of::<User>(KeyValue::n(1), Some(KeyValue::n(2))))
            .unwrap_err();
        assert!(matches!(err, TransactError::DuplicateItem { .. }));
    }

    #[test]
    fn test_range_key_distinguishes_identities() {
        let mut set = IdentitySet::default();
        set.register(EntityKey::of::<User>(KeyValue::n(1), Some(KeyValue::s("a"))))
            .unwrap();
        set.register(EntityKey::of::<User>(KeyValue::n(1), Some(KeyValue::s("b"))))
            .unwrap();
        set.register(EntityKey::of::<User>(KeyValue::n(1), None)).unwrap();
    }

    #[test]
    fn test_instance_identity_matches_explicit_identity() {
        let mut set = IdentitySet::default();
        set.register(EntityKey::for_entity(&User)).unwrap();
        let err = set
            .register(EntityKey::of::<User>(KeyValue::n(1), None))
            .unwrap_err();
        assert!(matches!(err, TransactError::DuplicateItem { .. }));
    }
}
