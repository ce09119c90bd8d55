//! Shared accumulation state for both transaction kinds
//!
//! Read and write transactions embed a [`TransactionBatch`]: the client
//! handle, the ordered transact items, the identity set, and the
//! cross-cutting consumed-capacity option. The item cap mirrors the
//! store's own per-transaction ceiling; no splitting across multiple
//! physical requests is performed.

use crate::error::{Result, TransactError};
use crate::identity::{EntityKey, IdentitySet};
use dynatx_core::wire::{ReturnConsumedCapacity, TransactItem, MAX_TRANSACT_ITEMS};

pub(crate) struct TransactionBatch<C> {
    client: C,
    items: Vec<TransactItem>,
    identities: IdentitySet,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

impl<C> TransactionBatch<C> {
    pub(crate) fn new(client: C, return_consumed_capacity: Option<ReturnConsumedCapacity>) -> Self {
        Self {
            client,
            items: Vec::new(),
            identities: IdentitySet::default(),
            return_consumed_capacity,
        }
    }

    /// Accept one operation: capacity check, identity claim, append
    ///
    /// The single entry point keeps the invariant that every accepted
    /// item claimed exactly one identity.
    pub(crate) fn add(&mut self, identity: EntityKey, item: TransactItem) -> Result<()> {
        if self.items.len() >= MAX_TRANSACT_ITEMS {
            return Err(TransactError::TooManyItems {
                max: MAX_TRANSACT_ITEMS,
            });
        }
        self.identities.register(identity)?;
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn items(&self) -> &[TransactItem] {
        &self.items
    }

    pub(crate) fn into_parts(self) -> (C, Vec<TransactItem>, Option<ReturnConsumedCapacity>) {
        (self.client, self.items, self.return_consumed_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynatx_core::wire::{OperationArgs, OperationKind};
    use dynatx_core::{Entity, Item, KeyValue, StoreError};

    #[derive(Clone, Debug)]
    struct Row(i64);

    impl Entity for Row {
        fn table_name() -> &'static str {
            "row"
        }
        fn hash_key_name() -> &'static str {
            "id"
        }
        fn hash_key(&self) -> KeyValue {
            KeyValue::n(self.0)
        }
        fn to_item(&self) -> Item {
            Item::new()
        }
        fn from_item(_item: &Item) -> std::result::Result<Self, StoreError> {
            Ok(Row(0))
        }
    }

    fn item() -> TransactItem {
        TransactItem {
            kind: OperationKind::Get,
            fields: OperationArgs::new(),
        }
    }

    #[test]
    fn test_eleventh_item_rejected() {
        let mut batch = TransactionBatch::new((), None);
        for i in 0..10 {
            batch
                .add(EntityKey::of::<Row>(KeyValue::n(i), None), item())
                .unwrap();
        }
        assert_eq!(batch.len(), 10);

        let err = batch
            .add(EntityKey::of::<Row>(KeyValue::n(10), None), item())
            .unwrap_err();
        assert!(matches!(err, TransactError::TooManyItems { max: 10 }));
        assert_eq!(batch.len(), 10);
    }

    #[test]
    fn test_rejected_add_claims_no_identity() {
        let mut batch = TransactionBatch::new((), None);
        for i in 0..10 {
            batch
                .add(EntityKey::of::<Row>(KeyValue::n(i), None), item())
                .unwrap();
        }
        // The over-cap add fails on capacity, so the identity stays
        // unclaimed and is reported as such, not as a duplicate.
        let err = batch
            .add(EntityKey::of::<Row>(KeyValue::n(10), None), item())
            .unwrap_err();
        assert!(matches!(err, TransactError::TooManyItems { .. }));
    }
}
