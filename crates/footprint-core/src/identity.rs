//! Durable per-visitor identity.
//!
//! The visitor identifier is minted on first contact, written to the
//! identity store, and returned unchanged on every later call, including
//! after a process restart when the store is durable.

use footprint_db::SharedStore;
use footprint_types::VisitorId;

use crate::DIAGNOSTICS;
use crate::clock::SharedClock;

/// Identity store key holding the visitor identifier.
pub const VISITOR_ID_KEY: &str = "footprint_visitor_id";

/// Produces a stable long-lived visitor identifier.
#[derive(Clone)]
pub struct VisitorIdentityManager {
    store: SharedStore,
    clock: SharedClock,
}

impl VisitorIdentityManager {
    /// Create a manager over `store`, minting with timestamps from `clock`.
    pub fn new(store: SharedStore, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Return the stored visitor identifier, minting and storing one if absent.
    ///
    /// Never fails. If the store cannot be read, a fresh identifier is
    /// returned for this call only. If the store cannot be written, the
    /// freshly minted identifier is still returned.
    pub fn get_or_create_visitor_id(&self) -> VisitorId {
        match self.store.get(VISITOR_ID_KEY) {
            Ok(Some(existing)) if !existing.is_empty() => return VisitorId::from(existing),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(target: DIAGNOSTICS, error = %e, "Visitor id unreadable, using ephemeral id");
                return VisitorId::mint(self.clock.now_ms());
            }
        }

        let id = VisitorId::mint(self.clock.now_ms());
        if let Err(e) = self.store.set(VISITOR_ID_KEY, id.as_str()) {
            tracing::debug!(target: DIAGNOSTICS, error = %e, "Visitor id not persisted");
        }
        id
    }
}

impl core::fmt::Debug for VisitorIdentityManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisitorIdentityManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use footprint_db::{DbError, IdentityStore, MemoryStore};

    use super::*;
    use crate::clock::ManualClock;

    struct BrokenStore;

    impl IdentityStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, DbError> {
            Err(DbError::Unavailable("storage disabled".to_owned()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), DbError> {
            Err(DbError::Unavailable("storage disabled".to_owned()))
        }
    }

    struct ReadOnlyStore(MemoryStore);

    impl IdentityStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, DbError> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), DbError> {
            Err(DbError::Unavailable("quota exceeded".to_owned()))
        }
    }

    #[test]
    fn repeated_calls_return_the_same_id() {
        let store = MemoryStore::shared();
        let manager = VisitorIdentityManager::new(store.clone(), Arc::new(ManualClock::new(5)));

        let first = manager.get_or_create_visitor_id();
        let second = manager.get_or_create_visitor_id();

        assert_eq!(first, second);
        assert!(first.as_str().starts_with("v_5_"));
        assert_eq!(store.get(VISITOR_ID_KEY).unwrap().as_deref(), Some(first.as_str()));
    }

    #[test]
    fn existing_value_is_returned_verbatim() {
        let store = MemoryStore::shared();
        store.set(VISITOR_ID_KEY, "v_123_legacy").unwrap();
        let manager = VisitorIdentityManager::new(store, Arc::new(ManualClock::new(999)));

        assert_eq!(manager.get_or_create_visitor_id().as_str(), "v_123_legacy");
    }

    #[test]
    fn new_manager_over_same_store_sees_same_id() {
        let store = MemoryStore::shared();
        let clock = Arc::new(ManualClock::new(1));
        let a = VisitorIdentityManager::new(store.clone(), clock.clone()).get_or_create_visitor_id();
        let b = VisitorIdentityManager::new(store, clock).get_or_create_visitor_id();
        assert_eq!(a, b);
    }

    #[test]
    fn unreadable_store_yields_ephemeral_ids() {
        let manager = VisitorIdentityManager::new(Arc::new(BrokenStore), Arc::new(ManualClock::new(7)));
        let a = manager.get_or_create_visitor_id();
        let b = manager.get_or_create_visitor_id();
        assert!(a.as_str().starts_with("v_7_"));
        assert_ne!(a, b);
    }

    #[test]
    fn unwritable_store_still_returns_an_id() {
        let manager = VisitorIdentityManager::new(
            Arc::new(ReadOnlyStore(MemoryStore::new())),
            Arc::new(ManualClock::new(7)),
        );
        assert!(manager.get_or_create_visitor_id().as_str().starts_with("v_7_"));
    }
}
