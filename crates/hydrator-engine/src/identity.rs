//! Identity maps: load-scoped and session-level.
//!
//! Two caches cooperate during a load. The **load-scoped** map belongs to one
//! query execution and guarantees at most one instance per [`EntityKey`] for
//! the duration of that load. The **session-level** cache outlives the query;
//! the engine does not own it and only talks to it through the
//! [`SessionCache`] capability injected at construction — never through
//! global state.

use crate::key::EntityKey;
use hydrator_core::{ContractViolationKind, Error, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-erased, shared entity instance.
///
/// Instance identity is pointer identity: two `Instance` handles are the
/// same instance exactly when they point at the same allocation. Cloning a
/// handle clones the `Arc`, never the entity.
#[derive(Clone)]
pub struct Instance(Arc<dyn Any + Send + Sync>);

impl Instance {
    /// Wrap an entity (or proxy) in a shared handle.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Whether two handles refer to the identical instance.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the underlying entity, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({:p})", Arc::as_ptr(&self.0))
    }
}

/// Outcome of registering an instance in the load-scoped map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// The key was not present; the instance is now cached.
    New,
    /// The identical (key, instance) pair was already present; no-op.
    Existing,
}

/// Cache of instances created or reused during one load.
///
/// Grows monotonically through the load; per-row state never reaches in
/// here. Registration enforces the duplicate-identity contract: one key, one
/// instance, for the whole load.
#[derive(Debug, Default)]
pub struct LoadIdentityMap {
    entries: HashMap<EntityKey, Instance>,
}

impl LoadIdentityMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the instance cached for `key` during this load.
    pub fn get(&self, key: &EntityKey) -> Option<&Instance> {
        self.entries.get(key)
    }

    /// Check whether `key` has an instance in this load.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Register `instance` for `key`.
    ///
    /// Idempotent for an identical (key, instance) pair. Registering a
    /// *different* instance for a present key is a duplicate-identity
    /// contract violation.
    pub fn register(&mut self, key: EntityKey, instance: Instance) -> Result<Registered> {
        if let Some(existing) = self.entries.get(&key) {
            if existing.ptr_eq(&instance) {
                return Ok(Registered::Existing);
            }
            return Err(Error::contract(
                ContractViolationKind::DuplicateIdentity,
                format!("a different instance is already registered for {key}"),
            ));
        }
        self.entries.insert(key, instance);
        Ok(Registered::New)
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The externally-owned, session-level identity map.
///
/// Longer-lived than any single query; consulted before the load-scoped map
/// when resolving instances, and receiving the load's registrations as rows
/// complete.
pub trait SessionCache {
    /// Look up a managed instance by key.
    fn get(&self, key: &EntityKey) -> Option<Instance>;

    /// Make an instance visible to the rest of the session.
    fn put(&mut self, key: EntityKey, instance: Instance);
}

/// In-process [`SessionCache`] backed by a hash map.
#[derive(Debug, Default)]
pub struct SessionIdentityMap {
    entries: HashMap<EntityKey, Instance>,
}

impl SessionIdentityMap {
    /// Create an empty session map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `key` is managed by the session.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of managed instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionCache for SessionIdentityMap {
    fn get(&self, key: &EntityKey) -> Option<Instance> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: EntityKey, instance: Instance) {
        // First registration wins; a session never swaps the instance it
        // already manages for a key.
        self.entries.entry(key).or_insert(instance);
    }
}
