//! Lock modes and per-query parameters.

use crate::plan::EntityRef;
use hydrator_core::Value;
use std::collections::HashMap;

/// Requested lock level for an entity reference.
///
/// Ordered from weakest to strongest; the engine never escalates on its own,
/// it only reports what the query parameters asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LockMode {
    /// No locking requested.
    #[default]
    None,
    /// Shared read lock.
    Read,
    /// Pessimistic upgrade lock (SELECT ... FOR UPDATE).
    Upgrade,
    /// Upgrade lock that fails immediately instead of waiting.
    UpgradeNoWait,
    /// Exclusive write lock.
    Write,
}

/// Supplies the requested lock mode per entity reference.
///
/// The row processing context delegates its lock-mode capability here rather
/// than owning the policy itself.
pub trait LockModeResolver {
    /// The effective lock mode for `entity_ref`.
    fn resolve_lock_mode(&self, entity_ref: EntityRef) -> LockMode;
}

/// Parameters of one query execution.
///
/// Carries per-reference lock-mode overrides, the proxy policy, and the
/// positional bind values the statement was executed with (kept for
/// observability; the engine never rebinds them).
#[derive(Debug, Clone, Default)]
pub struct QueryParameters {
    default_lock_mode: LockMode,
    lock_modes: HashMap<EntityRef, LockMode>,
    return_proxies: bool,
    bind_values: Vec<Value>,
}

impl QueryParameters {
    /// Parameters with no locking, no proxies, and no bind values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lock mode applied to references without an override.
    #[must_use]
    pub fn default_lock_mode(mut self, mode: LockMode) -> Self {
        self.default_lock_mode = mode;
        self
    }

    /// Override the lock mode for one reference.
    #[must_use]
    pub fn lock_mode(mut self, entity_ref: EntityRef, mode: LockMode) -> Self {
        self.lock_modes.insert(entity_ref, mode);
        self
    }

    /// Allow uninitialized proxies for non-root references.
    #[must_use]
    pub fn return_proxies(mut self, enabled: bool) -> Self {
        self.return_proxies = enabled;
        self
    }

    /// Record the positional bind values of the execution.
    #[must_use]
    pub fn bind_values(mut self, values: Vec<Value>) -> Self {
        self.bind_values = values;
        self
    }

    /// Whether proxies were requested for this execution.
    pub fn should_return_proxies(&self) -> bool {
        self.return_proxies
    }

    /// The positional bind values of the execution.
    pub fn binds(&self) -> &[Value] {
        &self.bind_values
    }
}

impl LockModeResolver for QueryParameters {
    fn resolve_lock_mode(&self, entity_ref: EntityRef) -> LockMode {
        self.lock_modes
            .get(&entity_ref)
            .copied()
            .unwrap_or(self.default_lock_mode)
    }
}
