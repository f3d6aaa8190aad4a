//! The row processing context: the engine's external-facing hub.

use crate::identity::{Instance, LoadIdentityMap, Registered, SessionCache};
use crate::key::EntityKey;
use crate::state::ProcessingState;
use hydrator_core::{ContractViolationKind, Error, Result};
use hydrator_plan::{EntityRef, FetchId, LoadPlan, LockMode, LockModeResolver, QueryParameters};
use std::sync::Arc;

/// Orchestrates one query execution's row loop.
///
/// Owns the per-row processing-state table (reset at the start of every row)
/// and the load-scoped identity map (the only state that survives across
/// rows). The session-level identity map is borrowed, not owned: the context
/// holds it exclusively for the duration of the load, which is also what
/// pins the whole engine to the single thread driving the cursor.
pub struct RowContext<'s> {
    plan: Arc<LoadPlan>,
    params: QueryParameters,
    /// Per-row state, indexed by `EntityRef`. `None` = untouched this row.
    states: Vec<Option<ProcessingState>>,
    load_map: LoadIdentityMap,
    session: &'s mut dyn SessionCache,
    /// Keys newly registered since the last merge into the session cache.
    pending_merge: Vec<EntityKey>,
}

impl<'s> RowContext<'s> {
    /// Create a context for one execution of `plan`.
    pub fn new(
        plan: Arc<LoadPlan>,
        params: QueryParameters,
        session: &'s mut dyn SessionCache,
    ) -> Self {
        let states = (0..plan.len()).map(|_| None).collect();
        Self {
            plan,
            params,
            states,
            load_map: LoadIdentityMap::new(),
            session,
            pending_merge: Vec::new(),
        }
    }

    /// The load plan this execution runs against.
    pub fn plan(&self) -> &Arc<LoadPlan> {
        &self.plan
    }

    /// The query parameters of this execution.
    pub fn params(&self) -> &QueryParameters {
        &self.params
    }

    /// Whether uninitialized proxies may stand in for non-root references.
    pub fn should_return_proxies(&self) -> bool {
        self.params.should_return_proxies()
    }

    /// Reset all per-row state. Must run before each row; nothing from the
    /// previous row survives except the load-scoped identity map.
    pub fn begin_row(&mut self) {
        for state in &mut self.states {
            *state = None;
        }
    }

    /// The current row's processing state for `entity_ref`, created lazily
    /// on first access within the row.
    ///
    /// Fails with an unknown-reference contract violation if `entity_ref`
    /// is not part of the associated load plan.
    pub fn processing_state(&mut self, entity_ref: EntityRef) -> Result<&mut ProcessingState> {
        if !self.plan.contains(entity_ref) {
            return Err(Error::contract(
                ContractViolationKind::UnknownReference,
                format!(
                    "entity reference {} is not part of the load plan",
                    entity_ref.index()
                ),
            ));
        }
        Ok(self.states[entity_ref.index()].get_or_insert_with(ProcessingState::default))
    }

    /// The processing state of `fetch`'s owner.
    ///
    /// The fetch graph walker visits owners before their fetches, so by the
    /// time any fetch is processed its owner's state exists.
    pub fn owner_processing_state(&mut self, fetch: FetchId) -> Result<&mut ProcessingState> {
        let owner = self.plan.owner_of(fetch).ok_or_else(|| {
            Error::contract(
                ContractViolationKind::UnknownReference,
                format!("fetch {} is not linked in the load plan", fetch.index()),
            )
        })?;
        self.processing_state(owner)
    }

    /// The current row's state for `entity_ref` without creating it.
    pub fn row_state(&self, entity_ref: EntityRef) -> Option<&ProcessingState> {
        self.states.get(entity_ref.index())?.as_ref()
    }

    /// The effective lock mode for `entity_ref`, from the query parameters.
    pub fn resolve_lock_mode(&self, entity_ref: EntityRef) -> LockMode {
        self.params.resolve_lock_mode(entity_ref)
    }

    /// The session-level identity map, read-only.
    pub fn session_cache(&self) -> &dyn SessionCache {
        &*self.session
    }

    /// The load-scoped identity map.
    pub fn load_map(&self) -> &LoadIdentityMap {
        &self.load_map
    }

    /// Record `instance` for `key` in the load-scoped identity map and in
    /// the reference's processing state.
    ///
    /// Idempotent for identical (key, instance) pairs; registering a
    /// different instance for a present key is a duplicate-identity
    /// contract violation.
    pub fn register_hydrated_entity(
        &mut self,
        entity_ref: EntityRef,
        key: EntityKey,
        instance: Instance,
    ) -> Result<()> {
        let registered = self.load_map.register(key.clone(), instance.clone())?;
        if registered == Registered::New {
            self.pending_merge.push(key.clone());
        }
        let state = self.processing_state(entity_ref)?;
        state.register_entity_key(key)?;
        state.register_entity_instance(instance)?;
        Ok(())
    }

    /// Merge instances registered since the last merge into the session
    /// cache. Runs when a row finishes — including a row that failed, since
    /// a load is at-least-partially-complete, never transactional.
    ///
    /// Returns the number of instances merged.
    pub fn end_row(&mut self) -> usize {
        let merged = self.pending_merge.len();
        for key in self.pending_merge.drain(..) {
            if let Some(instance) = self.load_map.get(&key) {
                self.session.put(key, instance.clone());
            }
        }
        merged
    }
}
