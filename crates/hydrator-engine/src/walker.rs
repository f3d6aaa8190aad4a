//! The fetch graph walker: one pass over the load plan per row.

use crate::context::RowContext;
use crate::identity::Instance;
use crate::key::{EntityKey, KeyResolution, KeyResolutionContext, resolve_entity_key};
use crate::resolve::{InstanceFactory, resolve_instance};
use hydrator_core::{ContractViolationKind, Error, Result, RowSource, Value};
use hydrator_plan::{EntityRef, FetchId, FetchKind, LoadPlan};
use std::sync::Arc;

/// One assembled entity position in a row's (or load's) object tree.
#[derive(Debug)]
pub struct GraphNode {
    /// Identity of the instance at this position.
    pub key: EntityKey,
    /// The resolved instance.
    pub instance: Instance,
    /// Fetched child results, in the plan's fetch declaration order.
    pub fetches: Vec<(FetchId, FetchValue)>,
}

/// The value a fetch edge produced under one owner.
#[derive(Debug)]
pub enum FetchValue {
    /// Single-valued association: present or absent for this owner.
    Entity(Option<GraphNode>),
    /// Collection-valued association: members accumulate across rows.
    Collection(Vec<GraphNode>),
}

impl FetchValue {
    /// The single-valued child, if any.
    pub fn entity(&self) -> Option<&GraphNode> {
        match self {
            FetchValue::Entity(child) => child.as_ref(),
            FetchValue::Collection(_) => None,
        }
    }

    /// The collection members; empty for entity fetches.
    pub fn collection(&self) -> &[GraphNode] {
        match self {
            FetchValue::Collection(members) => members,
            FetchValue::Entity(_) => &[],
        }
    }
}

impl GraphNode {
    /// The value of one fetch edge under this node.
    pub fn fetch_value(&self, fetch: FetchId) -> Option<&FetchValue> {
        self.fetches
            .iter()
            .find(|(id, _)| *id == fetch)
            .map(|(_, value)| value)
    }

    /// Fold another assembly of the same identity into this one.
    ///
    /// Collection fetches accumulate: incoming members merge into an
    /// existing member with the same key or are appended. Entity fetches do
    /// not accumulate; an owner has at most one value per single-valued
    /// association, so an already-present child only absorbs the incoming
    /// child's own fetches.
    pub fn merge_from(&mut self, incoming: GraphNode) {
        debug_assert_eq!(self.key, incoming.key);
        for ((_, existing), (_, new)) in self.fetches.iter_mut().zip(incoming.fetches) {
            match (existing, new) {
                (FetchValue::Collection(members), FetchValue::Collection(new_members)) => {
                    for member in new_members {
                        if let Some(found) = members.iter_mut().find(|m| m.key == member.key) {
                            found.merge_from(member);
                        } else {
                            members.push(member);
                        }
                    }
                }
                (FetchValue::Entity(slot), FetchValue::Entity(incoming_slot)) => {
                    if let Some(incoming_child) = incoming_slot {
                        if let Some(existing_child) = slot.as_mut() {
                            existing_child.merge_from(incoming_child);
                        } else {
                            *slot = Some(incoming_child);
                        }
                    }
                }
                // The two assemblies come from the same plan; kinds always
                // line up.
                _ => {}
            }
        }
    }
}

/// Drives the load plan traversal for one row at a time.
///
/// The traversal is the plan's fixed pre-order, so every fetch's owner state
/// is resolved before the fetch itself is processed. The walker is stateless
/// across rows; everything per-row lives in the [`RowContext`].
pub struct FetchGraphWalker<'f> {
    factory: &'f dyn InstanceFactory,
}

impl<'f> FetchGraphWalker<'f> {
    /// Create a walker that constructs instances through `factory`.
    pub fn new(factory: &'f dyn InstanceFactory) -> Self {
        Self { factory }
    }

    /// Process the row the source is currently positioned on and assemble
    /// its object tree.
    pub fn read_row(
        &self,
        ctx: &mut RowContext<'_>,
        source: &dyn RowSource,
    ) -> Result<GraphNode> {
        ctx.begin_row();
        let plan = Arc::clone(ctx.plan());
        // References whose owner chain is absent this row; everything below
        // them is short-circuited.
        let mut skipped = vec![false; plan.len()];

        for entity_ref in plan.preorder() {
            let reference = plan.reference(entity_ref).ok_or_else(|| {
                Error::contract(
                    ContractViolationKind::UnknownReference,
                    "pre-order yielded a reference outside the plan",
                )
            })?;

            if let Some(owner) = reference.owner() {
                let owner_absent = skipped[owner.index()]
                    || ctx
                        .row_state(owner)
                        .is_none_or(|state| state.is_missing_identifier());
                if owner_absent {
                    skipped[entity_ref.index()] = true;
                    continue;
                }
            }

            let raw = read_aliases(source, reference.id_aliases())?;
            ctx.processing_state(entity_ref)?
                .register_identifier_hydrated_form(raw.clone())?;

            let lock_mode = ctx.resolve_lock_mode(entity_ref);
            let key_ctx = KeyResolutionContext::new(reference, lock_mode);
            let key = match resolve_entity_key(&raw, &key_ctx)? {
                KeyResolution::Missing => {
                    tracing::trace!(entity = %reference.entity(), "missing identifier, skipping subtree");
                    ctx.processing_state(entity_ref)?
                        .register_missing_identifier()?;
                    skipped[entity_ref.index()] = true;
                    continue;
                }
                KeyResolution::Resolved(key) => key,
            };
            ctx.processing_state(entity_ref)?
                .register_entity_key(key.clone())?;

            let attrs = read_aliases(source, reference.attr_aliases())?;
            ctx.processing_state(entity_ref)?
                .register_hydrated_state(attrs.clone())?;

            let allow_proxy = ctx.should_return_proxies() && entity_ref != plan.root();
            let resolved = resolve_instance(
                ctx.session_cache(),
                ctx.load_map(),
                self.factory,
                &key,
                &attrs,
                allow_proxy,
            )?;
            tracing::trace!(key = %key, source = ?resolved.source, "resolved entity");
            ctx.register_hydrated_entity(entity_ref, key, resolved.instance)?;
        }

        self.assemble(ctx, &plan, plan.root())?.ok_or_else(|| {
            Error::contract(
                ContractViolationKind::IllegalStateTransition,
                "row finished without a resolved root",
            )
        })
    }

    /// Assemble the tree below `entity_ref` from the row's processing
    /// states. `None` for references absent this row.
    fn assemble(
        &self,
        ctx: &RowContext<'_>,
        plan: &LoadPlan,
        entity_ref: EntityRef,
    ) -> Result<Option<GraphNode>> {
        let Some(state) = ctx.row_state(entity_ref) else {
            return Ok(None);
        };
        if state.is_missing_identifier() {
            return Ok(None);
        }
        let key = state.entity_key().cloned().ok_or_else(|| {
            Error::contract(
                ContractViolationKind::IllegalStateTransition,
                "assembling a reference whose key was never resolved",
            )
        })?;
        let instance = state.entity_instance().cloned().ok_or_else(|| {
            Error::contract(
                ContractViolationKind::IllegalStateTransition,
                "assembling a reference whose instance was never resolved",
            )
        })?;

        let mut fetches = Vec::with_capacity(plan.fetches_of(entity_ref).len());
        for &fetch_id in plan.fetches_of(entity_ref) {
            let fetch = plan.fetch(fetch_id).ok_or_else(|| {
                Error::contract(
                    ContractViolationKind::UnknownReference,
                    "plan adjacency yielded a fetch outside the plan",
                )
            })?;
            let child = self.assemble(ctx, plan, fetch.target())?;
            let value = match fetch.kind() {
                FetchKind::Entity => FetchValue::Entity(child),
                FetchKind::Collection => FetchValue::Collection(child.into_iter().collect()),
            };
            fetches.push((fetch_id, value));
        }
        Ok(Some(GraphNode {
            key,
            instance,
            fetches,
        }))
    }
}

fn read_aliases(source: &dyn RowSource, aliases: &[String]) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(aliases.len());
    for alias in aliases {
        values.push(source.read(alias)?.clone());
    }
    Ok(values)
}
