//! The load plan: an immutable description of what one query populates.
//!
//! A plan is an arena of [`EntityReference`] nodes connected by [`Fetch`]
//! edges. Index-based edges (rather than owned child nodes) keep
//! self-referential plans — an entity fetching its own type — free of
//! ownership cycles. A plan is built once per query compilation and shared
//! read-only across every row of an execution.

use hydrator_core::SqlType;
use std::sync::Arc;

/// Index of one entity reference within a [`LoadPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef(usize);

impl EntityRef {
    /// The arena index of this reference.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of one fetch edge within a [`LoadPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchId(usize);

impl FetchId {
    /// The arena index of this fetch.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Column shape of one entity position: its type name, identifier type, and
/// the result-set aliases its columns arrive under.
#[derive(Debug, Clone)]
pub struct ReferenceSpec {
    entity: Arc<str>,
    id_type: SqlType,
    id_aliases: Vec<String>,
    attr_aliases: Vec<String>,
}

impl ReferenceSpec {
    /// Create a spec for an entity with the given identifier type.
    pub fn new(entity: &str, id_type: SqlType) -> Self {
        Self {
            entity: Arc::from(entity),
            id_type,
            id_aliases: Vec::new(),
            attr_aliases: Vec::new(),
        }
    }

    /// Add an identifier column alias. Composite identifiers add several.
    #[must_use]
    pub fn id_alias(mut self, alias: &str) -> Self {
        self.id_aliases.push(alias.to_string());
        self
    }

    /// Add a non-identifier attribute column alias.
    #[must_use]
    pub fn attr_alias(mut self, alias: &str) -> Self {
        self.attr_aliases.push(alias.to_string());
        self
    }
}

/// One mapped entity position (root or fetched) in a load plan.
#[derive(Debug)]
pub struct EntityReference {
    entity: Arc<str>,
    id_type: SqlType,
    id_aliases: Vec<String>,
    attr_aliases: Vec<String>,
    owner: Option<EntityRef>,
    optional: bool,
}

impl EntityReference {
    /// The entity type name.
    pub fn entity(&self) -> &Arc<str> {
        &self.entity
    }

    /// The declared identifier type.
    pub fn id_type(&self) -> &SqlType {
        &self.id_type
    }

    /// Result-set aliases of the identifier columns.
    pub fn id_aliases(&self) -> &[String] {
        &self.id_aliases
    }

    /// Result-set aliases of the non-identifier attribute columns.
    pub fn attr_aliases(&self) -> &[String] {
        &self.attr_aliases
    }

    /// The owning reference, `None` for the root.
    pub fn owner(&self) -> Option<EntityRef> {
        self.owner
    }

    /// Whether this is the plan's root reference.
    pub fn is_root(&self) -> bool {
        self.owner.is_none()
    }

    /// Whether this reference is outer-joined and may be absent for a row.
    /// The root is never optional.
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Whether a fetch targets a single-valued or collection-valued association.
///
/// Consumers match on this tag; there is no polymorphic dispatch over fetch
/// kinds anywhere in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Single-valued association: at most one value per owner.
    Entity,
    /// Collection-valued association: values accumulate across rows.
    Collection,
}

/// An association edge from an owner reference to a fetched reference.
#[derive(Debug)]
pub struct Fetch {
    owner: EntityRef,
    target: EntityRef,
    association: String,
    kind: FetchKind,
}

impl Fetch {
    /// The owning reference.
    pub fn owner(&self) -> EntityRef {
        self.owner
    }

    /// The fetched reference.
    pub fn target(&self) -> EntityRef {
        self.target
    }

    /// The association name on the owner.
    pub fn association(&self) -> &str {
        &self.association
    }

    /// Entity- or collection-valued.
    pub fn kind(&self) -> FetchKind {
        self.kind
    }
}

/// Immutable tree describing what to load for one query.
#[derive(Debug)]
pub struct LoadPlan {
    refs: Vec<EntityReference>,
    fetches: Vec<Fetch>,
    root: EntityRef,
    /// Fetch ids grouped by owner, in declaration order.
    children: Vec<Vec<FetchId>>,
}

impl LoadPlan {
    /// The root entity reference.
    pub fn root(&self) -> EntityRef {
        self.root
    }

    /// Look up a reference node.
    pub fn reference(&self, entity_ref: EntityRef) -> Option<&EntityReference> {
        self.refs.get(entity_ref.0)
    }

    /// Look up a fetch edge.
    pub fn fetch(&self, fetch: FetchId) -> Option<&Fetch> {
        self.fetches.get(fetch.0)
    }

    /// Check that a reference belongs to this plan.
    pub fn contains(&self, entity_ref: EntityRef) -> bool {
        entity_ref.0 < self.refs.len()
    }

    /// Fetches owned by the given reference, in declaration order.
    pub fn fetches_of(&self, owner: EntityRef) -> &[FetchId] {
        self.children
            .get(owner.0)
            .map_or(&[], std::vec::Vec::as_slice)
    }

    /// The owner reference of a fetch edge.
    pub fn owner_of(&self, fetch: FetchId) -> Option<EntityRef> {
        self.fetch(fetch).map(Fetch::owner)
    }

    /// Number of entity references in the plan.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// A plan always has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// References in the fixed traversal order: root first, then each fetch
    /// subtree depth-first in declaration order. Every owner precedes all of
    /// its fetches.
    pub fn preorder(&self) -> Vec<EntityRef> {
        let mut order = Vec::with_capacity(self.refs.len());
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            order.push(current);
            // Push in reverse so declaration order pops first.
            for fetch in self.fetches_of(current).iter().rev() {
                stack.push(self.fetches[fetch.0].target);
            }
        }
        order
    }
}

/// Builder for [`LoadPlan`].
///
/// Fetched references are appended after their owners, which is what makes
/// the pre-order traversal owner-before-fetch by construction.
#[derive(Debug)]
pub struct LoadPlanBuilder {
    refs: Vec<EntityReference>,
    fetches: Vec<Fetch>,
    children: Vec<Vec<FetchId>>,
}

impl LoadPlanBuilder {
    /// Start a plan with the given root entity. The root is always required.
    pub fn root(spec: ReferenceSpec) -> Self {
        let root = EntityReference {
            entity: spec.entity,
            id_type: spec.id_type,
            id_aliases: spec.id_aliases,
            attr_aliases: spec.attr_aliases,
            owner: None,
            optional: false,
        };
        Self {
            refs: vec![root],
            fetches: Vec::new(),
            children: vec![Vec::new()],
        }
    }

    /// The root reference of the plan under construction.
    pub fn root_ref(&self) -> EntityRef {
        EntityRef(0)
    }

    /// Add a single-valued association fetch under `owner`.
    ///
    /// `optional` marks an outer-joined fetch whose identifier columns may
    /// all be null for a given row.
    pub fn entity_fetch(
        &mut self,
        owner: EntityRef,
        association: &str,
        spec: ReferenceSpec,
        optional: bool,
    ) -> EntityRef {
        self.add_fetch(owner, association, spec, FetchKind::Entity, optional)
    }

    /// Add a collection-valued association fetch under `owner`.
    /// Collection fetches are always outer-joined and thus optional.
    pub fn collection_fetch(
        &mut self,
        owner: EntityRef,
        association: &str,
        spec: ReferenceSpec,
    ) -> EntityRef {
        self.add_fetch(owner, association, spec, FetchKind::Collection, true)
    }

    fn add_fetch(
        &mut self,
        owner: EntityRef,
        association: &str,
        spec: ReferenceSpec,
        kind: FetchKind,
        optional: bool,
    ) -> EntityRef {
        assert!(owner.0 < self.refs.len(), "fetch owner not in plan");
        let target = EntityRef(self.refs.len());
        self.refs.push(EntityReference {
            entity: spec.entity,
            id_type: spec.id_type,
            id_aliases: spec.id_aliases,
            attr_aliases: spec.attr_aliases,
            owner: Some(owner),
            optional,
        });
        self.children.push(Vec::new());
        let fetch = FetchId(self.fetches.len());
        self.fetches.push(Fetch {
            owner,
            target,
            association: association.to_string(),
            kind,
        });
        self.children[owner.0].push(fetch);
        target
    }

    /// Finish the plan.
    pub fn build(self) -> Arc<LoadPlan> {
        tracing::debug!(
            references = self.refs.len(),
            fetches = self.fetches.len(),
            "built load plan"
        );
        Arc::new(LoadPlan {
            refs: self.refs,
            fetches: self.fetches,
            root: EntityRef(0),
            children: self.children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(entity: &str, id: &str) -> ReferenceSpec {
        ReferenceSpec::new(entity, SqlType::BigInt).id_alias(id)
    }

    #[test]
    fn preorder_visits_owner_before_fetch() {
        let mut builder = LoadPlanBuilder::root(spec("Team", "t_id"));
        let root = builder.root_ref();
        let heroes = builder.collection_fetch(root, "heroes", spec("Hero", "h_id"));
        let hq = builder.entity_fetch(root, "headquarters", spec("Hq", "q_id"), true);
        let powers = builder.collection_fetch(heroes, "powers", spec("Power", "p_id"));
        let plan = builder.build();

        let order = plan.preorder();
        assert_eq!(order, vec![root, heroes, powers, hq]);

        // Every owner precedes all of its fetched references.
        for (i, r) in order.iter().enumerate() {
            if let Some(owner) = plan.reference(*r).unwrap().owner() {
                assert!(order[..i].contains(&owner));
            }
        }
    }

    #[test]
    fn fetch_edges_carry_kind_and_association() {
        let mut builder = LoadPlanBuilder::root(spec("Team", "t_id"));
        let root = builder.root_ref();
        let heroes = builder.collection_fetch(root, "heroes", spec("Hero", "h_id"));
        let plan = builder.build();

        let fetch_ids = plan.fetches_of(root);
        assert_eq!(fetch_ids.len(), 1);
        let fetch = plan.fetch(fetch_ids[0]).unwrap();
        assert_eq!(fetch.kind(), FetchKind::Collection);
        assert_eq!(fetch.association(), "heroes");
        assert_eq!(fetch.owner(), root);
        assert_eq!(fetch.target(), heroes);
        assert_eq!(plan.owner_of(fetch_ids[0]), Some(root));
    }

    #[test]
    fn root_is_required_and_collections_are_optional() {
        let mut builder = LoadPlanBuilder::root(spec("Team", "t_id"));
        let root = builder.root_ref();
        let heroes = builder.collection_fetch(root, "heroes", spec("Hero", "h_id"));
        let hq = builder.entity_fetch(root, "headquarters", spec("Hq", "q_id"), false);
        let plan = builder.build();

        assert!(plan.reference(root).unwrap().is_root());
        assert!(!plan.reference(root).unwrap().is_optional());
        assert!(plan.reference(heroes).unwrap().is_optional());
        assert!(!plan.reference(hq).unwrap().is_optional());
    }

    #[test]
    fn self_referential_plan_builds() {
        // An entity fetching its own type: Employee -> manager (Employee).
        let mut builder = LoadPlanBuilder::root(spec("Employee", "e_id"));
        let root = builder.root_ref();
        let manager = builder.entity_fetch(root, "manager", spec("Employee", "m_id"), true);
        let plan = builder.build();

        assert_eq!(
            plan.reference(root).unwrap().entity(),
            plan.reference(manager).unwrap().entity()
        );
        assert_eq!(plan.preorder(), vec![root, manager]);
    }

    #[test]
    fn contains_rejects_foreign_indices() {
        let plan = LoadPlanBuilder::root(spec("Team", "t_id")).build();
        assert!(plan.contains(plan.root()));
        assert_eq!(plan.len(), 1);

        let mut other = LoadPlanBuilder::root(spec("Team", "t_id"));
        let foreign = other.collection_fetch(other.root_ref(), "heroes", spec("Hero", "h_id"));
        assert!(!plan.contains(foreign));
    }
}
