//! Hydrator - row hydration and identity resolution for flat SQL result sets.
//!
//! A joined SQL query returns a flat, denormalized grid: a root entity's
//! columns repeated once per collection member, nulls where an outer join
//! found nothing. Hydrator turns that grid back into object graphs:
//!
//! - A [`LoadPlan`] describes what one query populates: a root entity
//!   reference plus nested entity and collection fetches, keyed by result-set
//!   column aliases.
//! - A [`ResultSetProcessor`] walks a positioned [`RowSource`] cursor against
//!   the plan, resolving each entity's identity exactly once per load and
//!   assembling deduplicated [`GraphNode`] trees.
//! - Identity is two-tiered: a load-scoped map guarantees one instance per
//!   [`EntityKey`] within a result set, and a [`SessionCache`] carries
//!   instances across loads so a re-loaded entity resolves to the object the
//!   caller already holds.
//!
//! # Example
//!
//! ```ignore
//! use hydrator::prelude::*;
//!
//! let mut builder = LoadPlanBuilder::root(
//!     ReferenceSpec::new("Team", SqlType::BigInt)
//!         .id_alias("t_id")
//!         .attr_alias("t_name"),
//! );
//! let team = builder.root_ref();
//! builder.collection_fetch(
//!     team,
//!     "heroes",
//!     ReferenceSpec::new("Hero", SqlType::BigInt)
//!         .id_alias("h_id")
//!         .attr_alias("h_name"),
//! );
//! let plan = builder.build();
//!
//! let processor = ResultSetProcessor::new(plan, QueryParameters::new(), &factory);
//! let teams = processor.process(&mut cursor, &mut session)?;
//! ```

pub use hydrator_core::{
    ColumnInfo, ContractViolationError, ContractViolationKind, ConversionError,
    DataIntegrityError, Error, Result, Row, RowSource, SqlType, Value, VecRowSource,
};
pub use hydrator_engine::{
    EntityKey, FetchGraphWalker, FetchValue, GraphNode, Instance, InstanceFactory,
    KeyResolution, LoadIdentityMap, ProcessingState, Registered, ResolutionSource,
    ResolvedInstance, ResultSetProcessor, RowContext, SessionCache, SessionIdentityMap,
};
pub use hydrator_plan::{
    EntityRef, EntityReference, Fetch, FetchId, FetchKind, LoadPlan, LoadPlanBuilder, LockMode,
    LockModeResolver, QueryParameters, ReferenceSpec,
};

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use hydrator_core::{Error, Result, RowSource, SqlType, Value, VecRowSource};
    pub use hydrator_engine::{
        EntityKey, FetchValue, GraphNode, Instance, InstanceFactory, ResultSetProcessor,
        SessionCache, SessionIdentityMap,
    };
    pub use hydrator_plan::{
        EntityRef, FetchId, FetchKind, LoadPlan, LoadPlanBuilder, LockMode, QueryParameters,
        ReferenceSpec,
    };
}
