//! Load plans for the hydrator engine.
//!
//! A load plan is the immutable, query-compilation-time description of what a
//! query populates: one root entity reference plus nested entity and
//! collection fetches. The engine walks it once per row; nothing in this
//! crate is mutated after [`LoadPlanBuilder::build`].

pub mod lock;
pub mod plan;

pub use lock::{LockMode, LockModeResolver, QueryParameters};
pub use plan::{
    EntityRef, EntityReference, Fetch, FetchId, FetchKind, LoadPlan, LoadPlanBuilder,
    ReferenceSpec,
};
