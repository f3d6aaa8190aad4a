//! The row-processing engine: identity resolution and graph assembly.
//!
//! This crate turns positioned result-set rows into object graphs against a
//! [`hydrator_plan::LoadPlan`]:
//!
//! - [`key`] converts raw identifier columns into [`EntityKey`]s
//! - [`state`] tracks each reference's per-row hydration phases
//! - [`identity`] holds the load- and session-scoped identity maps
//! - [`context`] ties the per-row state to the plan and the session
//! - [`resolve`] picks an instance source (session, load map, proxy, hydrate)
//! - [`walker`] traverses the plan for one row and assembles a [`GraphNode`]
//! - [`processor`] drives the cursor and deduplicates root graphs

pub mod context;
pub mod identity;
pub mod key;
pub mod processor;
pub mod resolve;
pub mod state;
pub mod walker;

pub use context::RowContext;
pub use identity::{Instance, LoadIdentityMap, Registered, SessionCache, SessionIdentityMap};
pub use key::{EntityKey, KeyResolution, KeyResolutionContext, resolve_entity_key};
pub use processor::ResultSetProcessor;
pub use resolve::{InstanceFactory, ResolutionSource, ResolvedInstance, resolve_instance};
pub use state::ProcessingState;
pub use walker::{FetchGraphWalker, FetchValue, GraphNode};
