//! Top-level result set processing: rows in, deduplicated roots out.

use crate::context::RowContext;
use crate::identity::SessionCache;
use crate::resolve::InstanceFactory;
use crate::walker::{FetchGraphWalker, GraphNode};
use hydrator_core::{Result, RowSource};
use hydrator_plan::{LoadPlan, QueryParameters};
use std::sync::Arc;

/// Turns a flat joined result set into a list of root object graphs.
///
/// One processor serves one query execution: it owns the plan and the query
/// parameters, borrows the instance factory, and builds a fresh
/// [`RowContext`] per call to [`process`](Self::process). Roots are
/// deduplicated by entity key across the whole result set, so a root joined
/// against a ten-member collection comes back once with ten members, not ten
/// times.
pub struct ResultSetProcessor<'f> {
    plan: Arc<LoadPlan>,
    params: QueryParameters,
    factory: &'f dyn InstanceFactory,
}

impl<'f> ResultSetProcessor<'f> {
    /// Create a processor for one query execution.
    pub fn new(
        plan: Arc<LoadPlan>,
        params: QueryParameters,
        factory: &'f dyn InstanceFactory,
    ) -> Self {
        Self {
            plan,
            params,
            factory,
        }
    }

    /// Consume `source` to exhaustion and assemble the root graphs.
    ///
    /// Instances registered during completed portions of the load are merged
    /// into `session` even when a later row fails; a load is at least
    /// partially complete, never rolled back.
    #[tracing::instrument(skip_all, fields(references = self.plan.len()))]
    pub fn process(
        &self,
        source: &mut dyn RowSource,
        session: &mut dyn SessionCache,
    ) -> Result<Vec<GraphNode>> {
        let mut ctx = RowContext::new(Arc::clone(&self.plan), self.params.clone(), session);
        let walker = FetchGraphWalker::new(self.factory);
        let mut roots: Vec<GraphNode> = Vec::new();
        let mut rows = 0usize;

        while source.advance()? {
            rows += 1;
            let outcome = walker.read_row(&mut ctx, source);
            // Merge before propagating so a failed row keeps what it managed
            // to hydrate.
            ctx.end_row();
            let node = outcome?;
            if let Some(existing) = roots.iter_mut().find(|root| root.key == node.key) {
                existing.merge_from(node);
            } else {
                roots.push(node);
            }
        }

        tracing::debug!(rows, roots = roots.len(), "result set processed");
        Ok(roots)
    }
}
