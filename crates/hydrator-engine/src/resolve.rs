//! Instance resolution: reuse, proxy, or hydrate.

use crate::identity::{Instance, LoadIdentityMap, SessionCache};
use crate::key::EntityKey;
use hydrator_core::{Result, Value};

/// External constructor of entity instances.
///
/// The engine never builds domain objects itself; proxy mechanics and
/// attribute materialization belong to the caller.
pub trait InstanceFactory {
    /// Build a fully-hydrated instance from the raw non-identifier column
    /// state recorded for the row.
    fn hydrate(&self, key: &EntityKey, state: &[Value]) -> Result<Instance>;

    /// Build an uninitialized placeholder for an entity whose state is not
    /// yet needed.
    fn proxy(&self, key: &EntityKey) -> Result<Instance>;
}

/// Where a resolved instance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Reused from the session-level identity map.
    SessionCache,
    /// Reused from the load-scoped identity map.
    LoadMap,
    /// Freshly created uninitialized proxy.
    Proxy,
    /// Freshly hydrated from raw column state.
    Hydrated,
}

/// A resolved instance together with its provenance.
#[derive(Debug)]
pub struct ResolvedInstance {
    pub instance: Instance,
    pub source: ResolutionSource,
}

/// Decide reuse-vs-proxy-vs-hydrate for a resolved key.
///
/// Checked strictly in order: session cache, then load-scoped map, then — if
/// `allow_proxy` — an uninitialized proxy, and only then fresh hydration
/// from `raw_state`. Both caches are consulted before any construction work,
/// so at most one instance is ever created per distinct key per load.
pub fn resolve_instance(
    session: &dyn SessionCache,
    load_map: &LoadIdentityMap,
    factory: &dyn InstanceFactory,
    key: &EntityKey,
    raw_state: &[Value],
    allow_proxy: bool,
) -> Result<ResolvedInstance> {
    if let Some(instance) = session.get(key) {
        tracing::trace!(key = %key, "reusing session instance");
        return Ok(ResolvedInstance {
            instance,
            source: ResolutionSource::SessionCache,
        });
    }
    if let Some(instance) = load_map.get(key) {
        tracing::trace!(key = %key, "reusing load-scoped instance");
        return Ok(ResolvedInstance {
            instance: instance.clone(),
            source: ResolutionSource::LoadMap,
        });
    }
    if allow_proxy {
        let instance = factory.proxy(key)?;
        tracing::trace!(key = %key, "created proxy");
        return Ok(ResolvedInstance {
            instance,
            source: ResolutionSource::Proxy,
        });
    }
    let instance = factory.hydrate(key, raw_state)?;
    tracing::trace!(key = %key, "hydrated new instance");
    Ok(ResolvedInstance {
        instance,
        source: ResolutionSource::Hydrated,
    })
}
