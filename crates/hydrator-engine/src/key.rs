//! Entity keys and raw-identifier resolution.

use hydrator_core::{DataIntegrityError, Error, Result, Value};
use hydrator_plan::{EntityReference, LockMode};
use std::fmt;
use std::sync::Arc;

/// Canonical identity of one entity instance: (entity type, converted
/// identifier value).
///
/// Keys are built only from **converted** identifier values, so two rows
/// carrying the same logical identifier — possibly at different raw integer
/// widths — always produce value-equal keys. That determinism is what allows
/// a parent repeated across many joined child rows to deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    entity: Arc<str>,
    id: Value,
}

impl EntityKey {
    /// Create a key from an entity type name and converted identifier.
    pub fn new(entity: Arc<str>, id: Value) -> Self {
        Self { entity, id }
    }

    /// The entity type name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The converted identifier value.
    pub fn id(&self) -> &Value {
        &self.id
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:?}", self.entity, self.id)
    }
}

/// What identifier resolution produced for one reference on one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    /// Identifier columns converted to a key.
    Resolved(EntityKey),
    /// All identifier columns null on an outer-joined reference: no
    /// associated row exists here.
    Missing,
}

/// Everything key resolution needs to know about the reference being
/// resolved.
#[derive(Debug)]
pub struct KeyResolutionContext<'a> {
    reference: &'a EntityReference,
    lock_mode: LockMode,
}

impl<'a> KeyResolutionContext<'a> {
    pub fn new(reference: &'a EntityReference, lock_mode: LockMode) -> Self {
        Self {
            reference,
            lock_mode,
        }
    }

    /// The entity reference whose identifier is being resolved.
    pub fn reference(&self) -> &EntityReference {
        self.reference
    }

    /// Effective lock mode for the reference.
    pub fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }
}

/// Convert raw identifier columns into a [`KeyResolution`].
///
/// Null handling depends on the reference:
/// - any null on an optional (outer-joined) reference resolves to `Missing`;
/// - any null on a required reference is a data-integrity failure;
/// - otherwise each column coerces through the reference's declared
///   identifier type. Composite identifiers become a `Value::Array` of the
///   coerced columns.
pub fn resolve_entity_key(raw: &[Value], ctx: &KeyResolutionContext<'_>) -> Result<KeyResolution> {
    let reference = ctx.reference();
    if raw.iter().any(Value::is_null) {
        if reference.is_optional() {
            return Ok(KeyResolution::Missing);
        }
        return Err(Error::DataIntegrity(DataIntegrityError {
            entity: reference.entity().to_string(),
            columns: reference.id_aliases().to_vec(),
            message: format!(
                "null identifier column for required reference '{}'",
                reference.entity()
            ),
        }));
    }

    let id = if raw.len() == 1 {
        coerce_column(ctx, 0, &raw[0])?
    } else {
        let mut parts = Vec::with_capacity(raw.len());
        for (i, value) in raw.iter().enumerate() {
            parts.push(coerce_column(ctx, i, value)?);
        }
        Value::Array(parts)
    };
    Ok(KeyResolution::Resolved(EntityKey::new(
        Arc::clone(reference.entity()),
        id,
    )))
}

fn coerce_column(ctx: &KeyResolutionContext<'_>, index: usize, value: &Value) -> Result<Value> {
    let reference = ctx.reference();
    reference.id_type().coerce(value).map_err(|mut err| {
        err.column = reference.id_aliases().get(index).cloned();
        Error::Conversion(err)
    })
}
