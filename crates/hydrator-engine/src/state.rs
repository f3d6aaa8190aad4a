//! Per-row processing state for one entity reference.

use crate::identity::Instance;
use crate::key::EntityKey;
use hydrator_core::{ContractViolationKind, Error, Result, Value};

/// How far hydration has progressed for one reference on the current row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Unstarted,
    IdentifierHydrated,
    KeyResolved,
    Missing,
    InstanceResolved,
}

/// Everything known about one entity reference while the current row is
/// processed.
///
/// The record advances through a fixed state machine:
///
/// ```text
/// UNSTARTED -> IDENTIFIER_HYDRATED -> { KEY_RESOLVED | MISSING }
///                                          -> INSTANCE_RESOLVED
/// ```
///
/// Registration out of order is a contract violation. Accessors never fail:
/// a not-yet-reached stage simply reads back as `None`/`false`. The record
/// is created lazily on first access within a row and dropped wholesale when
/// the row finishes.
#[derive(Debug, Default)]
pub struct ProcessingState {
    phase: Phase,
    identifier_hydrated_form: Option<Vec<Value>>,
    key: Option<EntityKey>,
    hydrated_state: Option<Vec<Value>>,
    instance: Option<Instance>,
}

impl ProcessingState {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn illegal(&self, attempted: &str) -> Error {
        Error::contract(
            ContractViolationKind::IllegalStateTransition,
            format!("{attempted} in phase {:?}", self.phase()),
        )
    }

    /// Store the raw, unconverted identifier column values for this row.
    pub fn register_identifier_hydrated_form(&mut self, raw: Vec<Value>) -> Result<()> {
        if self.phase() != Phase::Unstarted {
            return Err(self.illegal("register_identifier_hydrated_form"));
        }
        self.identifier_hydrated_form = Some(raw);
        self.set_phase(Phase::IdentifierHydrated);
        Ok(())
    }

    /// Record that no identifier was found for this row: the reference is
    /// outer-joined and no associated row exists here. All fetch processing
    /// below this reference is short-circuited for the row.
    pub fn register_missing_identifier(&mut self) -> Result<()> {
        if self.phase() != Phase::IdentifierHydrated {
            return Err(self.illegal("register_missing_identifier"));
        }
        self.set_phase(Phase::Missing);
        Ok(())
    }

    /// Record the resolved entity key for this row.
    ///
    /// Once registered, the key is immutable for the rest of the row:
    /// re-registering the identical key is a no-op, a different key is a
    /// contract violation.
    pub fn register_entity_key(&mut self, key: EntityKey) -> Result<()> {
        match self.phase() {
            Phase::IdentifierHydrated => {
                self.key = Some(key);
                self.set_phase(Phase::KeyResolved);
                Ok(())
            }
            Phase::KeyResolved | Phase::InstanceResolved => {
                if self.key.as_ref() == Some(&key) {
                    Ok(())
                } else {
                    Err(self.illegal("register_entity_key with a different key"))
                }
            }
            _ => Err(self.illegal("register_entity_key")),
        }
    }

    /// Store the raw non-identifier column values. Valid only once the key
    /// is resolved.
    pub fn register_hydrated_state(&mut self, columns: Vec<Value>) -> Result<()> {
        if !matches!(self.phase(), Phase::KeyResolved | Phase::InstanceResolved) {
            return Err(self.illegal("register_hydrated_state"));
        }
        self.hydrated_state = Some(columns);
        Ok(())
    }

    /// Record the final instance, reused or newly hydrated.
    ///
    /// Idempotent for the same instance; registering a different instance is
    /// a duplicate-identity contract violation.
    pub fn register_entity_instance(&mut self, instance: Instance) -> Result<()> {
        match self.phase() {
            Phase::KeyResolved => {
                self.instance = Some(instance);
                self.set_phase(Phase::InstanceResolved);
                Ok(())
            }
            Phase::InstanceResolved => {
                let existing = self.instance.as_ref();
                if existing.is_some_and(|e| e.ptr_eq(&instance)) {
                    Ok(())
                } else {
                    Err(Error::contract(
                        ContractViolationKind::DuplicateIdentity,
                        "a different instance is already registered for this reference",
                    ))
                }
            }
            _ => Err(self.illegal("register_entity_instance")),
        }
    }

    /// Whether this reference's identifier was null for the row.
    pub fn is_missing_identifier(&self) -> bool {
        self.phase() == Phase::Missing
    }

    /// The raw identifier column values, if registered.
    pub fn identifier_hydrated_form(&self) -> Option<&[Value]> {
        self.identifier_hydrated_form.as_deref()
    }

    /// The resolved key, if resolution has happened.
    pub fn entity_key(&self) -> Option<&EntityKey> {
        self.key.as_ref()
    }

    /// The raw non-identifier column values, if registered.
    pub fn hydrated_state(&self) -> Option<&[Value]> {
        self.hydrated_state.as_deref()
    }

    /// The resolved instance, if resolution has happened.
    pub fn entity_instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }
}
