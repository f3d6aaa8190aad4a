//! Error types for row processing.

use std::fmt;

/// The primary error type for hydration operations.
///
/// Every error aborts processing of the current row and surfaces to the
/// caller; there are no internal retries and nothing is swallowed.
#[derive(Debug)]
pub enum Error {
    /// Required identifier columns were null.
    DataIntegrity(DataIntegrityError),
    /// A caller or collaborator broke the engine's contract.
    ContractViolation(ContractViolationError),
    /// Raw-to-typed conversion failure.
    Conversion(ConversionError),
}

/// A required (non-outer-joined) entity reference produced null identifier
/// columns for the current row.
#[derive(Debug)]
pub struct DataIntegrityError {
    /// Entity type name of the offending reference.
    pub entity: String,
    /// The identifier column aliases that were read.
    pub columns: Vec<String>,
    pub message: String,
}

#[derive(Debug)]
pub struct ContractViolationError {
    pub kind: ContractViolationKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolationKind {
    /// A different instance was registered for an already-present key.
    DuplicateIdentity,
    /// An entity reference that is not part of the load plan was passed in.
    UnknownReference,
    /// A processing-state transition was attempted out of order.
    IllegalStateTransition,
    /// The row cursor was read before `advance` or after exhaustion.
    CursorProtocol,
}

/// Conversion failure, propagated from the type-conversion layer.
#[derive(Debug)]
pub struct ConversionError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Shorthand for a contract violation with a formatted message.
    pub fn contract(kind: ContractViolationKind, message: impl Into<String>) -> Self {
        Error::ContractViolation(ContractViolationError {
            kind,
            message: message.into(),
        })
    }

    /// The contract-violation kind, if this is one.
    pub fn contract_kind(&self) -> Option<ContractViolationKind> {
        match self {
            Error::ContractViolation(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DataIntegrity(e) => write!(f, "Data integrity error: {}", e.message),
            Error::ContractViolation(e) => write!(f, "Contract violation: {}", e.message),
            Error::Conversion(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Conversion error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(
                        f,
                        "Conversion error: expected {}, found {}",
                        e.expected, e.actual
                    )
                }
            }
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for DataIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ContractViolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<DataIntegrityError> for Error {
    fn from(err: DataIntegrityError) -> Self {
        Error::DataIntegrity(err)
    }
}

impl From<ContractViolationError> for Error {
    fn from(err: ContractViolationError) -> Self {
        Error::ContractViolation(err)
    }
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Error::Conversion(err)
    }
}

/// Result type alias for hydration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let err = Error::DataIntegrity(DataIntegrityError {
            entity: "Hero".to_string(),
            columns: vec!["hero_id".to_string()],
            message: "null identifier for required reference 'Hero'".to_string(),
        });
        assert!(err.to_string().starts_with("Data integrity error"));

        let err = Error::contract(ContractViolationKind::DuplicateIdentity, "two instances");
        assert!(err.to_string().starts_with("Contract violation"));
        assert_eq!(
            err.contract_kind(),
            Some(ContractViolationKind::DuplicateIdentity)
        );
    }

    #[test]
    fn conversion_display_names_column() {
        let err = Error::Conversion(ConversionError {
            expected: "BIGINT",
            actual: "TEXT".to_string(),
            column: Some("hero_id".to_string()),
        });
        let rendered = err.to_string();
        assert!(rendered.contains("hero_id"));
        assert!(rendered.contains("BIGINT"));
    }
}
