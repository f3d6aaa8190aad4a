//! Core types for the hydrator engine.
//!
//! This crate provides the foundational abstractions shared by the load plan
//! and the row-processing engine:
//!
//! - `Value` for dynamically-typed column values
//! - `Row`/`ColumnInfo` and the positioned `RowSource` cursor
//! - `SqlType` and raw-to-typed coercion
//! - the error taxonomy (`DataIntegrity`, `ContractViolation`, `Conversion`)

pub mod error;
pub mod row;
pub mod types;
pub mod value;

pub use error::{
    ContractViolationError, ContractViolationKind, ConversionError, DataIntegrityError, Error,
    Result,
};
pub use row::{ColumnInfo, Row, RowSource, VecRowSource};
pub use types::SqlType;
pub use value::Value;
