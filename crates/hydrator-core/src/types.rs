//! SQL type definitions and raw-to-typed coercion.
//!
//! `SqlType::coerce` is the type-conversion layer the engine leans on when it
//! turns raw identifier columns into canonical identifier values. Coercion is
//! deterministic: the same raw value always produces the same canonical
//! `Value`, regardless of which row it came from. That determinism is what
//! lets a parent repeated across many joined child rows resolve to one key.

use crate::error::ConversionError;
use crate::value::Value;

/// SQL storage classes an identifier or attribute column can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal,
    Boolean,
    Text,
    Blob,
    Date,
    Timestamp,
    Uuid,
    Json,
}

impl SqlType {
    /// Get the SQL type name for this type.
    pub const fn sql_name(&self) -> &'static str {
        match self {
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Real => "REAL",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Decimal => "DECIMAL",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
            SqlType::Date => "DATE",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Uuid => "UUID",
            SqlType::Json => "JSON",
        }
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlType::SmallInt
                | SqlType::Integer
                | SqlType::BigInt
                | SqlType::Real
                | SqlType::Double
                | SqlType::Decimal
        )
    }

    /// Coerce a raw value into the canonical `Value` for this type.
    ///
    /// Integer widths widen to the declared width; narrowing that would lose
    /// data fails. `Null` passes through unchanged (nullability is the
    /// caller's concern, not the conversion layer's).
    pub fn coerce(&self, raw: &Value) -> Result<Value, ConversionError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let coerced = match self {
            SqlType::SmallInt => match raw {
                Value::SmallInt(v) => Some(Value::SmallInt(*v)),
                Value::Int(v) => i16::try_from(*v).ok().map(Value::SmallInt),
                Value::BigInt(v) => i16::try_from(*v).ok().map(Value::SmallInt),
                _ => None,
            },
            SqlType::Integer => match raw {
                Value::SmallInt(v) => Some(Value::Int(i32::from(*v))),
                Value::Int(v) => Some(Value::Int(*v)),
                Value::BigInt(v) => i32::try_from(*v).ok().map(Value::Int),
                _ => None,
            },
            SqlType::BigInt => raw.as_i64().map(Value::BigInt),
            SqlType::Real => match raw {
                Value::Float(v) => Some(Value::Float(*v)),
                _ => None,
            },
            SqlType::Double => raw.as_f64().map(Value::Double),
            SqlType::Decimal => match raw {
                Value::Decimal(s) => Some(Value::Decimal(s.clone())),
                Value::Text(s) => Some(Value::Decimal(s.clone())),
                _ => None,
            },
            SqlType::Boolean => raw.as_bool().map(Value::Bool),
            SqlType::Text => raw.as_str().map(|s| Value::Text(s.to_string())),
            SqlType::Blob => match raw {
                Value::Bytes(b) => Some(Value::Bytes(b.clone())),
                _ => None,
            },
            SqlType::Date => match raw {
                Value::Date(d) => Some(Value::Date(*d)),
                Value::Int(d) => Some(Value::Date(*d)),
                _ => None,
            },
            SqlType::Timestamp => match raw {
                Value::Timestamp(ts) => Some(Value::Timestamp(*ts)),
                Value::BigInt(ts) => Some(Value::Timestamp(*ts)),
                _ => None,
            },
            SqlType::Uuid => match raw {
                Value::Uuid(u) => Some(Value::Uuid(*u)),
                Value::Bytes(b) if b.len() == 16 => {
                    let mut arr = [0u8; 16];
                    arr.copy_from_slice(b);
                    Some(Value::Uuid(arr))
                }
                _ => None,
            },
            SqlType::Json => match raw {
                Value::Json(j) => Some(Value::Json(j.clone())),
                Value::Text(s) => serde_json::from_str(s).ok().map(Value::Json),
                _ => None,
            },
        };
        coerced.ok_or_else(|| ConversionError {
            expected: self.sql_name(),
            actual: raw.type_name().to_string(),
            column: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widths_widen() {
        assert_eq!(
            SqlType::BigInt.coerce(&Value::Int(5)).unwrap(),
            Value::BigInt(5)
        );
        assert_eq!(
            SqlType::BigInt.coerce(&Value::SmallInt(5)).unwrap(),
            Value::BigInt(5)
        );
        assert_eq!(
            SqlType::Integer.coerce(&Value::SmallInt(5)).unwrap(),
            Value::Int(5)
        );
    }

    #[test]
    fn narrowing_out_of_range_fails() {
        assert!(SqlType::SmallInt.coerce(&Value::Int(100_000)).is_err());
        assert!(SqlType::Integer.coerce(&Value::BigInt(i64::MAX)).is_err());
        // In range narrows fine.
        assert_eq!(
            SqlType::SmallInt.coerce(&Value::BigInt(12)).unwrap(),
            Value::SmallInt(12)
        );
    }

    #[test]
    fn coercion_is_deterministic_across_forms() {
        // The same logical identifier arriving as Int or BigInt coerces to
        // the same canonical value.
        let a = SqlType::BigInt.coerce(&Value::Int(42)).unwrap();
        let b = SqlType::BigInt.coerce(&Value::BigInt(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn null_passes_through() {
        assert_eq!(SqlType::BigInt.coerce(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn mismatched_type_reports_names() {
        let err = SqlType::Uuid.coerce(&Value::Int(1)).unwrap_err();
        assert_eq!(err.expected, "UUID");
        assert_eq!(err.actual, "INTEGER");
    }

    #[test]
    fn uuid_from_bytes() {
        let bytes = vec![7u8; 16];
        assert_eq!(
            SqlType::Uuid.coerce(&Value::Bytes(bytes)).unwrap(),
            Value::Uuid([7u8; 16])
        );
        assert!(SqlType::Uuid.coerce(&Value::Bytes(vec![7u8; 4])).is_err());
    }
}
