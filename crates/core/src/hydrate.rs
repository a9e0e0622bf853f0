//! Casts a raw [`adapter::Row`] into a property-keyed value map, following
//! each field's declared `sql_type`/`source_type` pair. The derive macro
//! generates the final `TryFrom<HydratedRow>` for a concrete resource type;
//! this module only owns the untyped cast, so it stays usable from
//! `relations.rs` and `upsert.rs` without needing the target type in scope.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::adapter::Row;
use crate::error::{Error, Result, SchemaStateError};
use crate::resource::{ColumnAnnotation, FieldAnnotation, ResourceDescriptor};
use crate::schema::ColumnType;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Json(JsonValue),
    Timestamp(NaiveDateTime),
}

impl Value {
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HydratedRow {
    values: BTreeMap<String, Value>,
}

impl HydratedRow {
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    /// Casts every column-backed field the descriptor declares. Fields
    /// with no matching column in `row` (e.g. a relation the query didn't
    /// join) are simply absent from the result, not an error.
    pub fn from_row(row: &Row, descriptor: &'static ResourceDescriptor) -> Result<Self> {
        let mut values = BTreeMap::new();

        for field in descriptor.fields {
            let Some(column) = &field.column else {
                continue;
            };
            let column_name = column.name.unwrap_or(field.property_name);
            let Some(raw) = row.get(column_name) else {
                continue;
            };
            let value = cast_value(descriptor.table_name, raw, column, field.source_type)?;
            values.insert(field.property_name.to_string(), value);
        }

        Ok(Self { values })
    }
}

fn cast_value(table: &str, raw: &[u8], column: &ColumnAnnotation, source_type: &str) -> Result<Value> {
    let text = std::str::from_utf8(raw).map_err(|_| SchemaStateError::MalformedRow {
        table: table.to_string(),
        reason: "column value was not valid UTF-8".to_string(),
    })?;

    let backing = source_type.strip_prefix("enum:").unwrap_or(source_type);

    match column.sql_type {
        ColumnType::TinyInt | ColumnType::SmallInt | ColumnType::Int | ColumnType::BigInt | ColumnType::Year => {
            parse_int(table, text).map(Value::Int)
        }
        ColumnType::Boolean => parse_int(table, text).map(|v| Value::Bool(v != 0)),
        ColumnType::Float | ColumnType::Double | ColumnType::Decimal if backing == "floating" => {
            parse_float(table, text).map(Value::Float)
        }
        ColumnType::Json => serde_json::from_str(text)
            .map(Value::Json)
            .or_else(|_| Ok(Value::Str(text.to_string()))),
        ColumnType::DateTime | ColumnType::Timestamp if backing == "timestamp" => parse_timestamp(table, text),
        ColumnType::Blob | ColumnType::Binary => Ok(Value::Str(text.to_string())),
        _ => Ok(Value::Str(text.to_string())),
    }
}

fn parse_int(table: &str, text: &str) -> Result<i64> {
    text.parse().map_err(|_| {
        Error::SchemaState(SchemaStateError::MalformedRow {
            table: table.to_string(),
            reason: format!("expected an integer, got `{text}`"),
        })
    })
}

fn parse_float(table: &str, text: &str) -> Result<f64> {
    text.parse().map_err(|_| {
        Error::SchemaState(SchemaStateError::MalformedRow {
            table: table.to_string(),
            reason: format!("expected a floating-point value, got `{text}`"),
        })
    })
}

fn parse_timestamp(table: &str, text: &str) -> Result<Value> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Value::Timestamp(parsed));
        }
    }
    Err(Error::SchemaState(SchemaStateError::MalformedRow {
        table: table.to_string(),
        reason: format!("could not parse `{text}` as a timestamp"),
    }))
}

#[must_use]
pub fn field_by_property<'a>(
    descriptor: &'a ResourceDescriptor,
    property: &str,
) -> Option<&'a FieldAnnotation> {
    descriptor.fields.iter().find(|f| f.property_name == property)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_columns_cast_from_decimal_text() {
        let column = ColumnAnnotation {
            sql_type: ColumnType::Int,
            length: None,
            precision: None,
            scale: None,
            default: None,
            nullable: false,
            name: None,
        };
        let value = cast_value("widgets", b"42", &column, "integer").unwrap();
        assert_eq!(value.as_i64(), Some(42));
    }

    #[test]
    fn boolean_columns_cast_from_tinyint_text() {
        let column = ColumnAnnotation {
            sql_type: ColumnType::Boolean,
            length: None,
            precision: None,
            scale: None,
            default: None,
            nullable: false,
            name: None,
        };
        assert_eq!(cast_value("widgets", b"1", &column, "boolean").unwrap(), Value::Bool(true));
        assert_eq!(cast_value("widgets", b"0", &column, "boolean").unwrap(), Value::Bool(false));
    }
}
