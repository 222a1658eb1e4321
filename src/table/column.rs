//! Column expressions
//!
//! A small expression language over JSON rows: field references by dotted
//! path, literals, `explode`, and aliasing.

use super::types::Row;
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// A column expression evaluated per row
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Field reference, dotted for nested objects (`titleListMap.MONDAY`)
    Field(String),
    /// The same value on every row
    Literal(JsonValue),
    /// One output row per element of an array-valued expression
    Explode(Box<Column>),
    /// Rename the output column
    Alias(Box<Column>, String),
}

/// Reference a field by dotted path
pub fn col(path: impl Into<String>) -> Column {
    Column::Field(path.into())
}

/// A literal column
pub fn lit(value: impl Into<JsonValue>) -> Column {
    Column::Literal(value.into())
}

/// Expand an array-valued column into one row per element
pub fn explode(column: Column) -> Column {
    Column::Explode(Box::new(column))
}

impl Column {
    /// Rename the output column
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Self {
        Column::Alias(Box::new(self), name.into())
    }

    /// Output column name
    ///
    /// Fields are named after their last path segment, literals after their
    /// value and generators `col`, unless aliased.
    pub fn name(&self) -> String {
        match self {
            Column::Field(path) => path.rsplit('.').next().unwrap_or(path).to_string(),
            Column::Literal(JsonValue::String(s)) => s.clone(),
            Column::Literal(value) => value.to_string(),
            Column::Explode(_) => "col".to_string(),
            Column::Alias(_, name) => name.clone(),
        }
    }

    /// Whether this expression produces a variable number of rows
    pub fn is_generator(&self) -> bool {
        match self {
            Column::Explode(_) => true,
            Column::Alias(inner, _) => inner.is_generator(),
            Column::Field(_) | Column::Literal(_) => false,
        }
    }

    /// Field paths this expression reads
    pub fn referenced_paths(&self) -> Vec<&str> {
        match self {
            Column::Field(path) => vec![path.as_str()],
            Column::Literal(_) => Vec::new(),
            Column::Explode(inner) | Column::Alias(inner, _) => inner.referenced_paths(),
        }
    }

    /// Evaluate a scalar expression; absent fields evaluate to null
    pub fn eval(&self, row: &Row) -> Result<JsonValue> {
        match self {
            Column::Field(path) => Ok(lookup(row, path).cloned().unwrap_or(JsonValue::Null)),
            Column::Literal(value) => Ok(value.clone()),
            Column::Alias(inner, _) => inner.eval(row),
            Column::Explode(_) => Err(Error::projection(
                "explode cannot be evaluated as a scalar",
            )),
        }
    }

    /// Evaluate a generator; null and empty arrays yield no elements
    pub fn generate(&self, row: &Row) -> Result<Vec<JsonValue>> {
        match self {
            Column::Alias(inner, _) => inner.generate(row),
            Column::Explode(inner) => match inner.eval(row)? {
                JsonValue::Array(items) => Ok(items),
                JsonValue::Null => Ok(Vec::new()),
                other => Err(Error::projection(format!(
                    "cannot explode non-array value of '{}': {}",
                    inner.name(),
                    type_name(&other)
                ))),
            },
            _ => Ok(vec![self.eval(row)?]),
        }
    }
}

/// Resolve a dotted path through nested objects
pub fn lookup<'a>(row: &'a Row, path: &str) -> Option<&'a JsonValue> {
    let mut parts = path.split('.');
    let mut current = row.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
