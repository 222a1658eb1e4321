//! Arrow schema inference and JSON to Arrow conversion
//!
//! Provides utilities for inferring one Arrow schema across all rows of a
//! table and converting rows to Arrow RecordBatches.

use crate::error::{Error, Result};
use crate::table::{Row, Table};
use crate::types::JsonValue;
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, ListArray, StringArray, StructArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Infer an Arrow schema for a table
///
/// Columns keep the table's order. Types are merged across every row;
/// columns that are null everywhere become strings.
pub fn infer_schema(table: &Table) -> Schema {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|name| {
            let dtype = table
                .rows()
                .filter_map(|row| row.get(name))
                .map(infer_type)
                .fold(DataType::Null, |acc, t| merge_types(&acc, &t));
            Field::new(name, finalize(dtype), true)
        })
        .collect();

    Schema::new(fields)
}

/// Convert rows to an Arrow RecordBatch with the given schema
///
/// Fields missing from a row, or holding a value of another type, become
/// nulls. Keys not in the schema are ignored.
pub fn json_to_arrow(rows: &[Row], schema: &Arc<Schema>) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let values: Vec<Option<&JsonValue>> =
            rows.iter().map(|row| row.get(field.name())).collect();
        columns.push(build_array(&values, field.data_type())?);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    RecordBatch::try_new_with_options(Arc::clone(schema), columns, &options)
        .map_err(|e| Error::output(format!("Failed to create RecordBatch: {e}")))
}

/// Convert an Arrow RecordBatch back to JSON rows
///
/// Null fields are omitted from the produced objects.
#[cfg(test)]
pub(crate) fn arrow_to_json(batch: &RecordBatch) -> Result<Vec<JsonValue>> {
    if batch.num_rows() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = arrow::json::ArrayWriter::new(Vec::new());
    writer.write(batch)?;
    writer.finish()?;
    Ok(serde_json::from_slice(&writer.into_inner())?)
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &JsonValue) -> DataType {
    match value {
        JsonValue::Null => DataType::Null,
        JsonValue::Bool(_) => DataType::Boolean,
        JsonValue::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        JsonValue::String(_) => DataType::Utf8,
        JsonValue::Array(items) => {
            let element = items
                .iter()
                .map(infer_type)
                .fold(DataType::Null, |acc, t| merge_types(&acc, &t));
            list_of(element)
        }
        // Empty objects carry no columns; they merge into whatever else appears
        JsonValue::Object(obj) if obj.is_empty() => DataType::Null,
        JsonValue::Object(obj) => DataType::Struct(
            obj.iter()
                .map(|(k, v)| Field::new(k, infer_type(v), true))
                .collect::<Fields>(),
        ),
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        // Null can merge with anything
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        // Numbers can merge (prefer Float64 for mixed)
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        (DataType::List(a), DataType::List(b)) => {
            list_of(merge_types(a.data_type(), b.data_type()))
        }

        (DataType::Struct(a), DataType::Struct(b)) => {
            let mut merged: BTreeMap<&str, DataType> = BTreeMap::new();
            for field in a.iter().chain(b.iter()) {
                merged
                    .entry(field.name().as_str())
                    .and_modify(|existing| *existing = merge_types(existing, field.data_type()))
                    .or_insert_with(|| field.data_type().clone());
            }
            DataType::Struct(
                merged
                    .into_iter()
                    .map(|(name, dtype)| Field::new(name, dtype, true))
                    .collect::<Fields>(),
            )
        }

        // Different types -> fall back to String (most flexible)
        _ => DataType::Utf8,
    }
}

/// Replace leftover Null types with Utf8 so every column has a concrete type
fn finalize(dtype: DataType) -> DataType {
    match dtype {
        DataType::Null => DataType::Utf8,
        DataType::List(item) => list_of(finalize(item.data_type().clone())),
        DataType::Struct(fields) => DataType::Struct(
            fields
                .iter()
                .map(|f| Field::new(f.name(), finalize(f.data_type().clone()), true))
                .collect::<Fields>(),
        ),
        other => other,
    }
}

fn list_of(element: DataType) -> DataType {
    DataType::List(Arc::new(Field::new("item", element, true)))
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&JsonValue>], data_type: &DataType) -> Result<ArrayRef> {
    // Explicit JSON nulls and absent keys are the same thing from here on
    let values: Vec<Option<&JsonValue>> = values
        .iter()
        .copied()
        .map(|v| v.filter(|v| !v.is_null()))
        .collect();

    match data_type {
        DataType::Boolean => {
            let arr: BooleanArray = values
                .iter()
                .map(|v| v.and_then(JsonValue::as_bool))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values
                .iter()
                .map(|v| v.and_then(JsonValue::as_i64))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr: Float64Array = values
                .iter()
                .map(|v| v.and_then(JsonValue::as_f64))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.map(|v| match v {
                        JsonValue::String(s) => s.clone(),
                        _ => v.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(&values, field),

        DataType::Struct(fields) => build_struct_array(&values, fields),

        other => Err(Error::output(format!("Unsupported column type {other}"))),
    }
}

/// Build a list array from JSON arrays
fn build_list_array(values: &[Option<&JsonValue>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&JsonValue>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];
    let mut validity: Vec<bool> = Vec::with_capacity(values.len());

    for value in values {
        if let Some(JsonValue::Array(arr)) = value {
            all_items.extend(arr.iter().map(Some));
            validity.push(true);
        } else {
            validity.push(false);
        }
        let offset = i32::try_from(all_items.len())
            .map_err(|_| Error::output("Array too large for i32 offset"))?;
        offsets.push(offset);
    }

    let items_array = build_array(&all_items, field.data_type())?;
    let list_array = ListArray::try_new(
        Arc::clone(field),
        OffsetBuffer::new(offsets.into()),
        items_array,
        Some(NullBuffer::from(validity)),
    )?;
    Ok(Arc::new(list_array))
}

/// Build a struct array from JSON objects
fn build_struct_array(values: &[Option<&JsonValue>], fields: &Fields) -> Result<ArrayRef> {
    let mut child_arrays: Vec<ArrayRef> = Vec::with_capacity(fields.len());

    for field in fields {
        let child_values: Vec<Option<&JsonValue>> = values
            .iter()
            .map(|v| {
                v.and_then(JsonValue::as_object)
                    .and_then(|obj| obj.get(field.name()))
            })
            .collect();
        child_arrays.push(build_array(&child_values, field.data_type())?);
    }

    let validity: Vec<bool> = values
        .iter()
        .map(|v| v.is_some_and(JsonValue::is_object))
        .collect();
    let struct_array =
        StructArray::try_new(fields.clone(), child_arrays, Some(NullBuffer::from(validity)))?;
    Ok(Arc::new(struct_array))
}
