//! Tests for output module

use super::schema::arrow_to_json;
use super::*;
use crate::config::{OptimizerConfig, StorageConfig};
use crate::context::{FixedClock, RunContext};
use crate::storage::Session;
use crate::table::{Row, Table};
use crate::types::{Dataset, PartitionDate, WriteMode};
use arrow::datatypes::{DataType, Schema};
use bytes::Bytes;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{json, Value};
use std::sync::Arc;

fn rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .map(|v| match v {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        })
        .collect()
}

fn table(values: Vec<Value>) -> Table {
    Table::from_partitions(vec![rows(values)])
}

fn schema_of(values: Vec<Value>) -> Schema {
    infer_schema(&table(values))
}

fn decode(data: Bytes) -> Vec<Value> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)
        .unwrap()
        .build()
        .unwrap();
    reader
        .flat_map(|batch| arrow_to_json(&batch.unwrap()).unwrap())
        .collect()
}

// ============================================================================
// Schema Inference Tests
// ============================================================================

#[test]
fn test_infer_schema_empty() {
    let schema = infer_schema(&Table::default());
    assert!(schema.fields().is_empty());
}

#[test]
fn test_infer_schema_simple() {
    let schema = schema_of(vec![
        json!({"name": "Alice", "age": 30}),
        json!({"name": "Bob", "age": 25}),
    ]);
    assert_eq!(schema.fields().len(), 2);
    assert_eq!(schema.field(0).name(), "age");
    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
}

#[test]
fn test_infer_schema_follows_projected_column_order() {
    let t = Table::with_columns(
        vec!["title".to_string(), "weekday_str".to_string()],
        vec![rows(vec![json!({"title": {"titleId": 1}, "weekday_str": "MONDAY"})])],
    );
    let schema = infer_schema(&t);
    let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["title", "weekday_str"]);
}

#[test]
fn test_infer_schema_with_nulls() {
    let schema = schema_of(vec![
        json!({"email": null}),
        json!({"email": "bob@example.com"}),
    ]);
    assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
}

#[test]
fn test_infer_schema_all_null_becomes_string() {
    let schema = schema_of(vec![json!({"x": null}), json!({"x": null})]);
    assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
}

#[test]
fn test_infer_schema_mixed_numbers() {
    let schema = schema_of(vec![json!({"value": 42}), json!({"value": 3.14})]);
    assert_eq!(schema.field(0).data_type(), &DataType::Float64);
}

#[test]
fn test_infer_schema_conflicting_types_become_string() {
    let schema = schema_of(vec![json!({"value": 42}), json!({"value": "n/a"})]);
    assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
}

#[test]
fn test_infer_schema_merges_struct_fields() {
    let schema = schema_of(vec![
        json!({"article": {"no": 1}}),
        json!({"article": {"no": 2, "subtitle": "ep 2"}}),
    ]);
    match schema.field(0).data_type() {
        DataType::Struct(fields) => {
            let names: Vec<_> = fields.iter().map(|f| f.name().as_str()).collect();
            assert_eq!(names, vec!["no", "subtitle"]);
        }
        other => panic!("Expected Struct type, got {other}"),
    }
}

#[test]
fn test_infer_schema_array_elements_merged() {
    let schema = schema_of(vec![json!({"tags": [1, 2.5]}), json!({"tags": []})]);
    match schema.field(0).data_type() {
        DataType::List(inner) => assert_eq!(inner.data_type(), &DataType::Float64),
        other => panic!("Expected List type, got {other}"),
    }
}

// ============================================================================
// JSON to Arrow Tests
// ============================================================================

#[test]
fn test_json_to_arrow_missing_and_null_fields() {
    let t = table(vec![
        json!({"id": 1, "name": "Alice"}),
        json!({"id": 2, "name": null}),
        json!({"id": 3}),
    ]);
    let schema = Arc::new(infer_schema(&t));
    let batch = json_to_arrow(&t.partitions()[0], &schema).unwrap();
    assert_eq!(batch.num_rows(), 3);
    assert_eq!(batch.column(1).null_count(), 2);
}

#[test]
fn test_json_to_arrow_nested_round_trip() {
    let t = table(vec![
        json!({"title": {"titleId": 1, "thumbnails": ["a.png"]}, "weekday_str": "MONDAY"}),
        json!({"title": {"titleId": 2, "thumbnails": []}, "weekday_str": "MONDAY"}),
    ]);
    let schema = Arc::new(infer_schema(&t));
    let batch = json_to_arrow(&t.partitions()[0], &schema).unwrap();
    let back = arrow_to_json(&batch).unwrap();
    assert_eq!(back[0]["title"]["titleId"], 1);
    assert_eq!(back[0]["title"]["thumbnails"], json!(["a.png"]));
    assert_eq!(back[1]["title"]["thumbnails"], json!([]));
    assert_eq!(back[1]["weekday_str"], "MONDAY");
}

#[test]
fn test_arrow_to_json_empty() {
    let t = table(vec![json!({"a": 1})]);
    let schema = Arc::new(infer_schema(&t));
    let batch = json_to_arrow(&[], &schema).unwrap();
    assert!(arrow_to_json(&batch).unwrap().is_empty());
}

// ============================================================================
// Parquet Encoding Tests
// ============================================================================

#[test]
fn test_parquet_writer_config_defaults_to_snappy() {
    assert_eq!(ParquetWriterConfig::default().file_suffix(), "snappy.parquet");
}

#[test]
fn test_parquet_writer_appends_batches() {
    let t = table(vec![json!({"id": 1}), json!({"id": 2})]);
    let schema = Arc::new(infer_schema(&t));
    let batch = json_to_arrow(&t.partitions()[0], &schema).unwrap();

    let mut writer = ParquetWriter::new(Vec::new(), batch.schema(), &ParquetWriterConfig::default())
        .unwrap();
    writer.write(&batch).unwrap();
    writer.write(&batch).unwrap();

    let bytes = writer.close().unwrap();
    assert_eq!(&bytes[..4], b"PAR1");
    let ids: Vec<Value> = decode(Bytes::from(bytes)).iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(1), json!(2)]);
}

#[test]
fn test_encode_parquet_round_trip() {
    let t = table(vec![
        json!({"commentNo": 10, "contents": "great", "sympathyCount": 3}),
        json!({"commentNo": 11, "contents": "ok", "sympathyCount": 0}),
    ]);
    let schema = Arc::new(infer_schema(&t));
    let batch = json_to_arrow(&t.partitions()[0], &schema).unwrap();
    let data = encode_parquet(&batch, &ParquetWriterConfig::default()).unwrap();

    let back = decode(data);
    assert_eq!(back.len(), 2);
    assert_eq!(back[1]["contents"], "ok");
}

#[test]
fn test_encode_parquet_without_columns_fails() {
    let t = Table::from_partitions(vec![rows(vec![json!({})])]);
    let schema = Arc::new(infer_schema(&t));
    let batch = json_to_arrow(&t.partitions()[0], &schema).unwrap();
    assert!(encode_parquet(&batch, &ParquetWriterConfig::default()).is_err());
}

// ============================================================================
// Partitioned Sink Tests
// ============================================================================

fn test_config() -> OptimizerConfig {
    OptimizerConfig {
        bucket: "lake".to_string(),
        optimized_root_template:
            "memory://{{ bucket }}/optimized/{{ dataset }}/year={{ year }}/month={{ month }}/day={{ day }}/platform={{ platform }}"
                .to_string(),
        ..OptimizerConfig::default()
    }
}

fn run_context() -> RunContext {
    let now = NaiveDate::from_ymd_opt(2024, 5, 17)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap();
    RunContext::capture(&FixedClock(now), PartitionDate::Processing)
}

fn many_partitions(count: usize) -> Table {
    Table::from_partitions(
        (0..count)
            .map(|i| rows(vec![json!({"commentNo": i, "contents": format!("c{i}")})]))
            .collect(),
    )
}

async fn written_rows(session: &Session, path: &str) -> (usize, Vec<Value>) {
    let target = session.resolve(path).unwrap();
    let files = session.list_matching(&target, "*.parquet").await.unwrap();
    let mut all = Vec::new();
    for meta in &files {
        let data = session.read(&target.with_path(meta.location.clone())).await.unwrap();
        all.extend(decode(data));
    }
    (files.len(), all)
}

#[tokio::test]
async fn test_save_to_parquet_partition_path() {
    let session = Session::open(&StorageConfig::default()).unwrap();
    let config = test_config();
    let ctx = run_context();

    let summary = save_to_parquet(&session, &config, &ctx, many_partitions(3), Dataset::Comments)
        .await
        .unwrap();

    assert_eq!(
        summary.path,
        "memory://lake/optimized/comments/year=2024/month=05/day=17/platform=naver"
    );
    assert!(summary.path.contains("year=2024/month=05/day=17"));
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.files, 3);

    let marker = session
        .resolve(&format!("{}/{SUCCESS_MARKER}", summary.path))
        .unwrap();
    assert!(session.read(&marker).await.is_ok());
}

#[tokio::test]
async fn test_save_caps_file_count() {
    let session = Session::open(&StorageConfig::default()).unwrap();
    let config = test_config();

    let summary = save_to_parquet(&session, &config, &run_context(), many_partitions(137), Dataset::Comments)
        .await
        .unwrap();
    assert_eq!(summary.files, 50);

    let (files, written) = written_rows(&session, &summary.path).await;
    assert_eq!(files, 50);
    assert_eq!(written.len(), 137);
}

#[tokio::test]
async fn test_save_twice_appends() {
    let session = Session::open(&StorageConfig::default()).unwrap();
    let config = test_config();
    let ctx = run_context();

    let first = save_to_parquet(&session, &config, &ctx, many_partitions(2), Dataset::Comments)
        .await
        .unwrap();
    let (_, before) = written_rows(&session, &first.path).await;

    save_to_parquet(&session, &config, &ctx, many_partitions(2), Dataset::Comments)
        .await
        .unwrap();
    let (files, after) = written_rows(&session, &first.path).await;

    assert_eq!(files, 4);
    assert_eq!(after.len(), 4);
    assert!(before.iter().all(|row| after.contains(row)));
}

#[tokio::test]
async fn test_save_overwrite_replaces_partition() {
    let session = Session::open(&StorageConfig::default()).unwrap();
    let config = OptimizerConfig {
        write_mode: WriteMode::Overwrite,
        ..test_config()
    };
    let ctx = run_context();

    save_to_parquet(&session, &config, &ctx, many_partitions(2), Dataset::Comments)
        .await
        .unwrap();
    let second = save_to_parquet(&session, &config, &ctx, many_partitions(2), Dataset::Comments)
        .await
        .unwrap();

    // Two parquet files and the marker from the first write
    assert_eq!(second.replaced, 3);
    let (files, rows) = written_rows(&session, &second.path).await;
    assert_eq!(files, 2);
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_save_empty_table_writes_no_files() {
    let session = Session::open(&StorageConfig::default()).unwrap();
    let config = test_config();
    let empty = Table::with_columns(vec!["title".to_string()], vec![Vec::new()]);

    let summary = save_to_parquet(&session, &config, &run_context(), empty, Dataset::Titles)
        .await
        .unwrap();
    assert_eq!(summary.rows, 0);
    assert_eq!(summary.files, 0);
}
