//! Parquet encoding
//!
//! Part files are encoded in memory and uploaded whole.

use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Write;

/// Settings shared by every part file of a write
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024,
        }
    }
}

impl ParquetWriterConfig {
    /// Part file extension for the codec, e.g. `snappy.parquet`
    pub fn file_suffix(&self) -> &'static str {
        match self.compression {
            Compression::SNAPPY => "snappy.parquet",
            Compression::ZSTD(_) => "zstd.parquet",
            Compression::GZIP(_) => "gz.parquet",
            _ => "parquet",
        }
    }

    fn properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Streams record batches into a Parquet file over any byte sink
pub struct ParquetWriter<W: Write + Send> {
    inner: ArrowWriter<W>,
}

impl<W: Write + Send> ParquetWriter<W> {
    /// Start a file with the given schema
    pub fn new(sink: W, schema: SchemaRef, config: &ParquetWriterConfig) -> Result<Self> {
        let inner = ArrowWriter::try_new(sink, schema, Some(config.properties()))
            .map_err(|e| Error::output(format!("Failed to create Parquet writer: {e}")))?;
        Ok(Self { inner })
    }

    /// Append a batch
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.inner
            .write(batch)
            .map_err(|e| Error::output(format!("Failed to write batch: {e}")))
    }

    /// Write the footer and hand back the sink
    pub fn close(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| Error::output(format!("Failed to close Parquet writer: {e}")))
    }
}

/// Encode one batch as a complete in-memory Parquet file
pub fn encode_parquet(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    if batch.schema().fields().is_empty() {
        return Err(Error::output("Cannot write a table without columns"));
    }

    let mut writer = ParquetWriter::new(Vec::new(), batch.schema(), config)?;
    writer.write(batch)?;
    Ok(Bytes::from(writer.close()?))
}
