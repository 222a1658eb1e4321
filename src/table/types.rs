//! Table type
//!
//! Rows of JSON objects split into partitions. Read tables carry one
//! partition per source file; projections keep partition boundaries.

use super::column::{lookup, Column};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::collections::BTreeSet;

/// One table row
pub type Row = JsonObject;

/// A partitioned table of JSON rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Output column order
    columns: Vec<String>,
    /// Row groups; each one becomes at most one output file
    partitions: Vec<Vec<Row>>,
}

impl Table {
    /// Build a table whose columns are the sorted union of all top-level keys
    pub fn from_partitions(partitions: Vec<Vec<Row>>) -> Self {
        let columns: BTreeSet<&String> = partitions
            .iter()
            .flatten()
            .flat_map(|row| row.keys())
            .collect();
        let columns = columns.into_iter().cloned().collect();
        Self {
            columns,
            partitions,
        }
    }

    /// Build a table with an explicit column order
    pub fn with_columns(columns: Vec<String>, partitions: Vec<Vec<Row>>) -> Self {
        Self {
            columns,
            partitions,
        }
    }

    /// Column names in output order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Partitions in order
    pub fn partitions(&self) -> &[Vec<Row>] {
        &self.partitions
    }

    /// Number of partitions
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Total number of rows
    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    /// Iterate over every row, partition by partition
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.partitions.iter().flatten()
    }

    /// Whether a dotted field path resolves in at least one row
    pub fn has_path(&self, path: &str) -> bool {
        self.rows().any(|row| lookup(row, path).is_some())
    }

    /// Merge adjacent partitions until at most `max` remain
    ///
    /// Never splits a partition and never moves rows between non-adjacent
    /// partitions. A `max` of zero is treated as one.
    #[must_use]
    pub fn coalesce(self, max: usize) -> Self {
        let max = max.max(1);
        let total = self.partitions.len();
        if total <= max {
            return self;
        }

        let mut source = self.partitions.into_iter();
        let partitions: Vec<Vec<Row>> = (0..max)
            .map(|i| {
                let take = (i + 1) * total / max - i * total / max;
                source.by_ref().take(take).flatten().collect()
            })
            .collect();

        Self {
            columns: self.columns,
            partitions,
        }
    }

    /// Evaluate column expressions against every row
    ///
    /// At most one expression may be a generator (`explode`). Every field
    /// path referenced must resolve in at least one row.
    pub fn select(&self, exprs: &[Column]) -> Result<Self> {
        if exprs.is_empty() {
            return Err(Error::projection("select requires at least one column"));
        }
        if exprs.iter().filter(|e| e.is_generator()).count() > 1 {
            return Err(Error::projection(
                "only one generator (explode) is allowed per select",
            ));
        }

        for path in exprs.iter().flat_map(Column::referenced_paths) {
            if !self.has_path(path) {
                return Err(Error::MissingColumn {
                    column: path.to_string(),
                    available: self.columns.join(", "),
                });
            }
        }

        let columns: Vec<String> = exprs.iter().map(Column::name).collect();
        let mut seen = BTreeSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(Error::projection(format!("duplicate output column '{dup}'")));
        }

        let partitions = self
            .partitions
            .iter()
            .map(|rows| project_rows(rows, exprs, &columns))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns,
            partitions,
        })
    }
}

fn project_rows(rows: &[Row], exprs: &[Column], columns: &[String]) -> Result<Vec<Row>> {
    let generator = exprs.iter().position(Column::is_generator);
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let values: Vec<JsonValue> = exprs
            .iter()
            .map(|expr| {
                if expr.is_generator() {
                    Ok(JsonValue::Null)
                } else {
                    expr.eval(row)
                }
            })
            .collect::<Result<_>>()?;

        match generator {
            None => out.push(to_row(columns, values)),
            Some(at) => {
                for item in exprs[at].generate(row)? {
                    let mut values = values.clone();
                    values[at] = item;
                    out.push(to_row(columns, values));
                }
            }
        }
    }

    Ok(out)
}

fn to_row(columns: &[String], values: Vec<JsonValue>) -> Row {
    columns.iter().cloned().zip(values).collect()
}
