//! Run context
//!
//! Everything a run derives from the clock is computed once, up front, and
//! handed to each component explicitly.

use crate::config::OptimizerConfig;
use crate::error::Result;
use crate::template::{self, TemplateContext};
use crate::types::{Dataset, PartitionDate};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Weekday};

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    /// Current local time
    fn now(&self) -> NaiveDateTime;
}

/// The system clock in local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Upper-case English weekday names indexed Monday=0 .. Sunday=6
pub const WEEKDAY_NAMES: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

/// Name for a weekday index, wrapping past Sunday
pub fn weekday_name(index: usize) -> &'static str {
    WEEKDAY_NAMES[index % WEEKDAY_NAMES.len()]
}

/// Values fixed for the duration of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    processed_at: NaiveDateTime,
    raw_date: NaiveDate,
    partition_date: NaiveDate,
}

impl RunContext {
    /// Capture the clock once; raw files are read for today
    pub fn capture(clock: &dyn Clock, mode: PartitionDate) -> Self {
        let now = clock.now();
        Self::new(now, now.date(), mode)
    }

    /// Build a context reading raw files from `raw_date`
    pub fn new(processed_at: NaiveDateTime, raw_date: NaiveDate, mode: PartitionDate) -> Self {
        let partition_date = match mode {
            PartitionDate::Processing => processed_at.date(),
            PartitionDate::Raw => raw_date,
        };
        Self {
            processed_at,
            raw_date,
            partition_date,
        }
    }

    /// When the run started
    pub fn processed_at(&self) -> NaiveDateTime {
        self.processed_at
    }

    /// Date whose raw files are read
    pub fn raw_date(&self) -> NaiveDate {
        self.raw_date
    }

    /// Date of the output `year=/month=/day=` partition
    pub fn partition_date(&self) -> NaiveDate {
        self.partition_date
    }

    /// Raw date as `YYYY/MM/DD`
    pub fn raw_date_path(&self) -> String {
        self.raw_date.format("%Y/%m/%d").to_string()
    }

    /// Output partition as `year=YYYY/month=MM/day=DD`
    pub fn partition_path(&self) -> String {
        self.partition_date
            .format("year=%Y/month=%m/day=%d")
            .to_string()
    }

    /// Weekday index of the processing date, Monday=0 .. Sunday=6
    pub fn weekday_index(&self) -> usize {
        self.weekday().num_days_from_monday() as usize
    }

    /// Weekday of the processing date, independent of the raw date read
    pub fn weekday(&self) -> Weekday {
        self.processed_at.date().weekday()
    }

    /// Resolve the dated raw root of one dataset
    pub fn raw_root(&self, config: &OptimizerConfig, dataset: Dataset) -> Result<String> {
        raw_root(config, dataset, self.raw_date)
    }

    /// Resolve the output partition directory of one dataset
    pub fn optimized_root(&self, config: &OptimizerConfig, dataset: Dataset) -> Result<String> {
        let ctx = base_context(config, dataset)
            .with("date", self.partition_date.format("%Y/%m/%d").to_string());
        template::render(
            &config.optimized_root_template,
            &with_date_parts(ctx, self.partition_date),
        )
    }
}

/// Raw root of one dataset for a given date
pub fn raw_root(config: &OptimizerConfig, dataset: Dataset, date: NaiveDate) -> Result<String> {
    let ctx = base_context(config, dataset).with("date", date.format("%Y/%m/%d").to_string());
    template::render(&config.raw_root_template, &with_date_parts(ctx, date))
}

fn base_context(config: &OptimizerConfig, dataset: Dataset) -> TemplateContext {
    TemplateContext::new()
        .with("bucket", config.bucket.as_str())
        .with("platform", config.platform.as_str())
        .with("dataset", dataset.name())
}

fn with_date_parts(ctx: TemplateContext, date: NaiveDate) -> TemplateContext {
    ctx.with("year", date.format("%Y").to_string())
        .with("month", date.format("%m").to_string())
        .with("day", date.format("%d").to_string())
}
