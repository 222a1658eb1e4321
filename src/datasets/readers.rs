//! Raw zone readers and per-dataset projections

use crate::config::OptimizerConfig;
use crate::context::{raw_root, weekday_name, RunContext};
use crate::error::{Error, Result};
use crate::storage::Session;
use crate::table::{col, explode, lit, parse_document, Table};
use crate::types::{Dataset, ReadLayout};
use chrono::NaiveDate;

/// Read every JSON file under `root` matching the layout's glob
///
/// Each file becomes one partition of the returned table.
pub async fn read_json(session: &Session, root: &str, layout: ReadLayout) -> Result<Table> {
    let glob = layout.glob();
    let location = session.resolve(root)?;
    let files = session.list_matching(&location, glob).await?;

    if files.is_empty() {
        return Err(Error::NoFilesFound {
            pattern: format!("{}/{glob}", root.trim_end_matches('/')),
        });
    }

    let mut partitions = Vec::with_capacity(files.len());
    for meta in &files {
        let file = location.with_path(meta.location.clone());
        let body = session.read(&file).await?;
        partitions.push(parse_document(&file.url(), &body)?);
    }

    let table = Table::from_partitions(partitions);
    tracing::debug!(
        root,
        files = files.len(),
        rows = table.num_rows(),
        "Read raw JSON"
    );
    Ok(table)
}

async fn read_raw(
    session: &Session,
    config: &OptimizerConfig,
    dataset: Dataset,
    date: NaiveDate,
) -> Result<Table> {
    let root = raw_root(config, dataset, date)?;
    tracing::info!(%dataset, path = %root, "Reading raw data");
    read_json(session, &root, dataset.layout()).await
}

/// Comments, passed through unchanged
pub async fn get_comments(
    session: &Session,
    config: &OptimizerConfig,
    date: NaiveDate,
) -> Result<Table> {
    read_raw(session, config, Dataset::Comments, date).await
}

/// Episode like-counts, passed through unchanged
pub async fn get_episode_likes(
    session: &Session,
    config: &OptimizerConfig,
    date: NaiveDate,
) -> Result<Table> {
    read_raw(session, config, Dataset::EpisodeLikes, date).await
}

/// Episodes, one row per article
pub async fn get_episodes(
    session: &Session,
    config: &OptimizerConfig,
    date: NaiveDate,
) -> Result<Table> {
    let raw = read_raw(session, config, Dataset::Episodes, date).await?;
    project_episodes(&raw)
}

/// Title metadata, passed through unchanged
pub async fn get_title_info(
    session: &Session,
    config: &OptimizerConfig,
    date: NaiveDate,
) -> Result<Table> {
    read_raw(session, config, Dataset::TitleInfo, date).await
}

/// Titles scheduled on the given weekday (Monday=0)
pub async fn get_titles(
    session: &Session,
    config: &OptimizerConfig,
    date: NaiveDate,
    weekday_index: usize,
) -> Result<Table> {
    let raw = read_raw(session, config, Dataset::Titles, date).await?;
    project_titles(&raw, weekday_index)
}

/// Explode `articleList` into `article`, keeping the parent `titleId` as `title_id`
pub fn project_episodes(raw: &Table) -> Result<Table> {
    raw.select(&[
        explode(col("articleList")).alias("article"),
        col("titleId").alias("title_id"),
    ])
}

/// Explode `titleListMap.<WEEKDAY>` into `title` and tag rows with `weekday_str`
pub fn project_titles(raw: &Table, weekday_index: usize) -> Result<Table> {
    let weekday = weekday_name(weekday_index);
    raw.select(&[
        explode(col(format!("titleListMap.{weekday}"))).alias("title"),
        lit(weekday).alias("weekday_str"),
    ])
}

/// Read and project one dataset for a run
pub async fn read_dataset(
    session: &Session,
    config: &OptimizerConfig,
    ctx: &RunContext,
    dataset: Dataset,
) -> Result<Table> {
    let date = ctx.raw_date();
    match dataset {
        Dataset::Titles => get_titles(session, config, date, ctx.weekday_index()).await,
        Dataset::TitleInfo => get_title_info(session, config, date).await,
        Dataset::Episodes => get_episodes(session, config, date).await,
        Dataset::EpisodeLikes => get_episode_likes(session, config, date).await,
        Dataset::Comments => get_comments(session, config, date).await,
    }
}
