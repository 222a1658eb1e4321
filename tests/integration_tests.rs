//! Integration tests on a local filesystem lake
//!
//! Tests the full end-to-end flow: raw JSON files → daily run → Parquet
//! partitions read back from disk

use chrono::NaiveDate;
use clap::Parser;
use lake_optimizer::cli::{Cli, Runner};
use lake_optimizer::{
    Dataset, DailyOptimizer, Error, FixedClock, OptimizerConfig, Session, WriteMode,
};
use arrow::json::ArrayWriter;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn lake_config(root: &Path) -> OptimizerConfig {
    let root = root.display();
    OptimizerConfig {
        raw_root_template: format!("{root}/raw/{{{{ platform }}}}/{{{{ dataset }}}}/{{{{ date }}}}"),
        optimized_root_template: format!(
            "{root}/optimized/{{{{ dataset }}}}/year={{{{ year }}}}/month={{{{ month }}}}/day={{{{ day }}}}/platform={{{{ platform }}}}"
        ),
        ..OptimizerConfig::default()
    }
}

fn write_raw(root: &Path, relative: &str, body: &Value) {
    let path = root.join("raw/naver").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(body).unwrap()).unwrap();
}

/// One scraped day, Friday 2024-05-17
fn seed_friday(root: &Path) {
    let day = "2024/05/17";
    write_raw(
        root,
        &format!("titles/{day}/weekly.json"),
        &json!({
            "titleListMap": {
                "THURSDAY": [{"titleId": 10, "titleName": "thu"}],
                "FRIDAY": [
                    {"titleId": 20, "titleName": "fri-a", "author": "x"},
                    {"titleId": 21, "titleName": "fri-b", "author": "y"}
                ]
            }
        }),
    );
    write_raw(
        root,
        &format!("title_info/{day}/20.json"),
        &json!({"titleId": 20, "synopsis": "s", "tags": ["drama", "romance"]}),
    );
    write_raw(
        root,
        &format!("title_info/{day}/21.json"),
        &json!({"titleId": 21, "synopsis": "t", "tags": []}),
    );
    for title in [20, 21] {
        write_raw(
            root,
            &format!("episodes/{day}/{title}/page-1.json"),
            &json!({
                "titleId": title,
                "articleList": [
                    {"no": 1, "subtitle": "ep1", "starScore": 9.5},
                    {"no": 2, "subtitle": "ep2", "starScore": 9}
                ]
            }),
        );
        write_raw(
            root,
            &format!("episode_likes/{day}/{title}/1.json"),
            &json!({"titleId": title, "no": 1, "likeCount": 100 + title}),
        );
        write_raw(
            root,
            &format!("comments/{day}/{title}/1.json"),
            &json!([
                {"titleId": title, "no": 1, "commentNo": title * 10, "contents": "nice"},
                {"titleId": title, "no": 1, "commentNo": title * 10 + 1, "contents": null}
            ]),
        );
    }
    // Engine markers next to raw files are never read
    fs::write(
        root.join(format!("raw/naver/title_info/{day}/_SUCCESS")),
        b"",
    )
    .unwrap();
}

fn friday_clock() -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(4, 0, 0)
            .unwrap(),
    )
}

fn partition_dir(root: &Path, dataset: Dataset) -> PathBuf {
    root.join(format!(
        "optimized/{dataset}/year=2024/month=05/day=17/platform=naver"
    ))
}

fn parquet_files(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!("{}/*.parquet", dir.display());
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    files.sort();
    files
}

fn batch_rows(batch: &RecordBatch) -> Vec<Value> {
    let mut writer = ArrayWriter::new(Vec::new());
    writer.write(batch).unwrap();
    writer.finish().unwrap();
    let body = writer.into_inner();
    if body.is_empty() {
        return Vec::new();
    }
    serde_json::from_slice(&body).unwrap()
}

fn read_rows(dir: &Path) -> Vec<Value> {
    parquet_files(dir)
        .into_iter()
        .flat_map(|path| {
            let file = fs::File::open(path).unwrap();
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)
                .unwrap()
                .build()
                .unwrap();
            reader
                .flat_map(|batch| batch_rows(&batch.unwrap()))
                .collect::<Vec<_>>()
        })
        .collect()
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_daily_run_end_to_end() {
    let dir = TempDir::new().unwrap();
    seed_friday(dir.path());

    let optimizer = DailyOptimizer::new(lake_config(dir.path())).unwrap();
    let ctx = optimizer.context(&friday_clock(), None);
    let session = Session::open(&optimizer.config().storage).unwrap();

    let report = optimizer.run(&session, &ctx).await.unwrap();
    assert_eq!(report.datasets.len(), 5);

    // titles: Friday's schedule only, tagged with the weekday
    let titles = read_rows(&partition_dir(dir.path(), Dataset::Titles));
    assert_eq!(titles.len(), 2);
    assert!(titles.iter().all(|r| r["weekday_str"] == "FRIDAY"));
    assert_eq!(titles[0]["title"]["titleName"], "fri-a");

    // title_info: passed through, marker ignored
    let info = read_rows(&partition_dir(dir.path(), Dataset::TitleInfo));
    assert_eq!(info.len(), 2);
    assert_eq!(info[0]["tags"], json!(["drama", "romance"]));

    // episodes: one row per article with the parent title id
    let episodes = read_rows(&partition_dir(dir.path(), Dataset::Episodes));
    assert_eq!(episodes.len(), 4);
    assert_eq!(episodes[0]["title_id"], 20);
    assert_eq!(episodes[0]["article"]["no"], 1);
    assert_eq!(episodes[1]["article"]["starScore"], 9.0);

    // comments: null contents stay null
    let comments = read_rows(&partition_dir(dir.path(), Dataset::Comments));
    assert_eq!(comments.len(), 4);
    assert!(comments.iter().any(|r| r.get("contents").is_none()));

    for dataset in Dataset::ALL {
        let partition = partition_dir(dir.path(), dataset);
        assert!(partition.join("_SUCCESS").exists(), "{dataset}");
        assert!(parquet_files(&partition).len() <= 50);
    }
}

#[tokio::test]
async fn test_rerun_appends_rows() {
    let dir = TempDir::new().unwrap();
    seed_friday(dir.path());

    let optimizer = DailyOptimizer::new(lake_config(dir.path())).unwrap();
    let ctx = optimizer.context(&friday_clock(), None);
    let session = Session::open(&optimizer.config().storage).unwrap();

    optimizer.run(&session, &ctx).await.unwrap();
    let first = read_rows(&partition_dir(dir.path(), Dataset::Comments));

    optimizer.run(&session, &ctx).await.unwrap();
    let second = read_rows(&partition_dir(dir.path(), Dataset::Comments));

    assert_eq!(second.len(), first.len() * 2);
    assert!(first.iter().all(|row| second.contains(row)));
}

#[tokio::test]
async fn test_overwrite_rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    seed_friday(dir.path());

    let config = OptimizerConfig {
        write_mode: WriteMode::Overwrite,
        ..lake_config(dir.path())
    };
    let optimizer = DailyOptimizer::new(config).unwrap();
    let ctx = optimizer.context(&friday_clock(), None);
    let session = Session::open(&optimizer.config().storage).unwrap();

    optimizer.run(&session, &ctx).await.unwrap();
    optimizer.run(&session, &ctx).await.unwrap();

    let episodes = read_rows(&partition_dir(dir.path(), Dataset::Episodes));
    assert_eq!(episodes.len(), 4);
}

#[tokio::test]
async fn test_file_count_is_capped() {
    let dir = TempDir::new().unwrap();
    for title in 0..12 {
        write_raw(
            dir.path(),
            &format!("episode_likes/2024/05/17/{title}/1.json"),
            &json!({"titleId": title, "likeCount": title}),
        );
    }

    let config = OptimizerConfig {
        datasets: vec![Dataset::EpisodeLikes],
        file_count_cap: 5,
        ..lake_config(dir.path())
    };
    let optimizer = DailyOptimizer::new(config).unwrap();
    let ctx = optimizer.context(&friday_clock(), None);
    let session = Session::open(&optimizer.config().storage).unwrap();

    let report = optimizer.run(&session, &ctx).await.unwrap();
    assert_eq!(report.total_files(), 5);

    let partition = partition_dir(dir.path(), Dataset::EpisodeLikes);
    assert_eq!(parquet_files(&partition).len(), 5);
    assert_eq!(read_rows(&partition).len(), 12);
}

#[tokio::test]
async fn test_missing_episode_likes_halts_before_comments() {
    let dir = TempDir::new().unwrap();
    seed_friday(dir.path());
    fs::remove_dir_all(dir.path().join("raw/naver/episode_likes")).unwrap();

    let optimizer = DailyOptimizer::new(lake_config(dir.path())).unwrap();
    let ctx = optimizer.context(&friday_clock(), None);
    let session = Session::open(&optimizer.config().storage).unwrap();

    let err = optimizer.run(&session, &ctx).await.unwrap_err();
    assert_eq!(err.dataset(), Some("episode_likes"));
    assert!(err.to_string().contains("Path does not exist"));
    assert!(matches!(err, Error::Pipeline { .. }));

    assert!(partition_dir(dir.path(), Dataset::Episodes)
        .join("_SUCCESS")
        .exists());
    assert!(!partition_dir(dir.path(), Dataset::Comments).exists());
}

// ============================================================================
// CLI Tests
// ============================================================================

#[tokio::test]
async fn test_cli_run_with_config_file() {
    let dir = TempDir::new().unwrap();
    seed_friday(dir.path());

    let config_path = dir.path().join("job.yaml");
    fs::write(
        &config_path,
        serde_yaml::to_string(&lake_config(dir.path())).unwrap(),
    )
    .unwrap();

    let cli = Cli::parse_from([
        "lake-optimizer",
        "-C",
        config_path.to_str().unwrap(),
        "run",
        "--raw-date",
        "2024-05-17",
        "--datasets",
        "title_info",
    ]);
    Runner::new(cli).run().await.unwrap();

    // The partition follows today's processing date; only title_info ran
    let written: Vec<PathBuf> = glob::glob(&format!(
        "{}/optimized/*/year=*/month=*/day=*/platform=naver/*.parquet",
        dir.path().display()
    ))
    .unwrap()
    .map(Result::unwrap)
    .collect();
    assert_eq!(written.len(), 2);
    assert!(written
        .iter()
        .all(|p| p.to_string_lossy().contains("/optimized/title_info/")));
}

#[tokio::test]
async fn test_cli_plan_does_not_touch_storage() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("job.yaml");
    fs::write(
        &config_path,
        serde_yaml::to_string(&lake_config(dir.path())).unwrap(),
    )
    .unwrap();

    let cli = Cli::parse_from([
        "lake-optimizer",
        "-C",
        config_path.to_str().unwrap(),
        "plan",
        "--raw-date",
        "2024-05-17",
    ]);
    Runner::new(cli).run().await.unwrap();
    assert!(!dir.path().join("optimized").exists());
}
