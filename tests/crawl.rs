mod common;

use common::{FakeArchive, FakeSource, CORRUPT};
use radarcog::archive::{key_base_name, DirectoryArchive};
use radarcog::crawl::{processed_file_exists, CrawlError, CrawlOutcome};
use radarcog::{ColourMode, Converter, CrawlOptions, Crawler, RasterWriter, WriterConfig};
use std::path::Path;
use tempfile::TempDir;

const D1: &str = "radar/2024/01/01/scan_d1.h5";
const D2: &str = "radar/2024/01/02/scan_d2.h5";
const D3: &str = "radar/2024/01/03/scan_d3.h5";

fn three_days() -> FakeArchive {
    FakeArchive::default()
        .with(D1, b"d1")
        .with(D2, b"d2")
        .with(D3, b"d3")
}

fn converter() -> Converter<FakeSource> {
    Converter::new(FakeSource::scenario())
        .with_writer(RasterWriter::new(WriterConfig::default().with_tile_size(16)))
}

fn options(dir: &Path) -> CrawlOptions {
    CrawlOptions::new(dir.join("out")).with_staging_dir(dir.join("staging"))
}

fn mark_processed(dir: &Path, key: &str, mode: ColourMode) {
    let out = dir.join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join(mode.output_file_name(key_base_name(key))), b"").unwrap();
}

fn staging_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir.join("staging")).unwrap().next().is_none()
}

#[test]
fn catch_up_stops_at_first_processed_file() {
    let dir = TempDir::new().unwrap();
    mark_processed(dir.path(), D2, ColourMode::Greyscale);
    let archive = three_days();

    let crawler = Crawler::new(&archive, converter(), options(dir.path()));
    let summary = crawler.run().unwrap();

    assert_eq!(archive.downloaded(), vec![D3]);
    assert_eq!(summary.outcome, CrawlOutcome::CaughtUp { key: D2.to_string() });
    assert_eq!(summary.message(), "Caught up with existing data. Stopping.");
    assert_eq!(summary.converted, vec![dir.path().join("out/scan_d3_greyscale.tif")]);
    assert!(!processed_file_exists(&dir.path().join("out"), "scan_d1"));
    assert!(staging_is_empty(dir.path()));
}

#[test]
fn full_backfill_skips_processed_files() {
    let dir = TempDir::new().unwrap();
    mark_processed(dir.path(), D2, ColourMode::Coloured);
    let archive = three_days();

    let options = options(dir.path())
        .with_stop_on_catchup(false)
        .with_mode(ColourMode::Coloured);
    let summary = Crawler::new(&archive, converter(), options).run().unwrap();

    assert_eq!(archive.downloaded(), vec![D3, D1]);
    assert_eq!(summary.outcome, CrawlOutcome::Exhausted);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.message(), "Reached end of available historical data.");
    let out = dir.path().join("out");
    assert!(out.join("scan_d3_coloured.tif").exists());
    assert!(out.join("scan_d1_coloured.tif").exists());
}

#[test]
fn other_mode_output_counts_as_processed() {
    let dir = TempDir::new().unwrap();
    for key in [D1, D2, D3] {
        mark_processed(dir.path(), key, ColourMode::Coloured);
    }
    let archive = three_days();

    let options = options(dir.path()).with_stop_on_catchup(false);
    let summary = Crawler::new(&archive, converter(), options).run().unwrap();

    assert!(archive.downloaded().is_empty());
    assert!(!summary.found_unprocessed);
    assert_eq!(
        summary.message(),
        "No unprocessed files found at all - fully up to date."
    );
}

#[test]
fn converted_output_is_detected_on_the_next_run() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::default().with(D1, b"d1");

    let first = Crawler::new(&archive, converter(), options(dir.path())).run().unwrap();
    assert_eq!(first.converted.len(), 1);
    assert!(processed_file_exists(&dir.path().join("out"), "scan_d1"));

    let second = Crawler::new(&archive, converter(), options(dir.path())).run().unwrap();
    assert_eq!(second.outcome, CrawlOutcome::CaughtUp { key: D1.to_string() });
    assert_eq!(archive.downloaded(), vec![D1]);
}

#[test]
fn walks_years_and_months_newest_first() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::default()
        .with("radar/2023/12/31/late.h5", b"x")
        .with("radar/2024/02/01/b.h5", b"x")
        .with("radar/2024/10/01/c.h5", b"x")
        .with("radar/2024/10/01/a.h5", b"x")
        .with("radar/2024/10/01/readme.txt", b"x");

    Crawler::new(&archive, converter(), options(dir.path())).run().unwrap();
    assert_eq!(
        archive.downloaded(),
        vec![
            "radar/2024/10/01/c.h5",
            "radar/2024/10/01/a.h5",
            "radar/2024/02/01/b.h5",
            "radar/2023/12/31/late.h5",
        ]
    );
}

#[test]
fn first_failure_aborts_by_default() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::default().with(D1, b"d1").with(D3, CORRUPT);

    let result = Crawler::new(&archive, converter(), options(dir.path())).run();
    assert!(matches!(result, Err(CrawlError::Convert { ref key, .. }) if key == D3));
    assert_eq!(archive.downloaded(), vec![D3]);
    assert!(staging_is_empty(dir.path()));
}

#[test]
fn isolated_failures_are_recorded() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::default().with(D1, b"d1").with(D3, CORRUPT);

    let options = options(dir.path()).with_isolate_failures(true);
    let summary = Crawler::new(&archive, converter(), options).run().unwrap();
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, D3);
    assert_eq!(summary.converted.len(), 1);
    assert_eq!(summary.outcome, CrawlOutcome::Exhausted);
}

#[test]
fn crawls_a_directory_mirror() {
    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror");
    for key in [D1, D3] {
        let path = mirror.join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"scan").unwrap();
    }

    let archive = DirectoryArchive::new(&mirror);
    let summary = Crawler::new(archive, converter(), options(dir.path())).run().unwrap();
    assert_eq!(summary.converted.len(), 2);
    assert!(processed_file_exists(&dir.path().join("out"), "scan_d3"));
}
