//! Catch-up traversal of a date partitioned archive.
//!
//! Years, months, days and files are each visited newest first. A file is
//! processed when no output exists for it under either colour mode. With
//! `stop_on_catchup` the first already processed file ends the crawl, which
//! assumes files are archived in order: gaps older than the newest processed
//! file are never backfilled in that mode.

use crate::archive::{key_base_name, sort_descending, ArchiveStore, DEFAULT_PREFIX, OBSERVATION_SUFFIX};
use crate::container::ObservationSource;
use crate::convert::{ColourMode, Converter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

mod error;

pub use error::{CrawlError, CrawlResult};

pub const DEFAULT_STAGING_DIR: &str = "temp_h5";

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub output_folder: PathBuf,
    pub mode: ColourMode,
    pub stop_on_catchup: bool,
    pub prefix: String,
    pub staging_dir: PathBuf,
    pub isolate_failures: bool,
}

impl CrawlOptions {
    pub fn new<P: Into<PathBuf>>(output_folder: P) -> Self {
        Self {
            output_folder: output_folder.into(),
            mode: ColourMode::Greyscale,
            stop_on_catchup: true,
            prefix: DEFAULT_PREFIX.to_string(),
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            isolate_failures: false,
        }
    }

    pub fn with_mode(mut self, mode: ColourMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_stop_on_catchup(mut self, stop: bool) -> Self {
        self.stop_on_catchup = stop;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };
        self
    }

    pub fn with_staging_dir<P: Into<PathBuf>>(mut self, staging_dir: P) -> Self {
        self.staging_dir = staging_dir.into();
        self
    }

    pub fn with_isolate_failures(mut self, isolate: bool) -> Self {
        self.isolate_failures = isolate;
        self
    }
}

/// How a crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Stopped at the first already processed key
    CaughtUp { key: String },
    /// Every key in the archive was visited
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub outcome: CrawlOutcome,
    pub found_unprocessed: bool,
    pub converted: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: Vec<(String, String)>,
}

impl CrawlSummary {
    fn new() -> Self {
        Self {
            outcome: CrawlOutcome::Exhausted,
            found_unprocessed: false,
            converted: vec![],
            skipped: 0,
            failed: vec![],
        }
    }

    /// End of run message for the operator
    pub fn message(&self) -> &'static str {
        match (&self.outcome, self.found_unprocessed) {
            (CrawlOutcome::CaughtUp { .. }, _) => "Caught up with existing data. Stopping.",
            (CrawlOutcome::Exhausted, false) => {
                "No unprocessed files found at all - fully up to date."
            }
            (CrawlOutcome::Exhausted, true) => "Reached end of available historical data.",
        }
    }
}

/// Whether an output for `base` exists under either naming convention
pub fn processed_file_exists(output_folder: &Path, base: &str) -> bool {
    ColourMode::ALL
        .iter()
        .any(|mode| output_folder.join(mode.output_file_name(base)).exists())
}

pub struct Crawler<A, S> {
    archive: A,
    converter: Converter<S>,
    options: CrawlOptions,
}

impl<A: ArchiveStore, S: ObservationSource> Crawler<A, S> {
    pub fn new(archive: A, converter: Converter<S>, options: CrawlOptions) -> Self {
        Self {
            archive,
            converter,
            options,
        }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    pub fn run(&self) -> CrawlResult<CrawlSummary> {
        let staging = &self.options.staging_dir;
        std::fs::create_dir_all(staging).map_err(|source| CrawlError::Staging {
            path: staging.clone(),
            source,
        })?;

        let mut summary = CrawlSummary::new();
        for year in self.descending_prefixes(&self.options.prefix)? {
            info!("Year {}", partition_name(&year));
            for month in self.descending_prefixes(&year)? {
                info!("  Month {}", partition_name(&month));
                for day in self.descending_prefixes(&month)? {
                    info!("    Day {}", partition_name(&day));
                    if let Some(key) = self.crawl_day(&day, &mut summary)? {
                        info!("Caught up with existing data at {key}");
                        summary.outcome = CrawlOutcome::CaughtUp { key };
                        return Ok(summary);
                    }
                }
            }
        }

        summary.outcome = CrawlOutcome::Exhausted;
        Ok(summary)
    }

    /// Process one day, returning the key that triggered a catch-up stop
    fn crawl_day(&self, day: &str, summary: &mut CrawlSummary) -> CrawlResult<Option<String>> {
        let mut keys: Vec<String> = self
            .archive
            .list_keys(day)?
            .into_iter()
            .filter(|key| key.ends_with(OBSERVATION_SUFFIX))
            .collect();
        sort_descending(&mut keys);

        for key in keys {
            let base = key_base_name(&key);
            if processed_file_exists(&self.options.output_folder, base) {
                if self.options.stop_on_catchup {
                    return Ok(Some(key));
                }
                debug!("Already processed {key}");
                summary.skipped += 1;
                continue;
            }

            summary.found_unprocessed = true;
            match self.process(&key, base) {
                Ok(path) => summary.converted.push(path),
                Err(e) if self.options.isolate_failures => {
                    warn!("Skipping {key}: {e}");
                    summary.failed.push((key.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn process(&self, key: &str, base: &str) -> CrawlResult<PathBuf> {
        let staging = &self.options.staging_dir;
        let staging_error = |source| CrawlError::Staging {
            path: staging.clone(),
            source,
        };

        // Deleted when dropped, whether or not the conversion succeeds
        let staged = tempfile::Builder::new()
            .prefix(base)
            .suffix(OBSERVATION_SUFFIX)
            .tempfile_in(staging)
            .map_err(staging_error)?;

        info!("Downloading {key}");
        let bytes = self.archive.download(key, staged.path())?;
        debug!("Downloaded {bytes} bytes to {}", staged.path().display());

        let mode = self.options.mode;
        let file_name = mode.output_file_name(base);
        self.converter
            .convert(
                staged.path(),
                &self.options.output_folder,
                mode,
                Some(&file_name),
            )
            .map_err(|source| CrawlError::Convert {
                key: key.to_string(),
                source,
            })
    }

    fn descending_prefixes(&self, prefix: &str) -> CrawlResult<Vec<String>> {
        let mut prefixes = self.archive.list_prefixes(prefix)?;
        sort_descending(&mut prefixes);
        Ok(prefixes)
    }
}

/// `radar/2024/01/` -> `01`
fn partition_name(prefix: &str) -> &str {
    prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn either_naming_counts_as_processed() {
        let dir = TempDir::new().unwrap();
        assert!(!processed_file_exists(dir.path(), "scan"));
        std::fs::write(dir.path().join("scan_coloured.tif"), b"").unwrap();
        assert!(processed_file_exists(dir.path(), "scan"));
        assert!(!processed_file_exists(dir.path(), "other"));
        std::fs::write(dir.path().join("other_greyscale.tif"), b"").unwrap();
        assert!(processed_file_exists(dir.path(), "other"));
    }

    #[test]
    fn end_of_run_messages() {
        let mut summary = CrawlSummary::new();
        assert_eq!(
            summary.message(),
            "No unprocessed files found at all - fully up to date."
        );
        summary.found_unprocessed = true;
        assert_eq!(summary.message(), "Reached end of available historical data.");
        summary.outcome = CrawlOutcome::CaughtUp { key: "k".into() };
        assert_eq!(summary.message(), "Caught up with existing data. Stopping.");
    }

    #[test]
    fn options_normalise_prefix() {
        assert_eq!(CrawlOptions::new("out").with_prefix("radar").prefix, "radar/");
        assert_eq!(CrawlOptions::new("out").with_prefix("radar/").prefix, "radar/");
    }

    #[test]
    fn partition_names() {
        assert_eq!(partition_name("radar/2024/01/"), "01");
        assert_eq!(partition_name("2024/"), "2024");
    }
}
