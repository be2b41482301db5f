use crate::defaults;
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// One raw CSV row as read from a JMeter result file
///
/// Every field is optional: the header row defines which columns exist and
/// empty cells deserialize to `None`. Coercion into numbers and booleans is
/// the aggregator's job; this type stays faithful to the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub elapsed: Option<String>,
    #[serde(default)]
    pub success: Option<String>,
    #[serde(rename = "timeStamp", default)]
    pub time_stamp: Option<String>,
    #[serde(default)]
    pub bytes: Option<String>,
    #[serde(rename = "sentBytes", default)]
    pub sent_bytes: Option<String>,
}

fn users_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"results-(\d+)-user").unwrap())
}

fn scenario_file_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"results-.*user.*\.csv$").unwrap())
}

/// Extract the concurrent-user count encoded in a result file name
///
/// Matches the decimal integer between `results-` and `-user`/`-users`,
/// e.g. `API-results-12-users.csv` yields 12. File names without parsable
/// digits return the sentinel so they sort after every real scenario.
pub fn extract_users(path: &Path) -> u64 {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    users_pattern()
        .captures(&name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(defaults::USERS_SENTINEL)
}

/// Discover scenario result files in a folder
///
/// Accepts `.csv` files whose name contains the `results-<n>-user(s)`
/// fragment and returns them ordered by extracted user count (name as the
/// tie-break). A missing folder or an empty match set is a fatal error: a
/// run with nothing to aggregate should abort loudly rather than produce an
/// empty workbook.
pub fn find_scenario_files(results_folder: &Path) -> Result<Vec<PathBuf>> {
    if !results_folder.is_dir() {
        bail!(
            "results folder does not exist or is not a directory: {}",
            results_folder.display()
        );
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(results_folder)
        .with_context(|| format!("failed to read folder {}", results_folder.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .map(|n| scenario_file_pattern().is_match(&n.to_string_lossy()))
                    .unwrap_or(false)
        })
        .collect();

    if files.is_empty() {
        bail!(
            "no result files matching 'results-<n>-user(s).csv' found in {}",
            results_folder.display()
        );
    }

    files.sort_by_key(|path| (extract_users(path), path.file_name().map(|n| n.to_owned())));

    info!("Found {} scenario file(s)", files.len());
    for file in &files {
        info!(" - {}", file.display());
    }

    Ok(files)
}

/// Read a JMeter CSV result file into raw sample rows
///
/// The header row defines the fields; rows that fail to deserialize are
/// logged and skipped rather than aborting the read.
pub fn read_samples(path: &Path) -> Result<Vec<SampleRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open CSV file {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize::<SampleRow>() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => warn!("skipping unreadable row in {}: {}", path.display(), e),
        }
    }

    info!("Read {} sample row(s) from {}", rows.len(), path.display());
    Ok(rows)
}
