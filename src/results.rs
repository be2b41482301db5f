use crate::input::SampleRow;
use crate::metrics::{self, RecapRow};
use crate::defaults;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Cross-scenario matrix: label -> users -> value
///
/// BTreeMaps keep both labels and the user counts in stable ascending order
/// for deterministic rendering.
pub type Matrix = BTreeMap<String, BTreeMap<u64, f64>>;

/// One input file's worth of samples, reduced to its recap table
///
/// Identified by the extracted concurrent-user count and a display name
/// taken from the file name. Raw samples are retained only for the
/// execution date-range computation used by the Word report.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRun {
    pub users: u64,
    pub name: String,
    pub recap: Vec<RecapRow>,
    #[serde(skip)]
    pub samples: Vec<SampleRow>,
}

impl ScenarioRun {
    pub fn new(
        users: u64,
        name: impl Into<String>,
        recap: Vec<RecapRow>,
        samples: Vec<SampleRow>,
    ) -> Self {
        Self {
            users,
            name: name.into(),
            recap,
            samples,
        }
    }

    /// Wall-clock range of this run's samples, empty when unknown
    pub fn execution_range(&self) -> String {
        metrics::execution_range(&self.samples)
    }
}

/// Accumulates scenario runs and projects them into cross-scenario views
///
/// Each added run contributes its non-TOTAL recap rows to the response-time
/// and error-rate matrices. The collection reads run data but never mutates
/// it; runs are kept ordered by user count.
#[derive(Debug, Default)]
pub struct RecapCollection {
    runs: Vec<ScenarioRun>,
    response_time: Matrix,
    error_rate: Matrix,
}

impl RecapCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scenario run, folding its recap into the matrices
    pub fn add_run(&mut self, run: ScenarioRun) {
        for row in &run.recap {
            if row.label == defaults::TOTAL_LABEL {
                continue;
            }
            self.response_time
                .entry(row.label.clone())
                .or_default()
                .insert(run.users, row.average_ms as f64);
            self.error_rate
                .entry(row.label.clone())
                .or_default()
                .insert(run.users, row.error_pct);
        }
        self.runs.push(run);
        self.runs.sort_by_key(|r| r.users);
    }

    /// Runs in ascending user-count order
    pub fn runs(&self) -> &[ScenarioRun] {
        &self.runs
    }

    pub fn response_time_matrix(&self) -> &Matrix {
        &self.response_time
    }

    pub fn error_rate_matrix(&self) -> &Matrix {
        &self.error_rate
    }

    /// Distinct user counts across all runs, ascending
    pub fn user_counts(&self) -> Vec<u64> {
        let mut users: Vec<u64> = self.runs.iter().map(|r| r.users).collect();
        users.sort_unstable();
        users.dedup();
        users
    }

    /// Every label present in the matrices, preferred order first then
    /// alphabetical
    pub fn matrix_labels(&self) -> Vec<String> {
        metrics::ordered_labels(self.response_time.keys().map(String::as_str))
    }

    /// Write a consolidated JSON summary of every run's recap
    pub fn write_json_summary(&self, path: &Path) -> Result<()> {
        let summary = JsonSummary {
            version: crate::VERSION,
            generated: chrono::Utc::now(),
            total_runs: self.runs.len(),
            runs: &self.runs,
        };

        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write JSON summary {}", path.display()))?;

        info!("JSON summary written to {}", path.display());
        Ok(())
    }
}

/// Serialized shape of the JSON summary output
#[derive(Serialize)]
struct JsonSummary<'a> {
    version: &'a str,
    generated: chrono::DateTime<chrono::Utc>,
    total_runs: usize,
    runs: &'a [ScenarioRun],
}

/// Render an error percentage for the matrix sheets
///
/// Values within 1e-9 of an integer render bare ("50", "0"); everything
/// else gets two decimals ("33.33"). Report consumers compare these cells
/// byte for byte, so the tie-break is exact.
pub fn format_error_rate(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, average_ms: i64, error_pct: f64) -> RecapRow {
        RecapRow {
            label: label.to_string(),
            samples: 10,
            average_ms,
            min_ms: average_ms,
            max_ms: average_ms,
            std_dev_ms: 0.0,
            error_pct,
            throughput: "1.0/min".to_string(),
            received_kb: 0.0,
            sent_kb: 0.0,
            avg_bytes: 0.0,
        }
    }

    fn run(users: u64, rows: Vec<RecapRow>) -> ScenarioRun {
        ScenarioRun::new(users, format!("run-{users}"), rows, Vec::new())
    }

    #[test]
    fn matrices_hold_every_non_total_cell() {
        let mut collection = RecapCollection::new();
        collection.add_run(run(
            1,
            vec![
                row("Purchase", 120, 0.0),
                row("Cancel", 80, 50.0),
                row("TOTAL", 100, 25.0),
            ],
        ));
        collection.add_run(run(2, vec![row("Cancel", 90, 0.0), row("TOTAL", 90, 0.0)]));

        let rt = collection.response_time_matrix();
        assert_eq!(rt["Purchase"][&1], 120.0);
        assert_eq!(rt["Cancel"][&2], 90.0);
        // run 2 lacks Purchase entirely: no placeholder cell
        assert!(!rt["Purchase"].contains_key(&2));
        // TOTAL never reaches the matrices
        assert!(!rt.contains_key("TOTAL"));
        assert!(!collection.error_rate_matrix().contains_key("TOTAL"));
    }

    #[test]
    fn runs_are_ordered_by_user_count() {
        let mut collection = RecapCollection::new();
        collection.add_run(run(50, vec![]));
        collection.add_run(run(1, vec![]));
        collection.add_run(run(10, vec![]));
        let users: Vec<u64> = collection.runs().iter().map(|r| r.users).collect();
        assert_eq!(users, vec![1, 10, 50]);
        assert_eq!(collection.user_counts(), vec![1, 10, 50]);
    }

    #[test]
    fn matrix_labels_follow_report_order() {
        let mut collection = RecapCollection::new();
        collection.add_run(run(
            1,
            vec![
                row("Alpha", 1, 0.0),
                row("Cancel", 1, 0.0),
                row("Purchase", 1, 0.0),
            ],
        ));
        assert_eq!(
            collection.matrix_labels(),
            vec!["Purchase", "Cancel", "Alpha"]
        );
    }

    #[test]
    fn error_rate_formatting_tie_break() {
        assert_eq!(format_error_rate(50.0), "50");
        assert_eq!(format_error_rate(33.333), "33.33");
        assert_eq!(format_error_rate(0.0), "0");
        assert_eq!(format_error_rate(99.999999999), "100");
        assert_eq!(format_error_rate(2.5), "2.50");
    }

    #[test]
    fn json_summary_writes_runs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("summary.json");

        let mut collection = RecapCollection::new();
        collection.add_run(run(1, vec![row("Purchase", 120, 0.0)]));
        collection.write_json_summary(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["total_runs"], 1);
        assert_eq!(parsed["runs"][0]["users"], 1);
        assert_eq!(parsed["runs"][0]["recap"][0]["label"], "Purchase");
    }
}
