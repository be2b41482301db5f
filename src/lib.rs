//! # JMeter Recap Report Generator
//!
//! A tool that ingests JMeter CSV result files from a load test campaign,
//! aggregates per-label latency, error and throughput statistics for each
//! scenario run, and renders the aggregates into report artifacts.
//!
//! ## Pipeline Overview
//!
//! 1. **Discovery**: locate scenario files by the `results-<n>-user(s)`
//!    naming convention and order them by extracted concurrent-user count
//! 2. **Ingestion**: read each CSV, coercing fields best-effort and
//!    skipping malformed rows
//! 3. **Aggregation**: fold samples into per-label statistics plus a
//!    synthetic TOTAL row
//! 4. **Projection**: collect every run into cross-scenario response-time
//!    and error-rate matrices
//! 5. **Rendering**: write a multi-sheet spreadsheet, an optional JSON
//!    summary, and an optional Word report built from a template
//!
//! ## Error Handling
//!
//! Fatal errors (missing results folder, no matching files) surface as
//! `anyhow` errors and abort the run. Per-row data problems are never
//! errors: rows missing a label, elapsed time or timestamp are skipped and
//! unparsable byte counters default to zero. Output-stage problems with the
//! Word template (missing file, missing placeholder) are logged and the
//! affected substitution is skipped so the rest of the document is still
//! produced.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use jmeter_recap::{
//!     compute_recap, extract_users, find_scenario_files, read_samples,
//!     RecapCollection, ScenarioRun,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut collection = RecapCollection::new();
//!     for file in find_scenario_files(std::path::Path::new("results"))? {
//!         let users = extract_users(&file);
//!         let rows = read_samples(&file)?;
//!         let recap = compute_recap(&rows);
//!         collection.add_run(ScenarioRun::new(users, "scenario", recap, rows));
//!     }
//!     println!("runs collected: {}", collection.runs().len());
//!     Ok(())
//! }
//! ```

/// Command-line interface and configuration
///
/// Argument parsing using clap, with every option also backed by an
/// environment variable so the tool can be driven by environment alone.
/// Converts the user-facing `Args` into the internal `ReportConfig`,
/// normalizing the output path along the way.
pub mod cli;

/// Scenario file discovery and CSV ingestion
///
/// Locates result files by naming convention, extracts the concurrent-user
/// load parameter from file names, and reads JMeter CSV rows into the raw
/// `SampleRow` representation consumed by the aggregator.
pub mod input;

/// Colorized log output
pub mod logging;

/// Per-scenario statistics aggregation
///
/// The recap aggregator: folds raw sample rows into per-label aggregates in
/// a single pass and derives the recap table (mean, min, max, population
/// standard deviation, error percentage, per-minute throughput and byte
/// rates) plus the synthetic TOTAL row.
pub mod metrics;

/// Report output writers
///
/// The spreadsheet writer (per-scenario sheets plus the two cross-scenario
/// matrix sheets) and the Word template substitution writer.
pub mod report;

/// Cross-scenario result collection and projection
///
/// Accumulates `ScenarioRun`s and folds their non-TOTAL recap rows into the
/// response-time and error-rate matrices keyed by (label, users). Also
/// provides the JSON summary output.
pub mod results;

// Re-export the types that make up the public pipeline surface.

pub use cli::{Args, ReportConfig};
pub use input::{extract_users, find_scenario_files, read_samples, SampleRow};
pub use metrics::{compute_recap, execution_range, percentile, RecapRow};
pub use report::excel::ExcelReport;
pub use results::{format_error_rate, RecapCollection, ScenarioRun};

/// The current version of the recap generator
///
/// Populated from Cargo.toml and embedded in the JSON summary output for
/// reproducibility.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Default spreadsheet output file name
    ///
    /// Used when no output file is configured, and appended when the
    /// configured output is a bare directory or has no extension.
    pub const OUTPUT_FILE: &str = "recap_scenarios.xlsx";

    /// Load-parameter sentinel for file names without parsable digits
    ///
    /// Files that match the discovery convention but carry no decimal user
    /// count sort after every real scenario instead of erroring.
    pub const USERS_SENTINEL: u64 = 999_999;

    /// Preferred label ordering for report tables
    ///
    /// Labels listed here appear first in recap tables and matrix sheets,
    /// in this order; any remaining labels follow alphabetically.
    pub const LABEL_ORDER: [&str; 5] = [
        "Genera Token",
        "Purchase",
        "Policy",
        "Generate PDF",
        "Cancel",
    ];

    /// Synthetic label aggregating all samples of a run
    pub const TOTAL_LABEL: &str = "TOTAL";

    /// Percentiles computed alongside each recap row
    ///
    /// Kept for parity with JMeter's summary report; not part of the recap
    /// table itself.
    pub const RECAP_PERCENTILES: [f64; 3] = [90.0, 95.0, 99.0];
}
