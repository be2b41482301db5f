//! # JMeter Recap - Main Entry Point
//!
//! Binary entry point for the recap generator. The run proceeds in four
//! stages:
//!
//! 1. **Initialize logging**: tracing with a colorized line formatter; the
//!    level defaults to info (debug with `--verbose`) and can be overridden
//!    via `RUST_LOG`
//! 2. **Resolve configuration**: CLI arguments, each backed by an
//!    environment variable, normalized into a `ReportConfig`
//! 3. **Aggregate**: discover scenario files, read their samples and fold
//!    each run's recap into the cross-scenario collection
//! 4. **Render**: write the spreadsheet workbook, the optional JSON summary
//!    and the optional Word report
//!
//! Fatal errors (missing results folder, no matching files, unwritable
//! output) propagate out of `main` so the process exits nonzero instead of
//! silently passing off a partial report as success.

use anyhow::Result;
use clap::Parser;
use jmeter_recap::{
    cli::{Args, ReportConfig},
    input, metrics,
    logging::LevelColorFormatter,
    report::{excel::ExcelReport, word},
    results::{RecapCollection, ScenarioRun},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(LevelColorFormatter)
        .init();

    let config = ReportConfig::from(&args);
    info!("RESULTS_FOLDER = {}", config.results_folder.display());
    info!("OUTPUT_FILE    = {}", config.output_file.display());

    let files = input::find_scenario_files(&config.results_folder)?;

    let mut collection = RecapCollection::new();
    for file in &files {
        info!("--------------------------------------------------");
        info!("Processing scenario file: {}", file.display());

        let users = input::extract_users(file);
        let rows = input::read_samples(file)?;
        let recap = metrics::compute_recap(&rows);

        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scenario".to_string());
        collection.add_run(ScenarioRun::new(users, name, recap, rows));
    }

    ExcelReport::write(&config.output_file, &collection)?;

    if let Some(json_output) = &config.json_output {
        collection.write_json_summary(json_output)?;
    }

    match (&config.doc_template, &config.doc_output) {
        (Some(template), Some(output)) => word::generate_report(template, output, &collection)?,
        _ => info!("DOC_TEMPLATE or DOC_OUTPUT not set, skipping Word report"),
    }

    info!("Recap generation completed");
    Ok(())
}
