use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// JMeter Recap - aggregate load test CSV results into report artifacts
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Folder containing JMeter result CSV files
    #[clap(short = 'r', long, env = "RESULTS_FOLDER")]
    pub results_folder: PathBuf,

    /// Spreadsheet output path (a directory or extension-less path gets the
    /// default file name appended)
    #[clap(short = 'o', long, env = "OUTPUT_FILE", default_value = crate::defaults::OUTPUT_FILE)]
    pub output_file: PathBuf,

    /// Word template containing {EXEC_DATE_n} and {RT_TABLE_n} placeholders
    #[clap(long, env = "DOC_TEMPLATE")]
    pub doc_template: Option<PathBuf>,

    /// Destination for the generated Word report
    #[clap(long, env = "DOC_OUTPUT")]
    pub doc_output: Option<PathBuf>,

    /// Optional JSON summary of every scenario recap
    #[clap(long, env = "JSON_OUTPUT")]
    pub json_output: Option<PathBuf>,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved configuration for one report run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    pub results_folder: PathBuf,
    pub output_file: PathBuf,
    pub doc_template: Option<PathBuf>,
    pub doc_output: Option<PathBuf>,
    pub json_output: Option<PathBuf>,
}

impl From<&Args> for ReportConfig {
    fn from(args: &Args) -> Self {
        Self {
            results_folder: args.results_folder.clone(),
            output_file: normalize_output_path(&args.output_file),
            doc_template: args.doc_template.clone(),
            doc_output: args.doc_output.clone(),
            json_output: args.json_output.clone(),
        }
    }
}

impl ReportConfig {
    /// Word generation runs only when both template and output are set
    pub fn word_report_configured(&self) -> bool {
        self.doc_template.is_some() && self.doc_output.is_some()
    }
}

/// Append the default workbook name when the output is a bare directory or
/// has no file extension
fn normalize_output_path(path: &Path) -> PathBuf {
    if path.is_dir() || path.extension().is_none() {
        path.join(crate::defaults::OUTPUT_FILE)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_paths_pass_through() {
        assert_eq!(
            normalize_output_path(Path::new("reports/out.xlsx")),
            PathBuf::from("reports/out.xlsx")
        );
    }

    #[test]
    fn extension_less_paths_get_default_file_name() {
        assert_eq!(
            normalize_output_path(Path::new("reports/out")),
            PathBuf::from("reports/out").join(crate::defaults::OUTPUT_FILE)
        );
    }

    #[test]
    fn existing_directories_get_default_file_name() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(
            normalize_output_path(dir.path()),
            dir.path().join(crate::defaults::OUTPUT_FILE)
        );
    }

    #[test]
    fn word_report_requires_both_paths() {
        let args = Args::parse_from(["jmeter-recap", "--results-folder", "results"]);
        let config = ReportConfig::from(&args);
        assert!(!config.word_report_configured());

        let args = Args::parse_from([
            "jmeter-recap",
            "--results-folder",
            "results",
            "--doc-template",
            "tpl.docx",
            "--doc-output",
            "out.docx",
        ]);
        assert!(ReportConfig::from(&args).word_report_configured());
    }
}
