use crate::report::RECAP_HEADERS;
use crate::results::{format_error_rate, Matrix, RecapCollection};
use anyhow::Result;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::{info, warn};

/// Cell formats shared across all sheets
struct Formats {
    header: Format,
    cell: Format,
    number: Format,
    integer: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0x00D9D9D9))
                .set_border(FormatBorder::Thin),
            cell: Format::new().set_border(FormatBorder::Thin),
            number: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format("0.00"),
            integer: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format("0"),
        }
    }
}

/// Spreadsheet writer for the recap workbook
///
/// One sheet per scenario run with the fixed 11-column recap table, followed
/// by the two cross-scenario matrix sheets ("Data Time Response Time" and
/// "Data Error Rate") with merged scenario blocks.
pub struct ExcelReport;

impl ExcelReport {
    /// Write the whole workbook to `path`
    pub fn write(path: &Path, collection: &RecapCollection) -> Result<()> {
        info!("Creating workbook: {}", path.display());
        let mut workbook = Workbook::new();
        let formats = Formats::new();

        for run in collection.runs() {
            let sheet_name = sanitize_sheet_name(&run.name);
            info!("  -> sheet: {}", sheet_name);

            let sheet = workbook.add_worksheet();
            sheet.set_name(&sheet_name)?;

            if run.recap.is_empty() {
                warn!("    (no data for this scenario)");
                continue;
            }
            Self::write_recap_sheet(sheet, run, &formats)?;
        }

        let labels = collection.matrix_labels();
        let users = collection.user_counts();

        let rt_sheet = workbook.add_worksheet();
        rt_sheet.set_name("Data Time Response Time")?;
        Self::write_matrix_sheet(
            rt_sheet,
            "Response Time (ms)",
            &users,
            &labels,
            collection.response_time_matrix(),
            &formats,
            |sheet, row, value, formats| {
                sheet.write_with_format(row, 2, value.round() as i64, &formats.integer)?;
                Ok(())
            },
        )?;

        let err_sheet = workbook.add_worksheet();
        err_sheet.set_name("Data Error Rate")?;
        Self::write_matrix_sheet(
            err_sheet,
            "Error Rate (%)",
            &users,
            &labels,
            collection.error_rate_matrix(),
            &formats,
            |sheet, row, value, formats| {
                sheet.write_with_format(row, 2, format_error_rate(value).as_str(), &formats.cell)?;
                Ok(())
            },
        )?;

        workbook.save(path)?;
        info!("Workbook finalized: {}", path.display());
        Ok(())
    }

    /// One scenario run's recap table
    fn write_recap_sheet(
        sheet: &mut Worksheet,
        run: &crate::results::ScenarioRun,
        formats: &Formats,
    ) -> Result<()> {
        for (col, header) in RECAP_HEADERS.iter().enumerate() {
            sheet.write_with_format(0, col as u16, *header, &formats.header)?;
        }

        for (i, row) in run.recap.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write_with_format(r, 0, row.label.as_str(), &formats.cell)?;
            sheet.write_with_format(r, 1, row.samples as u64, &formats.number)?;
            sheet.write_with_format(r, 2, row.average_ms, &formats.integer)?;
            sheet.write_with_format(r, 3, row.min_ms, &formats.integer)?;
            sheet.write_with_format(r, 4, row.max_ms, &formats.integer)?;
            sheet.write_with_format(r, 5, row.std_dev_ms, &formats.number)?;
            sheet.write_with_format(r, 6, row.error_pct, &formats.number)?;
            sheet.write_with_format(r, 7, row.throughput.as_str(), &formats.cell)?;
            sheet.write_with_format(r, 8, row.received_kb, &formats.number)?;
            sheet.write_with_format(r, 9, row.sent_kb, &formats.number)?;
            sheet.write_with_format(r, 10, row.avg_bytes, &formats.number)?;
        }

        sheet.set_column_width(0, 40)?;
        for col in 1..RECAP_HEADERS.len() as u16 {
            sheet.set_column_width(col, 16)?;
        }
        Ok(())
    }

    /// Scenario | API | value sheet with user-count blocks merged in the
    /// first column; absent (label, users) cells are skipped outright
    fn write_matrix_sheet<F>(
        sheet: &mut Worksheet,
        value_header: &str,
        users: &[u64],
        labels: &[String],
        matrix: &Matrix,
        formats: &Formats,
        mut write_value: F,
    ) -> Result<()>
    where
        F: FnMut(&mut Worksheet, u32, f64, &Formats) -> Result<(), XlsxError>,
    {
        sheet.write_with_format(0, 0, "Scenario", &formats.header)?;
        sheet.write_with_format(0, 1, "API", &formats.header)?;
        sheet.write_with_format(0, 2, value_header, &formats.header)?;

        let mut row_idx: u32 = 1;
        for &user_count in users {
            let start_row = row_idx;
            for label in labels {
                let value = matrix.get(label).and_then(|cells| cells.get(&user_count));
                let Some(&value) = value else { continue };
                sheet.write_with_format(row_idx, 1, label.as_str(), &formats.cell)?;
                write_value(sheet, row_idx, value, formats)?;
                row_idx += 1;
            }

            let end_row = row_idx.saturating_sub(1);
            if end_row > start_row {
                sheet.merge_range(
                    start_row,
                    0,
                    end_row,
                    0,
                    &user_count.to_string(),
                    &formats.integer,
                )?;
            } else if end_row == start_row {
                sheet.write_with_format(
                    start_row,
                    0,
                    user_count.to_string().as_str(),
                    &formats.integer,
                )?;
            }
        }

        sheet.set_column_width(0, 12)?;
        sheet.set_column_width(1, 20)?;
        sheet.set_column_width(2, 20)?;
        Ok(())
    }
}

/// Clamp a raw scenario name into a legal Excel sheet name
///
/// Strips the forbidden characters, truncates to 31 characters and falls
/// back to "Sheet" for an empty result.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            ':' | '\\' | '/' | '?' | '*' | '[' | ']' => '_',
            other => other,
        })
        .take(31)
        .collect();
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_strip_forbidden_characters() {
        assert_eq!(
            sanitize_sheet_name("API: results/1-users"),
            "API_ results_1-users"
        );
        assert_eq!(sanitize_sheet_name("a[b]c*d?e"), "a_b_c_d_e");
    }

    #[test]
    fn sheet_names_are_truncated_to_31_chars() {
        let long = "x".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).chars().count(), 31);
    }

    #[test]
    fn empty_sheet_names_fall_back() {
        assert_eq!(sanitize_sheet_name(""), "Sheet");
    }
}
