use crate::metrics::RecapRow;
use crate::report::RECAP_HEADERS;
use crate::results::RecapCollection;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{error, info};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// WordprocessingML namespace, declared on the inserted table root
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Archive entry holding the document body
const DOCUMENT_ENTRY: &str = "word/document.xml";

/// Generate the Word report by substituting placeholders in a template
///
/// The template is a docx archive; `word/document.xml` is rewritten in
/// place and every other entry is copied through unchanged. Two placeholder
/// families are handled, indexed 1-based over the runs in ascending user
/// order:
///
/// - `{EXEC_DATE_n}`: replaced with the run's execution date range
/// - `{RT_TABLE_n}`: the paragraph containing the placeholder is replaced
///   with a bordered table built from the run's recap rows
///
/// A missing template, a template without a document body, or an absent
/// placeholder is logged and skipped; the report is still produced from
/// whatever could be substituted.
pub fn generate_report(
    template: &Path,
    output: &Path,
    collection: &RecapCollection,
) -> Result<()> {
    if !template.is_file() {
        error!("Word template does not exist: {}", template.display());
        return Ok(());
    }

    info!("Opening Word template: {}", template.display());
    let file = File::open(template)
        .with_context(|| format!("failed to open template {}", template.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("template is not a valid docx archive: {}", template.display()))?;

    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        entries.push((entry.name().to_string(), data));
    }

    let document = match entries.iter().find(|(name, _)| name == DOCUMENT_ENTRY) {
        Some((_, data)) => String::from_utf8(data.clone())
            .context("word/document.xml is not valid UTF-8")?,
        None => {
            error!("{} not found in the template", DOCUMENT_ENTRY);
            return Ok(());
        }
    };

    let document = apply_substitutions(document, collection);

    let out = File::create(output)
        .with_context(|| format!("failed to create Word output {}", output.display()))?;
    let mut writer = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default();

    for (name, data) in &entries {
        writer.start_file(name.clone(), options)?;
        if name == DOCUMENT_ENTRY {
            writer.write_all(document.as_bytes())?;
        } else {
            writer.write_all(data)?;
        }
    }
    writer.finish()?;

    info!("Word report written to {}", output.display());
    Ok(())
}

/// Apply both placeholder families for every run
fn apply_substitutions(mut document: String, collection: &RecapCollection) -> String {
    for (i, run) in collection.runs().iter().enumerate() {
        let n = i + 1;

        let date_placeholder = format!("{{EXEC_DATE_{n}}}");
        if document.contains(&date_placeholder) {
            let range = run.execution_range();
            info!("Replacing {} with '{}'", date_placeholder, range);
            document = document.replace(&date_placeholder, &xml_escape(&range));
        } else {
            info!("Placeholder {} not found in the document", date_placeholder);
        }

        if run.recap.is_empty() {
            continue;
        }
        let table_placeholder = format!("{{RT_TABLE_{n}}}");
        match replace_enclosing_paragraph(
            &document,
            &table_placeholder,
            &build_response_time_table(&run.recap),
        ) {
            Some(updated) => {
                info!(
                    "Inserted response-time table at {} (users={})",
                    table_placeholder, run.users
                );
                document = updated;
            }
            None => info!(
                "Placeholder {} not found (users={})",
                table_placeholder, run.users
            ),
        }
    }
    document
}

/// Replace the whole `<w:p>` element containing `placeholder`
///
/// Returns `None` when the placeholder or its enclosing paragraph cannot be
/// located.
fn replace_enclosing_paragraph(
    document: &str,
    placeholder: &str,
    replacement: &str,
) -> Option<String> {
    let idx = document.find(placeholder)?;
    let start = find_paragraph_start(document, idx)?;
    let end = document[idx..].find("</w:p>")? + idx + "</w:p>".len();
    Some(format!(
        "{}{}{}",
        &document[..start],
        replacement,
        &document[end..]
    ))
}

/// Find the opening `<w:p>` tag preceding `from`
///
/// Walks backwards past `<w:pPr>` and other tags sharing the prefix; only a
/// bare `<w:p>` or `<w:p ...>` counts.
fn find_paragraph_start(document: &str, from: usize) -> Option<usize> {
    let bytes = document.as_bytes();
    let mut search_end = from;
    while let Some(pos) = document[..search_end].rfind("<w:p") {
        match bytes.get(pos + 4) {
            Some(b'>') | Some(b' ') => return Some(pos),
            _ => search_end = pos,
        }
    }
    None
}

/// Minimal XML text escaping for cell contents
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn table_cell(text: &str, bold: bool) -> String {
    let bold_tag = if bold { "<w:b/>" } else { "" };
    format!(
        "<w:tc><w:tcPr/><w:p><w:r><w:rPr>{bold_tag}\
         <w:sz w:val=\"16\"/><w:szCs w:val=\"16\"/></w:rPr>\
         <w:t>{}</w:t></w:r></w:p></w:tc>",
        xml_escape(text)
    )
}

/// Build the bordered response-time table for one run's recap rows
///
/// Header cells and the label column are bold; numeric columns mirror the
/// spreadsheet rendering (integer ms, two-decimal deviation and rates, the
/// error percentage suffixed with '%').
fn build_response_time_table(recap: &[RecapRow]) -> String {
    let mut rows = String::from("<w:tr>");
    for header in RECAP_HEADERS {
        rows.push_str(&table_cell(header, true));
    }
    rows.push_str("</w:tr>");

    for row in recap {
        rows.push_str("<w:tr>");
        let cells = [
            row.label.clone(),
            row.samples.to_string(),
            row.average_ms.to_string(),
            row.min_ms.to_string(),
            row.max_ms.to_string(),
            format!("{:.2}", row.std_dev_ms),
            format!("{:.2}%", row.error_pct),
            row.throughput.clone(),
            format!("{:.2}", row.received_kb),
            format!("{:.2}", row.sent_kb),
            format!("{:.1}", row.avg_bytes),
        ];
        for (i, cell) in cells.iter().enumerate() {
            rows.push_str(&table_cell(cell, i == 0));
        }
        rows.push_str("</w:tr>");
    }

    format!(
        "<w:tbl xmlns:w=\"{W_NS}\"><w:tblPr><w:tblBorders>\
         <w:top w:val=\"single\" w:sz=\"8\" w:space=\"0\" w:color=\"000000\"/>\
         <w:left w:val=\"single\" w:sz=\"8\" w:space=\"0\" w:color=\"000000\"/>\
         <w:bottom w:val=\"single\" w:sz=\"8\" w:space=\"0\" w:color=\"000000\"/>\
         <w:right w:val=\"single\" w:sz=\"8\" w:space=\"0\" w:color=\"000000\"/>\
         <w:insideH w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"000000\"/>\
         <w:insideV w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"000000\"/>\
         </w:tblBorders></w:tblPr>{rows}</w:tbl>"
    )
}
