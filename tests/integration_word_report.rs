use jmeter_recap::report::word::generate_report;
use jmeter_recap::{compute_recap, RecapCollection, SampleRow, ScenarioRun};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn write_template(path: &Path, document_xml: &str) {
    let file = File::create(path).expect("create template");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    writer
        .start_file("[Content_Types].xml", options)
        .expect("start entry");
    writer.write_all(b"<Types/>").expect("write entry");
    writer
        .start_file("word/document.xml", options)
        .expect("start document");
    writer.write_all(document_xml.as_bytes()).expect("write document");
    writer.finish().expect("finish template");
}

fn read_document(path: &Path) -> String {
    let mut archive = ZipArchive::new(File::open(path).expect("open output")).expect("zip");
    let mut entry = archive.by_name("word/document.xml").expect("document entry");
    let mut text = String::new();
    entry.read_to_string(&mut text).expect("read document");
    text
}

fn sample(label: &str, elapsed: &str, ts: &str) -> SampleRow {
    SampleRow {
        label: Some(label.to_string()),
        elapsed: Some(elapsed.to_string()),
        success: Some("true".to_string()),
        time_stamp: Some(ts.to_string()),
        bytes: Some("512".to_string()),
        sent_bytes: Some("128".to_string()),
    }
}

fn one_run_collection() -> RecapCollection {
    let rows = vec![
        sample("Purchase", "120", "1700000000000"),
        sample("Purchase", "80", "1700000600000"),
    ];
    let recap = compute_recap(&rows);
    let mut collection = RecapCollection::new();
    collection.add_run(ScenarioRun::new(1, "API-results-1-users", recap, rows));
    collection
}

#[test]
fn placeholders_are_substituted_in_the_output_document() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("template.docx");
    let output = dir.path().join("report.docx");

    write_template(
        &template,
        "<?xml version=\"1.0\"?><w:document \
         xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>\
         <w:p><w:r><w:t>{EXEC_DATE_1}</w:t></w:r></w:p>\
         <w:p><w:r><w:t>{RT_TABLE_1}</w:t></w:r></w:p>\
         </w:body></w:document>",
    );

    let collection = one_run_collection();
    generate_report(&template, &output, &collection).expect("generate report");

    let document = read_document(&output);
    assert!(!document.contains("{EXEC_DATE_1}"));
    assert!(!document.contains("{RT_TABLE_1}"));

    let expected_range = collection.runs()[0].execution_range();
    assert!(!expected_range.is_empty());
    assert!(document.contains(&expected_range));

    assert!(document.contains("<w:tbl"));
    assert!(document.contains("<w:t>Purchase</w:t>"));
    assert!(document.contains("<w:t>TOTAL</w:t>"));
    assert!(document.contains("<w:t>Avg. Bytes</w:t>"));
}

#[test]
fn unmatched_placeholders_leave_the_rest_of_the_document_intact() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("template.docx");
    let output = dir.path().join("report.docx");

    // Template only carries the date placeholder; the table placeholder is
    // simply absent.
    write_template(
        &template,
        "<w:document><w:body>\
         <w:p><w:r><w:t>intro text</w:t></w:r></w:p>\
         <w:p><w:r><w:t>{EXEC_DATE_1}</w:t></w:r></w:p>\
         </w:body></w:document>",
    );

    generate_report(&template, &output, &one_run_collection()).expect("generate report");

    let document = read_document(&output);
    assert!(document.contains("intro text"));
    assert!(!document.contains("{EXEC_DATE_1}"));
    assert!(!document.contains("<w:tbl"));
}

#[test]
fn missing_template_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("no-such-template.docx");
    let output = dir.path().join("report.docx");

    generate_report(&template, &output, &one_run_collection()).expect("skip quietly");
    assert!(!output.exists());
}

#[test]
fn non_document_entries_are_copied_through() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("template.docx");
    let output = dir.path().join("report.docx");

    write_template(
        &template,
        "<w:document><w:body><w:p><w:r><w:t>{EXEC_DATE_1}</w:t></w:r></w:p></w:body></w:document>",
    );

    generate_report(&template, &output, &one_run_collection()).expect("generate report");

    let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
    let mut entry = archive.by_name("[Content_Types].xml").expect("copied entry");
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    assert_eq!(text, "<Types/>");
}
