/// Spreadsheet output writer
pub mod excel;

/// Word template substitution writer
pub mod word;

/// Fixed column headers shared by the per-scenario sheets and the Word
/// response-time table
pub const RECAP_HEADERS: [&str; 11] = [
    "Label",
    "# Samples",
    "Average",
    "Min",
    "Max",
    "Std. Dev.",
    "Error %",
    "Throughput",
    "Received KB/sec",
    "Sent KB/sec",
    "Avg. Bytes",
];
