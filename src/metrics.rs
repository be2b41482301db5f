use crate::defaults;
use crate::input::SampleRow;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Derived statistics for one label within a scenario run
///
/// Produced once per run by [`compute_recap`] and never mutated afterwards.
/// Average, min and max are rounded to the nearest millisecond; the standard
/// deviation uses the population formula and is rounded to two decimals.
/// Throughput and the byte rates are per-minute values; the byte-rate fields
/// keep their legacy "KB/sec" report captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapRow {
    pub label: String,
    pub samples: usize,
    pub average_ms: i64,
    pub min_ms: i64,
    pub max_ms: i64,
    pub std_dev_ms: f64,
    pub error_pct: f64,
    /// Rendered as `"<value>/min"` with one decimal
    pub throughput: String,
    pub received_kb: f64,
    pub sent_kb: f64,
    pub avg_bytes: f64,
}

/// Accumulated state for one label while folding samples
///
/// Transient: lives only inside [`compute_recap`] and is discarded once the
/// recap rows are derived.
struct LabelAggregate {
    times: Vec<f64>,
    errors: usize,
    bytes_sum: i64,
    sent_bytes_sum: i64,
    first_ts: i64,
    last_end_ts: i64,
}

impl LabelAggregate {
    fn new(ts: i64, end_ts: i64) -> Self {
        Self {
            times: Vec::new(),
            errors: 0,
            bytes_sum: 0,
            sent_bytes_sum: 0,
            first_ts: ts,
            last_end_ts: end_ts,
        }
    }

    fn record(&mut self, elapsed: f64, success: bool, bytes: i64, sent_bytes: i64, ts: i64) {
        let end_ts = ts + elapsed as i64;
        self.times.push(elapsed);
        if !success {
            self.errors += 1;
        }
        self.bytes_sum += bytes;
        self.sent_bytes_sum += sent_bytes;
        self.first_ts = self.first_ts.min(ts);
        self.last_end_ts = self.last_end_ts.max(end_ts);
    }
}

/// Parse an optional string field as a float
fn to_f64(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

/// Parse an optional string field as an integer, defaulting on failure
fn to_i64(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

/// Interpret the JMeter `success` column
///
/// Case-insensitive truthy-token match; anything else, including an absent
/// field, counts as a failure.
fn is_success(value: Option<&str>) -> bool {
    match value {
        Some(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        ),
        None => false,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0.0 below two samples
fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentile via linear interpolation between order statistics
///
/// For percentile `p` over `n` sorted values the rank is
/// `k = (n - 1) * p / 100`; the result interpolates between the values at
/// `floor(k)` and `ceil(k)`. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let k = (sorted.len() - 1) as f64 * (p / 100.0);
    let f = k.floor() as usize;
    let c = (f + 1).min(sorted.len() - 1);
    if f == c {
        return Some(sorted[f]);
    }
    let d0 = sorted[f] * (c as f64 - k);
    let d1 = sorted[c] * (k - f as f64);
    Some(d0 + d1)
}

/// Order labels for report output: the preferred sequence first (only labels
/// actually present), then the remainder alphabetically
pub fn ordered_labels<'a, I>(present: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = present.into_iter().collect();
    let mut ordered: Vec<String> = defaults::LABEL_ORDER
        .iter()
        .filter(|l| present.contains(*l))
        .map(|l| l.to_string())
        .collect();
    let mut remaining: Vec<&str> = present
        .iter()
        .filter(|l| !defaults::LABEL_ORDER.contains(*l))
        .copied()
        .collect();
    remaining.sort_unstable();
    ordered.extend(remaining.into_iter().map(String::from));
    ordered
}

/// Derive a recap row from an aggregate's raw counters
///
/// Shared by the per-label rows and the TOTAL row so that TOTAL is computed
/// from raw values rather than from already-rounded per-label results.
fn derive_row(label: &str, agg: &LabelAggregate) -> RecapRow {
    let samples = agg.times.len();
    let avg = mean(&agg.times);
    let mn = agg.times.iter().copied().fold(f64::INFINITY, f64::min);
    let mx = agg.times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std_dev = population_std_dev(&agg.times);

    // Computed for parity with JMeter's summary report; not carried into
    // the recap table.
    for p in defaults::RECAP_PERCENTILES {
        let _ = percentile(&agg.times, p);
    }

    let err_pct = agg.errors as f64 / samples as f64 * 100.0;

    // Wall-clock window for the label, floored at 1 ms so the rate
    // divisions below cannot divide by zero.
    let duration_ms = (agg.last_end_ts - agg.first_ts).max(1);
    let duration_min = duration_ms as f64 / 1000.0 / 60.0;

    let (throughput_per_min, recv_kb_per_min, sent_kb_per_min) = if duration_min > 0.0 {
        (
            samples as f64 / duration_min,
            (agg.bytes_sum as f64 / 1024.0) / duration_min,
            (agg.sent_bytes_sum as f64 / 1024.0) / duration_min,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let avg_bytes = agg.bytes_sum as f64 / samples as f64;

    RecapRow {
        label: label.to_string(),
        samples,
        average_ms: avg.round() as i64,
        min_ms: mn.round() as i64,
        max_ms: mx.round() as i64,
        std_dev_ms: round2(std_dev),
        error_pct: round2(err_pct),
        throughput: format!("{:.1}/min", throughput_per_min),
        received_kb: round2(recv_kb_per_min),
        sent_kb: round2(sent_kb_per_min),
        avg_bytes: round1(avg_bytes),
    }
}

/// Aggregate raw sample rows into the recap table for one scenario run
///
/// Single pass over the rows: each valid sample is folded into its label's
/// aggregate. Rows missing a label, elapsed time or timestamp (or whose
/// elapsed time does not parse) are skipped; byte counters default to zero
/// when unparsable. The returned rows follow the preferred label order, then
/// remaining labels alphabetically, with the TOTAL row last. A run with no
/// valid samples yields an empty table.
pub fn compute_recap(rows: &[SampleRow]) -> Vec<RecapRow> {
    let mut labels: BTreeMap<String, LabelAggregate> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let label = match row.label.as_deref() {
            Some(l) if !l.is_empty() => l,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let elapsed = match to_f64(row.elapsed.as_deref()) {
            Some(e) => e,
            None => {
                skipped += 1;
                continue;
            }
        };
        let ts = match row
            .time_stamp
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
        {
            Some(ts) => ts,
            None => {
                skipped += 1;
                continue;
            }
        };

        let success = is_success(row.success.as_deref());
        let bytes = to_i64(row.bytes.as_deref(), 0);
        let sent_bytes = to_i64(row.sent_bytes.as_deref(), 0);
        let end_ts = ts + elapsed as i64;

        labels
            .entry(label.to_string())
            .or_insert_with(|| LabelAggregate::new(ts, end_ts))
            .record(elapsed, success, bytes, sent_bytes, ts);
    }

    if skipped > 0 {
        debug!("skipped {} rows with missing or unparsable fields", skipped);
    }

    let mut recap = Vec::with_capacity(labels.len() + 1);
    let mut total = LabelAggregate::new(i64::MAX, i64::MIN);

    for label in ordered_labels(labels.keys().map(String::as_str)) {
        let agg = &labels[&label];
        recap.push(derive_row(&label, agg));

        total.times.extend_from_slice(&agg.times);
        total.errors += agg.errors;
        total.bytes_sum += agg.bytes_sum;
        total.sent_bytes_sum += agg.sent_bytes_sum;
        total.first_ts = total.first_ts.min(agg.first_ts);
        total.last_end_ts = total.last_end_ts.max(agg.last_end_ts);
    }

    if !total.times.is_empty() {
        recap.push(derive_row(defaults::TOTAL_LABEL, &total));
    }

    recap
}

/// Render a timestamp in the report's date format
fn format_instant(instant: DateTime<Local>) -> String {
    instant.format("%d/%m/%y %I:%M %p").to_string()
}

/// Wall-clock range of a run's samples, e.g. `21/11/25 09:42 PM - 21/11/25 10:00 PM`
///
/// Scans every row with a parsable integer `timeStamp`, converts the min and
/// max from epoch milliseconds to local time, and joins them with " - ".
/// Returns an empty string when no timestamp parses.
pub fn execution_range(rows: &[SampleRow]) -> String {
    let timestamps: Vec<i64> = rows
        .iter()
        .filter_map(|r| r.time_stamp.as_deref())
        .filter_map(|v| v.trim().parse::<i64>().ok())
        .collect();

    let (start_ms, end_ms) = match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(&start), Some(&end)) => (start, end),
        _ => return String::new(),
    };

    let start = Local.timestamp_millis_opt(start_ms).single();
    let end = Local.timestamp_millis_opt(end_ms).single();
    match (start, end) {
        (Some(start), Some(end)) => {
            format!("{} - {}", format_instant(start), format_instant(end))
        }
        _ => String::new(),
    }
}
