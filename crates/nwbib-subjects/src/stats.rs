//! Frequency statistics over the scanned corpus, and their report.
//!
//! Three tables are kept: how many records carry each top-level key, how many
//! records have N retained subjects, and how often each subject occurs.
//! Tables are built per shard and merged, so shards can be scanned in parallel.

use std::collections::BTreeMap;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use nwbib_core::{fmt_num, pct};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::extract::{NormalizedRecord, RawRecord, Subject};
use crate::scanner::ScanSummary;

/// Rows shown in the top-keys and top-subjects tables
pub const TOP_N: usize = 20;

/// Frequency tables accumulated during a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total_records: usize,
    /// Top-level key → number of records containing it
    pub record_keys: FxHashMap<String, usize>,
    /// Retained subject count → number of records
    pub subjects_per_record: BTreeMap<usize, usize>,
    /// `"<id> (<label>)"` → occurrences
    pub subjects: FxHashMap<String, usize>,
}

/// Sorted, serializable snapshot of [`Statistics`]
#[derive(Debug, Serialize)]
pub struct StatisticsReport<'a> {
    pub total_records: usize,
    pub subjects_per_record: &'a BTreeMap<usize, usize>,
    pub record_keys: BTreeMap<&'a str, usize>,
    pub subjects: BTreeMap<&'a str, usize>,
}

impl Statistics {
    /// Count one record: its raw keys and its normalized subjects
    pub fn observe(&mut self, raw: &RawRecord, record: &NormalizedRecord) {
        self.total_records += 1;
        for key in raw.keys() {
            *self.record_keys.entry(key.clone()).or_default() += 1;
        }
        *self
            .subjects_per_record
            .entry(record.subjects.len())
            .or_default() += 1;
        for subject in &record.subjects {
            *self.subjects.entry(subject_key(subject)).or_default() += 1;
        }
    }

    /// Fold another shard's tables into this one
    pub fn merge(&mut self, other: Statistics) {
        self.total_records += other.total_records;
        for (key, n) in other.record_keys {
            *self.record_keys.entry(key).or_default() += n;
        }
        for (count, n) in other.subjects_per_record {
            *self.subjects_per_record.entry(count).or_default() += n;
        }
        for (key, n) in other.subjects {
            *self.subjects.entry(key).or_default() += n;
        }
    }

    /// Most frequent top-level keys, ties broken by key
    pub fn top_keys(&self, n: usize) -> Vec<(&str, usize)> {
        top_n(&self.record_keys, n)
    }

    /// Most frequent subjects, ties broken by key
    pub fn top_subjects(&self, n: usize) -> Vec<(&str, usize)> {
        top_n(&self.subjects, n)
    }

    pub fn report(&self) -> StatisticsReport<'_> {
        StatisticsReport {
            total_records: self.total_records,
            subjects_per_record: &self.subjects_per_record,
            record_keys: self
                .record_keys
                .iter()
                .map(|(k, v)| (k.as_str(), *v))
                .collect(),
            subjects: self
                .subjects
                .iter()
                .map(|(k, v)| (k.as_str(), *v))
                .collect(),
        }
    }

    /// Full tables as pretty JSON with sorted keys
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report())
    }

    /// Format the human-readable report as a string.
    pub fn format_tables(&self, scan: &ScanSummary) -> String {
        let mut out = String::new();

        let mut overview = header_table("Corpus", &["Value", "%"]);
        let rows = [
            ("Records", scan.records),
            ("With subjects", scan.valid),
            ("Without subjects", scan.unlabeled),
            ("Malformed", scan.malformed),
        ];
        for (label, n) in rows {
            overview.add_row(vec![
                Cell::new(label),
                Cell::new(fmt_num(n)),
                Cell::new(format!("{:.1}", pct(n, scan.records))),
            ]);
        }
        overview.add_row(vec![
            Cell::new("Shards"),
            Cell::new(format!(
                "{}/{} ({} failed)",
                scan.total_shards - scan.failed_shards,
                scan.total_shards,
                scan.failed_shards
            )),
            Cell::new(""),
        ]);
        if scan.vocabulary_rejections > 0 {
            overview.add_row(vec![
                Cell::new("Vocabulary rejections").fg(Color::Yellow),
                Cell::new(fmt_num(scan.vocabulary_rejections)).fg(Color::Yellow),
                Cell::new(""),
            ]);
        }
        out.push_str(&format!("\n{overview}"));

        let mut histogram = header_table("Subjects per record", &["Records", "%"]);
        for (count, n) in &self.subjects_per_record {
            histogram.add_row(vec![
                Cell::new(count),
                Cell::new(fmt_num(*n)),
                Cell::new(format!("{:.1}", pct(*n, self.total_records))),
            ]);
        }
        out.push_str(&format!("\n{histogram}"));

        let mut keys = header_table("Record key", &["Records", "%"]);
        for (key, n) in self.top_keys(TOP_N) {
            keys.add_row(vec![
                Cell::new(key),
                Cell::new(fmt_num(n)),
                Cell::new(format!("{:.1}", pct(n, self.total_records))),
            ]);
        }
        out.push_str(&format!("\n{keys}"));

        let mut subjects = header_table("Subject", &["Occurrences"]);
        for (key, n) in self.top_subjects(TOP_N) {
            subjects.add_row(vec![Cell::new(key), Cell::new(fmt_num(n))]);
        }
        out.push_str(&format!("\n{subjects}"));
        out.push_str(&format!(
            "\n  Distinct subjects: {}  |  Distinct keys: {}",
            fmt_num(self.subjects.len()),
            fmt_num(self.record_keys.len())
        ));

        out
    }
}

/// Statistics key for a subject: `"<id> (<label>)"`
pub fn subject_key(subject: &Subject) -> String {
    format!("{} ({})", subject.id, subject.label)
}

fn top_n(counts: &FxHashMap<String, usize>, n: usize) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(n);
    entries
}

fn header_table(title: &str, columns: &[&str]) -> Table {
    let mut header = vec![Cell::new(title)
        .fg(Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)];
    header.extend(columns.iter().map(|c| Cell::new(c).fg(Color::Cyan)));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}
