//! Record extraction: raw lobid JSON → title and NWBib subjects
//!
//! Extraction never fails. Absent or mistyped fields fall back to empty
//! values, so one odd record cannot stop a scan of millions.

use serde_json::{Map, Value};

use crate::vocab::VocabularySet;

/// Subject ids outside this authority (GND, Wikidata, ...) are ignored
pub const SUBJECT_AUTHORITY_PREFIX: &str = "https://nwbib.de/subjects";

/// Separator for joined `otherTitleInformation` parts
const OTHER_TITLE_SEPARATOR: &str = ", ";

/// One line of the source export, decoded but otherwise untouched
pub type RawRecord = Map<String, Value>;

/// NWBib subject reference
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subject {
    pub id: String,
    pub label: String,
}

impl Subject {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Title and subjects of one bibliographic record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedRecord {
    pub title: String,
    /// `otherTitleInformation` parts joined with ", "
    pub other_title_information: String,
    /// In source order
    pub subjects: Vec<Subject>,
}

impl NormalizedRecord {
    pub fn has_subjects(&self) -> bool {
        !self.subjects.is_empty()
    }

    /// Title suffixed with " - " and the other title information, if any
    pub fn combined_title(&self) -> String {
        if self.other_title_information.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.other_title_information)
        }
    }
}

/// Result of extracting one record
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub record: NormalizedRecord,
    /// Subject ids dropped only because the vocabulary does not know them
    pub rejected: Vec<String>,
}

/// Extract title and subjects from a raw record.
///
/// With a vocabulary, NWBib subjects missing from it are dropped and
/// reported in [`Extraction::rejected`].
pub fn extract_record(raw: &RawRecord, vocabulary: Option<&VocabularySet>) -> Extraction {
    let mut out = Extraction {
        record: NormalizedRecord {
            title: str_field(raw, "title").to_string(),
            other_title_information: other_title_information(raw),
            subjects: Vec::new(),
        },
        rejected: Vec::new(),
    };

    let Some(subjects) = raw.get("subject").and_then(Value::as_array) else {
        return out;
    };

    for entry in subjects {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let id = str_field(entry, "id");
        if !id.starts_with(SUBJECT_AUTHORITY_PREFIX) {
            continue;
        }
        let label = str_field(entry, "label");
        if let Some(vocab) = vocabulary {
            if !vocab.contains(id) {
                log::debug!("Subject {id} ({label}) not in vocabulary, dropped");
                out.rejected.push(id.to_string());
                continue;
            }
        }
        out.record.subjects.push(Subject::new(id, label));
    }
    out
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

fn other_title_information(raw: &RawRecord) -> String {
    match raw.get("otherTitleInformation") {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(OTHER_TITLE_SEPARATOR),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}
