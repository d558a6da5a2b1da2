//! NWBib subject vocabulary loading
//!
//! The vocabulary ships as a SKOS Turtle file. Rather than parsing Turtle,
//! every line that is exactly a local concept name (`:N<digits>`) is taken
//! as a term; everything else is skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use rustc_hash::FxHashSet;

/// Base URI that local concept names are resolved against
pub const VOCABULARY_BASE_URI: &str = "https://nwbib.de/subjects#";

/// O(1) subject URI lookup using `FxHashSet`
#[derive(Debug, Clone, Default)]
pub struct VocabularySet {
    set: FxHashSet<String>,
}

impl VocabularySet {
    /// Collect terms from vocabulary text, one candidate per line
    pub fn parse(text: &str) -> Self {
        text.lines().filter_map(term_uri).collect()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.set.contains(uri)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl FromIterator<String> for VocabularySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            set: iter.into_iter().collect(),
        }
    }
}

/// Local concept name on a line, e.g. `N543020` for `:N543020`.
///
/// Leading and trailing whitespace is ignored; anything else on the line
/// disqualifies it.
pub fn term_id(line: &str) -> Option<&str> {
    let id = line.trim().strip_prefix(':')?;
    let digits = id.strip_prefix('N')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(id)
}

/// Fully-qualified subject URI for a vocabulary line, if it names a term
pub fn term_uri(line: &str) -> Option<String> {
    term_id(line).map(|id| format!("{VOCABULARY_BASE_URI}{id}"))
}

/// Load a vocabulary file, streaming it line by line.
///
/// A file without any term lines yields an empty set, which filters out
/// every subject. Callers that want no filtering pass no vocabulary at all.
pub fn load_vocabulary(path: &Path) -> io::Result<VocabularySet> {
    let reader = BufReader::new(File::open(path)?);
    let mut terms = FxHashSet::default();
    for line in reader.lines() {
        if let Some(uri) = term_uri(&line?) {
            terms.insert(uri);
        }
    }
    log::info!(
        "Loaded {} vocabulary terms from {}",
        terms.len(),
        path.display()
    );
    Ok(VocabularySet { set: terms })
}
