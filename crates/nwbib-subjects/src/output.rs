//! Dataset files: labeled TSV and unlabeled title lists
//!
//! Every file is written to `<name>.tmp` and renamed into place once
//! flushed, so an interrupted run never leaves a truncated output behind.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::extract::NormalizedRecord;

/// Quote a TSV field if it contains a tab, quote, or line break
pub fn tsv_field(field: &str) -> Cow<'_, str> {
    if field.contains(['\t', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// One labeled row: combined title followed by `<subject-uri>` columns.
///
/// Rows are terminated with `\n` by the writers below, not the `\r\n` of
/// RFC 4180 style writers; consumers expecting CRLF rows must convert.
pub fn tsv_line(record: &NormalizedRecord) -> String {
    let mut line = tsv_field(&record.combined_title()).into_owned();
    for subject in &record.subjects {
        line.push('\t');
        line.push_str(&tsv_field(&format!("<{}>", subject.id)));
    }
    line
}

/// Combined title on a single line
pub fn unlabeled_line(record: &NormalizedRecord) -> String {
    record
        .combined_title()
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

/// Write labeled records as TSV, returning the number of rows
pub fn write_labeled(path: &Path, records: &[&NormalizedRecord]) -> io::Result<usize> {
    write_atomic(path, |w| {
        for record in records {
            writeln!(w, "{}", tsv_line(record))?;
        }
        Ok(records.len())
    })
}

/// Write one combined title per line, returning the number of lines
pub fn write_unlabeled(path: &Path, records: &[NormalizedRecord]) -> io::Result<usize> {
    write_atomic(path, |w| {
        for record in records {
            writeln!(w, "{}", unlabeled_line(record))?;
        }
        Ok(records.len())
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_atomic<F>(path: &Path, body: F) -> io::Result<usize>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<usize>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    match write_tmp(&tmp, body) {
        Ok(n) => {
            fs::rename(&tmp, path)?;
            log::info!("Wrote {n} lines to {}", path.display());
            Ok(n)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn write_tmp<F>(tmp: &Path, body: F) -> io::Result<usize>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<usize>,
{
    let mut writer = BufWriter::new(File::create(tmp)?);
    let n = body(&mut writer)?;
    writer.flush()?;
    Ok(n)
}
