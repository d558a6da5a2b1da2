//! End-to-end test: JSON-lines export → shards → dataset files
//!
//! Runs fully offline on a generated corpus.

use std::collections::BTreeSet;
use std::path::Path;

use indicatif::ProgressBar;
use nwbib_core::{ChunkConfig, chunk_file};
use nwbib_subjects::Config;
use tempfile::TempDir;

const VOCABULARY: &str = "\
@prefix : <https://nwbib.de/subjects#> .

:N1
    a skos:Concept .
:N2
    a skos:Concept .
";

/// 12 records: even ones carry N1 or N2, every third odd one N9 (not in the
/// vocabulary), the rest no NWBib subject at all
fn export_line(i: usize) -> String {
    let subject = if i % 2 == 0 {
        format!(
            r#"[{{"id": "https://nwbib.de/subjects#N{}", "label": "S"}}, {{"id": "https://d-nb.info/gnd/1", "label": "GND"}}]"#,
            1 + (i / 2) % 2
        )
    } else if i % 3 == 0 {
        r#"[{"id": "https://nwbib.de/subjects#N9", "label": "Unknown"}]"#.to_string()
    } else {
        "[]".to_string()
    };
    format!(
        r#"{{"title": "Titel {i}", "otherTitleInformation": ["Teil {i}"], "subject": {subject}}}"#
    )
}

fn write_export(path: &Path, n: usize) {
    let mut content: String = (0..n).map(|i| export_line(i) + "\n").collect();
    content.push('\n');
    std::fs::write(path, content).unwrap();
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn titles(lines: &[String]) -> BTreeSet<String> {
    lines
        .iter()
        .map(|l| l.split('\t').next().unwrap().to_string())
        .collect()
}

#[test]
fn chunk_then_prepare() {
    let dir = TempDir::new().unwrap();
    let export = dir.path().join("nwbib.jsonl");
    write_export(&export, 12);

    let chunk = ChunkConfig {
        input: export,
        output_dir: dir.path().join("chunks"),
        chunk_size: 5,
    };
    let chunked = chunk_file(&chunk, &ProgressBar::hidden()).unwrap();
    assert_eq!(chunked.records, 12);
    assert_eq!(chunked.shards, 3);
    assert_eq!(chunked.blank_lines, 1);

    let vocab = dir.path().join("nwbib.ttl");
    std::fs::write(&vocab, VOCABULARY).unwrap();

    let config = Config {
        shard_dir: chunk.output_dir.clone(),
        vocabulary: Some(vocab),
        collect_stats: true,
        eval_fraction: 0.5,
        seed: Some(11),
        workers: 2,
        train_file: dir.path().join("out/train.tsv"),
        eval_file: dir.path().join("out/test.tsv"),
        unlabeled_file: dir.path().join("out/unlabeled.txt"),
        ..Default::default()
    };
    let summary = nwbib_subjects::run(&config, &ProgressBar::hidden()).unwrap();

    // Even records (6) are labeled; odd ones are unlabeled after filtering
    assert_eq!(summary.scan.records, 12);
    assert_eq!(summary.scan.total_shards, 3);
    assert_eq!(summary.scan.vocabulary_rejections, 2);
    assert_eq!(summary.eval_records, 3);
    assert_eq!(summary.train_records, 3);
    assert_eq!(summary.unlabeled_records, 6);

    let train = read_lines(&config.train_file);
    let eval = read_lines(&config.eval_file);
    assert_eq!(train.len(), 3);
    assert_eq!(eval.len(), 3);

    let train_titles = titles(&train);
    let eval_titles = titles(&eval);
    assert!(train_titles.is_disjoint(&eval_titles));
    let all: BTreeSet<String> = train_titles.union(&eval_titles).cloned().collect();
    let expected: BTreeSet<String> = (0..12)
        .step_by(2)
        .map(|i| format!("Titel {i} - Teil {i}"))
        .collect();
    assert_eq!(all, expected);

    for line in train.iter().chain(&eval) {
        let columns: Vec<&str> = line.split('\t').collect();
        assert_eq!(columns.len(), 2, "GND subject must not be written: {line}");
        assert!(columns[1].starts_with("<https://nwbib.de/subjects#N"));
    }

    assert_eq!(
        read_lines(&config.unlabeled_file),
        vec![
            "Titel 1 - Teil 1",
            "Titel 3 - Teil 3",
            "Titel 5 - Teil 5",
            "Titel 7 - Teil 7",
            "Titel 9 - Teil 9",
            "Titel 11 - Teil 11",
        ]
    );

    let stats = summary.stats.unwrap();
    assert_eq!(stats.total_records, 12);
    assert_eq!(stats.subjects_per_record[&1], 6);
}

#[test]
fn contiguous_split_follows_corpus_order() {
    let dir = TempDir::new().unwrap();
    let export = dir.path().join("nwbib.jsonl");
    // 12 records over 12 single-record shards: offsets 10 and 11 sort after 2
    write_export(&export, 12);
    let chunk = ChunkConfig {
        input: export,
        output_dir: dir.path().join("chunks"),
        chunk_size: 1,
    };
    chunk_file(&chunk, &ProgressBar::hidden()).unwrap();

    let config = Config {
        shard_dir: chunk.output_dir.clone(),
        eval_fraction: 0.5,
        eval_start: Some(1),
        train_file: dir.path().join("train.tsv"),
        eval_file: dir.path().join("test.tsv"),
        unlabeled_file: dir.path().join("unlabeled.txt"),
        ..Default::default()
    };
    nwbib_subjects::run(&config, &ProgressBar::hidden()).unwrap();

    // Labeled records: 0, 2, 3, 4, 6, 8, 9, 10 (N9 kept without vocabulary)
    let eval_in_order: Vec<String> = read_lines(&config.eval_file)
        .iter()
        .map(|l| l.split('\t').next().unwrap().to_string())
        .collect();
    assert_eq!(
        eval_in_order,
        vec![
            "Titel 2 - Teil 2",
            "Titel 3 - Teil 3",
            "Titel 4 - Teil 4",
            "Titel 6 - Teil 6",
        ]
    );
}
