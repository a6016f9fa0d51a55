#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! End-to-end indexing and query scenarios over a real directory.

use manroff_diagnostics::MemorySink;
use manroff_index::{
    Indexer, KEYWORD_DB, KeyMask, Query, QueryOpts, RECORD_DB, Record, search,
};
use manroff_parser::{ParseConfig, Parser};
use pretty_assertions::assert_eq;

const MINIMAL: &str = "\
.Dd Jan 1, 2020
.Dt TEST 1
.Os
.Sh NAME
.Nm test
.Nd a thing
";

const SECOND: &str = "\
.Dd Jan 2, 2020
.Dt OTHER 8 amd64
.Os
.Sh NAME
.Nm other
.Nd another thing
.Sh ENVIRONMENT
.Ev OTHER_HOME
.Sh FILES
.Pa /etc/other.conf
";

fn build_index(dir: &std::path::Path, docs: &[(&str, &str)]) {
    let parser = Parser::new(ParseConfig::default());
    let mut indexer = Indexer::new(dir);
    for (file, source) in docs {
        let mut sink = MemorySink::new();
        assert!(
            indexer.add_source(file, source, &parser, &mut sink),
            "failed to index {file}: {:?}",
            sink.diagnostics()
        );
    }
    indexer.commit().unwrap();
}

fn run_query(dir: &std::path::Path, tokens: &[&str]) -> Vec<Record> {
    let query = Query::compile(tokens).unwrap();
    let mut out = Vec::new();
    search(dir, &QueryOpts::default(), &query, |records| {
        out.extend(records.iter().cloned());
    })
    .unwrap();
    out
}

#[test]
fn indexer_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    build_index(dir.path(), &[("test.1", MINIMAL)]);

    let reader = manroff_index::DbReader::open(dir.path()).unwrap();
    let record = reader.record(1).unwrap();
    assert_eq!(record.file, "test.1");
    assert_eq!(record.sec, "1");
    assert_eq!(record.title, "TEST");
    assert_eq!(record.arch, "");
    assert_eq!(record.desc, "a thing");

    let name_entry =
        reader.keywords().iter().find(|e| e.key == b"test").expect("name keyword");
    assert_eq!(name_entry.mask, KeyMask::NAME.union(KeyMask::UTILITY));
    assert_eq!(name_entry.rec, 1);

    let desc_entry =
        reader.keywords().iter().find(|e| e.key == b"a thing").expect("desc keyword");
    assert!(desc_entry.mask.intersects(KeyMask::DESC));
    assert_eq!(desc_entry.rec, 1);
}

#[test]
fn query_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    build_index(dir.path(), &[("test.1", MINIMAL)]);

    let hits = run_query(dir.path(), &["name=test"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].rec, 1);
    assert_eq!(hits[0].title, "TEST");

    assert!(run_query(dir.path(), &["name=absent"]).is_empty());

    // Case-sensitive by default, folded under -i.
    assert!(run_query(dir.path(), &["name=TEST"]).is_empty());
    let hits = run_query(dir.path(), &["-i", "name=TEST"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].rec, 1);
}

#[test]
fn record_numbers_are_dense_and_ordered() {
    let dir = tempfile::tempdir().unwrap();
    build_index(dir.path(), &[("test.1", MINIMAL), ("other.8", SECOND)]);

    let reader = manroff_index::DbReader::open(dir.path()).unwrap();
    let recs: Vec<u32> = reader.records().iter().map(|r| r.rec).collect();
    assert_eq!(recs, vec![1, 2]);

    // Results arrive in record-number order regardless of match order.
    let hits = run_query(dir.path(), &["-i", "desc=thing"]);
    let recs: Vec<u32> = hits.iter().map(|r| r.rec).collect();
    assert_eq!(recs, vec![1, 2]);
}

#[test]
fn semantic_classes_reach_the_database() {
    let dir = tempfile::tempdir().unwrap();
    build_index(dir.path(), &[("other.8", SECOND)]);

    let hits = run_query(dir.path(), &["path=/etc/other.conf"]);
    assert_eq!(hits.len(), 1);

    let hits = run_query(dir.path(), &["env=OTHER_HOME"]);
    assert_eq!(hits.len(), 1);

    // Architecture and section markers from the title line.
    let hits = run_query(dir.path(), &["arch=amd64"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].arch, "amd64");
}

#[test]
fn architecture_filter_applies() {
    let dir = tempfile::tempdir().unwrap();
    build_index(dir.path(), &[("test.1", MINIMAL), ("other.8", SECOND)]);

    let query = Query::compile(&["-i", "desc=thing"]).unwrap();
    let opts = QueryOpts { arch: Some("amd64".into()), section: None };
    let mut out = Vec::new();
    search(dir.path(), &opts, &query, |records| out.extend(records.iter().cloned()))
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].file, "other.8");

    let opts = QueryOpts { arch: None, section: Some("1".into()) };
    let mut out = Vec::new();
    search(dir.path(), &opts, &query, |records| out.extend(records.iter().cloned()))
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].file, "test.1");
}

#[test]
fn reindexing_is_byte_identical() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let docs = [("test.1", MINIMAL), ("other.8", SECOND)];
    build_index(dir_a.path(), &docs);
    build_index(dir_b.path(), &docs);

    for name in [KEYWORD_DB, RECORD_DB] {
        let a = std::fs::read(dir_a.path().join(name)).unwrap();
        let b = std::fs::read(dir_b.path().join(name)).unwrap();
        assert_eq!(a, b, "{name} not reproducible");
    }
}

#[test]
fn query_results_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    build_index(dir.path(), &[("test.1", MINIMAL), ("other.8", SECOND)]);

    let first = run_query(dir.path(), &["-i", "desc=thing"]);
    let second = run_query(dir.path(), &["-i", "desc=thing"]);
    assert_eq!(first, second);
}

#[test]
fn parse_failures_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let parser = Parser::new(ParseConfig::default());
    let mut indexer = Indexer::new(dir.path());

    let mut sink = MemorySink::new();
    assert!(!indexer.add_source("broken.1", "no prologue here\n", &parser, &mut sink));

    let mut sink = MemorySink::new();
    assert!(indexer.add_source("test.1", MINIMAL, &parser, &mut sink));
    assert_eq!(indexer.staged(), 1);
    indexer.commit().unwrap();

    let hits = run_query(dir.path(), &["name=test"]);
    assert_eq!(hits.len(), 1);
}

#[test]
fn presentation_dialect_name_heuristic() {
    let man_page = "\
.TH OTHERCMD 1 \"January 5, 2020\" \"test suite\"
.SH NAME
othercmd, altname \\- do the other thing
.SH DESCRIPTION
Does the other thing.
";
    let dir = tempfile::tempdir().unwrap();
    build_index(dir.path(), &[("othercmd.1", man_page)]);

    let reader = manroff_index::DbReader::open(dir.path()).unwrap();
    assert_eq!(reader.record(1).unwrap().desc, "do the other thing");

    for name in ["othercmd", "altname"] {
        let hits = run_query(dir.path(), &[&format!("name={name}")]);
        assert_eq!(hits.len(), 1, "missing {name}");
    }
    let hits = run_query(dir.path(), &["desc=other thing"]);
    assert_eq!(hits.len(), 1);
}

#[test]
fn boolean_expressions_over_real_data() {
    let dir = tempfile::tempdir().unwrap();
    build_index(dir.path(), &[("test.1", MINIMAL), ("other.8", SECOND)]);

    // name=test OR env=OTHER_HOME -> both manuals.
    let hits = run_query(dir.path(), &["name=test", "-o", "env=OTHER_HOME"]);
    assert_eq!(hits.len(), 2);

    // name=other AND path=/etc -> only the second.
    let hits = run_query(dir.path(), &["name=other", "-a", "path=/etc"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file, "other.8");

    // name=test AND path=/etc -> nothing shares both.
    let hits = run_query(dir.path(), &["name=test", "-a", "path=/etc"]);
    assert!(hits.is_empty());
}
