use sheet_extract::{
    batch::Batch,
    config::Config,
    extract::Pass,
    layout::LayoutKind,
    report::SummaryRecord,
    sample_key::SampleKey,
};
use std::fs;
use std::path::Path;

const SHEET: &str = "\
Bad channels: 12 47
Total No. of rejected epochs: 3
Indices of rejected epochs: 2 9 14
Total No. of trials left: 97
";

fn put(base: &Path, rel: &str, content: &[u8]) {
    let path = base.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn config(base: &Path, out: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.global.print_progress = false;
    cfg.input.base_dir = base.display().to_string();
    cfg.output.root = out.display().to_string();
    cfg
}

fn seed(base: &Path) {
    put(
        base,
        "S02/S02_AnalysisExplanation/Gaze2_S02_T1_Face1_AnalysisSheet.txt",
        SHEET.as_bytes(),
    );
    put(
        base,
        "S01/S01_AnalysisExplanation/S01_T2_AnalysisSheet.txt",
        b"Bad channels: 5\n\xff\xfe junk\n",
    );
    put(
        base,
        "S03/S03_AnalysisExplanation/unlabelled_AnalysisSheet.txt",
        SHEET.as_bytes(),
    );
    put(base, "S04/notes.txt", b"Bad channels: 1\n");
}

#[test]
fn run_writes_artifacts_and_summary() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    seed(input.path());

    let batch = Batch::new(&config(input.path(), out.path()));
    let outcome = batch.run().unwrap();

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.succeeded(), 3);
    assert!(outcome.records[0].filepath().contains("S01_T2"));
    assert!(outcome.records[1].filepath().contains("S02_T1_Face1"));

    let layout = batch.layout();
    let key = SampleKey::from_stem("S02_T1_Face1").unwrap();
    assert_eq!(
        fs::read_to_string(layout.channel_table(&key)).unwrap(),
        "name\tstatus\r\nE12\tbad\r\nE47\tbad\r\n"
    );
    assert_eq!(
        fs::read_to_string(layout.pass_indices(&key, Pass::First)).unwrap(),
        "1,8,13"
    );
    assert_eq!(
        fs::read_to_string(layout.pass_indices(&key, Pass::Second)).unwrap(),
        ""
    );

    let raw = fs::read_to_string(outcome.summary_path.as_ref().unwrap()).unwrap();
    let records: Vec<SummaryRecord> = serde_json::from_str(&raw).unwrap();
    assert_eq!(records, outcome.records);

    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json[1]["subject"], "02");
    assert_eq!(json[1]["pass1_rejected_count"], 3);
    assert_eq!(json[1]["pass1_trials_left"], 97);
    assert!(json[1]["pass2_rejected_count"].is_null());
    assert_eq!(json[0]["bad_channels"], serde_json::json!([5]));
}

#[test]
fn unkeyed_file_is_summarised_but_not_written() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    seed(input.path());

    let batch = Batch::new(&config(input.path(), out.path()));
    let outcome = batch.run().unwrap();

    match &outcome.records[2] {
        SummaryRecord::Extracted(s) => {
            assert_eq!(s.subject, None);
            assert_eq!(s.task, None);
            assert_eq!(s.bad_channels, vec![12, 47]);
        }
        other => panic!("unexpected record: {other:?}"),
    }

    let tables: Vec<_> = fs::read_dir(batch.layout().channels_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".tsv"))
        .collect();
    assert_eq!(tables.len(), 2);
}

#[test]
fn second_run_is_byte_identical() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    seed(input.path());
    let batch = Batch::new(&config(input.path(), out.path()));

    let snapshot = |dir: &Path| -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let p = e.unwrap().path();
                (p.display().to_string(), fs::read(&p).unwrap())
            })
            .collect();
        files.sort();
        files
    };

    batch.run().unwrap();
    let first = (
        snapshot(batch.layout().channels_dir()),
        snapshot(batch.layout().epochs_dir()),
    );
    batch.run().unwrap();
    let second = (
        snapshot(batch.layout().channels_dir()),
        snapshot(batch.layout().epochs_dir()),
    );
    assert_eq!(first, second);
}

#[test]
fn unreadable_file_becomes_error_record() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let batch = Batch::new(&config(input.path(), out.path()));

    let record = batch.process_file(&input.path().join("S09_T1_missing.txt"));
    match record {
        SummaryRecord::Failed(e) => assert!(!e.error.is_empty()),
        other => panic!("unexpected record: {other:?}"),
    }
}

#[test]
fn legacy_dirs_removed_but_active_ones_kept() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    seed(input.path());
    fs::create_dir_all(out.path().join("bad_epochs_channels")).unwrap();
    fs::write(out.path().join("bad_epochs_channels/old.txt"), "x").unwrap();

    let mut cfg = config(input.path(), out.path());
    cfg.output.layout = LayoutKind::Split;
    let batch = Batch::new(&cfg);
    let outcome = batch.run().unwrap();

    assert_eq!(outcome.removed_dirs.len(), 1);
    assert!(!out.path().join("bad_epochs_channels").exists());
    assert!(out.path().join("bad_channels").is_dir());
    assert!(out.path().join("bad_epochs").is_dir());
    assert!(out.path().join("bad_channels/summary.json").is_file());
}

#[test]
fn failed_artifact_write_becomes_error_record() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    seed(input.path());

    let batch = Batch::new(&config(input.path(), out.path()));
    // A directory where the table file should go makes the write fail.
    let blocked = SampleKey::from_stem("S01_T2").unwrap();
    fs::create_dir_all(batch.layout().channel_table(&blocked)).unwrap();

    let outcome = batch.run().unwrap();

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.succeeded(), 2);
    match &outcome.records[0] {
        SummaryRecord::Failed(e) => {
            assert!(e.filepath.contains("S01_T2"));
            assert!(e.error.contains("writing artifacts for S01_T2"), "{}", e.error);
        }
        other => panic!("unexpected record: {other:?}"),
    }
    let raw = fs::read_to_string(outcome.summary_path.as_ref().unwrap()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json[0]["error"].is_string());
    assert_eq!(json[1]["subject"], "02");
}
