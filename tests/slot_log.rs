use std::fs;
use std::sync::Arc;
use std::thread;

use shredscope::{
    AnalysisConfig, BucketWidth, LineWindow, MismatchPolicy, ShredscopeError, SlotLog, Timestamp,
};

const LOG: &str = "\
type:slot ID:Shred ID:FEC ID:FEC data shreds:FEC set size:time_stamp
SHRED_RX:7:0:1:2:4:1000
SHRED_RX:9:0:0:16:32:1001
SHRED_RX:7:1:1:0:0:1001
SHRED_RX:9:1:0:0:0:1002
REPAIR_RX:7:0:1:0:0:1002
";

fn write_log(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("receipts.log");
    fs::write(&path, LOG).unwrap();
    path
}

#[test]
fn analyze_scenario_block() {
    let dir = tempfile::tempdir().unwrap();
    let log = SlotLog::open(write_log(&dir), AnalysisConfig::default()).unwrap();
    assert_eq!(log.index().block_ids().collect::<Vec<_>>(), vec![7, 9]);

    let analysis = log.analyze(7).unwrap();
    assert_eq!(analysis.events, 3);
    let timeline = &analysis.timelines[&1];
    assert_eq!(timeline.count_at(Timestamp::from_micros(1001)), Some(2));
    assert_eq!(analysis.ready_points.len(), 1);
    assert_eq!(analysis.ready_points[0].timestamp, Timestamp::from_micros(1001));
    assert_eq!(analysis.ready_points[0].cumulative, 2);
    assert_eq!(analysis.duplicates.len(), 1);
    assert_eq!(analysis.stats.repair_events, 1);
    assert_eq!(analysis.stats.duplicates, 1);
}

#[test]
fn wider_buckets_merge_steps() {
    let dir = tempfile::tempdir().unwrap();
    let log = SlotLog::open(write_log(&dir), AnalysisConfig::default()).unwrap();
    let bucket = BucketWidth::from_micros(10).unwrap();
    let analysis = log.analyze_with(7, bucket, MismatchPolicy::Fail).unwrap();
    assert_eq!(analysis.bucket_micros, 10);
    assert_eq!(analysis.timelines[&1].len(), 1);
    assert_eq!(analysis.ready_points[0].timestamp, Timestamp::from_micros(1000));
}

#[test]
fn unknown_block_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let log = SlotLog::open(write_log(&dir), AnalysisConfig::default()).unwrap();
    assert!(matches!(log.analyze(8), Err(ShredscopeError::UnknownBlock(8))));
}

#[test]
fn line_window_limits_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = AnalysisConfig {
        window: LineWindow::new(1, Some(3)),
        ..AnalysisConfig::default()
    };
    let log = SlotLog::open(write_log(&dir), config).unwrap();
    assert_eq!(log.index().len(), 2);
    let analysis = log.analyze(7).unwrap();
    assert_eq!(analysis.events, 1);
}

#[test]
fn empty_window_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = AnalysisConfig {
        window: LineWindow::new(4, Some(4)),
        ..AnalysisConfig::default()
    };
    let err = SlotLog::open(write_log(&dir), config).unwrap_err();
    assert!(matches!(err, ShredscopeError::Config(_)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SlotLog::open(dir.path().join("nope.log"), AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, ShredscopeError::Io(_)));
}

#[test]
fn blocks_can_be_analyzed_in_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(SlotLog::open(write_log(&dir), AnalysisConfig::default()).unwrap());
    let handles: Vec<_> = [7u64, 9]
        .into_iter()
        .map(|id| {
            let log = Arc::clone(&log);
            thread::spawn(move || log.analyze(id).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results[0], log.analyze(7).unwrap());
    assert_eq!(results[1].block_id, 9);
    assert_eq!(results[1].batches[0].set_size, 32);
}
