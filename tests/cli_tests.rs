use std::fs;
use std::process::Command;

use serde_json::Value;

const LOG: &str = "\
type:slot ID:Shred ID:FEC ID:FEC data shreds:FEC set size:time_stamp
SHRED_RX:7:0:1:2:4:1000
SHRED_RX:9:0:0:16:32:1001
SHRED_RX:7:1:1:0:0:1001
SHRED_RX:9:1:0:0:0:1002
REPAIR_RX:7:0:1:0:0:1002
";

#[test]
fn analyze_block_to_json_and_csv() {
    let exe = env!("CARGO_BIN_EXE_shredscope");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("receipts.log");
    let json = dir.path().join("out.json");
    let csv = dir.path().join("out.csv");
    fs::write(&input, LOG).unwrap();

    let output = Command::new(exe)
        .args([
            input.to_str().unwrap(),
            "--block",
            "7",
            "--json",
            json.to_str().unwrap(),
            "--csv",
            csv.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run shredscope");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("block 7"));
    assert!(stdout.contains("READY"));

    let value: Value = serde_json::from_slice(&fs::read(&json).unwrap()).unwrap();
    let block = &value[0];
    assert_eq!(block["block_id"].as_u64(), Some(7));
    assert_eq!(block["ready_points"][0]["timestamp"].as_i64(), Some(1001));
    assert_eq!(block["ready_points"][0]["cumulative"].as_u64(), Some(2));
    assert_eq!(block["timelines"]["1"].as_array().unwrap().len(), 3);
    assert!(block["duplicates"]["1/0"].is_object());

    let csv_text = fs::read_to_string(&csv).unwrap();
    assert!(csv_text.starts_with("block_id,kind,fec_set_id"));
    assert!(csv_text.contains("7,duplicate,1,0,1002,2,REPAIR_RX"));
    assert!(csv_text.contains("7,ready,1,,1001,2,"));
}

#[test]
fn list_prints_block_ids() {
    let exe = env!("CARGO_BIN_EXE_shredscope");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("receipts.log");
    fs::write(&input, LOG).unwrap();

    let output = Command::new(exe)
        .args([input.to_str().unwrap(), "--list"])
        .output()
        .expect("failed to run shredscope");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let ids: Vec<&str> = stdout.lines().skip(1).collect();
    assert_eq!(ids, vec!["7", "9"]);
}

#[test]
fn zero_bucket_is_rejected() {
    let exe = env!("CARGO_BIN_EXE_shredscope");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("receipts.log");
    fs::write(&input, LOG).unwrap();

    let output = Command::new(exe)
        .args([input.to_str().unwrap(), "--bucket-us", "0"])
        .output()
        .expect("failed to run shredscope");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid configuration"));
}

#[test]
fn unknown_block_suggests_list() {
    let exe = env!("CARGO_BIN_EXE_shredscope");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("receipts.log");
    fs::write(&input, LOG).unwrap();

    let output = Command::new(exe)
        .args([input.to_str().unwrap(), "--block", "8"])
        .output()
        .expect("failed to run shredscope");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--list"));
}

#[test]
fn missing_file_error() {
    let exe = env!("CARGO_BIN_EXE_shredscope");
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(exe)
        .args([dir.path().join("missing.log").to_str().unwrap()])
        .output()
        .expect("failed to run shredscope");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Check that the file exists"));
}

#[test]
fn slot_index_dumps_ranges() {
    let exe = env!("CARGO_BIN_EXE_slot_index");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("receipts.log");
    fs::write(&input, LOG).unwrap();

    let output = Command::new(exe)
        .args([input.to_str().unwrap()])
        .output()
        .expect("failed to run slot_index");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let header_len = LOG.lines().next().unwrap().len() + 1;
    assert!(stdout.starts_with(&format!("7 {header_len} {}", LOG.len())));
    assert!(stdout.contains("#blocks: 2"));
}
