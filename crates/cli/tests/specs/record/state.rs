//! `sd record state` specs

use crate::prelude::*;
use serde_json::json;

#[test]
fn state_prints_capture_ledger() {
    let temp = Project::empty();
    temp.sample_log("sample.jsonl");

    let run = temp
        .sd()
        .args(&["record", "state", "sample.jsonl"])
        .passes();

    similar_asserts::assert_eq!(
        run.stdout_json(),
        json!({
            "version": 1,
            "name": "sample.jsonl",
            "channels": {
                "C1": ["1000.000100", "1001.000000", "1002.000000"],
                "C2": ["5.0"],
            },
            "threads": {
                "C1:1000.000100": ["1000.000200"],
            },
            "files": {
                "C1": { "F1": "" },
            },
        })
    );
}

#[test]
fn state_of_empty_log_has_no_channels() {
    let temp = Project::empty();
    temp.file("empty.jsonl", "");

    let run = temp.sd().args(&["record", "state", "empty.jsonl"]).passes();
    let state = run.stdout_json();
    assert_eq!(state["version"], 1);
    assert_eq!(state["channels"], json!({}));
}
