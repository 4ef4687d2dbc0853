//! `sd record channels` specs

use crate::prelude::*;
use serde_json::json;

#[test]
fn channels_lists_counts_and_latest() {
    let temp = Project::empty();
    temp.sample_log("sample.jsonl");

    let expected = format!(
        "{:<12} {:>8} {}\n{:<12} {:>8} {}\n",
        "C1", 3, "1002.000000", "C2", 1, "5.000000"
    );
    temp.sd()
        .args(&["record", "channels", "sample.jsonl"])
        .passes()
        .stdout_eq(&expected);
}

#[test]
fn channels_json_format() {
    let temp = Project::empty();
    temp.sample_log("sample.jsonl");

    let run = temp
        .sd()
        .args(&["record", "channels", "sample.jsonl", "--format", "json"])
        .passes();

    similar_asserts::assert_eq!(
        run.stdout_json(),
        json!([
            { "id": "C1", "messages": 3, "latest": "1002.000000" },
            { "id": "C2", "messages": 1, "latest": "5.000000" },
        ])
    );
}

#[test]
fn channels_of_empty_log_prints_nothing() {
    let temp = Project::empty();
    temp.file("empty.jsonl", "");

    temp.sd()
        .args(&["record", "channels", "empty.jsonl"])
        .passes()
        .stdout_eq("");
}
