//! Error display specs
//!
//! Failures users hit print a message plus numbered suggestions.

use crate::prelude::*;

#[test]
fn missing_log_suggests_recording_one() {
    let temp = Project::empty();

    temp.sd()
        .args(&["record", "state", "missing.jsonl"])
        .fails()
        .stderr_has("error: Log 'missing.jsonl' not found")
        .stderr_has("suggestions:")
        .stderr_has("1. Check the path and try again");
}

#[test]
fn corrupt_log_reports_offset() {
    let temp = Project::empty();
    temp.sample_log("good.jsonl");
    let good = temp.read("good.jsonl");
    let first = good.lines().next().unwrap();
    temp.file("bad.jsonl", &format!("{first}\n{{\"t\":\n"));

    temp.sd()
        .args(&["record", "channels", "bad.jsonl"])
        .fails()
        .stderr_has("Log 'bad.jsonl' is corrupted")
        .stderr_has(&format!("byte offset {}", first.len() + 1));
}

#[test]
fn unknown_channel_is_rejected_before_writing() {
    let temp = Project::empty();
    temp.sample_log("sample.jsonl");

    temp.sd()
        .args(&["record", "stream", "--source", "sample.jsonl", "-o", "out.jsonl", "C9"])
        .fails()
        .stderr_has("Channel 'C9' has no history in 'sample.jsonl'")
        .stderr_has("sd record channels sample.jsonl");

    assert!(!temp.join("out.jsonl").exists());
}

#[test]
fn output_cannot_overwrite_source() {
    let temp = Project::empty();
    temp.sample_log("sample.jsonl");
    let before = temp.read("sample.jsonl");

    temp.sd()
        .args(&["record", "stream", "--source", "sample.jsonl", "-o", "sample.jsonl", "C1"])
        .fails()
        .stderr_has("is still being recorded");

    similar_asserts::assert_eq!(temp.read("sample.jsonl"), before);
}

#[test]
fn bad_replay_config_fails_before_binding() {
    let temp = Project::empty();
    temp.sample_log("sample.jsonl");
    temp.file("replay.toml", "listen = \"127.0.0.1:0\"\n");

    temp.sd()
        .args(&["replay", "sample.jsonl", "--config", "replay.toml"])
        .fails()
        .stderr_has("invalid config");
}
