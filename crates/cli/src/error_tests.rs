// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::error::Error as _;

#[test]
fn error_display() {
    let err = CliError::new("Something went wrong")
        .with_context("First context")
        .with_context("Second context")
        .with_suggestion("Try this")
        .with_suggestion("Or this");

    let output = format!("{}", err);
    assert!(output.contains("error: Something went wrong"));
    assert!(output.contains("-> First context"));
    assert!(output.contains("-> Second context"));
    assert!(output.contains("1. Try this"));
    assert!(output.contains("2. Or this"));
}

#[test]
fn bare_error_is_one_line() {
    assert_eq!(CliError::new("boom").to_string(), "error: boom\n");
}

#[test]
fn corrupt_log_names_offset() {
    let output = CliError::corrupt_log(Path::new("capture.jsonl"), 4096).to_string();
    assert!(output.contains("capture.jsonl"));
    assert!(output.contains("byte offset 4096"));
}

#[test]
fn channel_not_recorded_suggests_listing() {
    let output = CliError::channel_not_recorded("C9", Path::new("a.jsonl")).to_string();
    assert!(output.contains("sd record channels a.jsonl"));
}

#[test]
fn source_is_exposed() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err = CliError::log_not_found(Path::new("x")).with_source(io);
    assert_eq!(err.source().map(|e| e.to_string()), Some("gone".to_string()));
}
