//! Help output specs

use crate::prelude::*;

#[test]
fn top_level_help_lists_commands() {
    let temp = Project::empty();

    temp.sd()
        .args(&["--help"])
        .passes()
        .stdout_has("record")
        .stdout_has("replay");
}

#[test]
fn record_help_lists_subcommands() {
    let temp = Project::empty();

    temp.sd()
        .args(&["record", "--help"])
        .passes()
        .stdout_has("stream")
        .stdout_has("state")
        .stdout_has("channels");
}

#[test]
fn replay_help_shows_flags() {
    let temp = Project::empty();

    temp.sd()
        .args(&["replay", "--help"])
        .passes()
        .stdout_has("--bind")
        .stdout_has("--timeout")
        .stdout_has("--config");
}

#[test]
fn missing_subcommand_fails() {
    let temp = Project::empty();
    temp.sd().args(&["record"]).fails();
}
