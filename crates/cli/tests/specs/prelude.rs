//! Shared helpers for CLI specs

#![allow(dead_code)]

use assert_cmd::Command;
use sd_core::{Channel, File, Message, User};
use sd_storage::Recorder;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use predicates::prelude::*;

/// The `sd` binary built alongside these specs
pub const SD_BIN: &str = env!("CARGO_BIN_EXE_sd");

/// Scratch directory the CLI runs in
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn file(&self, rel: &str, contents: &str) {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.join(rel)).unwrap()
    }

    /// Write the standard sample capture to `rel`
    pub fn sample_log(&self, rel: &str) {
        let mut rec = Recorder::create(&self.join(rel)).unwrap();
        rec.channel_info(Channel::new("C1")).unwrap();
        let root = Message {
            thread_ts: Some("1000.000100".to_string()),
            reply_count: Some(1),
            ..Message::new("1000.000100", "kickoff")
        };
        rec.messages("C1", vec![root.clone(), Message::new("1001.000000", "second")], false)
            .unwrap();
        let with_file = Message {
            files: vec![File::new("F1")],
            ..Message::new("1002.000000", "see attached")
        };
        rec.messages("C1", vec![with_file.clone()], true).unwrap();
        rec.files("C1", Some(Channel::new("C1")), with_file.clone(), with_file.files.clone())
            .unwrap();
        rec.thread_messages("C1", root, vec![Message::new("1000.000200", "reply")], true)
            .unwrap();
        rec.messages("C2", vec![Message::new("5.0", "other channel")], true)
            .unwrap();
        rec.users(vec![User::new("U1")]).unwrap();
        drop(rec.close().unwrap());
    }

    pub fn sd(&self) -> Cli {
        let mut cmd = Command::new(SD_BIN);
        cmd.current_dir(self.path()).env_remove("SD_LOG").env_remove("SD_REPLAY_BIND");
        Cli { cmd }
    }
}

/// Pending `sd` invocation
pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> Run {
        let output = self.cmd.assert().success().get_output().clone();
        Run { output }
    }

    pub fn fails(mut self) -> Run {
        let output = self.cmd.assert().failure().get_output().clone();
        Run { output }
    }
}

/// Finished invocation
pub struct Run {
    output: std::process::Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            predicate::str::contains(needle).eval(&self.stdout()),
            "stdout missing {needle:?}:\n{}",
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            predicate::str::contains(needle).eval(&self.stderr()),
            "stderr missing {needle:?}:\n{}",
            self.stderr()
        );
        self
    }

    pub fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout()).unwrap()
    }
}
