//! `sd replay` specs
//!
//! Start the server on an ephemeral port and query it over raw HTTP.

use crate::prelude::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::process::{Child, ChildStderr, Command as StdCommand, Stdio};

struct Server {
    child: Child,
    addr: String,
    _stderr: BufReader<ChildStderr>,
}

impl Server {
    fn start(temp: &Project, log: &str) -> Self {
        let mut child = StdCommand::new(SD_BIN)
            .args(["replay", log, "--bind", "127.0.0.1:0"])
            .current_dir(temp.path())
            .env_remove("SD_LOG")
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let mut stderr = BufReader::new(child.stderr.take().unwrap());
        let mut banner = String::new();
        stderr.read_line(&mut banner).unwrap();
        let addr = banner
            .split("http://")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap_or_else(|| panic!("no address in banner: {banner:?}"))
            .to_string();
        Self {
            child,
            addr,
            _stderr: stderr,
        }
    }

    fn get(&self, path: &str) -> String {
        let mut stream = TcpStream::connect(&self.addr).unwrap();
        write!(
            stream,
            "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn replay_serves_recorded_history() {
    let temp = Project::empty();
    temp.sample_log("sample.jsonl");
    let server = Server::start(&temp, "sample.jsonl");

    let first = server.get("/api/conversations.history?channel=C1");
    assert!(first.starts_with("HTTP/1.1 200"), "{first}");
    assert!(first.contains("kickoff"));
    assert!(first.contains("\"has_more\":true"));

    let second = server.get("/api/conversations.history?channel=C1");
    assert!(second.contains("see attached"));
    assert!(second.contains("\"has_more\":false"));
}

#[test]
fn replay_reports_unknown_thread() {
    let temp = Project::empty();
    temp.sample_log("sample.jsonl");
    let server = Server::start(&temp, "sample.jsonl");

    let response = server.get("/api/conversations.replies?channel=C1&ts=9.9");
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(response.contains("thread_not_found"));

    let replies = server.get("/api/conversations.replies?channel=C1&ts=1000.000100");
    assert!(replies.contains("\"reply\""));
}

#[test]
fn replay_of_missing_log_fails() {
    let temp = Project::empty();

    temp.sd()
        .args(&["replay", "missing.jsonl", "--bind", "127.0.0.1:0"])
        .fails()
        .stderr_has("Log 'missing.jsonl' not found");
}
