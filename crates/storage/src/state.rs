// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture ledger derived from a full log scan
//!
//! Records which messages, thread replies and files a log holds. The ledger
//! is never authoritative: it is rebuilt from the log on demand and saved
//! next to it as `<log>.state`.

use crate::player::{Player, PlayerError};
use sd_core::{parse_ts, ChunkBody, InvalidTimestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Current on-disk format version
pub const STATE_VERSION: u32 = 1;

/// Appended to a log's file name to name its ledger
pub const STATE_SUFFIX: &str = ".state";

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid state file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported state version {0} (expected {STATE_VERSION})")]
    UnsupportedVersion(u32),
    #[error(transparent)]
    Timestamp(#[from] InvalidTimestamp),
}

/// Ledger path for the log at `log`
pub fn state_path_for(log: &Path) -> PathBuf {
    let mut name = log.as_os_str().to_os_string();
    name.push(STATE_SUFFIX);
    PathBuf::from(name)
}

/// What a log has captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureState {
    pub version: u32,
    /// Name of the log the ledger was derived from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Channel ID → message timestamps
    #[serde(default)]
    pub channels: BTreeMap<String, BTreeSet<String>>,
    /// `channel:thread_ts` → reply timestamps
    #[serde(default)]
    pub threads: BTreeMap<String, BTreeSet<String>>,
    /// Channel ID → file ID → local path, empty until downloaded
    #[serde(default)]
    pub files: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::new("")
    }
}

fn thread_key(channel_id: &str, thread_ts: &str) -> String {
    format!("{channel_id}:{thread_ts}")
}

impl CaptureState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            name: name.into(),
            channels: BTreeMap::new(),
            threads: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    /// Scan every record of `player` into a fresh ledger.
    ///
    /// Resets the player's cursors.
    pub fn build<R: Read + Seek>(player: &Player<R>) -> Result<Self, StateError> {
        let mut state = Self::new(player.label());
        player.for_each(|chunk| {
            match chunk.body {
                ChunkBody::Messages {
                    channel_id,
                    messages,
                    ..
                } => {
                    for m in &messages {
                        state.add_message(&channel_id, &m.ts);
                    }
                }
                ChunkBody::ThreadMessages {
                    channel_id,
                    thread_ts,
                    messages,
                    ..
                } => {
                    for m in &messages {
                        state.add_thread(&channel_id, &thread_ts, &m.ts);
                    }
                }
                ChunkBody::Files {
                    channel_id, files, ..
                } => {
                    for f in &files {
                        state.add_file(&channel_id, &f.id, "");
                    }
                }
                _ => {}
            }
            Ok::<_, StateError>(())
        })?;

        debug!(
            channels = state.channels.len(),
            threads = state.threads.len(),
            "built capture state"
        );
        Ok(state)
    }

    pub fn add_message(&mut self, channel_id: &str, ts: &str) {
        self.channels
            .entry(channel_id.to_string())
            .or_default()
            .insert(ts.to_string());
    }

    pub fn add_thread(&mut self, channel_id: &str, thread_ts: &str, ts: &str) {
        self.threads
            .entry(thread_key(channel_id, thread_ts))
            .or_default()
            .insert(ts.to_string());
    }

    /// Record a file; `path` is empty when no local copy is known
    pub fn add_file(&mut self, channel_id: &str, file_id: &str, path: &str) {
        self.files
            .entry(channel_id.to_string())
            .or_default()
            .insert(file_id.to_string(), path.to_string());
    }

    pub fn has_message(&self, channel_id: &str, ts: &str) -> bool {
        self.channels
            .get(channel_id)
            .is_some_and(|set| set.contains(ts))
    }

    pub fn has_thread_message(&self, channel_id: &str, thread_ts: &str, ts: &str) -> bool {
        self.threads
            .get(&thread_key(channel_id, thread_ts))
            .is_some_and(|set| set.contains(ts))
    }

    pub fn has_file(&self, channel_id: &str, file_id: &str) -> bool {
        self.files
            .get(channel_id)
            .is_some_and(|files| files.contains_key(file_id))
    }

    /// Local path of a captured file, if one is known
    pub fn file_path(&self, channel_id: &str, file_id: &str) -> Option<&str> {
        self.files
            .get(channel_id)?
            .get(file_id)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    /// Newest captured message of a channel, in epoch microseconds
    pub fn latest_message(&self, channel_id: &str) -> Result<Option<i64>, StateError> {
        let Some(set) = self.channels.get(channel_id) else {
            return Ok(None);
        };
        let mut latest = None;
        for ts in set {
            let micros = parse_ts(ts)?;
            latest = latest.max(Some(micros));
        }
        Ok(latest)
    }

    /// Captured messages across all channels
    pub fn message_count(&self) -> usize {
        self.channels.values().map(BTreeSet::len).sum()
    }

    /// Captured replies across all threads
    pub fn thread_message_count(&self) -> usize {
        self.threads.values().map(BTreeSet::len).sum()
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(BTreeMap::len).sum()
    }

    /// Write the ledger as pretty JSON, replacing `path` atomically
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let json = serde_json::to_vec_pretty(self)?;

        let mut temp_name: OsString = path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(&json)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;

        info!(path = %path.display(), messages = self.message_count(), "saved capture state");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, StateError> {
        let bytes = fs::read(path)?;
        let state: Self = serde_json::from_slice(&bytes)?;
        if state.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(state.version));
        }
        Ok(state)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
