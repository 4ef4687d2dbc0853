// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recorder: sequential chunk writer
//!
//! Appends one JSON line per [`Chunk`], in capture order. A record is
//! serialized in full before any byte reaches the sink, and a failed write
//! rolls the sink back to the end of the last complete record, so the log
//! stays decodable from offset 0 whatever happens.

use fs2::FileExt;
use sd_core::{
    Bookmark, Channel, Chunk, ChunkBody, ChunkError, Clock, File as ApiFile, Message, StarredItem,
    SystemClock, User, WorkspaceInfo,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while recording
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode chunk: {0}")]
    Encode(#[from] ChunkError),
    #[error("recorder is unusable after a failed write")]
    Poisoned,
    #[error("log is in use: {}", .0.display())]
    Locked(PathBuf),
}

/// Destination a [`Recorder`] appends to
pub trait LogSink: Write {
    /// Make everything written so far durable
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }

    /// Discard bytes past `len`, the end of the last complete record.
    ///
    /// Sinks that cannot shrink leave their contents alone.
    fn truncate_to(&mut self, _len: u64) -> io::Result<()> {
        Ok(())
    }

    /// Release any lock held on the destination
    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn release(&mut self) -> io::Result<()> {
        FileExt::unlock(self)
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::End(0))?;
        Ok(())
    }
}

impl LogSink for Vec<u8> {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.truncate(len as usize);
        Ok(())
    }
}

impl LogSink for Cursor<Vec<u8>> {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().truncate(len as usize);
        self.set_position(len);
        Ok(())
    }
}

impl LogSink for io::Stdout {}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        (**self).truncate_to(len)
    }

    fn release(&mut self) -> io::Result<()> {
        (**self).release()
    }
}

/// Sequential writer of chunk records.
///
/// The sink is expected to be empty when the recorder takes it over;
/// returned offsets count from there.
pub struct Recorder<W: LogSink, C: Clock = SystemClock> {
    sink: W,
    clock: C,
    path: Option<PathBuf>,
    bytes_written: u64,
    records: u64,
    poisoned: bool,
}

impl<W: LogSink> Recorder<W> {
    pub fn new(sink: W) -> Self {
        Self::with_clock(sink, SystemClock)
    }
}

impl Recorder<File> {
    /// Create a fresh log at `path`, replacing any previous contents.
    ///
    /// Holds an exclusive lock on the file until the recorder is closed or
    /// dropped, so a [`Player`](crate::Player) cannot open it mid-capture.
    pub fn create(path: &Path) -> Result<Self, RecorderError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().write(true).create(true).open(path)?;
        FileExt::try_lock_exclusive(&file)
            .map_err(|_| RecorderError::Locked(path.to_path_buf()))?;
        file.set_len(0)?;

        let mut recorder = Self::new(file);
        recorder.path = Some(path.to_path_buf());
        Ok(recorder)
    }
}

impl<W: LogSink, C: Clock> Recorder<W, C> {
    pub fn with_clock(sink: W, clock: C) -> Self {
        Self {
            sink,
            clock,
            path: None,
            bytes_written: 0,
            records: 0,
            poisoned: false,
        }
    }

    /// Stamp and append one record.
    ///
    /// Returns the byte offset at which the record begins.
    pub fn record(&mut self, body: ChunkBody) -> Result<u64, RecorderError> {
        let chunk = Chunk::new(self.clock.epoch_micros(), body);
        self.append(&chunk)
    }

    /// Append a record exactly as given, keeping its timestamp
    pub fn append(&mut self, chunk: &Chunk) -> Result<u64, RecorderError> {
        if self.poisoned {
            return Err(RecorderError::Poisoned);
        }

        let mut line = chunk.to_line()?;
        line.push(b'\n');

        let offset = self.bytes_written;
        if let Err(e) = self.sink.write_all(&line) {
            self.poisoned = true;
            if let Err(rollback) = self.sink.truncate_to(offset) {
                warn!(offset, "failed to roll back partial record: {}", rollback);
            }
            return Err(RecorderError::Io(e));
        }

        self.bytes_written += line.len() as u64;
        self.records += 1;
        debug!(group = %chunk.group_id(), offset, n = chunk.count(), "recorded chunk");
        Ok(offset)
    }

    /// One page of a channel's history
    pub fn messages(
        &mut self,
        channel_id: &str,
        messages: Vec<Message>,
        is_last: bool,
    ) -> Result<u64, RecorderError> {
        let num_threads = messages.iter().filter(|m| m.is_thread_parent()).count();
        self.record(ChunkBody::Messages {
            channel_id: channel_id.to_string(),
            messages,
            is_last,
            num_threads,
        })
    }

    /// One page of replies to `parent`
    pub fn thread_messages(
        &mut self,
        channel_id: &str,
        parent: Message,
        messages: Vec<Message>,
        is_last: bool,
    ) -> Result<u64, RecorderError> {
        let thread_ts = parent
            .thread_ts()
            .map(str::to_string)
            .unwrap_or_else(|| parent.ts.clone());
        self.record(ChunkBody::ThreadMessages {
            channel_id: channel_id.to_string(),
            thread_ts,
            parent,
            messages,
            is_last,
        })
    }

    /// Files attached to `parent`
    pub fn files(
        &mut self,
        channel_id: &str,
        channel: Option<Channel>,
        parent: Message,
        files: Vec<ApiFile>,
    ) -> Result<u64, RecorderError> {
        self.record(ChunkBody::Files {
            channel_id: channel_id.to_string(),
            channel,
            parent,
            files,
        })
    }

    pub fn users(&mut self, users: Vec<User>) -> Result<u64, RecorderError> {
        self.record(ChunkBody::Users { users })
    }

    pub fn channels(&mut self, channels: Vec<Channel>) -> Result<u64, RecorderError> {
        self.record(ChunkBody::Channels { channels })
    }

    pub fn channel_info(&mut self, channel: Channel) -> Result<u64, RecorderError> {
        self.record(ChunkBody::ChannelInfo {
            channel_id: channel.id.clone(),
            channel,
        })
    }

    pub fn workspace_info(&mut self, info: WorkspaceInfo) -> Result<u64, RecorderError> {
        self.record(ChunkBody::WorkspaceInfo { info })
    }

    pub fn channel_users(
        &mut self,
        channel_id: &str,
        user_ids: Vec<String>,
    ) -> Result<u64, RecorderError> {
        self.record(ChunkBody::ChannelUsers {
            channel_id: channel_id.to_string(),
            user_ids,
        })
    }

    pub fn starred_items(&mut self, items: Vec<StarredItem>) -> Result<u64, RecorderError> {
        self.record(ChunkBody::StarredItems { items })
    }

    pub fn bookmarks(
        &mut self,
        channel_id: &str,
        bookmarks: Vec<Bookmark>,
    ) -> Result<u64, RecorderError> {
        self.record(ChunkBody::Bookmarks {
            channel_id: channel_id.to_string(),
            bookmarks,
        })
    }

    /// Flush buffered bytes to the sink
    pub fn flush(&mut self) -> Result<(), RecorderError> {
        self.sink.flush()?;
        Ok(())
    }

    /// Flush, sync and hand back the sink.
    ///
    /// For file-backed recorders this also releases the write lock.
    pub fn close(mut self) -> Result<W, RecorderError> {
        self.sink.flush()?;
        self.sink.sync()?;
        self.sink.release()?;
        debug!(records = self.records, bytes = self.bytes_written, "recorder closed");
        Ok(self.sink)
    }

    /// Bytes appended so far; also the offset of the next record
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Records appended so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Path of the log, for recorders created with [`Recorder::create`]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
