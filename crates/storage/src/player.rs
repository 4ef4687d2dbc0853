// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Player: indexed random-access reader over a chunk log
//!
//! Each group key has its own cursor into the index. `next` hands out that
//! group's records one at a time, in capture order. The stream position is
//! shared by every reader of one player, so seeking and decoding happen
//! under a single lock.

use crate::index::{ChunkIndex, IndexError};
use crate::state::{CaptureState, StateError};
use fs2::FileExt;
use sd_core::{
    Bookmark, Channel, Chunk, ChunkBody, ChunkError, ChunkKind, File as ApiFile, GroupId, Message,
    StarredItem, User, WorkspaceInfo,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading a log
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("no records for {0}")]
    NotFound(GroupId),
    #[error("all records for {0} have been read")]
    Exhausted(GroupId),
    #[error("failed to decode {group} record at offset {offset}: {source}")]
    Decode {
        group: GroupId,
        offset: u64,
        source: ChunkError,
    },
    #[error("corrupted chunk at offset {offset}: {source}")]
    Corrupted { offset: u64, source: ChunkError },
    #[error("{group} holds {found} records, not {expected}")]
    UnexpectedKind {
        group: GroupId,
        expected: ChunkKind,
        found: ChunkKind,
    },
    #[error("read of {0} was abandoned")]
    Abandoned(GroupId),
    #[error("log is being written: {}", .0.display())]
    Locked(PathBuf),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PlayerError {
    /// True for the expected end of a group's records
    pub fn is_exhausted(&self) -> bool {
        matches!(self, PlayerError::Exhausted(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlayerError::NotFound(_))
    }
}

/// One record handed out by [`Player::read`]
#[derive(Debug, Clone)]
pub struct Entry {
    pub chunk: Chunk,
    /// Byte offset the record starts at
    pub offset: u64,
    /// Whether the group has records after this one
    pub has_more: bool,
}

/// Random-access reader over one indexed log
pub struct Player<R = File> {
    stream: Mutex<R>,
    index: ChunkIndex,
    cursors: RwLock<HashMap<GroupId, usize>>,
    last_offset: AtomicU64,
    label: String,
}

impl Player<File> {
    /// Open and index the log at `path`.
    ///
    /// Takes a shared lock on the file, so a log still held by a
    /// [`Recorder`](crate::Recorder) is refused. The player is labelled
    /// with the file name.
    pub fn open(path: &Path) -> Result<Self, PlayerError> {
        let file = File::open(path)?;
        FileExt::try_lock_shared(&file).map_err(|_| PlayerError::Locked(path.to_path_buf()))?;

        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file)?.with_label(label))
    }
}

impl<R: Read + Seek> Player<R> {
    /// Index `stream` and wrap it in a player
    pub fn new(mut stream: R) -> Result<Self, PlayerError> {
        let index = ChunkIndex::build(&mut stream)?;
        Ok(Self {
            stream: Mutex::new(stream),
            index,
            cursors: RwLock::new(HashMap::new()),
            last_offset: AtomicU64::new(0),
            label: String::new(),
        })
    }

    /// Name the stream, for labelling derived artifacts
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Name of the underlying stream; empty when it has none
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    /// Byte offset of the record most recently returned by [`Player::next`]
    pub fn offset(&self) -> u64 {
        self.last_offset.load(Ordering::SeqCst)
    }

    /// Next unread record for `id`
    pub fn next(&self, id: &GroupId) -> Result<Chunk, PlayerError> {
        self.read(id, || true).map(|entry| entry.chunk)
    }

    /// Next unread record for `id`, advancing its cursor only if `commit`
    /// agrees.
    ///
    /// `commit` runs after the record has been decoded, still under the
    /// stream lock. When it returns false the cursor is left where it was
    /// and the read fails with [`PlayerError::Abandoned`].
    pub fn read(
        &self,
        id: &GroupId,
        commit: impl FnOnce() -> bool,
    ) -> Result<Entry, PlayerError> {
        let offsets = self
            .index
            .offsets(id)
            .ok_or_else(|| PlayerError::NotFound(id.clone()))?;

        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());

        let pos = self
            .cursors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .copied()
            .unwrap_or(0);
        let offset = *offsets
            .get(pos)
            .ok_or_else(|| PlayerError::Exhausted(id.clone()))?;

        stream.seek(SeekFrom::Start(offset))?;
        let mut line = Vec::new();
        BufReader::new(&mut *stream).read_until(b'\n', &mut line)?;
        let chunk = Chunk::from_line(&line).map_err(|source| PlayerError::Decode {
            group: id.clone(),
            offset,
            source,
        })?;

        if !commit() {
            debug!(group = %id, offset, "read abandoned");
            return Err(PlayerError::Abandoned(id.clone()));
        }

        self.cursors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), pos + 1);
        self.last_offset.store(offset, Ordering::SeqCst);

        debug!(group = %id, offset, n = chunk.count(), "read chunk");
        Ok(Entry {
            chunk,
            offset,
            has_more: pos + 1 < offsets.len(),
        })
    }

    /// Whether `next(id)` would return a record.
    ///
    /// A key that is indexed but never read reports true; an unknown key
    /// reports false.
    pub fn has_more(&self, id: &GroupId) -> bool {
        let Some(offsets) = self.index.offsets(id) else {
            return false;
        };
        match self
            .cursors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
        {
            None => true,
            Some(&pos) => pos < offsets.len(),
        }
    }

    /// Forget every cursor and rewind the stream
    pub fn reset(&self) -> Result<(), PlayerError> {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        self.cursors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        stream.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Visit every record in file order.
    ///
    /// Cursors are reset first; the stream is rewound afterwards even when
    /// the scan or the callback fails.
    pub fn for_each<F, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(Chunk) -> Result<(), E>,
        E: From<PlayerError>,
    {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        self.cursors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        let result = scan(&mut *stream, &mut f);
        let rewind = stream.seek(SeekFrom::Start(0));
        result?;
        rewind.map_err(PlayerError::from)?;
        Ok(())
    }

    /// Plain channel IDs present in the log, sorted
    pub fn channel_ids(&self) -> Vec<String> {
        self.index.channel_ids()
    }

    /// Derive the capture ledger with a full scan
    pub fn state(&self) -> Result<CaptureState, StateError> {
        CaptureState::build(self)
    }

    fn project<T>(
        &self,
        id: &GroupId,
        expected: ChunkKind,
        f: impl FnOnce(ChunkBody) -> Option<T>,
    ) -> Result<T, PlayerError> {
        let chunk = self.next(id)?;
        let found = chunk.kind();
        f(chunk.body).ok_or_else(|| PlayerError::UnexpectedKind {
            group: id.clone(),
            expected,
            found,
        })
    }

    fn drain<T>(
        &self,
        mut next: impl FnMut(&Self) -> Result<Vec<T>, PlayerError>,
    ) -> Result<Vec<T>, PlayerError> {
        self.reset()?;
        let mut all = Vec::new();
        loop {
            match next(self) {
                Ok(items) => all.extend(items),
                Err(PlayerError::Exhausted(_)) => return Ok(all),
                Err(e) => return Err(e),
            }
        }
    }

    /// Next page of a channel's history
    pub fn messages(&self, channel_id: &str) -> Result<Vec<Message>, PlayerError> {
        self.project(&GroupId::channel(channel_id), ChunkKind::Messages, |body| {
            match body {
                ChunkBody::Messages { messages, .. } => Some(messages),
                _ => None,
            }
        })
    }

    /// Next page of replies to the thread rooted at `thread_ts`
    pub fn thread(&self, channel_id: &str, thread_ts: &str) -> Result<Vec<Message>, PlayerError> {
        self.project(
            &GroupId::thread(channel_id, thread_ts),
            ChunkKind::ThreadMessages,
            |body| match body {
                ChunkBody::ThreadMessages { messages, .. } => Some(messages),
                _ => None,
            },
        )
    }

    /// Next batch of files attached to the message at `parent_ts`
    pub fn files(&self, channel_id: &str, parent_ts: &str) -> Result<Vec<ApiFile>, PlayerError> {
        self.project(
            &GroupId::files(channel_id, parent_ts),
            ChunkKind::Files,
            |body| match body {
                ChunkBody::Files { files, .. } => Some(files),
                _ => None,
            },
        )
    }

    pub fn users(&self) -> Result<Vec<User>, PlayerError> {
        self.project(&GroupId::users(), ChunkKind::Users, |body| match body {
            ChunkBody::Users { users } => Some(users),
            _ => None,
        })
    }

    pub fn channels(&self) -> Result<Vec<Channel>, PlayerError> {
        self.project(&GroupId::channels(), ChunkKind::Channels, |body| match body {
            ChunkBody::Channels { channels } => Some(channels),
            _ => None,
        })
    }

    pub fn channel_info(&self, channel_id: &str) -> Result<Channel, PlayerError> {
        self.project(
            &GroupId::channel_info(channel_id),
            ChunkKind::ChannelInfo,
            |body| match body {
                ChunkBody::ChannelInfo { channel, .. } => Some(channel),
                _ => None,
            },
        )
    }

    /// Member IDs of a channel
    pub fn channel_users(&self, channel_id: &str) -> Result<Vec<String>, PlayerError> {
        self.project(
            &GroupId::channel_users(channel_id),
            ChunkKind::ChannelUsers,
            |body| match body {
                ChunkBody::ChannelUsers { user_ids, .. } => Some(user_ids),
                _ => None,
            },
        )
    }

    pub fn starred_items(&self) -> Result<Vec<StarredItem>, PlayerError> {
        self.project(
            &GroupId::starred_items(),
            ChunkKind::StarredItems,
            |body| match body {
                ChunkBody::StarredItems { items } => Some(items),
                _ => None,
            },
        )
    }

    pub fn bookmarks(&self, channel_id: &str) -> Result<Vec<Bookmark>, PlayerError> {
        self.project(
            &GroupId::bookmarks(channel_id),
            ChunkKind::Bookmarks,
            |body| match body {
                ChunkBody::Bookmarks { bookmarks, .. } => Some(bookmarks),
                _ => None,
            },
        )
    }

    pub fn workspace_info(&self) -> Result<WorkspaceInfo, PlayerError> {
        self.project(
            &GroupId::workspace_info(),
            ChunkKind::WorkspaceInfo,
            |body| match body {
                ChunkBody::WorkspaceInfo { info } => Some(info),
                _ => None,
            },
        )
    }

    pub fn has_more_messages(&self, channel_id: &str) -> bool {
        self.has_more(&GroupId::channel(channel_id))
    }

    pub fn has_more_threads(&self, channel_id: &str, thread_ts: &str) -> bool {
        self.has_more(&GroupId::thread(channel_id, thread_ts))
    }

    pub fn has_more_channels(&self) -> bool {
        self.has_more(&GroupId::channels())
    }

    pub fn has_more_users(&self) -> bool {
        self.has_more(&GroupId::users())
    }

    /// Every recorded message of a channel, in capture order.
    ///
    /// Resets all cursors first.
    pub fn all_messages(&self, channel_id: &str) -> Result<Vec<Message>, PlayerError> {
        self.drain(|p| p.messages(channel_id))
    }

    /// Every recorded reply of a thread. Resets all cursors first.
    pub fn all_thread_messages(
        &self,
        channel_id: &str,
        thread_ts: &str,
    ) -> Result<Vec<Message>, PlayerError> {
        self.drain(|p| p.thread(channel_id, thread_ts))
    }

    pub fn all_users(&self) -> Result<Vec<User>, PlayerError> {
        self.drain(|p| p.users())
    }

    pub fn all_channels(&self) -> Result<Vec<Channel>, PlayerError> {
        self.drain(|p| p.channels())
    }

    pub fn all_files(&self, channel_id: &str, parent_ts: &str) -> Result<Vec<ApiFile>, PlayerError> {
        self.drain(|p| p.files(channel_id, parent_ts))
    }
}

fn scan<R, F, E>(stream: &mut R, f: &mut F) -> Result<(), E>
where
    R: Read + Seek,
    F: FnMut(Chunk) -> Result<(), E>,
    E: From<PlayerError>,
{
    stream
        .seek(SeekFrom::Start(0))
        .map_err(PlayerError::from)?;
    let mut reader = BufReader::new(stream);
    let mut offset = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(PlayerError::from)?;
        if read == 0 {
            return Ok(());
        }
        let start = offset;
        offset += read as u64;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let chunk = Chunk::from_line(&line)
            .map_err(|source| PlayerError::Corrupted { offset: start, source })?;
        f(chunk)?;
    }
}

#[cfg(test)]
#[path = "player_tests.rs"]
mod tests;
