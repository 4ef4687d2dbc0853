// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-pass offset index over a chunk log
//!
//! Maps each [`GroupId`] to the byte offsets where its records begin, in
//! file order. Built once per opened stream and read-only afterwards.

use sd_core::{Chunk, ChunkError, ChunkKind, GroupId};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while indexing a log
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("corrupted chunk at offset {offset}: {source}")]
    Corrupted { offset: u64, source: ChunkError },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
struct GroupEntry {
    kind: ChunkKind,
    offsets: Vec<u64>,
}

/// Offsets of every record in a log, grouped by key
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    groups: HashMap<GroupId, GroupEntry>,
    records: usize,
}

impl ChunkIndex {
    /// Scan `stream` from the start and index every record.
    ///
    /// Any record that fails to decode aborts the whole scan; there is no
    /// partial index. On success the stream is left positioned at offset 0.
    pub fn build<R: Read + Seek>(stream: &mut R) -> Result<Self, IndexError> {
        stream.seek(SeekFrom::Start(0))?;

        let mut index = Self::default();
        {
            let mut reader = BufReader::new(&mut *stream);
            let mut offset = 0u64;
            let mut line = Vec::new();

            loop {
                line.clear();
                let read = reader.read_until(b'\n', &mut line)?;
                if read == 0 {
                    break;
                }
                let start = offset;
                offset += read as u64;

                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }

                let chunk = Chunk::from_line(&line)
                    .map_err(|source| IndexError::Corrupted { offset: start, source })?;
                index.insert(&chunk, start);
            }
        }

        stream.seek(SeekFrom::Start(0))?;
        debug!(
            groups = index.groups.len(),
            records = index.records,
            "indexed chunk log"
        );
        Ok(index)
    }

    fn insert(&mut self, chunk: &Chunk, offset: u64) {
        let kind = chunk.kind();
        self.groups
            .entry(chunk.group_id())
            .or_insert_with(|| GroupEntry {
                kind,
                offsets: Vec::new(),
            })
            .offsets
            .push(offset);
        self.records += 1;
    }

    /// Record offsets for `id`, in file order
    pub fn offsets(&self, id: &GroupId) -> Option<&[u64]> {
        self.groups.get(id).map(|g| g.offsets.as_slice())
    }

    /// Kind of the records stored under `id`
    pub fn kind(&self, id: &GroupId) -> Option<ChunkKind> {
        self.groups.get(id).map(|g| g.kind)
    }

    pub fn contains(&self, id: &GroupId) -> bool {
        self.groups.contains_key(id)
    }

    /// Number of distinct groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records across all groups
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// All group keys, sorted
    pub fn groups(&self) -> Vec<&GroupId> {
        let mut ids: Vec<_> = self.groups.keys().collect();
        ids.sort();
        ids
    }

    /// Channel IDs that have message history in the log, sorted.
    ///
    /// Only plain channel groups qualify; thread, file, info and list
    /// groups are excluded.
    pub fn channel_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .groups
            .iter()
            .filter(|(_, g)| g.kind == ChunkKind::Messages)
            .map(|(id, _)| id.as_str().to_string())
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
