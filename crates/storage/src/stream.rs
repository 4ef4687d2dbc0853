// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation streaming into a recorder
//!
//! A [`ConversationSource`] hands out typed response pages; the
//! [`Streamer`] turns them into records in capture order. The live network
//! source lives with the caller. [`PlayerSource`] replays pages from an
//! existing log.

use crate::player::{Player, PlayerError};
use crate::recorder::{LogSink, Recorder, RecorderError};
use sd_core::{Channel, Clock, Message};
use std::io::{Read, Seek};
use thiserror::Error;
use tracing::{debug, info};

/// One page of a paginated response
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the following page; `None` on the last one
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Supplier of conversation data
pub trait ConversationSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Channel metadata, if the source knows it
    fn channel_info(&mut self, channel_id: &str) -> Result<Option<Channel>, Self::Error>;

    /// One page of channel history
    fn history(
        &mut self,
        channel_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>, Self::Error>;

    /// One page of replies to the thread rooted at `thread_ts`
    fn replies(
        &mut self,
        channel_id: &str,
        thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("source failed for {channel}: {source}")]
    Source {
        channel: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

/// Counts for one streamed conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub messages: usize,
    pub threads: usize,
    pub replies: usize,
    pub files: usize,
    pub records: usize,
}

/// Drives conversation sources into a recorder
pub struct Streamer<'a, W: LogSink, C: Clock> {
    recorder: &'a mut Recorder<W, C>,
}

impl<'a, W: LogSink, C: Clock> Streamer<'a, W, C> {
    pub fn new(recorder: &'a mut Recorder<W, C>) -> Self {
        Self { recorder }
    }

    /// Record one channel: info, history pages with their attachments, then
    /// every thread's reply pages with theirs.
    pub fn conversation<S: ConversationSource>(
        &mut self,
        source: &mut S,
        channel_id: &str,
    ) -> Result<StreamStats, StreamError> {
        let source_err = |e: S::Error| StreamError::Source {
            channel: channel_id.to_string(),
            source: Box::new(e),
        };
        let mut stats = StreamStats::default();

        let channel = source.channel_info(channel_id).map_err(source_err)?;
        if let Some(info) = &channel {
            self.recorder.channel_info(info.clone())?;
            stats.records += 1;
        }

        let mut parents = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = source
                .history(channel_id, cursor.as_deref())
                .map_err(source_err)?;
            let is_last = page.is_last();
            stats.messages += page.items.len();
            parents.extend(page.items.iter().filter(|m| m.is_thread_parent()).cloned());

            let attachments: Vec<Message> = page
                .items
                .iter()
                .filter(|m| !m.files.is_empty())
                .cloned()
                .collect();
            self.recorder.messages(channel_id, page.items, is_last)?;
            stats.records += 1;
            self.attachments(channel_id, &channel, attachments, &mut stats)?;

            if is_last {
                break;
            }
            cursor = page.next_cursor;
        }

        for parent in parents {
            let thread_ts = parent.thread_ts().unwrap_or(parent.ts.as_str()).to_string();
            stats.threads += 1;

            let mut cursor: Option<String> = None;
            loop {
                let page = source
                    .replies(channel_id, &thread_ts, cursor.as_deref())
                    .map_err(source_err)?;
                let is_last = page.is_last();
                stats.replies += page.items.len();

                let attachments: Vec<Message> = page
                    .items
                    .iter()
                    .filter(|m| !m.files.is_empty())
                    .cloned()
                    .collect();
                self.recorder
                    .thread_messages(channel_id, parent.clone(), page.items, is_last)?;
                stats.records += 1;
                self.attachments(channel_id, &channel, attachments, &mut stats)?;

                if is_last {
                    break;
                }
                cursor = page.next_cursor;
            }
        }

        info!(
            channel = channel_id,
            messages = stats.messages,
            threads = stats.threads,
            files = stats.files,
            "streamed conversation"
        );
        Ok(stats)
    }

    fn attachments(
        &mut self,
        channel_id: &str,
        channel: &Option<Channel>,
        owners: Vec<Message>,
        stats: &mut StreamStats,
    ) -> Result<(), StreamError> {
        for owner in owners {
            let files = owner.files.clone();
            stats.files += files.len();
            self.recorder
                .files(channel_id, channel.clone(), owner, files)?;
            stats.records += 1;
        }
        Ok(())
    }
}

/// Serves conversation pages out of a recorded log
pub struct PlayerSource<'a, R> {
    player: &'a Player<R>,
}

impl<'a, R: Read + Seek> PlayerSource<'a, R> {
    pub fn new(player: &'a Player<R>) -> Self {
        Self { player }
    }

    fn page(
        &self,
        result: Result<Vec<Message>, PlayerError>,
        has_more: bool,
    ) -> Result<Page<Message>, PlayerError> {
        let items = match result {
            Ok(items) => items,
            Err(PlayerError::Exhausted(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        let next_cursor = has_more.then(|| self.player.offset().to_string());
        Ok(Page { items, next_cursor })
    }
}

impl<R: Read + Seek> ConversationSource for PlayerSource<'_, R> {
    type Error = PlayerError;

    fn channel_info(&mut self, channel_id: &str) -> Result<Option<Channel>, PlayerError> {
        match self.player.channel_info(channel_id) {
            Ok(channel) => Ok(Some(channel)),
            Err(e) if e.is_not_found() || e.is_exhausted() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn history(
        &mut self,
        channel_id: &str,
        _cursor: Option<&str>,
    ) -> Result<Page<Message>, PlayerError> {
        let result = self.player.messages(channel_id);
        self.page(result, self.player.has_more_messages(channel_id))
    }

    /// A thread with no recorded replies answers one empty, final page
    fn replies(
        &mut self,
        channel_id: &str,
        thread_ts: &str,
        _cursor: Option<&str>,
    ) -> Result<Page<Message>, PlayerError> {
        let result = match self.player.thread(channel_id, thread_ts) {
            Err(e) if e.is_not_found() => {
                debug!(channel = channel_id, thread_ts, "no recorded replies");
                Ok(Vec::new())
            }
            other => other,
        };
        self.page(result, self.player.has_more_threads(channel_id, thread_ts))
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
