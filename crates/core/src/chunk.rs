// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunk record model
//!
//! A [`Chunk`] is one captured API response. In memory it is a tagged
//! variant carrying only the payload its kind uses; on the wire it is a
//! single flat JSON object with abbreviated field names, absent fields
//! omitted:
//!
//! ```text
//! {"t":1,"ts":1700000000000000,"id":"C1","n":2,"r":"1000.001","p":{...},"m":[...]}
//! ```
//!
//! | Field | Meaning                                     |
//! |-------|---------------------------------------------|
//! | `t`   | kind tag (see [`ChunkKind`])                |
//! | `ts`  | capture time, epoch microseconds            |
//! | `id`  | channel ID                                  |
//! | `n`   | number of messages or files                 |
//! | `r`   | thread timestamp                            |
//! | `l`   | last record for its channel or thread       |
//! | `nt`  | threads discovered in a messages page       |
//! | `ci`  | channel metadata                            |
//! | `cu`  | channel member IDs                          |
//! | `p`   | parent message                              |
//! | `m`, `f`, `u`, `ch`, `w`, `st`, `b` | payloads      |

use crate::group::GroupId;
use crate::model::{Bookmark, Channel, File, Message, StarredItem, User, WorkspaceInfo};
use crate::ts::{parse_ts, InvalidTimestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while mapping records to and from the wire shape
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("unsupported chunk type: {0}")]
    UnsupportedKind(u8),
    #[error("{kind} chunk is missing field {field:?}")]
    MissingField { kind: ChunkKind, field: &'static str },
    #[error("{0} chunk carries no message timestamps")]
    NoTimestamps(ChunkKind),
    #[error(transparent)]
    Timestamp(#[from] InvalidTimestamp),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kind of captured response. The discriminant is the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ChunkKind {
    Messages = 0,
    ThreadMessages = 1,
    Files = 2,
    Users = 3,
    Channels = 4,
    ChannelInfo = 5,
    WorkspaceInfo = 6,
    ChannelUsers = 7,
    StarredItems = 8,
    Bookmarks = 9,
}

impl ChunkKind {
    pub const ALL: [ChunkKind; 10] = [
        ChunkKind::Messages,
        ChunkKind::ThreadMessages,
        ChunkKind::Files,
        ChunkKind::Users,
        ChunkKind::Channels,
        ChunkKind::ChannelInfo,
        ChunkKind::WorkspaceInfo,
        ChunkKind::ChannelUsers,
        ChunkKind::StarredItems,
        ChunkKind::Bookmarks,
    ];
}

impl From<ChunkKind> for u8 {
    fn from(kind: ChunkKind) -> Self {
        kind as u8
    }
}

impl TryFrom<u8> for ChunkKind {
    type Error = ChunkError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        ChunkKind::ALL
            .get(usize::from(tag))
            .copied()
            .ok_or(ChunkError::UnsupportedKind(tag))
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChunkKind::Messages => "Messages",
            ChunkKind::ThreadMessages => "ThreadMessages",
            ChunkKind::Files => "Files",
            ChunkKind::Users => "Users",
            ChunkKind::Channels => "Channels",
            ChunkKind::ChannelInfo => "ChannelInfo",
            ChunkKind::WorkspaceInfo => "WorkspaceInfo",
            ChunkKind::ChannelUsers => "ChannelUsers",
            ChunkKind::StarredItems => "StarredItems",
            ChunkKind::Bookmarks => "Bookmarks",
        };
        f.write_str(name)
    }
}

/// Payload of a chunk, one variant per kind
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkBody {
    /// One page of a channel's history
    Messages {
        channel_id: String,
        messages: Vec<Message>,
        is_last: bool,
        num_threads: usize,
    },
    /// One page of a thread's replies
    ThreadMessages {
        channel_id: String,
        thread_ts: String,
        parent: Message,
        messages: Vec<Message>,
        is_last: bool,
    },
    /// Files attached to `parent`
    Files {
        channel_id: String,
        channel: Option<Channel>,
        parent: Message,
        files: Vec<File>,
    },
    Users {
        users: Vec<User>,
    },
    Channels {
        channels: Vec<Channel>,
    },
    ChannelInfo {
        channel_id: String,
        channel: Channel,
    },
    WorkspaceInfo {
        info: WorkspaceInfo,
    },
    ChannelUsers {
        channel_id: String,
        user_ids: Vec<String>,
    },
    StarredItems {
        items: Vec<StarredItem>,
    },
    Bookmarks {
        channel_id: String,
        bookmarks: Vec<Bookmark>,
    },
}

/// One captured API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChunk", into = "RawChunk")]
pub struct Chunk {
    /// Capture time, epoch microseconds
    pub timestamp: i64,
    pub body: ChunkBody,
}

impl Chunk {
    pub fn new(timestamp: i64, body: ChunkBody) -> Self {
        Self { timestamp, body }
    }

    pub fn kind(&self) -> ChunkKind {
        match &self.body {
            ChunkBody::Messages { .. } => ChunkKind::Messages,
            ChunkBody::ThreadMessages { .. } => ChunkKind::ThreadMessages,
            ChunkBody::Files { .. } => ChunkKind::Files,
            ChunkBody::Users { .. } => ChunkKind::Users,
            ChunkBody::Channels { .. } => ChunkKind::Channels,
            ChunkBody::ChannelInfo { .. } => ChunkKind::ChannelInfo,
            ChunkBody::WorkspaceInfo { .. } => ChunkKind::WorkspaceInfo,
            ChunkBody::ChannelUsers { .. } => ChunkKind::ChannelUsers,
            ChunkBody::StarredItems { .. } => ChunkKind::StarredItems,
            ChunkBody::Bookmarks { .. } => ChunkKind::Bookmarks,
        }
    }

    /// Key this record queues under
    pub fn group_id(&self) -> GroupId {
        match &self.body {
            ChunkBody::Messages { channel_id, .. } => GroupId::channel(channel_id),
            ChunkBody::ThreadMessages {
                channel_id,
                thread_ts,
                ..
            } => GroupId::thread(channel_id, thread_ts),
            ChunkBody::Files {
                channel_id, parent, ..
            } => GroupId::files(channel_id, &parent.ts),
            ChunkBody::ChannelInfo { channel_id, .. } => GroupId::channel_info(channel_id),
            ChunkBody::ChannelUsers { channel_id, .. } => GroupId::channel_users(channel_id),
            ChunkBody::Bookmarks { channel_id, .. } => GroupId::bookmarks(channel_id),
            ChunkBody::Users { .. } => GroupId::users(),
            ChunkBody::Channels { .. } => GroupId::channels(),
            ChunkBody::WorkspaceInfo { .. } => GroupId::workspace_info(),
            ChunkBody::StarredItems { .. } => GroupId::starred_items(),
        }
    }

    /// Channel the record belongs to, for channel-scoped kinds
    pub fn channel_id(&self) -> Option<&str> {
        match &self.body {
            ChunkBody::Messages { channel_id, .. }
            | ChunkBody::ThreadMessages { channel_id, .. }
            | ChunkBody::Files { channel_id, .. }
            | ChunkBody::ChannelInfo { channel_id, .. }
            | ChunkBody::ChannelUsers { channel_id, .. }
            | ChunkBody::Bookmarks { channel_id, .. } => Some(channel_id),
            ChunkBody::Users { .. }
            | ChunkBody::Channels { .. }
            | ChunkBody::WorkspaceInfo { .. }
            | ChunkBody::StarredItems { .. } => None,
        }
    }

    /// Number of messages or files carried; zero for other kinds
    pub fn count(&self) -> usize {
        match &self.body {
            ChunkBody::Messages { messages, .. } | ChunkBody::ThreadMessages { messages, .. } => {
                messages.len()
            }
            ChunkBody::Files { files, .. } => files.len(),
            _ => 0,
        }
    }

    /// Message payload, for Messages and ThreadMessages records
    pub fn messages(&self) -> Option<&[Message]> {
        match &self.body {
            ChunkBody::Messages { messages, .. } | ChunkBody::ThreadMessages { messages, .. } => {
                Some(messages)
            }
            _ => None,
        }
    }

    /// Message timestamps in epoch microseconds, in payload order
    pub fn message_timestamps(&self) -> Result<Vec<i64>, ChunkError> {
        let messages = self.messages().ok_or(ChunkError::NoTimestamps(self.kind()))?;
        messages
            .iter()
            .map(|m| parse_ts(&m.ts).map_err(ChunkError::from))
            .collect()
    }

    /// Decode one record from its JSON line
    pub fn from_line(line: &[u8]) -> Result<Self, ChunkError> {
        Ok(serde_json::from_slice(line)?)
    }

    /// Encode to a single JSON line, without the trailing newline
    pub fn to_line(&self) -> Result<Vec<u8>, ChunkError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.group_id())
    }
}

/// Flat wire shape of a chunk
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawChunk {
    t: u8,
    ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    n: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    r: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    l: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    nt: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ci: Option<Channel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cu: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    p: Option<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    m: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    f: Vec<File>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    u: Vec<User>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ch: Vec<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    w: Option<WorkspaceInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    st: Vec<StarredItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    b: Vec<Bookmark>,
}

impl From<Chunk> for RawChunk {
    fn from(chunk: Chunk) -> Self {
        let kind = chunk.kind();
        let n = chunk.count();
        let mut raw = RawChunk {
            t: kind.into(),
            ts: chunk.timestamp,
            n,
            ..RawChunk::default()
        };

        match chunk.body {
            ChunkBody::Messages {
                channel_id,
                messages,
                is_last,
                num_threads,
            } => {
                raw.id = Some(channel_id);
                raw.m = messages;
                raw.l = is_last;
                raw.nt = num_threads;
            }
            ChunkBody::ThreadMessages {
                channel_id,
                thread_ts,
                parent,
                messages,
                is_last,
            } => {
                raw.id = Some(channel_id);
                raw.r = Some(thread_ts);
                raw.p = Some(parent);
                raw.m = messages;
                raw.l = is_last;
            }
            ChunkBody::Files {
                channel_id,
                channel,
                parent,
                files,
            } => {
                raw.id = Some(channel_id);
                raw.ci = channel;
                raw.p = Some(parent);
                raw.f = files;
            }
            ChunkBody::Users { users } => raw.u = users,
            ChunkBody::Channels { channels } => raw.ch = channels,
            ChunkBody::ChannelInfo {
                channel_id,
                channel,
            } => {
                raw.id = Some(channel_id);
                raw.ci = Some(channel);
            }
            ChunkBody::WorkspaceInfo { info } => raw.w = Some(info),
            ChunkBody::ChannelUsers {
                channel_id,
                user_ids,
            } => {
                raw.id = Some(channel_id);
                raw.cu = user_ids;
            }
            ChunkBody::StarredItems { items } => raw.st = items,
            ChunkBody::Bookmarks {
                channel_id,
                bookmarks,
            } => {
                raw.id = Some(channel_id);
                raw.b = bookmarks;
            }
        }
        raw
    }
}

impl TryFrom<RawChunk> for Chunk {
    type Error = ChunkError;

    fn try_from(raw: RawChunk) -> Result<Self, Self::Error> {
        let kind = ChunkKind::try_from(raw.t)?;
        let missing = |field| ChunkError::MissingField { kind, field };

        let body = match kind {
            ChunkKind::Messages => ChunkBody::Messages {
                channel_id: raw.id.ok_or_else(|| missing("id"))?,
                messages: raw.m,
                is_last: raw.l,
                num_threads: raw.nt,
            },
            ChunkKind::ThreadMessages => {
                let parent = raw.p.ok_or_else(|| missing("p"))?;
                let thread_ts = match raw.r {
                    Some(ts) => ts,
                    None => parent.thread_ts.clone().ok_or_else(|| missing("r"))?,
                };
                ChunkBody::ThreadMessages {
                    channel_id: raw.id.ok_or_else(|| missing("id"))?,
                    thread_ts,
                    parent,
                    messages: raw.m,
                    is_last: raw.l,
                }
            }
            ChunkKind::Files => ChunkBody::Files {
                channel_id: raw.id.ok_or_else(|| missing("id"))?,
                channel: raw.ci,
                parent: raw.p.ok_or_else(|| missing("p"))?,
                files: raw.f,
            },
            ChunkKind::Users => ChunkBody::Users { users: raw.u },
            ChunkKind::Channels => ChunkBody::Channels { channels: raw.ch },
            ChunkKind::ChannelInfo => {
                let channel = raw.ci.ok_or_else(|| missing("ci"))?;
                ChunkBody::ChannelInfo {
                    channel_id: raw.id.unwrap_or_else(|| channel.id.clone()),
                    channel,
                }
            }
            ChunkKind::WorkspaceInfo => ChunkBody::WorkspaceInfo {
                info: raw.w.ok_or_else(|| missing("w"))?,
            },
            ChunkKind::ChannelUsers => ChunkBody::ChannelUsers {
                channel_id: raw.id.ok_or_else(|| missing("id"))?,
                user_ids: raw.cu,
            },
            ChunkKind::StarredItems => ChunkBody::StarredItems { items: raw.st },
            ChunkKind::Bookmarks => ChunkBody::Bookmarks {
                channel_id: raw.id.ok_or_else(|| missing("id"))?,
                bookmarks: raw.b,
            },
        };

        Ok(Chunk {
            timestamp: raw.ts,
            body,
        })
    }
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
#[path = "chunk_tests.rs"]
mod tests;
