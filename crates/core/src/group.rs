// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group keys
//!
//! Every record in a chunk log is addressed by a [`GroupId`]. Records that
//! paginate the same entity (a channel's history, one thread's replies, ...)
//! share a key, so they queue under it in capture order.
//!
//! | Kind           | Key                         |
//! |----------------|-----------------------------|
//! | Messages       | `<channel>`                 |
//! | ThreadMessages | `t:<channel>:<thread_ts>`   |
//! | Files          | `f:<channel>:<parent_ts>`   |
//! | ChannelInfo    | `ic:<channel>`              |
//! | ChannelUsers   | `lcu:<channel>`             |
//! | Bookmarks      | `lb:<channel>`              |
//! | Users          | `lusr`                      |
//! | Channels       | `lch`                       |
//! | WorkspaceInfo  | `iw`                        |
//! | StarredItems   | `ls`                        |

use serde::{Deserialize, Serialize};
use std::fmt;

const THREAD_PREFIX: &str = "t";
const FILE_PREFIX: &str = "f";
const CHANNEL_INFO_PREFIX: &str = "ic";
const CHANNEL_USERS_PREFIX: &str = "lcu";
const BOOKMARKS_PREFIX: &str = "lb";

const USERS_KEY: &str = "lusr";
const CHANNELS_KEY: &str = "lch";
const WORKSPACE_INFO_KEY: &str = "iw";
const STARRED_KEY: &str = "ls";

/// Key grouping records of the same logical entity.
///
/// May or may not equal the service's identifier for that entity; only
/// plain channel message groups use the raw channel ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Message history of a channel
    pub fn channel(channel_id: &str) -> Self {
        Self(channel_id.to_string())
    }

    /// Replies of one thread
    pub fn thread(channel_id: &str, thread_ts: &str) -> Self {
        Self::prefixed(THREAD_PREFIX, &[channel_id, thread_ts])
    }

    /// Files attached to one message
    pub fn files(channel_id: &str, parent_ts: &str) -> Self {
        Self::prefixed(FILE_PREFIX, &[channel_id, parent_ts])
    }

    pub fn channel_info(channel_id: &str) -> Self {
        Self::prefixed(CHANNEL_INFO_PREFIX, &[channel_id])
    }

    pub fn channel_users(channel_id: &str) -> Self {
        Self::prefixed(CHANNEL_USERS_PREFIX, &[channel_id])
    }

    pub fn bookmarks(channel_id: &str) -> Self {
        Self::prefixed(BOOKMARKS_PREFIX, &[channel_id])
    }

    /// Workspace user list; one per archive
    pub fn users() -> Self {
        Self(USERS_KEY.to_string())
    }

    /// Workspace channel list; one per archive
    pub fn channels() -> Self {
        Self(CHANNELS_KEY.to_string())
    }

    pub fn workspace_info() -> Self {
        Self(WORKSPACE_INFO_KEY.to_string())
    }

    pub fn starred_items() -> Self {
        Self(STARRED_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn prefixed(prefix: &str, parts: &[&str]) -> Self {
        Self(format!("{}:{}", prefix, parts.join(":")))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for GroupId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for GroupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
