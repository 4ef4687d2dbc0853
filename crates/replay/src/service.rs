// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay service: API-shaped answers from a player
//!
//! Transport independent. Each request pulls the next record for its
//! group; the HTTP layer only moves parameters in and envelopes out.

use axum::http::StatusCode;
use sd_core::{ChunkBody, ChunkKind, GroupId};
use sd_storage::{Entry, Player, PlayerError};
use serde_json::{json, Value};
use std::fmt;
use std::io::{Read, Seek};
use std::sync::Arc;
use tracing::{debug, error};

/// Emulated API method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `conversations.history`
    History,
    /// `conversations.replies`
    Replies,
    /// `conversations.info`
    Info,
    /// `conversations.list`
    ConversationsList,
    /// `users.list`
    UsersList,
}

impl Endpoint {
    pub fn method(self) -> &'static str {
        match self {
            Endpoint::History => "conversations.history",
            Endpoint::Replies => "conversations.replies",
            Endpoint::Info => "conversations.info",
            Endpoint::ConversationsList => "conversations.list",
            Endpoint::UsersList => "users.list",
        }
    }

    /// Envelope field holding the payload
    fn field(self) -> &'static str {
        match self {
            Endpoint::History | Endpoint::Replies => "messages",
            Endpoint::Info => "channel",
            Endpoint::ConversationsList => "channels",
            Endpoint::UsersList => "members",
        }
    }

    fn not_found(self) -> &'static str {
        match self {
            Endpoint::History | Endpoint::Info => "channel_not_found",
            Endpoint::Replies => "thread_not_found",
            Endpoint::ConversationsList | Endpoint::UsersList => "not_found",
        }
    }

    /// Record kind the method reads
    fn kind(self) -> ChunkKind {
        match self {
            Endpoint::History => ChunkKind::Messages,
            Endpoint::Replies => ChunkKind::ThreadMessages,
            Endpoint::Info => ChunkKind::ChannelInfo,
            Endpoint::ConversationsList => ChunkKind::Channels,
            Endpoint::UsersList => ChunkKind::Users,
        }
    }

    /// Payload reported once a group has no records left
    fn empty(self) -> Value {
        match self {
            Endpoint::Info => Value::Null,
            _ => json!([]),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Addressing parameters of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRequest {
    pub endpoint: Endpoint,
    pub channel: Option<String>,
    pub thread_ts: Option<String>,
}

impl ReplayRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            channel: None,
            thread_ts: None,
        }
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn thread_ts(mut self, ts: impl Into<String>) -> Self {
        self.thread_ts = Some(ts.into());
        self
    }
}

/// Status plus JSON envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ReplayResponse {
    fn error(status: StatusCode, code: &str, detail: Option<String>) -> Self {
        let mut body = json!({ "ok": false, "error": code });
        if let Some(detail) = detail {
            body["detail"] = Value::String(detail);
        }
        Self { status, body }
    }
}

/// Answers API requests from one shared player
pub struct ReplayService<R> {
    player: Arc<Player<R>>,
}

impl<R> Clone for ReplayService<R> {
    fn clone(&self) -> Self {
        Self {
            player: Arc::clone(&self.player),
        }
    }
}

impl<R: Read + Seek> ReplayService<R> {
    pub fn new(player: Player<R>) -> Self {
        Self {
            player: Arc::new(player),
        }
    }

    pub fn player(&self) -> &Player<R> {
        &self.player
    }

    /// Rewind every group so the next requests start from the first record
    pub fn reset(&self) -> Result<(), PlayerError> {
        self.player.reset()
    }

    pub fn handle(&self, request: &ReplayRequest) -> ReplayResponse {
        self.handle_if(request, || true)
    }

    /// Answer `request`, consuming its record only if `commit` returns
    /// true once the record has been decoded.
    ///
    /// A refused commit leaves the group's cursor untouched and answers 504.
    pub fn handle_if(
        &self,
        request: &ReplayRequest,
        commit: impl FnOnce() -> bool,
    ) -> ReplayResponse {
        let endpoint = request.endpoint;
        debug!(
            method = endpoint.method(),
            channel = request.channel.as_deref(),
            ts = request.thread_ts.as_deref(),
            "replay request"
        );

        let group = match group_for(request) {
            Ok(group) => group,
            Err(response) => return response,
        };
        let result = self.player.read(&group, commit);
        respond(endpoint, group, result)
    }
}

fn group_for(request: &ReplayRequest) -> Result<GroupId, ReplayResponse> {
    let channel = || request.channel.as_deref().ok_or_else(|| missing("channel"));
    Ok(match request.endpoint {
        Endpoint::History => GroupId::channel(channel()?),
        Endpoint::Replies => {
            let channel = channel()?;
            let ts = request.thread_ts.as_deref().ok_or_else(|| missing("ts"))?;
            GroupId::thread(channel, ts)
        }
        Endpoint::Info => GroupId::channel_info(channel()?),
        Endpoint::ConversationsList => GroupId::channels(),
        Endpoint::UsersList => GroupId::users(),
    })
}

/// Payload of `body` for `endpoint`; `None` when the record is of another kind
fn payload(endpoint: Endpoint, body: ChunkBody) -> Option<serde_json::Result<Value>> {
    let value = match (endpoint, body) {
        (Endpoint::History, ChunkBody::Messages { messages, .. })
        | (Endpoint::Replies, ChunkBody::ThreadMessages { messages, .. }) => {
            serde_json::to_value(messages)
        }
        (Endpoint::Info, ChunkBody::ChannelInfo { channel, .. }) => serde_json::to_value(channel),
        (Endpoint::ConversationsList, ChunkBody::Channels { channels }) => {
            serde_json::to_value(channels)
        }
        (Endpoint::UsersList, ChunkBody::Users { users }) => serde_json::to_value(users),
        _ => return None,
    };
    Some(value)
}

fn respond(
    endpoint: Endpoint,
    group: GroupId,
    result: Result<Entry, PlayerError>,
) -> ReplayResponse {
    let entry = match result {
        Ok(entry) => entry,
        Err(PlayerError::Exhausted(_)) => {
            return ReplayResponse {
                status: StatusCode::OK,
                body: envelope(endpoint, endpoint.empty(), false, String::new()),
            };
        }
        Err(PlayerError::NotFound(_)) => {
            return ReplayResponse::error(StatusCode::NOT_FOUND, endpoint.not_found(), None);
        }
        Err(PlayerError::Abandoned(_)) => {
            return ReplayResponse::error(StatusCode::GATEWAY_TIMEOUT, "timeout", None);
        }
        Err(e) => {
            let offset = match &e {
                PlayerError::Decode { offset, .. } => Some(*offset),
                _ => None,
            };
            error!(method = endpoint.method(), %group, offset, "replay failed: {}", e);
            return internal(e.to_string());
        }
    };

    let found = entry.chunk.kind();
    let payload = match payload(endpoint, entry.chunk.body) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            error!(
                method = endpoint.method(),
                %group,
                offset = entry.offset,
                "failed to encode payload: {}",
                e
            );
            return internal(e.to_string());
        }
        None => {
            let e = PlayerError::UnexpectedKind {
                group: group.clone(),
                expected: endpoint.kind(),
                found,
            };
            error!(
                method = endpoint.method(),
                %group,
                offset = entry.offset,
                "replay failed: {}",
                e
            );
            return internal(e.to_string());
        }
    };

    ReplayResponse {
        status: StatusCode::OK,
        body: envelope(endpoint, payload, entry.has_more, entry.offset.to_string()),
    }
}

fn envelope(endpoint: Endpoint, payload: Value, has_more: bool, cursor: String) -> Value {
    let mut body = json!({
        "ok": true,
        "has_more": has_more,
        "response_metadata": { "next_cursor": cursor },
    });
    body[endpoint.field()] = payload;
    body
}

fn internal(detail: String) -> ReplayResponse {
    ReplayResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", Some(detail))
}

fn missing(param: &str) -> ReplayResponse {
    ReplayResponse::error(
        StatusCode::BAD_REQUEST,
        "invalid_arguments",
        Some(format!("missing required parameter: {param}")),
    )
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
