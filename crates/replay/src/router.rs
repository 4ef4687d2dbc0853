// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP routes for the replay service
//!
//! Parameters come from the query string on GET and from a urlencoded body
//! on POST, the way API clients send them. Each request runs its log read
//! on the blocking pool under the configured timeout. A request that times
//! out before its record is consumed leaves the cursor where it was.

use crate::service::{Endpoint, ReplayRequest, ReplayResponse, ReplayService};
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::io::{Read, Seek};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Request parameters understood by the replay routes
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    pub channel: Option<String>,
    pub ts: Option<String>,
    /// Accepted for client compatibility; records are served in order
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

const PENDING: u8 = 0;
const COMMITTED: u8 = 1;
const ABANDONED: u8 = 2;

/// Decides, once, whether a timed-out request's read still counts
#[derive(Clone, Default)]
struct Ticket(Arc<AtomicU8>);

impl Ticket {
    /// Claim the read for the request; false once it has been abandoned
    fn commit(&self) -> bool {
        self.settle(COMMITTED)
    }

    /// Give up on the read; false when it was already committed
    fn abandon(&self) -> bool {
        self.settle(ABANDONED)
    }

    fn settle(&self, to: u8) -> bool {
        self.0
            .compare_exchange(PENDING, to, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

struct RouterState<R> {
    service: ReplayService<R>,
    timeout: Duration,
}

impl<R> Clone for RouterState<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            timeout: self.timeout,
        }
    }
}

impl IntoResponse for ReplayResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build the replay router
pub fn router<R>(service: ReplayService<R>, timeout: Duration) -> Router
where
    R: Read + Seek + Send + 'static,
{
    let state = RouterState { service, timeout };
    Router::new()
        .route(
            "/api/conversations.history",
            get(history::<R>).post(history::<R>),
        )
        .route(
            "/api/conversations.replies",
            get(replies::<R>).post(replies::<R>),
        )
        .route("/api/conversations.info", get(info::<R>).post(info::<R>))
        .route(
            "/api/conversations.list",
            get(conversations::<R>).post(conversations::<R>),
        )
        .route("/api/users.list", get(users::<R>).post(users::<R>))
        .with_state(state)
}

async fn history<R>(State(state): State<RouterState<R>>, Form(params): Form<Params>) -> Response
where
    R: Read + Seek + Send + 'static,
{
    dispatch(state, Endpoint::History, params).await
}

async fn replies<R>(State(state): State<RouterState<R>>, Form(params): Form<Params>) -> Response
where
    R: Read + Seek + Send + 'static,
{
    dispatch(state, Endpoint::Replies, params).await
}

async fn info<R>(State(state): State<RouterState<R>>, Form(params): Form<Params>) -> Response
where
    R: Read + Seek + Send + 'static,
{
    dispatch(state, Endpoint::Info, params).await
}

async fn conversations<R>(
    State(state): State<RouterState<R>>,
    Form(params): Form<Params>,
) -> Response
where
    R: Read + Seek + Send + 'static,
{
    dispatch(state, Endpoint::ConversationsList, params).await
}

async fn users<R>(State(state): State<RouterState<R>>, Form(params): Form<Params>) -> Response
where
    R: Read + Seek + Send + 'static,
{
    dispatch(state, Endpoint::UsersList, params).await
}

async fn dispatch<R>(state: RouterState<R>, endpoint: Endpoint, params: Params) -> Response
where
    R: Read + Seek + Send + 'static,
{
    let request = ReplayRequest {
        endpoint,
        channel: params.channel,
        thread_ts: params.ts,
    };
    let service = state.service;
    let ticket = Ticket::default();
    let mut call = tokio::task::spawn_blocking({
        let ticket = ticket.clone();
        move || service.handle_if(&request, || ticket.commit())
    });

    let joined = match tokio::time::timeout(state.timeout, &mut call).await {
        Ok(joined) => joined,
        Err(_) if ticket.abandon() => {
            warn!(
                method = endpoint.method(),
                timeout = ?state.timeout,
                "replay request timed out"
            );
            return timed_out();
        }
        // Read committed as the deadline passed
        Err(_) => call.await,
    };

    match joined {
        Ok(response) => response.into_response(),
        Err(e) => {
            error!(method = endpoint.method(), "replay task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "internal_error" })),
            )
                .into_response()
        }
    }
}

fn timed_out() -> Response {
    (
        StatusCode::GATEWAY_TIMEOUT,
        Json(json!({ "ok": false, "error": "timeout" })),
    )
        .into_response()
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
