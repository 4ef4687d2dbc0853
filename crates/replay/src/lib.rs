// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-replay: API emulation backed by a recorded chunk log
//!
//! Answers `conversations.*` and `users.list` requests from successive
//! records of a [`Player`](sd_storage::Player), so client code can be
//! exercised without network access.

mod config;
mod router;
mod server;
mod service;

pub use config::{ConfigError, ReplayConfig, DEFAULT_REQUEST_TIMEOUT};
pub use router::{router, Params};
pub use server::{bind, serve, shutdown_signal, ServeError};
pub use service::{Endpoint, ReplayRequest, ReplayResponse, ReplayService};
