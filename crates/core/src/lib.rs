// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-core: record model for chunk logs
//!
//! This crate provides:
//! - The [`Chunk`] record and its flat wire encoding
//! - Deterministic [`GroupId`] addressing
//! - API payload models
//! - Message timestamp parsing and a testable clock

pub mod chunk;
pub mod clock;
pub mod group;
pub mod model;
pub mod ts;

pub use chunk::{Chunk, ChunkBody, ChunkError, ChunkKind};
pub use clock::{Clock, FakeClock, SystemClock};
pub use group::GroupId;
pub use model::{Bookmark, Channel, Extra, File, Message, StarredItem, User, WorkspaceInfo};
pub use ts::{format_ts, parse_ts, InvalidTimestamp};
