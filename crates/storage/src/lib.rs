// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-storage: chunk log recording and replay
//!
//! This crate provides:
//! - [`Recorder`]: append-only writer of chunk records
//! - [`ChunkIndex`]: one-pass offset index over a log
//! - [`Player`]: per-group sequential reads and full scans
//! - [`CaptureState`]: ledger of what a log has captured
//! - [`Streamer`]: records a conversation from a [`ConversationSource`]

mod index;
mod player;
mod recorder;
mod state;
mod stream;

pub use index::{ChunkIndex, IndexError};
pub use player::{Entry, Player, PlayerError};
pub use recorder::{LogSink, Recorder, RecorderError};
pub use state::{state_path_for, CaptureState, StateError, STATE_SUFFIX, STATE_VERSION};
pub use stream::{ConversationSource, Page, PlayerSource, StreamError, StreamStats, Streamer};
