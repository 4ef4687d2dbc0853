// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod record;
pub mod replay;

use crate::error::CliError;
use sd_storage::{IndexError, Player, PlayerError};
use std::io::ErrorKind;
use std::path::Path;

/// Open and index a log, turning the common failures into friendly errors
pub fn open_log(path: &Path) -> anyhow::Result<Player> {
    match Player::open(path) {
        Ok(player) => Ok(player),
        Err(PlayerError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            Err(CliError::log_not_found(path).with_source(e).into())
        }
        Err(PlayerError::Locked(_)) => Err(CliError::log_locked(path).into()),
        Err(PlayerError::Index(IndexError::Corrupted { offset, source })) => {
            Err(CliError::corrupt_log(path, offset).with_source(source).into())
        }
        Err(e) => Err(e.into()),
    }
}
