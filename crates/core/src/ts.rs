// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message timestamp parsing
//!
//! The remote service identifies messages by a `seconds.micros` string
//! (`"1234567890.123456"`). These helpers convert it to epoch microseconds
//! so timestamps can be ordered numerically.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid message timestamp: {0:?}")]
pub struct InvalidTimestamp(pub String);

/// Parse a message timestamp into epoch microseconds.
///
/// The fractional part may be shorter than six digits (`"1.5"` is
/// 1.5 seconds) and may be omitted entirely.
pub fn parse_ts(ts: &str) -> Result<i64, InvalidTimestamp> {
    let invalid = || InvalidTimestamp(ts.to_string());
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    if secs.is_empty() || frac.len() > 6 {
        return Err(invalid());
    }
    if !secs.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let secs: i64 = secs.parse().map_err(|_| invalid())?;
    let micros = if frac.is_empty() {
        0
    } else {
        let scale = 10_i64.pow(6 - frac.len() as u32);
        frac.parse::<i64>().map_err(|_| invalid())? * scale
    };

    secs.checked_mul(1_000_000)
        .and_then(|s| s.checked_add(micros))
        .ok_or_else(invalid)
}

/// Format epoch microseconds back into the service's `seconds.micros` form
pub fn format_ts(micros: i64) -> String {
    format!("{}.{:06}", micros / 1_000_000, micros % 1_000_000)
}

#[cfg(test)]
#[path = "ts_tests.rs"]
mod tests;
