// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable capture timestamps

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A clock that provides the current wall time in epoch microseconds
pub trait Clock: Clone + Send + Sync {
    fn epoch_micros(&self) -> i64;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_micros(&self) -> i64 {
        chrono::Utc::now().timestamp_micros()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<i64>>,
}

impl FakeClock {
    pub fn new(epoch_micros: i64) -> Self {
        Self {
            current: Arc::new(Mutex::new(epoch_micros)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration.as_micros() as i64;
    }

    /// Set the clock to a specific epoch time in microseconds
    pub fn set(&self, epoch_micros: i64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = epoch_micros;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn epoch_micros(&self) -> i64 {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
