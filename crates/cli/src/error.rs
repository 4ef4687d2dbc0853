// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Builders for the failures users actually hit
impl CliError {
    /// The log file does not exist
    pub fn log_not_found(path: &Path) -> Self {
        CliError::new(format!("Log '{}' not found", path.display()))
            .with_suggestion("Check the path and try again")
            .with_suggestion("Record a log with: sd record stream --source <LOG> --output <FILE> <CHANNEL>")
    }

    /// A recorder still holds the log
    pub fn log_locked(path: &Path) -> Self {
        CliError::new(format!("Log '{}' is still being recorded", path.display()))
            .with_context("Another sd process holds the write lock on this file")
            .with_suggestion("Wait for the recording to finish, then retry")
    }

    /// A record in the log could not be decoded
    pub fn corrupt_log(path: &Path, offset: u64) -> Self {
        CliError::new(format!("Log '{}' is corrupted", path.display()))
            .with_context(format!("Record at byte offset {} could not be decoded", offset))
            .with_context("The capture may have been interrupted mid-write")
            .with_suggestion("Re-record the affected channels into a fresh log")
    }

    /// A channel has no history in the source log
    pub fn channel_not_recorded(channel: &str, path: &Path) -> Self {
        CliError::new(format!(
            "Channel '{}' has no history in '{}'",
            channel,
            path.display()
        ))
        .with_suggestion(format!(
            "List recorded channels: sd record channels {}",
            path.display()
        ))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
