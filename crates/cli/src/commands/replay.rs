// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sd replay` - Serve a recorded log as an API backend

use super::open_log;
use anyhow::Result;
use clap::Args;
use sd_replay::{bind, serve, shutdown_signal, ReplayConfig, ReplayService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Args)]
pub struct ReplayArgs {
    /// Log file to serve
    pub log: PathBuf,
    /// TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Listen address
    #[arg(long, env = "SD_REPLAY_BIND")]
    pub bind: Option<SocketAddr>,
    /// Per-request timeout (e.g. "5s", "500ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

impl ReplayArgs {
    /// Config file values with flags applied on top
    pub fn config(&self) -> Result<ReplayConfig> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::load(path)?,
            None => ReplayConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = timeout;
        }
        Ok(config)
    }
}

pub async fn handle(args: ReplayArgs) -> Result<()> {
    let config = args.config()?;
    let player = open_log(&args.log)?;
    info!(
        log = %args.log.display(),
        groups = player.index().len(),
        records = player.index().record_count(),
        "loaded log"
    );

    let listener = bind(&config).await?;
    eprintln!(
        "Replaying {} on http://{} (Ctrl-C to stop)",
        args.log.display(),
        listener.local_addr()?
    );

    serve(listener, ReplayService::new(player), &config, shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
