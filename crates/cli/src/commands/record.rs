// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sd record` - Chunk log capture and inspection

use super::open_log;
use crate::error::CliError;
use crate::output::{print_json, print_list, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use sd_core::{format_ts, parse_ts, GroupId};
use sd_storage::{
    state_path_for, LogSink, Player, PlayerSource, Recorder, RecorderError, StreamStats, Streamer,
};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub command: RecordCommand,
}

#[derive(Subcommand)]
pub enum RecordCommand {
    /// Record channels into a fresh log
    Stream {
        /// Log to read conversations from
        #[arg(long, value_name = "LOG")]
        source: PathBuf,
        /// Output log; writes to stdout when omitted
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Channel IDs to record
        #[arg(required = true)]
        channels: Vec<String>,
    },
    /// Print the capture state of a log
    State {
        /// Log file
        log: PathBuf,
    },
    /// List channels with recorded history
    Channels {
        /// Log file
        log: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

pub fn handle(args: RecordArgs) -> Result<()> {
    match args.command {
        RecordCommand::Stream {
            source,
            output,
            channels,
        } => stream(&source, output.as_deref(), &channels),
        RecordCommand::State { log } => state(&log),
        RecordCommand::Channels { log, format } => list_channels(&log, format),
    }
}

fn stream(source: &Path, output: Option<&Path>, channels: &[String]) -> Result<()> {
    let player = open_log(source)?;
    if let Some(missing) = channels
        .iter()
        .find(|ch| !player.index().contains(&GroupId::channel(ch)))
    {
        return Err(CliError::channel_not_recorded(missing, source).into());
    }

    let Some(output) = output else {
        let mut recorder = Recorder::new(std::io::stdout());
        stream_channels(&mut recorder, &player, channels)?;
        recorder.close()?;
        return Ok(());
    };

    let mut recorder = Recorder::create(output).map_err(|e| match e {
        RecorderError::Locked(path) => CliError::log_locked(&path).into(),
        e => anyhow::Error::from(e),
    })?;
    let totals = stream_channels(&mut recorder, &player, channels)?;
    recorder.close()?;

    let state = open_log(output)?.state()?;
    let state_path = state_path_for(output);
    state.save(&state_path)?;

    eprintln!(
        "Recorded {} messages, {} replies, {} files from {} channel(s) to {}",
        totals.messages,
        totals.replies,
        totals.files,
        channels.len(),
        output.display()
    );
    Ok(())
}

fn stream_channels<W: LogSink>(
    recorder: &mut Recorder<W>,
    player: &Player,
    channels: &[String],
) -> Result<StreamStats> {
    let mut totals = StreamStats::default();
    let mut streamer = Streamer::new(recorder);
    for channel in channels {
        info!(channel = %channel, "streaming channel");
        let mut source = PlayerSource::new(player);
        let stats = streamer.conversation(&mut source, channel)?;
        totals.messages += stats.messages;
        totals.threads += stats.threads;
        totals.replies += stats.replies;
        totals.files += stats.files;
        totals.records += stats.records;
    }
    Ok(totals)
}

fn state(log: &Path) -> Result<()> {
    let state = open_log(log)?.state()?;
    print_json(&state)
}

#[derive(Serialize)]
struct ChannelSummary {
    id: String,
    messages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest: Option<String>,
}

impl fmt::Display for ChannelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {:>8} {}",
            self.id,
            self.messages,
            self.latest.as_deref().unwrap_or("-")
        )
    }
}

fn list_channels(log: &Path, format: OutputFormat) -> Result<()> {
    let player = open_log(log)?;

    let mut summaries = Vec::new();
    for id in player.channel_ids() {
        let messages = player.all_messages(&id)?;
        let mut latest = None;
        for m in &messages {
            latest = latest.max(Some(parse_ts(&m.ts)?));
        }
        summaries.push(ChannelSummary {
            id,
            messages: messages.len(),
            latest: latest.map(format_ts),
        });
    }
    print_list(&summaries, format)
}
