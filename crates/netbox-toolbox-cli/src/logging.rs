// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    /// Headless modes: the configured file if there is one, otherwise stderr.
    Stderr,
    /// The TUI owns the terminal, so only a configured file is written.
    FileOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Off,
    Stderr,
    File(&'a Path),
}

pub fn destination(config: &LogConfig, sink: LogSink) -> LogTarget<'_> {
    match (sink, &config.file) {
        (_, Some(path)) => LogTarget::File(path),
        (LogSink::Stderr, None) => LogTarget::Stderr,
        (LogSink::FileOnly, None) => LogTarget::Off,
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LogConfig, sink: LogSink) -> Result<()> {
    let target = destination(config, sink);
    if target == LogTarget::Off {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level {:?}", config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match target {
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|error| anyhow!("install log subscriber: {error}"))?;
        }
        LogTarget::Stderr => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|error| anyhow!("install log subscriber: {error}"))?;
        }
        LogTarget::Off => {}
    }

    tracing::debug!(level = %config.level, file = ?config.file, "logging initialized");
    Ok(())
}
