// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cfg::config::{LogOutput, LoggerConfig};

/// Installs the global `tracing` subscriber. The returned guard must be kept
/// alive for the process lifetime (dropping it stops the non-blocking
/// writer from flushing).
pub fn init_logger(cfg: &LoggerConfig) -> Result<WorkerGuard> {
    let (writer, guard) = match cfg.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    let env_filter = EnvFilter::try_new(&cfg.level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .context("failed to parse log level from config or env")?;

    fmt()
        .with_writer(writer)
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}
