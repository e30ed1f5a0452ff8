// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::{Context, Result};
use sector_chat_relay::cfg::{cli::resolve_config_path, config::Config, logger::init_logger};
use sector_chat_relay::core::{ChatServerState, sweeper};
use sector_chat_relay::net::{SessionTable, acceptor};
use tracing::info;

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let path = resolve_config_path(&config_path)
        .with_context(|| format!("failed to resolve config path {config_path}"))?;
    let cfg = Config::load_from_file(&path).context("failed to load config")?;

    // The logging guard must outlive the whole process; dropping it early
    // would silently stop the non-blocking writer from flushing.
    let _log_guard = init_logger(&cfg.logger).context("failed to install logger")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cfg.network.worker_thread_count as usize)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run(cfg))
}

async fn run(cfg: Config) -> Result<()> {
    let table = Arc::new(SessionTable::new());
    let state = ChatServerState::new(cfg, table.clone());

    tokio::spawn(sweeper::run(Arc::clone(&state)));

    info!("sector chat relay starting");
    acceptor::run(state, table).await
}
