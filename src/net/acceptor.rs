// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! TCP acceptor loop (§10.1): binds `network.port`, assigns each accepted
//! socket a monotonic session id, applies `TCP_NODELAY`/`SND_BUF_ZERO`, and
//! spawns its session task. Past `MAX_SESSION_COUNT` concurrently accepted
//! sockets, new connections are accepted and immediately shut down rather
//! than left to queue in the OS backlog.

use std::os::fd::{AsRawFd, FromRawFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use socket2::Socket;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::ChatServerState;
use crate::net::session::run_session;
use crate::net::table::SessionTable;

/// Session ids are never reused (monotonic counter, not recycled from a
/// freed slot), so a stale id surviving past its session's release can
/// never alias a freshly accepted one.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Runs the accept loop until the listener errors. Each accepted connection
/// is handed off to [`run_session`] on its own task; this function does not
/// return under normal operation.
pub async fn run(state: Arc<ChatServerState>, table: Arc<SessionTable>) -> Result<()> {
    let cfg = &state.config.network;
    let listener = TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .with_context(|| format!("failed to bind TCP listener on port {}", cfg.port))?;
    info!(port = cfg.port, "chat relay listening");

    let outbound_capacity = cfg.concurrent_thread_count.max(1) as usize;

    loop {
        let (stream, peer) = listener.accept().await.context("accept() failed")?;

        if table.len() >= cfg.max_session_count as usize {
            warn!(%peer, "MAX_SESSION_COUNT reached, rejecting connection");
            drop(stream);
            continue;
        }

        if let Err(e) = stream.set_nodelay(cfg.tcp_nodelay) {
            warn!(%peer, error = %e, "failed to set TCP_NODELAY");
        }
        if cfg.snd_buf_zero {
            // tokio's TcpStream has no setsockopt for SO_SNDBUF; borrow the
            // raw fd just long enough for socket2 to apply it, then let the
            // borrow expire without touching ownership of `stream`.
            let raw = unsafe { Socket::from_raw_fd(stream.as_raw_fd()) };
            let result = raw.set_send_buffer_size(0);
            std::mem::forget(raw);
            if let Err(e) = result {
                warn!(%peer, error = %e, "failed to set zero send buffer");
            }
        }

        let session_id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        info!(session_id, %peer, "accepted connection");

        tokio::spawn(run_session(
            stream,
            session_id,
            Arc::clone(&state),
            Arc::clone(&table),
            outbound_capacity,
        ));
    }
}
