// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-connection reader/writer tasks and length-prefixed framing (§10.1).

use std::io;
use std::sync::Arc;

use bytes::{Bytes, BytesMut, BufMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::{ChatServerState, SessionId};
use crate::net::table::SessionTable;
use crate::wire::Packet;

const LENGTH_PREFIX_LEN: usize = 4;
/// Generous upper bound on a single frame, well above the largest defined
/// packet (a full MESSAGE request/response), to reject obviously bogus
/// length prefixes without allocating on their say-so.
const MAX_FRAME_LEN: usize = 64 * 1024;

/// Owns one accepted connection end to end: registers the session, spawns
/// the reader and writer tasks, and runs `on_release` exactly once after
/// both have stopped.
pub async fn run_session(
    stream: TcpStream,
    session_id: SessionId,
    state: Arc<ChatServerState>,
    table: Arc<SessionTable>,
    outbound_capacity: usize,
) {
    let (tx, rx) = mpsc::channel::<Packet>(outbound_capacity.max(1));
    let cancel = CancellationToken::new();
    table.register(session_id, tx, cancel.clone());
    state.on_accept(session_id).await;

    let (read_half, write_half) = stream.into_split();

    let reader = tokio::spawn(run_reader(
        read_half,
        session_id,
        Arc::clone(&state),
        cancel.clone(),
    ));
    let writer = tokio::spawn(run_writer(write_half, rx, cancel.clone()));

    let _ = tokio::join!(reader, writer);

    table.deregister(session_id);
    state.on_release(session_id).await;
}

async fn run_reader(
    mut read_half: impl AsyncRead + Unpin,
    session_id: SessionId,
    state: Arc<ChatServerState>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = read_frame(&mut read_half) => {
                match frame {
                    Ok(Some(payload)) => {
                        state.dispatch(session_id, Packet::from_bytes(payload)).await;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!(session_id, error = %e, "session read error");
                        break;
                    }
                }
            }
        }
    }
    cancel.cancel();
}

async fn run_writer(
    mut write_half: impl AsyncWrite + Unpin,
    mut rx: mpsc::Receiver<Packet>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            maybe_packet = rx.recv() => {
                match maybe_packet {
                    Some(packet) => {
                        if write_frame(&mut write_half, packet.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }
    cancel.cancel();
}

async fn read_frame(stream: &mut (impl AsyncRead + Unpin)) -> io::Result<Option<Bytes>> {
    let mut len_buf = [0u8; LENGTH_PREFIX_LEN];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame length {len} exceeds {MAX_FRAME_LEN}"),
        ));
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(Some(Bytes::from(payload)))
}

async fn write_frame(stream: &mut (impl AsyncWrite + Unpin), payload: &Bytes) -> io::Result<()> {
    let mut framed = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    framed.put_u32_le(payload.len() as u32);
    framed.put_slice(payload);
    stream.write_all(&framed).await
}
