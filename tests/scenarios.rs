// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! End-to-end scenarios against the in-process dispatch engine (§8),
//! driven through a recording [`NetworkLayer`] instead of real sockets —
//! the locking protocol under test lives entirely below the transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sector_chat_relay::cfg::config::{Config, LogOutput, LoggerConfig, NetworkConfig, TimeoutConfig};
use sector_chat_relay::core::{ChatServerState, NetworkLayer, SessionId};
use sector_chat_relay::wire::opcode::PacketType;
use sector_chat_relay::wire::packet::{Packet, PacketWriter};
use sector_chat_relay::wire::{ID_LEN, NICKNAME_LEN, SESSION_KEY_LEN};

/// Records every packet enqueued and every disconnect requested, keyed by
/// session id, so assertions can inspect what the core would have sent.
#[derive(Default)]
struct RecordingNetwork {
    sent: Mutex<HashMap<SessionId, Vec<Packet>>>,
    disconnected: Mutex<Vec<SessionId>>,
}

impl RecordingNetwork {
    fn received_by(&self, session_id: SessionId) -> Vec<Packet> {
        self.sent
            .lock()
            .expect("recording mutex poisoned")
            .get(&session_id)
            .cloned()
            .unwrap_or_default()
    }

    fn was_disconnected(&self, session_id: SessionId) -> bool {
        self.disconnected
            .lock()
            .expect("recording mutex poisoned")
            .contains(&session_id)
    }
}

impl NetworkLayer for RecordingNetwork {
    fn send_packet(&self, session_id: SessionId, packet: Packet) {
        self.sent
            .lock()
            .expect("recording mutex poisoned")
            .entry(session_id)
            .or_default()
            .push(packet);
    }

    fn disconnect(&self, session_id: SessionId) {
        self.disconnected
            .lock()
            .expect("recording mutex poisoned")
            .push(session_id);
    }
}

fn test_config() -> Config {
    Config {
        network: NetworkConfig {
            port: 0,
            max_session_count: 100,
            concurrent_thread_count: 4,
            worker_thread_count: 1,
            tcp_nodelay: true,
            snd_buf_zero: false,
        },
        timeouts: TimeoutConfig {
            sweep_interval: Duration::from_millis(1_000),
            logged_in_timeout: Duration::from_millis(40_000),
            anonymous_timeout: Duration::from_millis(10_000),
        },
        logger: LoggerConfig {
            level: "error".to_string(),
            output: LogOutput::Stdout,
        },
    }
}

fn make_state() -> (Arc<ChatServerState>, Arc<RecordingNetwork>) {
    let network = Arc::new(RecordingNetwork::default());
    let state = ChatServerState::new(test_config(), network.clone());
    (state, network)
}

fn login_packet(account_no: i64, id_char: u8, nick_char: u8) -> Packet {
    let mut id = [0u16; ID_LEN];
    id[0] = id_char as u16;
    let mut nickname = [0u16; NICKNAME_LEN];
    nickname[0] = nick_char as u16;

    PacketWriter::new(PacketType::CsChatReqLogin)
        .push_i64(account_no)
        .push_u16_array(&id)
        .push_u16_array(&nickname)
        .push_bytes(&[0u8; SESSION_KEY_LEN])
        .finish()
}

fn sector_move_packet(account_no: i64, x: u16, y: u16) -> Packet {
    PacketWriter::new(PacketType::CsChatReqSectorMove)
        .push_i64(account_no)
        .push_u16(x)
        .push_u16(y)
        .finish()
}

fn message_packet(account_no: i64, message: &[u8]) -> Packet {
    PacketWriter::new(PacketType::CsChatReqMessage)
        .push_i64(account_no)
        .push_u16(message.len() as u16)
        .push_bytes(message)
        .finish()
}

fn heartbeat_packet() -> Packet {
    PacketWriter::new(PacketType::CsChatReqHeartbeat).finish()
}

/// Scenario 1: login then move (§8).
#[tokio::test]
async fn login_then_move() {
    let (state, network) = make_state();
    state.on_accept(7).await;

    state.dispatch(7, login_packet(100, b'a', b'A')).await;
    let login_responses = network.received_by(7);
    assert_eq!(login_responses.len(), 1);
    let mut r = login_responses[0].reader();
    assert_eq!(r.pull_u16().expect("tag"), PacketType::CsChatResLogin as u16);
    assert_eq!(r.pull_u8().expect("status"), 1);
    assert_eq!(r.pull_i64().expect("account"), 100);

    state.dispatch(7, sector_move_packet(100, 5, 5)).await;
    let move_responses = network.received_by(7);
    assert_eq!(move_responses.len(), 1);
    let mut r = move_responses[0].reader();
    r.pull_u16().expect("tag");
    assert_eq!(r.pull_i64().expect("account"), 100);
    assert_eq!(r.pull_u16().expect("x"), 5);
    assert_eq!(r.pull_u16().expect("y"), 5);

    let recipients = state.grid.snapshot_neighborhood(5, 5).await;
    assert_eq!(recipients, vec![7]);
}

/// Scenario 2: broadcast to the full 3×3 neighborhood (§8).
#[tokio::test]
async fn broadcast_to_neighborhood() {
    let (state, network) = make_state();

    let mut session_id = 1u64;
    for y in 4..=6u16 {
        for x in 4..=6u16 {
            state.on_accept(session_id).await;
            state.dispatch(session_id, sector_move_packet(session_id as i64, x, y)).await;
            session_id += 1;
        }
    }
    // A tenth session well outside the neighborhood.
    state.on_accept(10).await;
    state.dispatch(10, sector_move_packet(10, 8, 8)).await;

    // Session 5 sits at the center of the 4..=6 block (the fifth placed,
    // at x=5, y=5).
    let sender = 5u64;
    state.dispatch(sender, message_packet(sender as i64, b"hi!\0")).await;

    for id in 1..=9u64 {
        let received = network.received_by(id);
        assert_eq!(received.len(), 1, "session {id} should receive exactly one broadcast");
        assert_eq!(
            received[0].peek_type().expect("tag"),
            PacketType::CsChatResMessage
        );
    }
    assert!(network.received_by(10).is_empty(), "session 10 is outside the neighborhood");
}

/// Scenario 3: a corner cell's neighborhood skips out-of-grid neighbors
/// without error (§8).
#[tokio::test]
async fn edge_cell_neighborhood_is_clipped() {
    let (state, _network) = make_state();

    for (id, x, y) in [(1u64, 0u16, 0u16), (2, 1, 0), (3, 0, 1), (4, 1, 1)] {
        state.on_accept(id).await;
        state.dispatch(id, sector_move_packet(id as i64, x, y)).await;
    }

    let mut ids = state.grid.snapshot_neighborhood(0, 0).await;
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

/// Scenario 4: a concurrent move and message never deadlock and never
/// double-deliver (§8). The outcome of whether session 2 is caught in the
/// snapshot is unspecified; both outcomes are acceptable.
#[tokio::test]
async fn concurrent_move_and_message_does_not_deadlock() {
    let (state, network) = make_state();

    state.on_accept(1).await;
    state.dispatch(1, sector_move_packet(1, 10, 10)).await;
    state.on_accept(2).await;
    state.dispatch(2, sector_move_packet(2, 9, 10)).await;

    let state_a = Arc::clone(&state);
    let sender = tokio::spawn(async move {
        state_a.dispatch(1, message_packet(1, b"hey")).await;
    });
    let state_b = Arc::clone(&state);
    let mover = tokio::spawn(async move {
        state_b.dispatch(2, sector_move_packet(2, 30, 30)).await;
    });

    let (sender_result, mover_result) = tokio::join!(sender, mover);
    sender_result.expect("sender task panicked");
    mover_result.expect("mover task panicked");

    // Whichever interleaving occurred, session 2 received at most one copy.
    assert!(network.received_by(2).len() <= 1);
}

/// Scenario 5: idle sessions are evicted by the sweeper past their
/// role-dependent timeout (§4.10, §8).
#[tokio::test(start_paused = true)]
async fn sweeper_evicts_idle_logged_in_session() {
    let (state, network) = make_state();
    state.on_accept(3).await;
    state.dispatch(3, login_packet(300, b'b', b'B')).await;

    let sweep_state = Arc::clone(&state);
    let sweeper = tokio::spawn(sector_chat_relay::core::sweeper::run(sweep_state));

    // With the clock paused, sleeping past the 40s logged-in timeout lets
    // the runtime auto-advance through each of the sweeper's 1s ticks.
    tokio::time::sleep(Duration::from_millis(41_000)).await;

    assert!(network.was_disconnected(3));
    sweeper.abort();
}

/// Scenario 6: a malformed LOGIN payload is a protocol violation, not a
/// response (§7, §8).
#[tokio::test]
async fn malformed_login_disconnects_without_responding() {
    let (state, network) = make_state();
    state.on_accept(9).await;

    let bad = PacketWriter::new(PacketType::CsChatReqLogin)
        .push_i64(1)
        .finish(); // far too short for LOGIN_REQ_LEN

    state.dispatch(9, bad).await;

    assert!(network.received_by(9).is_empty());
    assert!(network.was_disconnected(9));
}

/// A session not yet known to the registry (e.g. released concurrently) is
/// handled silently — no panic, no response (§4.2, §7).
#[tokio::test]
async fn heartbeat_for_absent_session_is_a_silent_noop() {
    let (state, network) = make_state();
    state.dispatch(999, heartbeat_packet()).await;
    assert!(network.received_by(999).is_empty());
    assert!(!network.was_disconnected(999));
}
