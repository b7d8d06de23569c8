#![cfg(feature = "std")]
//! Turn arbitration between two paired peers.

use rand::Rng;

use crate::net::{Connection, NetError};
use crate::protocol::{GameStatus, Message, ShotResult};

/// One peer slot in a session.
struct Peer {
    conn: Box<dyn Connection>,
    connected: bool,
}

/// A paired two-player game: relays shots between the active and the
/// waiting peer and decides when the game is over.
///
/// Peer order is join order; the first mover defaults to the first peer
/// until [`Session::randomize_active`] is called.
pub struct Session {
    peers: [Peer; 2],
    active: usize,
}

impl Session {
    pub fn new(first: Box<dyn Connection>, second: Box<dyn Connection>) -> Self {
        Self {
            peers: [
                Peer {
                    conn: first,
                    connected: true,
                },
                Peer {
                    conn: second,
                    connected: true,
                },
            ],
            active: 0,
        }
    }

    /// Uniformly pick which peer fires first.
    pub fn randomize_active<R: Rng>(&mut self, rng: &mut R) {
        self.active = rng.random_range(0..2);
    }

    fn swap_active(&mut self) {
        self.active ^= 1;
    }

    fn all_connected(&self) -> bool {
        self.peers.iter().all(|p| p.connected)
    }

    /// Send to one peer, marking it dead on failure.
    async fn send_to(&mut self, idx: usize, msg: &Message) {
        let peer = &mut self.peers[idx];
        if peer.connected && peer.conn.send(msg).await.is_err() {
            peer.connected = false;
        }
    }

    /// Send to every still-connected peer.
    async fn send_to_connected(&mut self, msg: &Message) {
        for idx in 0..self.peers.len() {
            self.send_to(idx, msg).await;
        }
    }

    /// Receive from one peer. Any failure — connection loss, truncation,
    /// undecodable bytes — marks the peer dead and yields `None`.
    async fn recv_from(&mut self, idx: usize) -> Option<Message> {
        match self.peers[idx].conn.recv().await {
            Ok(msg) => Some(msg),
            Err(NetError::Disconnected) => {
                log::info!("peer {} disconnected", idx);
                self.peers[idx].connected = false;
                None
            }
            Err(err) => {
                log::warn!("read from peer {} failed: {}", idx, err);
                self.peers[idx].connected = false;
                None
            }
        }
    }

    /// A protocol violation ends the session deterministically: the
    /// offender is cut off and the survivors told the game is over.
    async fn abort_on_violation(&mut self, idx: usize, got: &Message, expected: &'static str) {
        log::warn!(
            "expected {} from peer {}, got {}; closing session",
            expected,
            idx,
            got.name()
        );
        self.peers[idx].connected = false;
        self.send_to_connected(&Message::GameStatus(GameStatus::Disconnected))
            .await;
    }

    /// Drive the session to a terminal state.
    pub async fn run(mut self) {
        if self.all_connected() {
            self.send_to_connected(&Message::GameStatus(GameStatus::Running))
                .await;
        } else {
            self.send_to_connected(&Message::GameStatus(GameStatus::Disconnected))
                .await;
            return;
        }

        loop {
            if !self.all_connected() {
                self.send_to_connected(&Message::GameStatus(GameStatus::Disconnected))
                    .await;
                break;
            }
            let active = self.active;
            let waiting = active ^ 1;
            self.send_to(active, &Message::ShotAvailable(true)).await;
            self.send_to(waiting, &Message::ShotAvailable(false)).await;

            // the active peer's move, relayed verbatim
            let shot = match self.recv_from(active).await {
                Some(msg @ Message::ShotDetails { .. }) => msg,
                Some(other) => {
                    self.abort_on_violation(active, &other, "ShotDetails").await;
                    break;
                }
                None => {
                    self.send_to_connected(&Message::GameStatus(GameStatus::Disconnected))
                        .await;
                    break;
                }
            };
            self.send_to(waiting, &shot).await;

            // the waiting peer's verdict, relayed back
            let result = match self.recv_from(waiting).await {
                Some(Message::ShotResults(result)) => result,
                Some(other) => {
                    self.abort_on_violation(waiting, &other, "ShotResults").await;
                    break;
                }
                None => {
                    self.send_to_connected(&Message::GameStatus(GameStatus::Disconnected))
                        .await;
                    break;
                }
            };
            self.send_to(active, &Message::ShotResults(result)).await;

            match result {
                ShotResult::Win => {
                    self.send_to(active, &Message::GameStatus(GameStatus::Win)).await;
                    self.send_to(waiting, &Message::GameStatus(GameStatus::Lose)).await;
                    break;
                }
                ShotResult::Miss => self.swap_active(),
                ShotResult::Hit | ShotResult::Destroyed => {}
            }
        }
    }
}
