#![cfg(feature = "std")]
//! Server-side dispatcher: pairs incoming connections into sessions.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;

use crate::config::JOIN_TIMEOUT;
use crate::net::{Connection, FramedConnection};
use crate::protocol::Message;
use crate::session::Session;

/// A map entry: a half-formed session or a running one.
enum SessionEntry {
    /// One peer joined, waiting for the second.
    Forming(Box<dyn Connection>),
    /// Both peers paired; the handle allows shutdown and joining.
    Running(JoinHandle<()>),
}

/// The key → session map shared by the accept loop and session tasks.
/// The mutex is the single synchronization point: sessions are looked up
/// by key from the handshake tasks and erased by terminating sessions.
pub struct Registry {
    sessions: Mutex<HashMap<u64, SessionEntry>>,
    next_key: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            // 0 is the wire sentinel for "new session"
            next_key: AtomicU64::new(1),
        }
    }

    /// Mint a fresh session key, unique for the lifetime of the server.
    fn mint_key(&self) -> u64 {
        self.next_key.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of sessions currently forming or running.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn remove(&self, key: u64) {
        self.sessions.lock().await.remove(&key);
    }

    /// Abort every running session and drop all entries.
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.lock().await;
        for (_, entry) in sessions.drain() {
            if let SessionEntry::Running(handle) = entry {
                handle.abort();
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept connections forever, handing each to a handshake task. The
/// tasks live in a `JoinSet` and are reaped as they finish; nothing runs
/// detached.
pub async fn serve(listener: TcpListener, registry: Arc<Registry>) -> anyhow::Result<()> {
    let mut handshakes = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, addr) = accepted?;
                log::info!("client connected from {}", addr);
                handshakes.spawn(handle_connection(stream, addr, Arc::clone(&registry)));
            }
            Some(finished) = handshakes.join_next(), if !handshakes.is_empty() => {
                if let Err(err) = finished {
                    log::warn!("handshake task failed: {}", err);
                }
            }
        }
    }
}

/// Wait briefly for a join query and route the peer into the registry.
/// A connection whose first message is anything else is dropped without
/// reply.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, registry: Arc<Registry>) {
    let mut conn: Box<dyn Connection> = Box::new(FramedConnection::new(stream));
    let queried_key = match timeout(JOIN_TIMEOUT, conn.recv()).await {
        Ok(Ok(Message::PlayerQuery { session_key })) => session_key,
        Ok(Ok(other)) => {
            log::warn!("{}: first message was {}, dropping", addr, other.name());
            return;
        }
        Ok(Err(err)) => {
            log::info!("{}: handshake read failed: {}", addr, err);
            return;
        }
        Err(_) => {
            log::info!("{}: no join query within {:?}", addr, JOIN_TIMEOUT);
            return;
        }
    };

    if queried_key == 0 {
        open_session(conn, addr, registry).await;
    } else {
        join_existing(conn, addr, queried_key, registry).await;
    }
}

/// First peer of a new session: mint a key, confirm it, park the peer.
/// The lock is held across confirm-and-insert so the key resolves the
/// moment the client can have learned it.
async fn open_session(mut conn: Box<dyn Connection>, addr: SocketAddr, registry: Arc<Registry>) {
    let key = registry.mint_key();
    let response = Message::PlayerResponse {
        joined: true,
        session_key: key,
    };
    let mut sessions = registry.sessions.lock().await;
    if conn.send(&response).await.is_err() {
        log::warn!("{}: could not confirm new session {}", addr, key);
        return;
    }
    sessions.insert(key, SessionEntry::Forming(conn));
    log::info!("{}: opened session {}", addr, key);
}

/// Second peer joining by key: pair up and start the session task, or
/// refuse when the key is unknown or the session is already full.
async fn join_existing(
    mut conn: Box<dyn Connection>,
    addr: SocketAddr,
    key: u64,
    registry: Arc<Registry>,
) {
    let first = {
        let mut sessions = registry.sessions.lock().await;
        match sessions.remove(&key) {
            Some(SessionEntry::Forming(first)) => first,
            Some(running @ SessionEntry::Running(_)) => {
                sessions.insert(key, running);
                drop(sessions);
                refuse(conn, addr, key).await;
                return;
            }
            None => {
                drop(sessions);
                refuse(conn, addr, key).await;
                return;
            }
        }
    };

    let response = Message::PlayerResponse {
        joined: true,
        session_key: key,
    };
    if conn.send(&response).await.is_err() {
        // the joiner vanished between query and reply; put the first
        // peer back to wait for someone else
        log::warn!("{}: join confirmation for session {} failed", addr, key);
        registry
            .sessions
            .lock()
            .await
            .insert(key, SessionEntry::Forming(first));
        return;
    }

    let mut session = Session::new(first, conn);
    let mut rng = SmallRng::from_rng(&mut rand::rng());
    session.randomize_active(&mut rng);

    // holding the lock until the handle is in the map keeps the task's
    // own removal from racing ahead of the insert
    let mut sessions = registry.sessions.lock().await;
    let task_registry = Arc::clone(&registry);
    let handle = tokio::spawn(async move {
        session.run().await;
        task_registry.remove(key).await;
        log::info!("session {} closed", key);
    });
    sessions.insert(key, SessionEntry::Running(handle));
    log::info!("{}: joined session {}, game starting", addr, key);
}

async fn refuse(mut conn: Box<dyn Connection>, addr: SocketAddr, key: u64) {
    log::info!("{}: refused join to session {}", addr, key);
    let response = Message::PlayerResponse {
        joined: false,
        session_key: 0,
    };
    let _ = conn.send(&response).await;
}
