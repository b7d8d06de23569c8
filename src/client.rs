#![cfg(feature = "std")]
//! Client-side game flow: the join handshake and the message-driven state
//! machine a UI layer renders from.

use rand::Rng;

use crate::config::FIELD_SIZE;
use crate::field::{Field, FieldState, Pos, ShotOutcome};
use crate::net::{Connection, NetError};
use crate::protocol::{GameStatus, Message, ShotResult};

/// Server verdict on a join query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Joined; for a new session the key is the one to share with the
    /// opponent.
    Joined { session_key: u64 },
    /// Unknown key or the session already has two players. Not an error:
    /// the caller reports it and gives up on this flow.
    Refused,
}

/// Send the join query and wait for the server's verdict. `key` of `None`
/// asks for a new session.
pub async fn join_session(
    conn: &mut dyn Connection,
    key: Option<u64>,
) -> Result<JoinOutcome, NetError> {
    conn.send(&Message::PlayerQuery {
        session_key: key.unwrap_or(0),
    })
    .await?;
    match conn.recv().await? {
        Message::PlayerResponse {
            joined: true,
            session_key,
        } => Ok(JoinOutcome::Joined { session_key }),
        Message::PlayerResponse { joined: false, .. } => Ok(JoinOutcome::Refused),
        other => Err(NetError::UnexpectedMessage {
            expected: "PlayerResponse",
            got: other.name(),
        }),
    }
}

/// Client lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// Arranging ships; not joined yet.
    Preparing,
    /// Joined a session, game not started.
    Connected,
    /// Game running, waiting to hear whose turn it is.
    AwaitingTurn,
    MyTurn,
    EnemyTurn,
    Win,
    Lose,
    Disconnected,
}

impl ClientPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ClientPhase::Win | ClientPhase::Lose | ClientPhase::Disconnected
        )
    }
}

/// One player's view of a game: the own field, the opponent's revealed
/// field, and where we last fired.
pub struct GameClient {
    my_field: Field,
    enemy_field: Field,
    phase: ClientPhase,
    last_shot: Option<Pos>,
}

impl GameClient {
    /// A fresh client with the startup fleet dealt into the staging rows,
    /// ready for interactive placement.
    pub fn new() -> Self {
        let mut my_field = Field::new(Pos::new(FIELD_SIZE, FIELD_SIZE), FieldState::Preparing);
        my_field.add_startup_ships();
        Self::with_field(my_field)
    }

    /// A client around an already prepared own field (e.g. a random fleet
    /// for an automated player).
    pub fn with_field(my_field: Field) -> Self {
        Self {
            my_field,
            enemy_field: Field::new(Pos::new(FIELD_SIZE, FIELD_SIZE), FieldState::EnemyPreparing),
            phase: ClientPhase::Preparing,
            last_shot: None,
        }
    }

    pub fn my_field(&self) -> &Field {
        &self.my_field
    }

    pub fn my_field_mut(&mut self) -> &mut Field {
        &mut self.my_field
    }

    pub fn enemy_field(&self) -> &Field {
        &self.enemy_field
    }

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    pub fn last_shot(&self) -> Option<Pos> {
        self.last_shot
    }

    /// Whether the ready gate passes: every ship sits legally on the grid.
    pub fn can_ready(&self) -> bool {
        self.my_field.all_ships_placed()
    }

    /// Record a successful join; placement is locked from here on.
    pub fn joined(&mut self) {
        self.my_field.set_state(FieldState::Ready);
        self.phase = ClientPhase::Connected;
    }

    /// Record the loss of the server connection.
    pub fn connection_lost(&mut self) {
        self.phase = ClientPhase::Disconnected;
    }

    /// Fire at the enemy cell. Yields the message to send iff it is our
    /// turn and the cell has not been shot at before.
    pub fn fire_at(&mut self, pos: Pos) -> Option<Message> {
        if self.phase != ClientPhase::MyTurn {
            return None;
        }
        if !self.enemy_field.is_cell_empty_at(pos) {
            return None;
        }
        self.last_shot = Some(pos);
        self.phase = ClientPhase::AwaitingTurn;
        Some(Message::ShotDetails {
            x: pos.x as u32,
            y: pos.y as u32,
        })
    }

    /// Apply a server message. The returned message, if any, is the reply
    /// the caller must send back.
    pub fn handle_message(&mut self, msg: Message) -> Option<Message> {
        match msg {
            Message::Undefined => None,
            Message::GameStatus(status) => {
                self.on_status(status);
                None
            }
            Message::ShotAvailable(available) => {
                self.phase = if available {
                    ClientPhase::MyTurn
                } else {
                    ClientPhase::EnemyTurn
                };
                self.enemy_field.set_state(if available {
                    FieldState::EnemyReady
                } else {
                    FieldState::EnemyPreparing
                });
                None
            }
            Message::ShotResults(result) => {
                self.on_shot_result(result);
                None
            }
            Message::ShotDetails { x, y } => {
                Some(self.on_incoming_shot(Pos::new(x as i32, y as i32)))
            }
            other @ (Message::PlayerQuery { .. } | Message::PlayerResponse { .. }) => {
                log::warn!("ignoring out-of-phase {} message", other.name());
                None
            }
        }
    }

    fn on_status(&mut self, status: GameStatus) {
        self.phase = match status {
            GameStatus::Running => ClientPhase::AwaitingTurn,
            GameStatus::Win => ClientPhase::Win,
            GameStatus::Lose => ClientPhase::Lose,
            GameStatus::Disconnected => ClientPhase::Disconnected,
        };
    }

    /// The opponent's verdict on our last shot, revealed on the enemy
    /// field. A winning shot reveals the last kill like any other; the
    /// server's terminal status follows separately.
    fn on_shot_result(&mut self, result: ShotResult) {
        let Some(pos) = self.last_shot else {
            log::warn!("shot result with no outstanding shot");
            return;
        };
        let outcome = match result {
            ShotResult::Miss => ShotOutcome::Miss,
            ShotResult::Hit => ShotOutcome::Hit,
            ShotResult::Destroyed | ShotResult::Win => ShotOutcome::Destroyed,
        };
        self.enemy_field.shot_at(pos, outcome);
    }

    /// The opponent fired at us: apply the shot to the own field and
    /// compute the verdict to send back.
    fn on_incoming_shot(&mut self, pos: Pos) -> Message {
        match self.my_field.find_at(pos) {
            Some(part_id) => {
                if let Some(part) = self.my_field.part_mut(part_id) {
                    part.destroyed = true;
                }
                let owner = self.my_field.part(part_id).and_then(|p| p.ship);
                let result = match owner {
                    Some(ship) if self.my_field.ship_destroyed(ship) => {
                        if self.my_field.all_ships_destroyed() {
                            ShotResult::Win
                        } else {
                            ShotResult::Destroyed
                        }
                    }
                    _ => ShotResult::Hit,
                };
                Message::ShotResults(result)
            }
            None => {
                self.my_field.shot_at(pos, ShotOutcome::Miss);
                Message::ShotResults(ShotResult::Miss)
            }
        }
    }
}

impl Default for GameClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive an automated player until the game reaches a terminal phase:
/// receive, react, fire at a random fresh cell whenever allowed.
pub async fn run_auto<R: Rng>(
    conn: &mut dyn Connection,
    client: &mut GameClient,
    rng: &mut R,
) -> Result<(), NetError> {
    while !client.phase().is_terminal() {
        let msg = match conn.recv().await {
            Ok(msg) => msg,
            Err(NetError::Disconnected) => {
                client.connection_lost();
                break;
            }
            Err(err) => return Err(err),
        };
        if let Some(reply) = client.handle_message(msg) {
            conn.send(&reply).await?;
        }
        if client.phase() == ClientPhase::MyTurn {
            if let Some(shot) = random_shot(client, rng) {
                conn.send(&shot).await?;
            }
        }
    }
    Ok(())
}

/// A few random probes, then a deterministic sweep once the board fills
/// up. `None` only when every cell has already been shot at.
fn random_shot<R: Rng>(client: &mut GameClient, rng: &mut R) -> Option<Message> {
    for _ in 0..64 {
        let pos = Pos::new(
            rng.random_range(0..FIELD_SIZE),
            rng.random_range(0..FIELD_SIZE),
        );
        if let Some(msg) = client.fire_at(pos) {
            return Some(msg);
        }
    }
    for y in 0..FIELD_SIZE {
        for x in 0..FIELD_SIZE {
            if let Some(msg) = client.fire_at(Pos::new(x, y)) {
                return Some(msg);
            }
        }
    }
    None
}
