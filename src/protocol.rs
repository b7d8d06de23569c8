//! Fixed-layout binary messages exchanged between peers and the server.
//!
//! Every message on the wire is `[1-byte tag][payload]` with no delimiter
//! and no length prefix; the payload size is a fixed function of the tag
//! (see [`payload_len`]) and both ends must share the table. All
//! multi-byte fields are big-endian with an explicit width, so the
//! encoding is identical on every platform.

use alloc::vec::Vec;
use core::fmt;

pub const TAG_UNDEFINED: u8 = 0;
pub const TAG_PLAYER_QUERY: u8 = 1;
pub const TAG_PLAYER_RESPONSE: u8 = 2;
pub const TAG_GAME_STATUS: u8 = 3;
pub const TAG_SHOT_AVAILABLE: u8 = 4;
pub const TAG_SHOT_DETAILS: u8 = 5;
pub const TAG_SHOT_RESULTS: u8 = 6;

/// Game status codes carried by [`Message::GameStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GameStatus {
    Running = 0,
    Win = 1,
    Lose = 2,
    Disconnected = 3,
}

impl GameStatus {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(GameStatus::Running),
            1 => Some(GameStatus::Win),
            2 => Some(GameStatus::Lose),
            3 => Some(GameStatus::Disconnected),
            _ => None,
        }
    }
}

/// Shot verdict codes carried by [`Message::ShotResults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShotResult {
    Miss = 0,
    Hit = 1,
    Destroyed = 2,
    /// The shot destroyed the last ship.
    Win = 3,
}

impl ShotResult {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ShotResult::Miss),
            1 => Some(ShotResult::Hit),
            2 => Some(ShotResult::Destroyed),
            3 => Some(ShotResult::Win),
            _ => None,
        }
    }
}

/// A protocol message, one variant per wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Undefined,
    /// Client → server: join a session. A key of 0 requests a new one.
    PlayerQuery { session_key: u64 },
    /// Server → client: outcome of a join query.
    PlayerResponse { joined: bool, session_key: u64 },
    GameStatus(GameStatus),
    /// Whether the receiving peer fires this turn.
    ShotAvailable(bool),
    /// Coordinates of the active peer's shot.
    ShotDetails { x: u32, y: u32 },
    ShotResults(ShotResult),
}

/// Fixed payload size for `tag`, or `None` for an unknown tag.
pub fn payload_len(tag: u8) -> Option<usize> {
    match tag {
        TAG_UNDEFINED => Some(0),
        TAG_PLAYER_QUERY => Some(8),
        TAG_PLAYER_RESPONSE => Some(9),
        TAG_GAME_STATUS | TAG_SHOT_AVAILABLE | TAG_SHOT_RESULTS => Some(1),
        TAG_SHOT_DETAILS => Some(8),
        _ => None,
    }
}

impl Message {
    pub fn tag(&self) -> u8 {
        match self {
            Message::Undefined => TAG_UNDEFINED,
            Message::PlayerQuery { .. } => TAG_PLAYER_QUERY,
            Message::PlayerResponse { .. } => TAG_PLAYER_RESPONSE,
            Message::GameStatus(_) => TAG_GAME_STATUS,
            Message::ShotAvailable(_) => TAG_SHOT_AVAILABLE,
            Message::ShotDetails { .. } => TAG_SHOT_DETAILS,
            Message::ShotResults(_) => TAG_SHOT_RESULTS,
        }
    }

    /// Variant name, for logs and error reports.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Undefined => "Undefined",
            Message::PlayerQuery { .. } => "PlayerQuery",
            Message::PlayerResponse { .. } => "PlayerResponse",
            Message::GameStatus(_) => "GameStatus",
            Message::ShotAvailable(_) => "ShotAvailable",
            Message::ShotDetails { .. } => "ShotDetails",
            Message::ShotResults(_) => "ShotResults",
        }
    }

    /// Encode as the tag byte followed by the fixed payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + payload_len(self.tag()).unwrap_or(0));
        buf.push(self.tag());
        match *self {
            Message::Undefined => {}
            Message::PlayerQuery { session_key } => {
                buf.extend_from_slice(&session_key.to_be_bytes());
            }
            Message::PlayerResponse { joined, session_key } => {
                buf.push(joined as u8);
                buf.extend_from_slice(&session_key.to_be_bytes());
            }
            Message::GameStatus(status) => buf.push(status as u8),
            Message::ShotAvailable(available) => buf.push(available as u8),
            Message::ShotDetails { x, y } => {
                buf.extend_from_slice(&x.to_be_bytes());
                buf.extend_from_slice(&y.to_be_bytes());
            }
            Message::ShotResults(result) => buf.push(result as u8),
        }
        buf
    }

    /// Decode a payload of at least `payload_len(tag)` bytes.
    pub fn decode_payload(tag: u8, payload: &[u8]) -> Result<Message, DecodeError> {
        let expected = payload_len(tag).ok_or(DecodeError::UnknownTag(tag))?;
        if payload.len() < expected {
            return Err(DecodeError::ShortPayload {
                tag,
                expected,
                got: payload.len(),
            });
        }
        let msg = match tag {
            TAG_UNDEFINED => Message::Undefined,
            TAG_PLAYER_QUERY => Message::PlayerQuery {
                session_key: be_u64(payload),
            },
            TAG_PLAYER_RESPONSE => Message::PlayerResponse {
                joined: payload[0] != 0,
                session_key: be_u64(&payload[1..]),
            },
            TAG_GAME_STATUS => Message::GameStatus(
                GameStatus::from_u8(payload[0])
                    .ok_or(DecodeError::BadValue { tag, value: payload[0] })?,
            ),
            TAG_SHOT_AVAILABLE => Message::ShotAvailable(payload[0] != 0),
            TAG_SHOT_DETAILS => Message::ShotDetails {
                x: be_u32(payload),
                y: be_u32(&payload[4..]),
            },
            TAG_SHOT_RESULTS => Message::ShotResults(
                ShotResult::from_u8(payload[0])
                    .ok_or(DecodeError::BadValue { tag, value: payload[0] })?,
            ),
            _ => return Err(DecodeError::UnknownTag(tag)),
        };
        Ok(msg)
    }
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

fn be_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(buf)
}

/// Errors from byte-level message decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Tag not present in the message table.
    UnknownTag(u8),
    /// Fewer payload bytes than the table demands.
    ShortPayload { tag: u8, expected: usize, got: usize },
    /// A payload byte outside the value range for the tag.
    BadValue { tag: u8, value: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownTag(tag) => write!(f, "unknown message tag {}", tag),
            DecodeError::ShortPayload { tag, expected, got } => write!(
                f,
                "short payload for tag {}: expected {} bytes, got {}",
                tag, expected, got
            ),
            DecodeError::BadValue { tag, value } => {
                write!(f, "invalid payload value {} for tag {}", value, tag)
            }
        }
    }
}
