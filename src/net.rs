#![cfg(feature = "std")]
//! Async framing of protocol messages over a byte stream.

use std::fmt;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::protocol::{payload_len, DecodeError, Message};

/// Largest payload in the message table.
const MAX_PAYLOAD: usize = 9;

/// Errors from the framed connection layer.
#[derive(Debug)]
pub enum NetError {
    /// The peer closed the connection (EOF on a message boundary). This is
    /// the one and only connection-loss signal; it is never conflated with
    /// the `Undefined` message.
    Disconnected,
    /// The stream ended mid-payload; the frame is unusable and the read
    /// fails rather than yielding a short message.
    TruncatedPayload { tag: u8, expected: usize, got: usize },
    /// A well-formed message of the wrong type for the protocol state.
    UnexpectedMessage { expected: &'static str, got: &'static str },
    /// Bytes that do not decode against the message table.
    Decode(DecodeError),
    Io(io::Error),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Disconnected => write!(f, "connection closed by peer"),
            NetError::TruncatedPayload { tag, expected, got } => write!(
                f,
                "truncated payload for tag {}: expected {} bytes, got {}",
                tag, expected, got
            ),
            NetError::UnexpectedMessage { expected, got } => {
                write!(f, "expected {} message, got {}", expected, got)
            }
            NetError::Decode(err) => write!(f, "decode error: {}", err),
            NetError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for NetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecodeError> for NetError {
    fn from(err: DecodeError) -> Self {
        NetError::Decode(err)
    }
}

impl From<io::Error> for NetError {
    fn from(err: io::Error) -> Self {
        NetError::Io(err)
    }
}

/// A bidirectional message pipe between two peers.
#[async_trait::async_trait]
pub trait Connection: Send {
    async fn send(&mut self, msg: &Message) -> Result<(), NetError>;
    async fn recv(&mut self) -> Result<Message, NetError>;
}

/// Message framing over any async byte stream.
pub struct FramedConnection<S> {
    stream: S,
    send_delay: Option<Duration>,
}

impl<S> FramedConnection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            send_delay: None,
        }
    }

    /// Pause before every send. The original transport used this to keep
    /// two rapid writes from coalescing into one read; exact-length framed
    /// reads do not need it, so it is off unless asked for.
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl FramedConnection<TcpStream> {
    /// Connect to a server and frame the stream (client side).
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, NetError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

#[async_trait::async_trait]
impl<S> Connection for FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, msg: &Message) -> Result<(), NetError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        let bytes = msg.encode();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Message, NetError> {
        let mut tag_buf = [0u8; 1];
        if let Err(err) = self.stream.read_exact(&mut tag_buf).await {
            return Err(if err.kind() == io::ErrorKind::UnexpectedEof {
                NetError::Disconnected
            } else {
                NetError::Io(err)
            });
        }
        let tag = tag_buf[0];
        let expected = payload_len(tag).ok_or(DecodeError::UnknownTag(tag))?;

        // Read until the fixed payload is complete, counting what arrived
        // so a truncated frame is reported precisely.
        let mut payload = [0u8; MAX_PAYLOAD];
        let mut got = 0;
        while got < expected {
            match self.stream.read(&mut payload[got..expected]).await {
                Ok(0) => return Err(NetError::TruncatedPayload { tag, expected, got }),
                Ok(n) => got += n,
                Err(err) => return Err(NetError::Io(err)),
            }
        }
        Ok(Message::decode_payload(tag, &payload[..expected])?)
    }
}
