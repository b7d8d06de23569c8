use seabattle::{
    payload_len, Connection, DecodeError, FramedConnection, GameStatus, Message, NetError,
    ShotResult, TAG_GAME_STATUS, TAG_PLAYER_QUERY, TAG_PLAYER_RESPONSE, TAG_SHOT_AVAILABLE,
    TAG_SHOT_DETAILS, TAG_SHOT_RESULTS, TAG_UNDEFINED,
};
use tokio::io::AsyncWriteExt;

fn sample_messages() -> Vec<Message> {
    vec![
        Message::Undefined,
        Message::PlayerQuery { session_key: 0 },
        Message::PlayerQuery {
            session_key: 0xDEAD_BEEF_0042,
        },
        Message::PlayerResponse {
            joined: true,
            session_key: 7,
        },
        Message::PlayerResponse {
            joined: false,
            session_key: 0,
        },
        Message::GameStatus(GameStatus::Running),
        Message::GameStatus(GameStatus::Disconnected),
        Message::ShotAvailable(true),
        Message::ShotAvailable(false),
        Message::ShotDetails { x: 3, y: 9 },
        Message::ShotResults(ShotResult::Miss),
        Message::ShotResults(ShotResult::Win),
    ]
}

#[test]
fn test_payload_table() {
    assert_eq!(payload_len(TAG_UNDEFINED), Some(0));
    assert_eq!(payload_len(TAG_PLAYER_QUERY), Some(8));
    assert_eq!(payload_len(TAG_PLAYER_RESPONSE), Some(9));
    assert_eq!(payload_len(TAG_GAME_STATUS), Some(1));
    assert_eq!(payload_len(TAG_SHOT_AVAILABLE), Some(1));
    assert_eq!(payload_len(TAG_SHOT_DETAILS), Some(8));
    assert_eq!(payload_len(TAG_SHOT_RESULTS), Some(1));
    assert_eq!(payload_len(42), None);
}

#[test]
fn test_encoded_sizes_match_table() {
    for msg in sample_messages() {
        let bytes = msg.encode();
        assert_eq!(bytes[0], msg.tag());
        assert_eq!(bytes.len(), 1 + payload_len(msg.tag()).unwrap(), "{:?}", msg);
    }
}

#[test]
fn test_byte_level_round_trip() {
    for msg in sample_messages() {
        let bytes = msg.encode();
        let decoded = Message::decode_payload(bytes[0], &bytes[1..]).unwrap();
        assert_eq!(decoded, msg);
    }
}

#[test]
fn test_explicit_wire_layout() {
    // [tag][joined u8][session key u64 BE], no padding anywhere
    let bytes = Message::PlayerResponse {
        joined: true,
        session_key: 0x0102,
    }
    .encode();
    assert_eq!(bytes, vec![TAG_PLAYER_RESPONSE, 1, 0, 0, 0, 0, 0, 0, 1, 2]);

    let bytes = Message::ShotDetails { x: 1, y: 258 }.encode();
    assert_eq!(bytes, vec![TAG_SHOT_DETAILS, 0, 0, 0, 1, 0, 0, 1, 2]);
}

#[test]
fn test_decode_rejects_bad_values() {
    assert_eq!(
        Message::decode_payload(TAG_GAME_STATUS, &[9]),
        Err(DecodeError::BadValue {
            tag: TAG_GAME_STATUS,
            value: 9
        })
    );
    assert_eq!(
        Message::decode_payload(TAG_SHOT_RESULTS, &[4]),
        Err(DecodeError::BadValue {
            tag: TAG_SHOT_RESULTS,
            value: 4
        })
    );
    assert_eq!(
        Message::decode_payload(42, &[]),
        Err(DecodeError::UnknownTag(42))
    );
    assert_eq!(
        Message::decode_payload(TAG_SHOT_DETAILS, &[0, 0, 0]),
        Err(DecodeError::ShortPayload {
            tag: TAG_SHOT_DETAILS,
            expected: 8,
            got: 3
        })
    );
}

#[tokio::test]
async fn test_framed_round_trip() {
    let (a, b) = tokio::io::duplex(256);
    let mut sender = FramedConnection::new(a);
    let mut receiver = FramedConnection::new(b);

    for msg in sample_messages() {
        sender.send(&msg).await.unwrap();
        assert_eq!(receiver.recv().await.unwrap(), msg);
    }
}

#[tokio::test]
async fn test_split_writes_reassemble() {
    let (mut raw, b) = tokio::io::duplex(256);
    let mut receiver = FramedConnection::new(b);

    let bytes = Message::ShotDetails { x: 7, y: 2 }.encode();
    let reader = tokio::spawn(async move { receiver.recv().await });

    // tag alone, then the payload dribbled in two pieces
    raw.write_all(&bytes[..1]).await.unwrap();
    raw.flush().await.unwrap();
    tokio::task::yield_now().await;
    raw.write_all(&bytes[1..5]).await.unwrap();
    raw.flush().await.unwrap();
    tokio::task::yield_now().await;
    raw.write_all(&bytes[5..]).await.unwrap();
    raw.flush().await.unwrap();

    let msg = reader.await.unwrap().unwrap();
    assert_eq!(msg, Message::ShotDetails { x: 7, y: 2 });
}

#[tokio::test]
async fn test_coalesced_writes_split_into_messages() {
    let (mut raw, b) = tokio::io::duplex(256);
    let mut receiver = FramedConnection::new(b);

    // two messages in a single write: no delimiter on the wire, the
    // fixed table is what separates them
    let mut bytes = Message::ShotAvailable(true).encode();
    bytes.extend(Message::GameStatus(GameStatus::Running).encode());
    raw.write_all(&bytes).await.unwrap();
    raw.flush().await.unwrap();

    assert_eq!(receiver.recv().await.unwrap(), Message::ShotAvailable(true));
    assert_eq!(
        receiver.recv().await.unwrap(),
        Message::GameStatus(GameStatus::Running)
    );
}

#[tokio::test]
async fn test_truncated_payload_fails_the_read() {
    let (mut raw, b) = tokio::io::duplex(256);
    let mut receiver = FramedConnection::new(b);

    let bytes = Message::ShotDetails { x: 1, y: 1 }.encode();
    raw.write_all(&bytes[..4]).await.unwrap();
    raw.flush().await.unwrap();
    drop(raw);

    match receiver.recv().await {
        Err(NetError::TruncatedPayload { tag, expected, got }) => {
            assert_eq!(tag, TAG_SHOT_DETAILS);
            assert_eq!(expected, 8);
            assert_eq!(got, 3);
        }
        other => panic!("expected TruncatedPayload, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_tag_fails_the_read() {
    let (mut raw, b) = tokio::io::duplex(256);
    let mut receiver = FramedConnection::new(b);

    raw.write_all(&[42]).await.unwrap();
    raw.flush().await.unwrap();

    match receiver.recv().await {
        Err(NetError::Decode(DecodeError::UnknownTag(42))) => {}
        other => panic!("expected UnknownTag, got {:?}", other),
    }
}

#[tokio::test]
async fn test_clean_close_is_disconnected() {
    let (raw, b) = tokio::io::duplex(256);
    let mut receiver = FramedConnection::new(b);
    drop(raw);

    match receiver.recv().await {
        Err(NetError::Disconnected) => {}
        other => panic!("expected Disconnected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_delay_still_delivers() {
    let (a, b) = tokio::io::duplex(256);
    let mut sender = FramedConnection::new(a).with_send_delay(std::time::Duration::from_millis(5));
    let mut receiver = FramedConnection::new(b);

    sender.send(&Message::ShotAvailable(false)).await.unwrap();
    assert_eq!(
        receiver.recv().await.unwrap(),
        Message::ShotAvailable(false)
    );
}
