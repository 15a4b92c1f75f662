use crate::{Message, ProtocolError};

fn roundtrip(msg: Message) {
    let frame = msg.encode();
    let declared = u32::from_be_bytes(frame[..4].try_into().unwrap());
    assert_eq!(declared as usize, frame.len());
    let decoded = Message::decode(&frame).expect("decode of a freshly encoded frame");
    assert_eq!(decoded, msg);
}

#[test]
fn chat_roundtrips() {
    roundtrip(Message::Chat { timestamp: 1_700_000_000, name: "alice".into(), text: "hi".into() });
}

#[test]
fn chat_roundtrips_at_caps() {
    // NAME_SIZE_LIMIT=50 and TEXT_SIZE_LIMIT=1000 include the NUL terminator.
    let name = "a".repeat(49);
    let text = "b".repeat(999);
    roundtrip(Message::Chat { timestamp: 0, name, text });
}

#[test]
fn join_roundtrips() {
    roundtrip(Message::Join { room_id: 3 });
}

#[test]
fn name_roundtrips() {
    roundtrip(Message::Name { name: "bob".into() });
}

#[test]
fn reply_roundtrips_at_cap() {
    roundtrip(Message::Reply { text: "x".repeat(99) });
}

#[test]
fn decode_fails_on_truncated_frame() {
    let frame = Message::Name { name: "bob".into() }.encode();
    let err = Message::decode(&frame[..frame.len() - 2]).unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated(_) | ProtocolError::NotNulTerminated { .. }));
}

#[test]
fn decode_fails_on_length_mismatch() {
    let mut frame = Message::Join { room_id: 1 }.encode();
    frame[0] = 0xff; // corrupt the declared total_len
    let err = Message::decode(&frame).unwrap_err();
    assert!(matches!(err, ProtocolError::LengthMismatch { .. }));
}

#[test]
fn decode_fails_on_unknown_type() {
    let mut frame = Message::Join { room_id: 1 }.encode();
    frame[4] = 0x7f;
    let err = Message::decode(&frame).unwrap_err();
    assert_eq!(err, ProtocolError::UnknownType(0x7f));
}

#[test]
fn decode_fails_on_trailing_bytes() {
    let mut frame = Message::Join { room_id: 1 }.encode();
    frame.push(0);
    let total_len = frame.len() as u32;
    frame[..4].copy_from_slice(&total_len.to_be_bytes());
    let err = Message::decode(&frame).unwrap_err();
    assert!(matches!(err, ProtocolError::TrailingBytes(1)));
}

#[test]
fn decode_fails_on_overlong_name() {
    let mut frame = Message::Name { name: "bob".into() }.encode();
    // name_len byte sits right after total_len(4) + msg_type(1).
    frame[5] = 200;
    let total_len = frame.len() as u32; // leave body alone; len check fires first on field cap
    frame[..4].copy_from_slice(&total_len.to_be_bytes());
    let err = Message::decode(&frame).unwrap_err();
    assert!(matches!(err, ProtocolError::Overlong { field: "name", .. }));
}

#[test]
fn decode_fails_on_missing_nul_terminator() {
    let mut frame = Message::Name { name: "bob".into() }.encode();
    *frame.last_mut().unwrap() = b'!'; // clobber the trailing NUL
    let err = Message::decode(&frame).unwrap_err();
    assert_eq!(err, ProtocolError::NotNulTerminated { field: "name" });
}

#[test]
fn msg_type_encoding_is_fixed() {
    assert_eq!(Message::Chat { timestamp: 0, name: String::new(), text: String::new() }.encode()
        [4], 0);
    assert_eq!(Message::Join { room_id: 0 }.encode()[4], 1);
    assert_eq!(Message::Name { name: String::new() }.encode()[4], 2);
    assert_eq!(Message::Reply { text: String::new() }.encode()[4], 3);
}
