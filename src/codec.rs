//! JSON wire codec.
//!
//! Messages travel as bare UTF-8 JSON text with no length prefix or
//! delimiter. Each read from the socket is decoded independently, so one
//! write on the sender side must correspond to one read on the receiver.
//! A message split across two reads is never reassembled, and two
//! messages concatenated into a single read are rejected as trailing
//! garbage. Known protocol limitation, kept as-is.

use serde_json::Value;

/// A decoded wire message: any JSON value (string, number, bool, null,
/// array, object). No schema is enforced here; handlers define expected
/// keys (`cmd`, `data`) by convention.
pub type Message = Value;

/// Decode errors.
#[derive(Debug)]
pub enum DecodeError {
    /// The trimmed bytes were not a single valid JSON document.
    MalformedPayload(serde_json::Error),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::MalformedPayload(e) => write!(f, "malformed payload: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::MalformedPayload(e) => Some(e),
        }
    }
}

/// Decode one raw payload into a [`Message`].
///
/// Trailing NUL bytes are stripped before parsing; some senders pad
/// fixed-size writes with them.
pub fn decode(raw: &[u8]) -> Result<Message, DecodeError> {
    let end = raw
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);

    serde_json::from_slice(&raw[..end]).map_err(DecodeError::MalformedPayload)
}

/// Encode a [`Message`] as UTF-8 JSON text. No trailing delimiter is
/// appended.
pub fn encode(message: &Message) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_object() {
        let msg = decode(br#"{"cmd":"test","data":["foo","bar"]}"#).unwrap();
        assert_eq!(msg, json!({"cmd": "test", "data": ["foo", "bar"]}));
    }

    #[test]
    fn test_decode_strips_trailing_nuls() {
        let msg = decode(b"{\"cmd\":\"ping\"}\0\0\0").unwrap();
        assert_eq!(msg, json!({"cmd": "ping"}));
    }

    #[test]
    fn test_decode_all_nuls() {
        assert!(matches!(
            decode(b"\0\0\0\0"),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            decode(br#"{"cmd":"tes"#),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_non_utf8() {
        assert!(matches!(
            decode(&[0xff, 0xfe, 0x01]),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_concatenated_messages() {
        // Two messages in one read are trailing garbage, not a feature.
        assert!(matches!(
            decode(br#"{"cmd":"a"}{"cmd":"b"}"#),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_encode_no_delimiter() {
        let payload = encode(&json!({"cmd": "ok"})).unwrap();
        assert!(!payload.ends_with(b"\n"));
        assert!(!payload.ends_with(b"\0"));
    }

    #[test]
    fn test_round_trip() {
        let messages = vec![
            json!({"cmd": "test", "data": ["foo", "bar"]}),
            json!({"cmd": "nested", "data": {"a": 1, "b": [true, null, 2.5]}}),
            json!("bare string"),
            json!(42),
            json!(null),
        ];
        for msg in messages {
            let encoded = encode(&msg).unwrap();
            assert_eq!(decode(&encoded).unwrap(), msg);
        }
    }
}
