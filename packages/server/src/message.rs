//! Wire message envelope and the recognized message kinds.
//!
//! Every frame exchanged with a client is a JSON envelope of the shape
//! `{"msgtype": string, "content": <opaque>, "error": string (optional)}`.
//! The `content` payload stays an uninterpreted blob ([`RawValue`]) end to
//! end: the server never inspects or validates it.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// The message kinds understood by the server.
///
/// The discriminator travels as a plain string so that envelopes carrying a
/// kind this server does not know still decode; dispatch treats those as
/// [`MessageType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Static player data (reserved, not dispatched on)
    PlayerData,
    /// Client -> server: replace this player's state payload
    PlayerState,
    /// Server -> client: full snapshot of every player's state
    GameState,
    /// Client -> server liveness probe
    Ping,
    /// Server -> client reply to a ping
    Pong,
    /// Any discriminator not listed above
    Unknown,
}

impl MessageType {
    /// Wire string for this kind. [`MessageType::Unknown`] has no stable wire
    /// form and is never sent by the server.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::PlayerData => "playerdata",
            MessageType::PlayerState => "playerstate",
            MessageType::GameState => "gamestate",
            MessageType::Ping => "ping",
            MessageType::Pong => "pong",
            MessageType::Unknown => "unknown",
        }
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        match s {
            "playerdata" => MessageType::PlayerData,
            "playerstate" => MessageType::PlayerState,
            "gamestate" => MessageType::GameState,
            "ping" => MessageType::Ping,
            "pong" => MessageType::Pong,
            _ => MessageType::Unknown,
        }
    }
}

/// The wire envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMessage {
    pub msgtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GameMessage {
    /// Build an envelope of the given kind with an optional payload.
    pub fn new(kind: MessageType, content: Option<Box<RawValue>>) -> Self {
        Self {
            msgtype: kind.as_str().to_owned(),
            content,
            error: None,
        }
    }

    /// The recognized kind of this envelope.
    pub fn kind(&self) -> MessageType {
        MessageType::from(self.msgtype.as_str())
    }

    /// Serialize the envelope to its JSON wire form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse an envelope from its JSON wire form.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_player_state_message() {
        // テスト項目: playerstate メッセージが正しくデコードされる
        // given (前提条件):
        let text = r#"{"msgtype":"playerstate","content":{"hp":10}}"#;

        // when (操作):
        let msg = GameMessage::decode(text).unwrap();

        // then (期待する結果):
        assert_eq!(msg.kind(), MessageType::PlayerState);
        assert_eq!(msg.content.unwrap().get(), r#"{"hp":10}"#);
        assert!(msg.error.is_none());
    }

    #[test]
    fn test_decode_unknown_msgtype_is_accepted() {
        // テスト項目: 未知の msgtype でも構文的には受理される
        // given (前提条件):
        let text = r#"{"msgtype":"teleport","content":[1,2,3]}"#;

        // when (操作):
        let msg = GameMessage::decode(text).unwrap();

        // then (期待する結果):
        assert_eq!(msg.kind(), MessageType::Unknown);
        assert_eq!(msg.msgtype, "teleport");
    }

    #[test]
    fn test_decode_invalid_json_fails() {
        // テスト項目: JSON として壊れた入力はデコードエラーになる
        // given (前提条件):
        let text = "this is not json";

        // when (操作):
        let result = GameMessage::decode(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_omits_absent_fields() {
        // テスト項目: content / error が無い場合はフィールドごと省略される
        // given (前提条件):
        let msg = GameMessage::new(MessageType::Pong, None);

        // when (操作):
        let encoded = msg.encode().unwrap();

        // then (期待する結果):
        assert_eq!(encoded, r#"{"msgtype":"pong"}"#);
    }

    #[test]
    fn test_encode_preserves_opaque_content() {
        // テスト項目: content の中身は変形されずそのまま送出される
        // given (前提条件):
        let raw = RawValue::from_string(r#"{"z":1,"a":2}"#.to_string()).unwrap();
        let msg = GameMessage::new(MessageType::GameState, Some(raw));

        // when (操作):
        let encoded = msg.encode().unwrap();

        // then (期待する結果): キー順もそのまま
        assert_eq!(encoded, r#"{"msgtype":"gamestate","content":{"z":1,"a":2}}"#);
    }

    #[test]
    fn test_error_field_round_trip() {
        // テスト項目: error フィールドがラウンドトリップで保持される
        // given (前提条件):
        let mut msg = GameMessage::new(MessageType::GameState, None);
        msg.error = Some("name taken".to_string());

        // when (操作):
        let decoded = GameMessage::decode(&msg.encode().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(decoded.error.as_deref(), Some("name taken"));
    }

    #[test]
    fn test_message_type_wire_strings_round_trip() {
        // テスト項目: 各 MessageType のワイヤ文字列が往復変換できる
        // given (前提条件):
        let kinds = [
            MessageType::PlayerData,
            MessageType::PlayerState,
            MessageType::GameState,
            MessageType::Ping,
            MessageType::Pong,
        ];

        for kind in kinds {
            // when (操作):
            let parsed = MessageType::from(kind.as_str());

            // then (期待する結果):
            assert_eq!(parsed, kind);
        }
    }
}
