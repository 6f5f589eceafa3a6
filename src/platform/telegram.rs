//! Bot API wire records and their translation to the domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Chat, ChatMigration, ChatType, Inbound, Message, ParseMode, User};

/// Envelope shared by every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: String,
}

/// Failure of a single Bot API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decoding response failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("code:{code} description:{description}")]
    Api { code: i64, description: String },
}

impl ApiResponse {
    /// Turn an `ok=false` envelope into [`ApiError::Api`].
    pub fn into_result(self) -> Result<Option<serde_json::Value>, ApiError> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(ApiError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self.description,
            })
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<WireMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: WireUser,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub chat: WireChat,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireUser {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireChat {
    #[serde(default)]
    pub id: i64,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutMessage {
    pub chat_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

impl From<&Message> for OutMessage {
    fn from(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id.clone(),
            text: msg.text.clone(),
            parse_mode: msg.parse_mode,
        }
    }
}

/// Translate one wire message into the single item dispatched for it.
///
/// A message carrying `migrate_to_chat_id` becomes [`Inbound::ChatMigrated`],
/// anything else a plain [`Inbound::Message`].
pub fn translate(wire: &WireMessage) -> Inbound {
    let message = Message {
        id: wire.message_id.to_string(),
        from: User {
            id: wire.from.id.to_string(),
            first_name: wire.from.first_name.clone(),
            last_name: wire.from.last_name.clone(),
            username: wire.from.username.clone(),
        },
        date: DateTime::<Utc>::from_timestamp(wire.date, 0).unwrap_or_default(),
        chat: Chat {
            id: wire.chat.id.to_string(),
            kind: ChatType::from_wire(&wire.chat.kind),
            title: wire.chat.title.clone(),
            first_name: wire.chat.first_name.clone(),
            last_name: wire.chat.last_name.clone(),
            username: wire.chat.username.clone(),
        },
        text: wire.text.clone(),
        parse_mode: None,
    };

    match wire.migrate_to_chat_id {
        Some(to) => Inbound::ChatMigrated(ChatMigration {
            from_chat_id: message.chat.id.clone(),
            to_chat_id: to.to_string(),
            message,
        }),
        None => Inbound::Message(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_update(value: serde_json::Value) -> WireUpdate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_translate_plain_message() {
        let update = wire_update(json!({
            "update_id": 42,
            "message": {
                "message_id": 7,
                "from": {"id": 1, "first_name": "A"},
                "date": 1700000000,
                "chat": {"id": 9, "type": "group"},
                "text": "hi"
            }
        }));
        assert_eq!(update.update_id, 42);

        let inbound = translate(update.message.as_ref().unwrap());
        let Inbound::Message(msg) = inbound else {
            panic!("expected a plain message");
        };
        assert_eq!(msg.id, "7");
        assert_eq!(msg.from.id, "1");
        assert_eq!(msg.from.first_name, "A");
        assert_eq!(msg.chat.id, "9");
        assert_eq!(msg.chat.kind, ChatType::Group);
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.date.timestamp(), 1_700_000_000);
        assert_eq!(msg.parse_mode, None);
    }

    #[test]
    fn test_translate_migration_is_not_overwritten() {
        let update = wire_update(json!({
            "update_id": 5,
            "message": {
                "message_id": 3,
                "date": 1700000000,
                "chat": {"id": -12, "type": "group", "title": "Team"},
                "migrate_to_chat_id": -100123
            }
        }));

        match translate(update.message.as_ref().unwrap()) {
            Inbound::ChatMigrated(migration) => {
                assert_eq!(migration.from_chat_id, "-12");
                assert_eq!(migration.to_chat_id, "-100123");
                assert_eq!(migration.message.chat.title, "Team");
            }
            other => panic!("expected a migration event, got {:?}", other),
        }
    }

    #[test]
    fn test_translate_unknown_chat_type() {
        let update = wire_update(json!({
            "update_id": 1,
            "message": {"message_id": 1, "chat": {"id": 2, "type": "something-new"}}
        }));
        let inbound = translate(update.message.as_ref().unwrap());
        assert_eq!(inbound.message().chat.kind, ChatType::Unknown);
    }

    #[test]
    fn test_private_chat_keeps_user_fields() {
        let update = wire_update(json!({
            "update_id": 1,
            "message": {
                "message_id": 1,
                "chat": {"id": 2, "type": "private", "first_name": "Ada", "username": "ada"}
            }
        }));
        let inbound = translate(update.message.as_ref().unwrap());
        let chat = &inbound.message().chat;
        assert_eq!(chat.kind, ChatType::Private);
        assert_eq!(chat.first_name, "Ada");
        assert_eq!(chat.username, "ada");
        assert!(chat.title.is_empty());
    }

    #[test]
    fn test_update_without_message() {
        let update = wire_update(json!({"update_id": 77, "edited_message": {}}));
        assert!(update.message.is_none());
    }

    #[test]
    fn test_reply_preserves_chat_id_and_text() {
        let update = wire_update(json!({
            "update_id": 10,
            "message": {"message_id": 1, "chat": {"id": -4455, "type": "supergroup"}, "text": "ünïcode ✓"}
        }));
        let inbound = translate(update.message.as_ref().unwrap());
        let out = OutMessage::from(inbound.message());
        assert_eq!(out.chat_id, "-4455");
        assert_eq!(out.text, "ünïcode ✓");

        let body = serde_json::to_value(&out).unwrap();
        assert_eq!(body, json!({"chat_id": "-4455", "text": "ünïcode ✓"}));
    }

    #[test]
    fn test_out_message_includes_parse_mode() {
        let msg = Message::outgoing("9", "*bold*").with_parse_mode(ParseMode::MarkdownV2);
        let body = serde_json::to_value(OutMessage::from(&msg)).unwrap();
        assert_eq!(body["parse_mode"], "MarkdownV2");
    }

    #[test]
    fn test_api_error_envelope() {
        let resp: ApiResponse = serde_json::from_value(json!({
            "ok": false,
            "error_code": 401,
            "description": "unauthorized"
        }))
        .unwrap();
        match resp.into_result() {
            Err(ApiError::Api { code, description }) => {
                assert_eq!(code, 401);
                assert_eq!(description, "unauthorized");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
