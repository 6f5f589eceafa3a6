pub mod telegram;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of chat a message was posted in.
///
/// Unknown wire strings map to [`ChatType::Unknown`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[default]
    Unknown,
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatType {
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "private" => ChatType::Private,
            "group" => ChatType::Group,
            "supergroup" => ChatType::Supergroup,
            "channel" => ChatType::Channel,
            _ => ChatType::Unknown,
        }
    }
}

/// Rendering mode understood by the Bot API `parse_mode` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
            ParseMode::MarkdownV2 => "MarkdownV2",
            ParseMode::Html => "HTML",
        }
    }
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChatType,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

/// A chat message, independent of the Bot API wire format.
///
/// Identifiers are strings so consumers never depend on the numeric width
/// the remote side happens to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub from: User,
    pub date: DateTime<Utc>,
    pub chat: Chat,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

impl Message {
    /// Build an outgoing reply to `chat_id`. Only the chat id, text and
    /// parse mode are used by the outbox.
    pub fn outgoing(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            from: User::default(),
            date: Utc::now(),
            chat: Chat {
                id: chat_id.into(),
                ..Chat::default()
            },
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }
}

/// Emitted instead of a plain message when a group was upgraded to a
/// supergroup and therefore changed id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMigration {
    pub message: Message,
    pub from_chat_id: String,
    pub to_chat_id: String,
}

/// What a plugin receives on its inbound queue. Exactly one variant is
/// produced per update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inbound {
    Message(Message),
    ChatMigrated(ChatMigration),
}

impl Inbound {
    /// The message carried by either variant.
    pub fn message(&self) -> &Message {
        match self {
            Inbound::Message(m) => m,
            Inbound::ChatMigrated(m) => &m.message,
        }
    }
}
