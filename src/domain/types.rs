//! # Domain Types
//!
//! Transport-neutral message values shared by the transport, the resilient
//! message wrapper and the execution context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type ChatId = i64;
pub type MessageId = i64;
pub type UserId = i64;

/// Kind of conversation a message lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    #[default]
    Private,
    Group,
    Supergroup,
    Channel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(default)]
    pub kind: ChatKind,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Username when the user has one, otherwise the numeric id.
    ///
    /// Usernames resolve more reliably on the transport side than bare ids.
    pub fn preferred_ref(&self) -> UserRef {
        match &self.username {
            Some(name) => UserRef::Username(name.clone()),
            None => UserRef::Id(self.id),
        }
    }
}

/// A reference to a user as resolved from command input or a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(UserId),
    Username(String),
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRef::Id(id) => write!(f, "{id}"),
            UserRef::Username(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Mention,
    TextMention,
    Url,
    Code,
    Bold,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    pub kind: EntityKind,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub length: usize,
    /// Present for inline mentions of users without a public username.
    #[serde(default)]
    pub user: Option<User>,
}

/// A message exactly as the transport delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: MessageId,
    pub chat: Chat,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub from_user: Option<User>,
    /// Set when the message was sent by the bot's own account.
    #[serde(default)]
    pub outgoing: bool,
    #[serde(default)]
    pub forward_from: Option<User>,
    /// Display name of a forward origin that hides its account.
    #[serde(default)]
    pub forward_sender_name: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    #[serde(default)]
    pub reply_to: Option<Box<RawMessage>>,
    #[serde(default)]
    pub date: i64,
}

/// Formatting knobs forwarded verbatim to the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatOptions {
    pub disable_web_page_preview: bool,
    pub disable_notification: bool,
    /// Backend-specific extras (keyboards, effects, ...).
    pub extra: Map<String, Value>,
}

/// Options for sending a brand-new message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    pub format: FormatOptions,
    pub reply_to: Option<MessageId>,
}

/// Options for [`crate::application::message::ResilientMessage::reply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyOptions {
    /// `None` quotes in groups and stays unquoted in private chats.
    pub quote: Option<bool>,
    /// Overrides the quoted message id.
    pub reply_to: Option<MessageId>,
    pub format: FormatOptions,
}

/// Tag describing how a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Edit,
    Reply,
    Repost,
    Error,
}

