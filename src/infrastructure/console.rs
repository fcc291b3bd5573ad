//! # Console Transport
//!
//! Local backend for running the bot from a terminal. Messages live in
//! memory and are echoed to stdout; the transport enforces the same refusals
//! a real messaging backend would (foreign edits, stale ids, protected
//! deletes) so the fallback paths can be exercised by hand.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;

use crate::domain::config::ConsoleConfig;
use crate::domain::error::TransportFault;
use crate::domain::traits::Transport;
use crate::domain::types::{
    Chat, ChatId, ChatKind, FormatOptions, MessageId, RawMessage, SendOptions, User,
};

const BOT_USER_ID: i64 = 1;

/// Ancestors attached to a message handed out by the store.
const MAX_REPLY_DEPTH: usize = 32;

struct Stored {
    /// Always stored without its chain; `reply_to` links by id.
    raw: RawMessage,
    reply_to: Option<MessageId>,
}

/// Bounded message history, oldest evicted first.
struct Store {
    limit: usize,
    messages: HashMap<MessageId, Stored>,
    order: VecDeque<MessageId>,
}

impl Store {
    fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            messages: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn insert(&mut self, mut raw: RawMessage) {
        let reply_to = raw.reply_to.take().map(|parent| parent.id);
        self.order.push_back(raw.id);
        self.messages.insert(raw.id, Stored { raw, reply_to });

        while self.order.len() > self.limit {
            if let Some(oldest) = self.order.pop_front() {
                self.messages.remove(&oldest);
                tracing::trace!("Console history dropped message {}", oldest);
            }
        }
    }

    fn remove(&mut self, id: MessageId) -> bool {
        if self.messages.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|kept| *kept != id);
        true
    }

    fn get(&self, id: MessageId) -> Option<&RawMessage> {
        self.messages.get(&id).map(|stored| &stored.raw)
    }

    /// `id` with every ancestor still in history attached.
    fn chain(&self, id: MessageId) -> Option<RawMessage> {
        let mut lineage = Vec::new();
        let mut next = Some(id);
        while let Some(id) = next
            && lineage.len() < MAX_REPLY_DEPTH
        {
            let Some(stored) = self.messages.get(&id) else {
                break;
            };
            lineage.push(stored.raw.clone());
            next = stored.reply_to;
        }

        let mut chain = lineage.pop()?;
        while let Some(mut child) = lineage.pop() {
            child.reply_to = Some(Box::new(chain));
            chain = child;
        }
        Some(chain)
    }
}

pub struct ConsoleTransport {
    config: ConsoleConfig,
    bot_user: User,
    next_id: AtomicI64,
    store: Mutex<Store>,
    echo: bool,
}

impl ConsoleTransport {
    pub fn new(config: ConsoleConfig) -> Self {
        let store = Store::new(config.history);
        Self {
            config,
            bot_user: User {
                id: BOT_USER_ID,
                username: Some("courier".to_string()),
            },
            next_id: AtomicI64::new(1),
            store: Mutex::new(store),
            echo: true,
        }
    }

    /// Stop echoing to stdout.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    fn chat(&self) -> Chat {
        Chat {
            id: self.config.chat_id,
            kind: self.config.chat_kind,
        }
    }

    fn check_chat(&self, chat_id: ChatId) -> Result<(), TransportFault> {
        if chat_id == self.config.chat_id {
            Ok(())
        } else {
            Err(TransportFault::Other(format!("unknown chat {chat_id}")))
        }
    }

    fn print(&self, line: String) {
        if self.echo {
            println!("{line}");
        }
    }

    pub async fn get(&self, id: MessageId) -> Option<RawMessage> {
        self.store.lock().await.chain(id)
    }

    /// Record a line typed by the console user.
    ///
    /// A leading `^<id>` makes the line a reply to message `<id>`.
    pub async fn inbound(&self, line: &str) -> RawMessage {
        let (reply_id, text) = parse_reply_marker(line);
        let mut store = self.store.lock().await;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = RawMessage {
            id,
            chat: self.chat(),
            text: text.to_string(),
            from_user: Some(User {
                id: self.config.user_id,
                username: self.config.username.clone(),
            }),
            outgoing: false,
            forward_from: None,
            forward_sender_name: None,
            entities: Vec::new(),
            reply_to: reply_id.and_then(|rid| store.chain(rid)).map(Box::new),
            date: chrono::Utc::now().timestamp(),
        };
        store.insert(message.clone());
        self.print(format!("[#{id}] you: {text}"));
        message
    }
}

fn parse_reply_marker(line: &str) -> (Option<MessageId>, &str) {
    if let Some(rest) = line.strip_prefix('^') {
        let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if let Ok(id) = id.parse() {
            return (Some(id), text.trim_start());
        }
    }
    (None, line)
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<RawMessage, TransportFault> {
        self.check_chat(chat_id)?;
        let mut store = self.store.lock().await;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = RawMessage {
            id,
            chat: self.chat(),
            text: text.to_string(),
            from_user: Some(self.bot_user.clone()),
            outgoing: true,
            forward_from: None,
            forward_sender_name: None,
            entities: Vec::new(),
            reply_to: options
                .reply_to
                .and_then(|rid| store.chain(rid))
                .map(Box::new),
            date: chrono::Utc::now().timestamp(),
        };
        store.insert(message.clone());

        match options.reply_to {
            Some(rid) => self.print(format!("[#{id} -> #{rid}] bot: {text}")),
            None => self.print(format!("[#{id}] bot: {text}")),
        }
        Ok(message)
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        _format: &FormatOptions,
    ) -> Result<RawMessage, TransportFault> {
        self.check_chat(chat_id)?;
        let mut store = self.store.lock().await;

        let stored = store
            .messages
            .get_mut(&message_id)
            .ok_or(TransportFault::MessageIdInvalid)?;
        if !stored.raw.outgoing {
            return Err(TransportFault::EditNotAllowed);
        }
        if stored.raw.text == text {
            return Err(TransportFault::NotModified);
        }

        stored.raw.text = text.to_string();
        self.print(format!("[#{message_id} edited] bot: {text}"));
        store.chain(message_id).ok_or(TransportFault::MessageIdInvalid)
    }

    async fn delete_messages(
        &self,
        chat_id: ChatId,
        message_ids: &[MessageId],
        _revoke: bool,
    ) -> Result<bool, TransportFault> {
        self.check_chat(chat_id)?;
        let mut store = self.store.lock().await;

        let protected = self.config.chat_kind != ChatKind::Private;
        if protected
            && message_ids
                .iter()
                .filter_map(|id| store.get(*id))
                .any(|m| !m.outgoing)
        {
            return Err(TransportFault::DeleteNotAllowed);
        }

        let mut deleted = false;
        for id in message_ids {
            if store.remove(*id) {
                self.print(format!("[#{id} deleted]"));
                deleted = true;
            }
        }
        Ok(deleted)
    }
}
