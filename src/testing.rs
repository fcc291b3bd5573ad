//! Scripted transport and builders shared by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::bot::{Bot, split_invocation};
use crate::application::cancellation::CancellationRegistry;
use crate::application::context::Context;
use crate::application::message::{MessageBinding, ResilientMessage};
use crate::application::registry::CommandRegistry;
use crate::application::responder::ChatResponder;
use crate::domain::config::{AppConfig, BotConfig};
use crate::domain::error::TransportFault;
use crate::domain::traits::{Responder, ResponseRequest, Transport};
use crate::domain::types::{
    Chat, ChatId, ChatKind, FormatOptions, MessageId, RawMessage, ReplyOptions, ResponseMode,
    SendOptions, User,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send {
        chat_id: ChatId,
        text: String,
        reply_to: Option<MessageId>,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    Delete {
        chat_id: ChatId,
        message_ids: Vec<MessageId>,
        revoke: bool,
    },
}

/// Records every call and fails the next edit/delete on request.
pub struct StubTransport {
    chat_kind: ChatKind,
    next_id: AtomicI64,
    calls: Mutex<Vec<Call>>,
    edit_faults: Mutex<VecDeque<TransportFault>>,
    delete_faults: Mutex<VecDeque<TransportFault>>,
}

impl StubTransport {
    pub fn new(chat_kind: ChatKind) -> Arc<Self> {
        Arc::new(Self {
            chat_kind,
            next_id: AtomicI64::new(1000),
            calls: Mutex::new(Vec::new()),
            edit_faults: Mutex::new(VecDeque::new()),
            delete_faults: Mutex::new(VecDeque::new()),
        })
    }

    pub fn fail_next_edit(&self, fault: TransportFault) {
        self.edit_faults.lock().unwrap().push_back(fault);
    }

    pub fn fail_next_delete(&self, fault: TransportFault) {
        self.delete_faults.lock().unwrap().push_back(fault);
    }

    /// Injected delete faults not yet consumed.
    pub fn pending_delete_faults(&self) -> usize {
        self.delete_faults.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Send { .. }))
            .count()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn bot_message(&self, chat_id: ChatId, id: MessageId, text: &str) -> RawMessage {
        let mut raw = raw_message(id, self.chat_kind, text);
        raw.chat.id = chat_id;
        raw.outgoing = true;
        raw.from_user = Some(User {
            id: 1,
            username: Some("courier_bot".into()),
        });
        raw
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<RawMessage, TransportFault> {
        self.record(Call::Send {
            chat_id,
            text: text.to_string(),
            reply_to: options.reply_to,
        });
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(self.bot_message(chat_id, id, text))
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        _format: &FormatOptions,
    ) -> Result<RawMessage, TransportFault> {
        if let Some(fault) = self.edit_faults.lock().unwrap().pop_front() {
            return Err(fault);
        }
        self.record(Call::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(self.bot_message(chat_id, message_id, text))
    }

    async fn delete_messages(
        &self,
        chat_id: ChatId,
        message_ids: &[MessageId],
        revoke: bool,
    ) -> Result<bool, TransportFault> {
        if let Some(fault) = self.delete_faults.lock().unwrap().pop_front() {
            return Err(fault);
        }
        self.record(Call::Delete {
            chat_id,
            message_ids: message_ids.to_vec(),
            revoke,
        });
        Ok(true)
    }
}

pub fn binding_for(stub: &Arc<StubTransport>) -> MessageBinding {
    MessageBinding::new(stub.clone(), Arc::new(CancellationRegistry::new()))
}

/// An inbound message from a regular user in chat 1.
pub fn raw_message(id: MessageId, kind: ChatKind, text: &str) -> RawMessage {
    RawMessage {
        id,
        chat: Chat { id: 1, kind },
        text: text.to_string(),
        from_user: Some(User {
            id: 42,
            username: Some("alice".into()),
        }),
        outgoing: false,
        forward_from: None,
        forward_sender_name: None,
        entities: Vec::new(),
        reply_to: None,
        date: 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResponse {
    pub target: MessageId,
    pub text: String,
    pub mode: Option<ResponseMode>,
    pub prior: Option<MessageId>,
}

/// Records what the context asked for; edits the prior or replies.
#[derive(Default)]
pub struct RecordingResponder {
    responses: Mutex<Vec<RecordedResponse>>,
}

impl RecordingResponder {
    pub fn responses(&self) -> Vec<RecordedResponse> {
        self.responses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn produce_response(
        &self,
        target: &ResilientMessage,
        text: &str,
        request: ResponseRequest,
        prior: Option<&mut ResilientMessage>,
    ) -> Result<ResilientMessage, TransportFault> {
        self.responses.lock().unwrap().push(RecordedResponse {
            target: target.id(),
            text: text.to_string(),
            mode: request.mode,
            prior: prior.as_ref().map(|p| p.id()),
        });
        match prior {
            Some(prior) => prior.edit(text, &request.format, true).await,
            None => target.reply(text, ReplyOptions::default()).await,
        }
    }
}

/// A bot with no commands whose responses are recorded.
pub fn test_bot(stub: &Arc<StubTransport>) -> (Arc<Bot>, Arc<RecordingResponder>) {
    let recorder = Arc::new(RecordingResponder::default());
    let bot = Bot::new(
        AppConfig::default(),
        CommandRegistry::new(),
        recorder.clone(),
        binding_for(stub),
    );
    (Arc::new(bot), recorder)
}

/// A bot with the default responder and the given commands.
pub fn test_bot_with(stub: &Arc<StubTransport>, registry: CommandRegistry) -> Arc<Bot> {
    let config = AppConfig::default();
    let responder = Arc::new(ChatResponder::new(BotConfig::default()));
    Arc::new(Bot::new(config, registry, responder, binding_for(stub)))
}

/// Build the context a prefix invocation in `raw` would get.
pub fn context_for(bot: &Arc<Bot>, raw: RawMessage) -> Context {
    let invocation = split_invocation(bot.prefix(), &raw.text).unwrap_or_else(|| {
        panic!("not an invocation: {}", raw.text);
    });
    let msg = ResilientMessage::wrap(raw, bot.binding());
    Context::new(
        bot.clone(),
        msg,
        invocation.segments,
        invocation.cmd_len,
        Vec::new(),
    )
}
