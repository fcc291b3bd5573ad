//! # Domain Traits
//!
//! Abstract interfaces the core consumes: the messaging transport, the
//! responder that turns handler output into sent messages, and the store of
//! pending cancellations.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::application::message::ResilientMessage;
use crate::domain::error::TransportFault;
use crate::domain::types::{
    ChatId, FormatOptions, MessageId, RawMessage, ResponseMode, SendOptions,
};

/// Send/edit/delete primitives addressed by chat + message identity.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new text message to a chat.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<RawMessage, TransportFault>;

    /// Replace the text of an existing message.
    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        format: &FormatOptions,
    ) -> Result<RawMessage, TransportFault>;

    /// Delete messages. `revoke` removes them for every participant.
    async fn delete_messages(
        &self,
        chat_id: ChatId,
        message_ids: &[MessageId],
        revoke: bool,
    ) -> Result<bool, TransportFault>;
}

/// Pending cancellation requests keyed by message id.
pub trait Cancellations: Send + Sync {
    fn insert(&self, id: MessageId);

    /// Remove `id` if pending. Each insert is observed by at most one caller.
    fn take_if_present(&self, id: MessageId) -> bool;
}

/// Everything a response needs besides its target and text.
#[derive(Debug, Clone, Default)]
pub struct ResponseRequest {
    pub mode: Option<ResponseMode>,
    /// `None` falls back to the configured default.
    pub redact: Option<bool>,
    pub format: FormatOptions,
}

/// Mode-aware response production plus detached task scheduling.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce a response to `target`, editing `prior` instead when given.
    async fn produce_response(
        &self,
        target: &ResilientMessage,
        text: &str,
        request: ResponseRequest,
        prior: Option<&mut ResilientMessage>,
    ) -> Result<ResilientMessage, TransportFault>;

    /// Schedule a task that nobody awaits.
    fn run_detached(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}
