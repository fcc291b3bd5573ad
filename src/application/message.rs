//! # Resilient Message
//!
//! Wraps one transport message with edit/reply/delete operations that degrade
//! gracefully when the transport refuses them, and with access to the
//! cooperative cancellation registry.
//!
//! The reply chain is wrapped eagerly so every ancestor carries the same
//! bindings as the head. Chains are built and torn down iteratively.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::application::cancellation::SharedCancellations;
use crate::domain::error::TransportFault;
use crate::domain::traits::Transport;
use crate::domain::types::{
    Chat, FormatOptions, MessageEntity, MessageId, RawMessage, ReplyOptions, SendOptions, User,
};

/// Shared handles every wrapped message in a chain is bound to.
#[derive(Clone)]
pub struct MessageBinding {
    pub transport: Arc<dyn Transport>,
    pub cancellations: SharedCancellations,
}

impl MessageBinding {
    pub fn new(transport: Arc<dyn Transport>, cancellations: SharedCancellations) -> Self {
        Self {
            transport,
            cancellations,
        }
    }
}

pub struct ResilientMessage {
    /// Head fields only; the ancestor lives in `reply_to`.
    raw: RawMessage,
    reply_to: Option<Box<ResilientMessage>>,
    binding: MessageBinding,
    cancel_observed: AtomicBool,
}

impl ResilientMessage {
    /// Wrap `raw` and its whole reply chain with the same bindings.
    pub(crate) fn wrap(mut raw: RawMessage, binding: &MessageBinding) -> Self {
        let mut ancestors = Vec::new();
        let mut next = raw.reply_to.take();
        while let Some(mut ancestor) = next {
            next = ancestor.reply_to.take();
            ancestors.push(*ancestor);
        }

        let reply_to = ancestors.into_iter().rev().fold(None, |inner, raw| {
            Some(Box::new(Self::from_parts(raw, inner, binding.clone(), false)))
        });

        Self::from_parts(raw, reply_to, binding.clone(), false)
    }

    fn from_parts(
        raw: RawMessage,
        reply_to: Option<Box<ResilientMessage>>,
        binding: MessageBinding,
        cancel_observed: bool,
    ) -> Self {
        Self {
            raw,
            reply_to,
            binding,
            cancel_observed: AtomicBool::new(cancel_observed),
        }
    }

    pub fn id(&self) -> MessageId {
        self.raw.id
    }

    pub fn chat(&self) -> &Chat {
        &self.raw.chat
    }

    pub fn text(&self) -> &str {
        &self.raw.text
    }

    pub fn from_user(&self) -> Option<&User> {
        self.raw.from_user.as_ref()
    }

    pub fn is_outgoing(&self) -> bool {
        self.raw.outgoing
    }

    pub fn forward_from(&self) -> Option<&User> {
        self.raw.forward_from.as_ref()
    }

    pub fn forward_sender_name(&self) -> Option<&str> {
        self.raw.forward_sender_name.as_deref()
    }

    pub fn entities(&self) -> &[MessageEntity] {
        &self.raw.entities
    }

    pub fn reply_to(&self) -> Option<&ResilientMessage> {
        self.reply_to.as_deref()
    }

    /// Edit the text of this message.
    ///
    /// Unchanged content yields `self`. When the transport refuses the edit
    /// (foreign author, vanished id) and `allow_fallback` is set, the text is
    /// sent as a fresh reply and this wrapper becomes that new message.
    pub async fn edit(
        &mut self,
        text: &str,
        format: &FormatOptions,
        allow_fallback: bool,
    ) -> Result<ResilientMessage, TransportFault> {
        let result = self
            .binding
            .transport
            .edit_message_text(self.raw.chat.id, self.raw.id, text, format)
            .await;

        match result {
            Ok(edited) => Ok(Self::wrap(edited, &self.binding)),
            Err(TransportFault::NotModified) => {
                tracing::debug!("Edit of message {} left content unchanged", self.raw.id);
                Ok(self.clone())
            }
            Err(fault @ (TransportFault::EditNotAllowed | TransportFault::MessageIdInvalid))
                if allow_fallback =>
            {
                tracing::warn!(
                    "Edit of message {} refused ({}), replying instead",
                    self.raw.id,
                    fault
                );
                let options = ReplyOptions {
                    format: format.clone(),
                    ..ReplyOptions::default()
                };
                let sent = self.reply(text, options).await?;
                // The conversation continues from the new message.
                *self = sent.clone();
                Ok(sent)
            }
            Err(fault) => Err(fault),
        }
    }

    /// Send a new message addressed as a reply to this one.
    pub async fn reply(
        &self,
        text: &str,
        options: ReplyOptions,
    ) -> Result<ResilientMessage, TransportFault> {
        let quote = options.quote.unwrap_or(!self.raw.chat.is_private());
        let reply_to = match options.reply_to {
            None if quote => Some(self.raw.id),
            other => other,
        };
        let send = SendOptions {
            format: options.format,
            reply_to,
        };

        let sent = self
            .binding
            .transport
            .send_message(self.raw.chat.id, text, &send)
            .await?;
        Ok(Self::wrap(sent, &self.binding))
    }

    /// Delete this message. A permission refusal becomes `Ok(false)` when
    /// `allow_fallback` is set.
    pub async fn delete(&self, revoke: bool, allow_fallback: bool) -> Result<bool, TransportFault> {
        let result = self
            .binding
            .transport
            .delete_messages(self.raw.chat.id, &[self.raw.id], revoke)
            .await;

        match result {
            Ok(deleted) => Ok(deleted),
            Err(TransportFault::DeleteNotAllowed) if allow_fallback => {
                tracing::debug!("Delete of message {} not allowed, skipping", self.raw.id);
                Ok(false)
            }
            Err(fault) => Err(fault),
        }
    }

    /// Whether a cancellation was requested for this message's process.
    ///
    /// Consumes the pending entry. Once true, stays true for this wrapper.
    pub fn cancellation_requested(&self) -> bool {
        if self.binding.cancellations.take_if_present(self.raw.id) {
            self.cancel_observed.store(true, Ordering::SeqCst);
        }
        self.cancel_observed.load(Ordering::SeqCst)
    }

    /// Ask whoever is processing this message to stop.
    pub fn request_cancellation(&self) {
        self.binding.cancellations.insert(self.raw.id);
    }
}

impl Clone for ResilientMessage {
    fn clone(&self) -> Self {
        let mut chain = Vec::new();
        let mut next = self.reply_to.as_deref();
        while let Some(ancestor) = next {
            chain.push(ancestor);
            next = ancestor.reply_to.as_deref();
        }

        let reply_to = chain.into_iter().rev().fold(None, |inner, ancestor| {
            Some(Box::new(Self::from_parts(
                ancestor.raw.clone(),
                inner,
                ancestor.binding.clone(),
                ancestor.cancel_observed.load(Ordering::SeqCst),
            )))
        });

        Self::from_parts(
            self.raw.clone(),
            reply_to,
            self.binding.clone(),
            self.cancel_observed.load(Ordering::SeqCst),
        )
    }
}

impl Drop for ResilientMessage {
    fn drop(&mut self) {
        let mut next = self.reply_to.take();
        while let Some(mut ancestor) = next {
            next = ancestor.reply_to.take();
        }
    }
}

impl fmt::Debug for ResilientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientMessage")
            .field("id", &self.raw.id)
            .field("chat", &self.raw.chat)
            .field("text", &self.raw.text)
            .field("reply_to", &self.reply_to.as_ref().map(|m| m.raw.id))
            .finish()
    }
}
