//! # Bot
//!
//! Routes inbound messages to registered commands. Each message is wrapped
//! (with its reply chain), matched by prefix + name/alias or by trigger
//! pattern, and handed to the handler inside a fresh [`Context`].

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::cancellation::SharedCancellations;
use crate::application::context::{Context, PatternMatch, RespondOptions};
use crate::application::message::{MessageBinding, ResilientMessage};
use crate::application::registry::{Command, CommandRegistry};
use crate::domain::config::AppConfig;
use crate::domain::traits::Responder;
use crate::domain::types::{RawMessage, ResponseMode};
use crate::strings::messages;

/// Segments and prefix length of a prefix-style invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub segments: Vec<String>,
    pub cmd_len: usize,
}

/// Split `text` into segments when it starts with `prefix`.
///
/// `cmd_len` covers the prefix, the invoker and one separator character.
pub(crate) fn split_invocation(prefix: &str, text: &str) -> Option<Invocation> {
    let body = text.strip_prefix(prefix)?;
    let segments: Vec<String> = body.split_whitespace().map(str::to_string).collect();
    let invoker = segments.first()?;

    let start = prefix.len() + (body.len() - body.trim_start().len());
    let end = start + invoker.len();
    let separator = text[end..].chars().next().map_or(0, char::len_utf8);

    Some(Invocation {
        segments,
        cmd_len: end + separator,
    })
}

pub struct Bot {
    config: AppConfig,
    registry: CommandRegistry,
    responder: Arc<dyn Responder>,
    binding: MessageBinding,
}

impl Bot {
    pub fn new(
        config: AppConfig,
        registry: CommandRegistry,
        responder: Arc<dyn Responder>,
        binding: MessageBinding,
    ) -> Self {
        Self {
            config,
            registry,
            responder,
            binding,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn prefix(&self) -> &str {
        &self.config.bot.prefix
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn responder(&self) -> &Arc<dyn Responder> {
        &self.responder
    }

    pub fn binding(&self) -> &MessageBinding {
        &self.binding
    }

    pub fn cancellations(&self) -> &SharedCancellations {
        &self.binding.cancellations
    }

    /// Dispatch every inbound message on its own task until the channel closes.
    pub async fn serve(self: Arc<Self>, mut inbound: mpsc::Receiver<RawMessage>) {
        while let Some(raw) = inbound.recv().await {
            let bot = self.clone();
            tokio::spawn(async move {
                let id = raw.id;
                if let Err(e) = bot.dispatch(raw).await {
                    tracing::error!("Dispatch of message {} failed: {:#}", id, e);
                }
            });
        }
        tracing::info!("Inbound channel closed, dispatcher stopping");
    }

    /// Run the command `raw` invokes, if any. Returns whether one ran.
    pub async fn dispatch(self: &Arc<Self>, raw: RawMessage) -> Result<bool> {
        if raw.outgoing {
            return Ok(false);
        }

        let msg = ResilientMessage::wrap(raw, &self.binding);
        let Some((command, invocation, matches)) = self.resolve(msg.text()) else {
            return Ok(false);
        };

        tracing::info!(
            "Dispatching cmd='{}' invoker='{}' chat={} msg={}",
            command.name,
            invocation.segments.first().map(String::as_str).unwrap_or_default(),
            msg.chat().id,
            msg.id()
        );

        let mut ctx = Context::new(
            self.clone(),
            msg,
            invocation.segments,
            invocation.cmd_len,
            matches,
        );

        if let Some(usage) = missing_usage(&command, &ctx) {
            let text = messages::missing_input(self.prefix(), &command.name, usage);
            ctx.respond(&text, RespondOptions::mode(ResponseMode::Error))
                .await?;
            return Ok(true);
        }

        match command.handler().invoke(&mut ctx).await {
            Ok(Some(text)) => {
                ctx.respond(&text, RespondOptions::default()).await?;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Error in command '{}': {:#}", command.name, e);
                let text = messages::command_error(&command.name, &format!("{e:#}"));
                ctx.respond(&text, RespondOptions::mode(ResponseMode::Error))
                    .await?;
            }
        }
        Ok(true)
    }

    fn resolve(&self, text: &str) -> Option<(Arc<Command>, Invocation, Vec<PatternMatch>)> {
        if let Some(invocation) = split_invocation(self.prefix(), text)
            && let Some(command) = invocation
                .segments
                .first()
                .and_then(|invoker| self.registry.get(invoker))
        {
            return Some((command.clone(), invocation, Vec::new()));
        }

        self.registry.pattern_commands().find_map(|command| {
            let pattern = command.pattern.as_ref()?;
            let matches: Vec<PatternMatch> = pattern
                .captures_iter(text)
                .map(|caps| PatternMatch::from_captures(&caps))
                .collect();
            if matches.is_empty() {
                return None;
            }
            let invocation = Invocation {
                segments: text.split_whitespace().map(str::to_string).collect(),
                cmd_len: 0,
            };
            Some((command.clone(), invocation, matches))
        })
    }
}

/// The usage string to show when required input is missing.
fn missing_usage<'a>(command: &'a Command, ctx: &Context) -> Option<&'a str> {
    let usage = command.usage.as_deref()?;
    if command.usage_optional || !ctx.input().trim().is_empty() {
        return None;
    }
    if command.usage_reply && ctx.msg().reply_to().is_some() {
        return None;
    }
    Some(usage)
}
