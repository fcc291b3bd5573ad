//! # Responder
//!
//! Default mode-aware response production: formats and redacts the text,
//! then edits the prior response, edits the target, or replies to it.

use async_trait::async_trait;

use crate::application::message::ResilientMessage;
use crate::domain::config::BotConfig;
use crate::domain::error::TransportFault;
use crate::domain::traits::{Responder, ResponseRequest};
use crate::domain::types::{ReplyOptions, ResponseMode};

const REDACTED: &str = "[REDACTED]";

pub struct ChatResponder {
    config: BotConfig,
}

impl ChatResponder {
    pub fn new(config: BotConfig) -> Self {
        Self { config }
    }

    fn format(&self, text: &str, mode: Option<ResponseMode>, redact: bool) -> String {
        let mut out = match mode {
            Some(ResponseMode::Error) => format!("⚠️ {text}"),
            _ => text.to_string(),
        };

        if redact {
            for secret in self.config.secrets.iter().filter(|s| !s.is_empty()) {
                out = out.replace(secret.as_str(), REDACTED);
            }
        }

        let limit = self.config.max_response_len;
        if limit > 0 && out.chars().count() > limit {
            out = out.chars().take(limit - 1).collect();
            out.push('…');
        }
        out
    }
}

#[async_trait]
impl Responder for ChatResponder {
    async fn produce_response(
        &self,
        target: &ResilientMessage,
        text: &str,
        request: ResponseRequest,
        prior: Option<&mut ResilientMessage>,
    ) -> Result<ResilientMessage, TransportFault> {
        let mode = request.mode.or(self.config.default_mode);
        let redact = request.redact.unwrap_or(self.config.redact);
        let text = self.format(text, mode, redact);

        if let Some(prior) = prior {
            return prior.edit(&text, &request.format, true).await;
        }

        let reply = |quote| ReplyOptions {
            quote,
            reply_to: None,
            format: request.format.clone(),
        };

        match mode {
            Some(ResponseMode::Reply) => target.reply(&text, reply(None)).await,
            Some(ResponseMode::Repost) => target.reply(&text, reply(Some(false))).await,
            Some(ResponseMode::Edit) | Some(ResponseMode::Error) | None => {
                if target.is_outgoing() {
                    let mut own = target.clone();
                    own.edit(&text, &request.format, true).await
                } else {
                    target.reply(&text, reply(None)).await
                }
            }
        }
    }
}
