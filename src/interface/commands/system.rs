//! # System Commands
//!
//! `ping`, `sleep` and `cancel`. `sleep` is the reference for cooperative
//! cancellation: it polls the invoking message between one-second naps.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::application::context::{Context, RespondOptions};
use crate::application::registry::{CommandHandler, CommandMeta};
use crate::strings::messages;

const MAX_SLEEP_SECS: u64 = 3600;

pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    async fn invoke(&self, ctx: &mut Context) -> anyhow::Result<Option<String>> {
        let start = Instant::now();
        ctx.respond(messages::PONG, RespondOptions::default()).await?;
        let elapsed = start.elapsed().as_millis();
        ctx.respond(&messages::pong_elapsed(elapsed), RespondOptions::reuse())
            .await?;
        Ok(None)
    }

    fn meta(&self) -> CommandMeta {
        CommandMeta::new().desc("Measure the response round trip.")
    }
}

pub struct SleepCommand;

#[async_trait]
impl CommandHandler for SleepCommand {
    async fn invoke(&self, ctx: &mut Context) -> anyhow::Result<Option<String>> {
        let input = ctx.filtered_input().to_string();
        let secs = match input.parse::<u64>() {
            Ok(secs) => secs.min(MAX_SLEEP_SECS),
            Err(_) => return Ok(Some(messages::invalid_duration(&input))),
        };
        let delete_after = ctx
            .flags()
            .get("-d")
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs);

        ctx.respond(&messages::sleeping(secs), RespondOptions::default())
            .await?;

        let mut elapsed = 0;
        let text = loop {
            if ctx.msg().cancellation_requested() {
                tracing::info!("Sleep in message {} cancelled after {} s", ctx.msg().id(), elapsed);
                break messages::sleep_cancelled(elapsed);
            }
            if elapsed >= secs {
                break messages::slept(secs);
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
            elapsed += 1;
        };

        let options = RespondOptions {
            reuse_response: Some(true),
            delete_after,
            ..RespondOptions::default()
        };
        ctx.respond(&text, options).await?;
        Ok(None)
    }

    fn meta(&self) -> CommandMeta {
        CommandMeta::new()
            .desc("Sleep for a while. `-d<N>` deletes the result after N seconds.")
            .usage("<seconds> [-d<N>]", false, false)
    }
}

pub struct CancelCommand;

#[async_trait]
impl CommandHandler for CancelCommand {
    async fn invoke(&self, ctx: &mut Context) -> anyhow::Result<Option<String>> {
        if let Ok(id) = ctx.filtered_input().parse::<i64>() {
            ctx.bot().cancellations().insert(id);
            return Ok(Some(messages::cancellation_requested(&[id])));
        }

        let Some(reply) = ctx.msg().reply_to() else {
            return Ok(Some(messages::CANCEL_NEEDS_REPLY.to_string()));
        };

        let mut ids = vec![reply.id()];
        reply.request_cancellation();
        // A status message of ours stands in for the command it answers.
        if reply.is_outgoing()
            && let Some(origin) = reply.reply_to()
        {
            origin.request_cancellation();
            ids.push(origin.id());
        }
        Ok(Some(messages::cancellation_requested(&ids)))
    }

    fn meta(&self) -> CommandMeta {
        CommandMeta::new()
            .desc("Stop the process running for the replied message (or a message id).")
            .usage("[message id]", false, true)
            .alias(["stop"])
    }
}
