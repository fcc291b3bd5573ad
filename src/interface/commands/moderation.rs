//! # Moderation Commands
//!
//! `whois` reports who a moderation action would target, resolved from the
//! input or the replied-to message.

use async_trait::async_trait;

use crate::application::context::Context;
use crate::application::registry::{CommandHandler, CommandMeta};
use crate::strings::messages;

pub struct WhoisCommand;

#[async_trait]
impl CommandHandler for WhoisCommand {
    async fn invoke(&self, ctx: &mut Context) -> anyhow::Result<Option<String>> {
        let text = match ctx.target_user_and_reason() {
            (Some(user), reason) => messages::whois(&user.to_string(), reason.as_deref()),
            (None, _) => messages::NO_TARGET.to_string(),
        };
        Ok(Some(text))
    }

    fn meta(&self) -> CommandMeta {
        CommandMeta::new()
            .desc("Resolve the user a moderation command would act on.")
            .usage("<user> [reason]", false, true)
            .alias(["target"])
    }
}
