//! # Help Command
//!
//! Lists every command, or shows the details of one.

use async_trait::async_trait;

use crate::application::context::Context;
use crate::application::registry::{CommandHandler, CommandMeta};
use crate::strings::help;

pub struct HelpCommand;

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn invoke(&self, ctx: &mut Context) -> anyhow::Result<Option<String>> {
        let bot = ctx.bot();
        let text = match ctx.args().first() {
            Some(name) => match bot.registry().get(name) {
                Some(command) => help::details(bot.prefix(), command),
                None => help::command_not_found(name),
            },
            None => help::listing(bot.registry()),
        };
        Ok(Some(text))
    }

    fn meta(&self) -> CommandMeta {
        CommandMeta::new()
            .desc("List available commands or show help for one.")
            .usage("[command]", true, false)
            .alias(["h"])
    }
}
