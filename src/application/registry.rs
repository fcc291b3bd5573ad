//! # Command Registry
//!
//! Binds declarative metadata (description, usage, aliases, trigger pattern)
//! to a handler at registration time. Commands are immutable afterwards and
//! every name and alias resolves to exactly one of them.

use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::application::context::Context;
use crate::domain::error::RegistryError;

pub type SharedHandler = Arc<dyn CommandHandler>;

/// A feature handler.
///
/// `Ok(Some(text))` is sent as the command's response.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn invoke(&self, ctx: &mut Context) -> anyhow::Result<Option<String>>;

    /// Metadata read once when the handler is registered.
    fn meta(&self) -> CommandMeta {
        CommandMeta::default()
    }
}

/// Declarative metadata describing a handler.
#[derive(Debug, Clone, Default)]
pub struct CommandMeta {
    pub description: Option<String>,
    pub usage: Option<String>,
    /// Input may be omitted even though a usage is declared.
    pub usage_optional: bool,
    /// Replying to a message can stand in for the input.
    pub usage_reply: bool,
    pub aliases: Vec<String>,
    pub pattern: Option<Regex>,
}

impl CommandMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn desc(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>, optional: bool, reply: bool) -> Self {
        self.usage = Some(usage.into());
        self.usage_optional = optional;
        self.usage_reply = reply;
        self
    }

    pub fn alias<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }
}

pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub usage_optional: bool,
    pub usage_reply: bool,
    pub aliases: Vec<String>,
    pub pattern: Option<Regex>,
    pub module: String,
    handler: SharedHandler,
}

impl Command {
    /// Build a command from the handler's declared metadata.
    pub fn register(name: impl Into<String>, module: impl Into<String>, handler: SharedHandler) -> Self {
        let meta = handler.meta();
        Self {
            name: name.into(),
            description: meta.description,
            usage: meta.usage,
            usage_optional: meta.usage_optional,
            usage_reply: meta.usage_reply,
            aliases: meta.aliases,
            pattern: meta.pattern,
            module: module.into(),
            handler,
        }
    }

    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    /// Name followed by aliases.
    pub fn invokers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("aliases", &self.aliases)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .finish_non_exhaustive()
    }
}

/// Name/alias namespace for registered commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<Command>>,
    index: HashMap<String, Arc<Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        module: impl Into<String>,
        handler: SharedHandler,
    ) -> Result<Arc<Command>, RegistryError> {
        self.insert(Command::register(name, module, handler))
    }

    pub fn insert(&mut self, command: Command) -> Result<Arc<Command>, RegistryError> {
        let mut keys: Vec<String> = Vec::new();
        for invoker in command.invokers() {
            let key = invoker.to_lowercase();
            if let Some(owner) = self.index.get(&key) {
                return Err(RegistryError::DuplicateName {
                    name: key,
                    owner: owner.name.clone(),
                });
            }
            if keys.contains(&key) {
                return Err(RegistryError::DuplicateName {
                    name: key,
                    owner: command.name.clone(),
                });
            }
            keys.push(key);
        }

        let command = Arc::new(command);
        for key in keys {
            self.index.insert(key, command.clone());
        }
        self.commands.push(command.clone());
        tracing::debug!("Registered command '{}' ({})", command.name, command.module);
        Ok(command)
    }

    /// Resolve a name or alias, case-insensitively.
    pub fn get(&self, invoker: &str) -> Option<&Arc<Command>> {
        self.index.get(&invoker.to_lowercase())
    }

    /// All commands in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter()
    }

    pub fn pattern_commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter().filter(|cmd| cmd.pattern.is_some())
    }

    pub fn by_module(&self) -> BTreeMap<&str, Vec<&Arc<Command>>> {
        let mut modules: BTreeMap<&str, Vec<&Arc<Command>>> = BTreeMap::new();
        for cmd in &self.commands {
            modules.entry(cmd.module.as_str()).or_default().push(cmd);
        }
        modules
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
