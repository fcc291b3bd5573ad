//! # Command Handlers
//!
//! Built-in commands. Each handler declares its metadata and is bound to a
//! name and module by [`register_all`].

use std::sync::Arc;

use crate::application::registry::CommandRegistry;
use crate::domain::error::RegistryError;

pub mod help;
pub mod moderation;
pub mod pathutils;
pub mod system;

pub fn register_all(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.register("help", "Core", Arc::new(help::HelpCommand))?;
    registry.register("ping", "System", Arc::new(system::PingCommand))?;
    registry.register("sleep", "System", Arc::new(system::SleepCommand))?;
    registry.register("cancel", "System", Arc::new(system::CancelCommand))?;
    registry.register("listdir", "Pathlib", Arc::new(pathutils::ListDirCommand))?;
    registry.register("whois", "Moderation", Arc::new(moderation::WhoisCommand))?;
    Ok(())
}
