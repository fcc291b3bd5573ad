//! # Help Text
//!
//! Renders the command listing and per-command details.

use crate::application::registry::{Command, CommandRegistry};
use crate::util::sublists;

const NAMES_PER_ROW: usize = 4;

pub fn command_not_found(name: &str) -> String {
    format!("Command `{name}` doesn't exist.")
}

/// Every command grouped by module, modules sorted by name.
pub fn listing(registry: &CommandRegistry) -> String {
    let mut out = String::from("**Available commands:**\n");
    for (module, commands) in registry.by_module() {
        let names: Vec<String> = commands.iter().map(|c| format!("`{}`", c.name)).collect();
        out.push_str(&format!("\n**{module}**"));
        for row in sublists(&names, NAMES_PER_ROW) {
            out.push_str(&format!("\n  {}", row.join(", ")));
        }
    }
    out
}

pub fn details(prefix: &str, command: &Command) -> String {
    let mut out = format!("`{prefix}{}`", command.name);
    if let Some(usage) = &command.usage {
        out.push_str(&format!(" `{usage}`"));
        if command.usage_optional {
            out.push_str(" (optional)");
        }
        if command.usage_reply {
            out.push_str(" (or reply)");
        }
    }
    out.push_str(&format!(
        "\n{}",
        command.description.as_deref().unwrap_or("No description.")
    ));
    if !command.aliases.is_empty() {
        out.push_str(&format!("\n**Aliases:** {}", command.aliases.join(", ")));
    }
    out.push_str(&format!("\n**Module:** {}", command.module));
    out
}
