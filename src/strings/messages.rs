//! # Messages
//!
//! Constant strings and format functions for user-facing responses.

pub const PONG: &str = "Pong!";
pub const PATH_NOT_FOUND: &str = "path not exists!";
pub const EMPTY_PATH: &str = "`empty path!`";
pub const NO_TARGET: &str = "No user given. Pass a user or reply to one of their messages.";
pub const CANCEL_NEEDS_REPLY: &str = "Reply to the message whose process should stop.";

pub fn missing_input(prefix: &str, name: &str, usage: &str) -> String {
    format!("Missing parameters.\n**Usage:** `{prefix}{name} {usage}`")
}

pub fn command_error(name: &str, err: &str) -> String {
    format!("Error executing command `{name}`:\n```\n{err}\n```")
}

pub fn pong_elapsed(ms: u128) -> String {
    format!("Pong! `{ms} ms`")
}

pub fn invalid_duration(input: &str) -> String {
    format!("`{input}` is not a number of seconds.")
}

pub fn sleeping(secs: u64) -> String {
    format!("Sleeping for {secs} s. Reply `cancel` to this command to stop.")
}

pub fn slept(secs: u64) -> String {
    format!("Slept for {secs} s.")
}

pub fn sleep_cancelled(after: u64) -> String {
    format!("Cancelled after {after} s.")
}

pub fn cancellation_requested(ids: &[i64]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| format!("`{id}`")).collect();
    format!("Cancellation requested for {}.", ids.join(", "))
}

pub fn whois(user: &str, reason: Option<&str>) -> String {
    format!("**User:** {user}\n**Reason:** {}", reason.unwrap_or("none"))
}

pub fn path_header(path: &str) -> String {
    format!("**PATH** : `{path}`\n\n")
}
