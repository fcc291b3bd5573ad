//! # Courier
//!
//! Command dispatch and response runtime for a chat bot.
//!
//! - Domain: configuration, transport/responder traits, message types
//! - Application: registry, cancellation, resilient messages, context, dispatch
//! - Infrastructure: console transport, logging
//! - Interface: built-in command handlers

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod strings;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;
