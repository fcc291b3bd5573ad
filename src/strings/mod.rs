//! # Strings Module
//!
//! Centralizes user-facing strings and help text.

pub mod help;
pub mod messages;
