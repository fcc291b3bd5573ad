//! # Interface Layer
//!
//! Feature handlers exposed to chat users.

pub mod commands;
