//! # Application Layer
//!
//! The dispatch runtime: command registry, cancellation registry, resilient
//! message wrapper, execution context, responder and the bot that ties them
//! together.

pub mod bot;
pub mod cancellation;
pub mod context;
pub mod message;
pub mod registry;
pub mod responder;
