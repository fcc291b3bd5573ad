//! # Infrastructure Layer
//!
//! Concrete backends behind the domain traits, plus process-level setup.

pub mod console;
pub mod logging;
