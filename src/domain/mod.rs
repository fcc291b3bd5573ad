//! # Domain Layer
//!
//! Core definitions, types, and traits that define the contract between the
//! dispatch runtime and whatever messaging backend carries it.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
