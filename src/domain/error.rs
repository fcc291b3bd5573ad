//! # Error Types
//!
//! Typed faults raised by the transport and the command registry.

use thiserror::Error;

/// Distinguishable failures reported by a [`crate::domain::traits::Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFault {
    /// The edit carried exactly the content already shown.
    #[error("message content is not modified")]
    NotModified,

    /// Only the original author may edit this message.
    #[error("editing this message is not allowed for this account")]
    EditNotAllowed,

    #[error("message id is invalid or no longer exists")]
    MessageIdInvalid,

    #[error("deleting this message is forbidden")]
    DeleteNotAllowed,

    #[error("transport error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command name or alias '{name}' is already registered by '{owner}'")]
    DuplicateName { name: String, owner: String },
}
