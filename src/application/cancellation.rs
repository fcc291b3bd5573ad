//! # Cancellation Registry
//!
//! Pending cancellation requests keyed by message id. An entry is inserted by
//! whoever wants a running process stopped and consumed by the first reader
//! that observes it. Handlers poll; nothing is interrupted.

use dashmap::DashSet;
use std::sync::Arc;

use crate::domain::traits::Cancellations;
use crate::domain::types::MessageId;

pub type SharedCancellations = Arc<dyn Cancellations>;

#[derive(Debug, Default)]
pub struct CancellationRegistry {
    pending: DashSet<MessageId>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Cancellations for CancellationRegistry {
    fn insert(&self, id: MessageId) {
        if self.pending.insert(id) {
            tracing::debug!("Cancellation requested for message {}", id);
        }
    }

    fn take_if_present(&self, id: MessageId) -> bool {
        self.pending.remove(&id).is_some()
    }
}
