//! Pending-choice registry
//!
//! Short-lived, per-user, single-use choice batches. A `send` listing
//! registers one choice per filename; the user's follow-up keyword
//! resolves to the mapped command. Registration replaces any existing
//! batch for the user, resolution consumes the whole batch, and batches
//! expire after a TTL so abandoned sessions do not accumulate.

use crate::bus::Command;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-user pending choices
#[derive(Debug, Default)]
pub struct ChoiceRegistry {
    ttl: Option<Duration>,
    pending: HashMap<String, Batch>,
}

#[derive(Debug)]
struct Batch {
    choices: HashMap<String, Command>,
    registered_at: Instant,
}

impl ChoiceRegistry {
    /// Create a registry; `None` disables expiry
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            pending: HashMap::new(),
        }
    }

    /// Drop the user's pending batch, if any
    pub fn clear(&mut self, user: &str) {
        self.pending.remove(user);
    }

    /// Register a new batch for the user, replacing any existing one
    pub fn register(&mut self, user: &str, choices: impl IntoIterator<Item = (String, Command)>) {
        let batch = Batch {
            choices: choices.into_iter().collect(),
            registered_at: Instant::now(),
        };
        tracing::debug!(user, count = batch.choices.len(), "registered choices");
        self.pending.insert(user.to_string(), batch);
    }

    /// Resolve a keyword against the user's batch
    ///
    /// A hit consumes the whole batch. An expired batch is dropped and
    /// resolves nothing.
    pub fn resolve(&mut self, user: &str, keyword: &str) -> Option<Command> {
        let expired = match self.pending.get(user) {
            Some(batch) => self.is_expired(batch),
            None => return None,
        };

        if expired {
            tracing::debug!(user, "pending choices expired");
            self.pending.remove(user);
            return None;
        }

        let command = self.pending.get(user)?.choices.get(keyword).cloned();
        if command.is_some() {
            self.pending.remove(user);
        }
        command
    }

    /// Whether the user has a live batch
    pub fn has_pending(&self, user: &str) -> bool {
        self.pending
            .get(user)
            .is_some_and(|batch| !self.is_expired(batch))
    }

    /// Drop every expired batch
    pub fn purge_expired(&mut self) {
        let Some(ttl) = self.ttl else { return };
        self.pending
            .retain(|_, batch| batch.registered_at.elapsed() <= ttl);
    }

    fn is_expired(&self, batch: &Batch) -> bool {
        self.ttl
            .is_some_and(|ttl| batch.registered_at.elapsed() > ttl)
    }
}
