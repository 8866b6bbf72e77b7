//! Conversation Gate — per-user serialization of message processing.
//!
//! Each user with work in flight owns one slot: an async mutex shared by the
//! running task and everyone queued behind it. Tokio's mutex is fair, so
//! queued messages for the same user run in arrival order. Different users
//! never share a slot and never wait on each other.
//!
//! The slot map itself sits behind a plain mutex that is only held for
//! bookkeeping, never while a task runs. Each entry counts its leases under
//! that mutex, so the last lease out always removes it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

type Slot = Arc<tokio::sync::Mutex<()>>;

struct Entry {
    slot: Slot,
    /// Holder plus waiters.
    leases: usize,
}

/// Serializes work per user identity.
#[derive(Default)]
pub struct ConversationGate {
    slots: Mutex<HashMap<String, Entry>>,
}

/// A caller's claim on a user's slot. Dropping it removes the slot from the
/// map once no other lease remains, on every exit path including
/// cancellation and panics.
struct Lease<'a> {
    gate: &'a ConversationGate,
    user_id: String,
    slot: Slot,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        let mut slots = self.gate.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = slots.get_mut(&self.user_id) {
            entry.leases -= 1;
            if entry.leases == 0 {
                slots.remove(&self.user_id);
            }
        }
    }
}

impl ConversationGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn checkout(&self, user_id: &str) -> Lease<'_> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = slots.entry(user_id.to_string()).or_insert_with(|| Entry {
            slot: Slot::default(),
            leases: 0,
        });
        entry.leases += 1;
        let slot = entry.slot.clone();
        Lease {
            gate: self,
            user_id: user_id.to_string(),
            slot,
        }
    }

    /// Run `task` once every earlier task for `user_id` has finished.
    ///
    /// The slot is released whether the task succeeds, fails or panics.
    pub async fn run_exclusive<F, Fut, T>(&self, user_id: &str, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lease = self.checkout(user_id);
        // Declared after `lease` so it is released before the lease cleans up.
        let _turn = match lease.slot.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!("⏳ User {user_id} already being processed, queuing");
                lease.slot.lock().await
            }
        };
        task().await
    }

    /// Number of users with a task running or queued.
    pub fn in_flight(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
