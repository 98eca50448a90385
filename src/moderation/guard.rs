//! Per-message idempotency guard for the approval state machine.
//!
//! Two approve events for the same message can be dispatched concurrently;
//! whichever acquires the claim first runs the publish attempt, the other is
//! silently ignored. Approvals for different messages proceed fully in
//! parallel — they touch disjoint dedup-store keys.
//!
//! Claims are in-memory only and lost on restart. That is acceptable: a
//! restart mid-publish is rare, and the published-flag check plus the
//! destination-side duplicate scan still bound the damage.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::types::MessageId;

/// Set of message identities currently inside an approval attempt.
#[derive(Debug, Default)]
pub struct ProcessingGuard {
    inner: Mutex<HashSet<MessageId>>,
}

impl ProcessingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim `id` for one approval attempt.
    ///
    /// Returns `None` if another attempt already holds the claim; the
    /// caller must abort. The claim releases on drop, so every exit path of
    /// the transition handler releases it.
    pub fn acquire(&self, id: MessageId) -> Option<ProcessingClaim<'_>> {
        if self.lock().insert(id) {
            Some(ProcessingClaim { guard: self, id })
        } else {
            None
        }
    }

    /// True if an approval attempt currently holds `id`.
    pub fn contains(&self, id: MessageId) -> bool {
        self.lock().contains(&id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<MessageId>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A held claim; releasing is dropping.
#[derive(Debug)]
pub struct ProcessingClaim<'a> {
    guard: &'a ProcessingGuard,
    id: MessageId,
}

impl ProcessingClaim<'_> {
    /// The message this claim covers.
    pub fn id(&self) -> MessageId {
        self.id
    }
}

impl Drop for ProcessingClaim<'_> {
    fn drop(&mut self) {
        self.guard.lock().remove(&self.id);
    }
}
