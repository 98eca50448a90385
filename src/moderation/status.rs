//! Explicit lifecycle state of a moderation post.
//!
//! The platform only stores marker presence; this module derives the tagged
//! state from it in one place so the state machine's invariants are checked
//! here rather than re-derived from marker inspection at each call site.

use crate::chat::{ChatMessage, Marker};

use super::guard::ProcessingGuard;

/// Lifecycle state of one moderation post.
///
/// `Pending → Processing → Terminal`; there is no transition back to
/// `Pending` from `Terminal`, and a terminal post must never be processed
/// again no matter how many further action events arrive for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    /// Awaiting moderator action.
    Pending,

    /// An approval attempt is in flight (transient, guard-held).
    Processing,

    /// Published; carries the processed marker.
    Terminal,
}

impl PostState {
    /// Classifies a fetched post against the guard.
    ///
    /// The terminal marker wins over an in-flight claim: a post that is both
    /// marked processed and mid-attempt (the attempt is finishing up) is
    /// already terminal for every new event.
    pub fn classify(message: &ChatMessage, guard: &ProcessingGuard) -> PostState {
        if message.has_marker(Marker::Processed) {
            PostState::Terminal
        } else if guard.contains(message.re.message) {
            PostState::Processing
        } else {
            PostState::Pending
        }
    }
}
