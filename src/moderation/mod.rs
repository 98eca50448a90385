//! The ingestion–moderation–publication pipeline.
//!
//! Items enter through the posting stage ([`post`]), wait in the moderation
//! channel as posts with approve/reject markers, and leave through the
//! approval state machine ([`approve`]) exactly once. [`render`] pairs the
//! post rendering with identity recovery, [`status`] derives the explicit
//! post lifecycle state, and [`guard`] provides per-message mutual
//! exclusion for concurrent approvals.

pub mod approve;
pub mod guard;
pub mod post;
pub mod render;
pub mod status;

pub use approve::{ApprovalConfig, ApprovalPipeline, ApproveOutcome, FailReason, IgnoreReason};
pub use guard::{ProcessingClaim, ProcessingGuard};
pub use post::{PostingStage, TickOutcome};
pub use render::{extract_identity, render_item, render_preview};
pub use status::PostState;
