//! Platform seam between the pipeline and the messaging backend.
//!
//! The pipeline never talks to Discord directly: it consumes the [`ChatApi`]
//! trait, which exposes the handful of primitives the pipeline needs (send a
//! rendered post, attach a marker, fetch a message, list history, resolve a
//! member, resolve a destination, create a discussion thread). The production
//! implementation lives in the `discord` module; tests substitute an
//! in-memory mock.
//!
//! Capabilities are typed: a resolved [`Destination`] carries explicit
//! `supports_*` flags instead of callers probing the backend object, so the
//! publish and repair paths branch on data rather than on runtime attribute
//! checks.

mod api;
mod error;
mod types;

pub use api::ChatApi;
pub use error::{ChatError, ChatErrorKind};
pub use types::{ChatMessage, Destination, Marker, Member, MessageRef, ReactionEvent, RenderedPost};
