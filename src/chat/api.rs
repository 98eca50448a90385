//! The `ChatApi` trait: the pipeline's view of the messaging platform.

use std::future::Future;

use crate::types::{ChannelId, GuildId, MessageId, UserId};

use super::error::ChatError;
use super::types::{ChatMessage, Destination, Marker, Member, MessageRef, RenderedPost};

/// Platform primitives consumed by the pipeline.
///
/// The production implementation talks to Discord; tests substitute an
/// in-memory mock. Implementations are shared across concurrently dispatched
/// event handlers, so methods take `&self` and must be safe to call from
/// multiple tasks at once.
///
/// Expected platform conditions (permission denied, entity missing,
/// incapable destination) are reported as [`ChatError`] values with a kind
/// the caller can branch on; see the pipeline's error taxonomy.
pub trait ChatApi: Send + Sync {
    /// Resolves a channel into a destination with capability flags.
    fn resolve_destination(
        &self,
        channel: ChannelId,
    ) -> impl Future<Output = Result<Destination, ChatError>> + Send;

    /// Sends a rendered post to a destination as a flat message.
    fn send_post(
        &self,
        destination: &Destination,
        post: &RenderedPost,
    ) -> impl Future<Output = Result<MessageRef, ChatError>> + Send;

    /// Sends plain text to a channel. Used for command replies.
    fn send_text(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<MessageRef, ChatError>> + Send;

    /// Attaches a marker to an existing message.
    fn add_marker(
        &self,
        message: &MessageRef,
        marker: Marker,
    ) -> impl Future<Output = Result<(), ChatError>> + Send;

    /// Fetches a single message by id.
    fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> impl Future<Output = Result<ChatMessage, ChatError>> + Send;

    /// Lists up to `limit` recent messages, newest first.
    ///
    /// Only valid for destinations with `supports_history`; others return a
    /// `ChatErrorKind::Unsupported` error.
    fn list_history(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, ChatError>> + Send;

    /// Resolves a guild member for the authorization check.
    fn resolve_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> impl Future<Output = Result<Member, ChatError>> + Send;

    /// Creates a discussion thread titled `title` and seeded with `post`.
    ///
    /// Only valid for destinations with `supports_threads`; others return a
    /// `ChatErrorKind::Unsupported` error, which the publish path treats as
    /// a signal to fall back to [`ChatApi::send_post`].
    fn create_thread(
        &self,
        destination: &Destination,
        title: &str,
        post: &RenderedPost,
    ) -> impl Future<Output = Result<MessageRef, ChatError>> + Send;
}
