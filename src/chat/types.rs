//! Value types exchanged across the platform seam.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, GuildId, MessageId, RoleId, UserId};

/// An attachable signal on a moderation post.
///
/// `Approve` and `Reject` are the two action markers offered to moderators;
/// `Processed` is the tombstone attached after a successful publish. A post
/// carrying `Processed` is terminal and must never be processed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Moderator action: publish this item.
    Approve,

    /// Moderator action: do not publish. Currently a no-op beyond existing
    /// on the post; it neither blocks a later approval nor records state.
    Reject,

    /// Tombstone: the post has been published and is terminal.
    Processed,
}

impl Marker {
    /// The two markers offered on every moderation post, in attachment order.
    pub const ACTIONS: [Marker; 2] = [Marker::Approve, Marker::Reject];

    /// Returns the unicode emoji the platform renders for this marker.
    pub fn emoji(&self) -> &'static str {
        match self {
            Marker::Approve => "\u{2705}",   // ✅
            Marker::Reject => "\u{274C}",    // ❌
            Marker::Processed => "\u{1F4CC}", // 📌
        }
    }

    /// Classifies an emoji string into a marker, if it is one.
    ///
    /// Any other emoji returns `None` and is ignored by the pipeline.
    pub fn from_emoji(emoji: &str) -> Option<Marker> {
        match emoji {
            "\u{2705}" => Some(Marker::Approve),
            "\u{274C}" => Some(Marker::Reject),
            "\u{1F4CC}" => Some(Marker::Processed),
            _ => None,
        }
    }
}

/// A rendered moderation or publication post.
///
/// This is the display payload the pipeline hands to the platform: the
/// platform implementation decides how to present it (an embed, on Discord).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedPost {
    /// Headline. Also the key used by duplicate and repair scans.
    pub title: String,

    /// Link the title points at; carries the item identity.
    pub link: Option<String>,

    /// Body text, already truncated to the rendering limit.
    pub body: String,

    /// Full-size preview image URL, when the item had one.
    pub image: Option<String>,

    /// Footer text. New posts carry none; old posts may encode a legacy
    /// `id:` identity here.
    pub footer: Option<String>,
}

/// Locates one message on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel: ChannelId,
    pub message: MessageId,
}

/// A message fetched back from the platform.
///
/// Only the parts the pipeline inspects are carried: the author (for the
/// self-check), the rendered payload if the message carries one, and the
/// markers currently attached (non-marker reactions are dropped at the
/// platform boundary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Where this message lives.
    pub re: MessageRef,

    /// Who sent it.
    pub author: UserId,

    /// The rendered post payload, when the message carries one.
    pub post: Option<RenderedPost>,

    /// Markers currently attached, in no particular order.
    pub markers: Vec<Marker>,
}

impl ChatMessage {
    /// True if this message already carries the given marker.
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

/// A resolved destination with explicit capability flags.
///
/// The pipeline branches on these flags instead of probing the platform
/// object: thread-capable destinations are published to via
/// [`super::ChatApi::create_thread`], history-capable ones can be scanned for
/// duplicates, and marker-capable ones accept reactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub channel: ChannelId,

    /// Reactions can be attached to messages here.
    pub supports_markers: bool,

    /// Publishing creates a discussion thread seeded with the post.
    pub supports_threads: bool,

    /// Recent messages can be listed for duplicate/repair scans.
    pub supports_history: bool,
}

/// A guild member, reduced to what the authorization check needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: UserId,
    pub roles: Vec<RoleId>,
}

impl Member {
    /// True if the member holds the given role.
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// An inbound reaction event from the platform gateway.
///
/// The raw emoji is classified into a [`Marker`] at the gateway boundary;
/// unclassifiable emoji arrive with `marker: None` and fall out of the
/// approval guard sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionEvent {
    /// The user who reacted.
    pub actor: UserId,

    /// The message reacted to.
    pub message: MessageId,

    /// The channel containing the message.
    pub channel: ChannelId,

    /// The guild, when the reaction happened in one. Reactions outside a
    /// guild cannot be authorized and are ignored.
    pub guild: Option<GuildId>,

    /// The classified marker, or `None` for any other emoji.
    pub marker: Option<Marker>,
}
