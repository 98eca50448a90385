//! Core domain types for the news moderation bot.
//!
//! This module contains the fundamental identifiers and records used
//! throughout the pipeline, designed to encode invariants via the type
//! system.

pub mod ids;
pub mod item;

// Re-export commonly used types at the module level
pub use ids::{ChannelId, GuildId, ItemId, MessageId, RoleId, UserId};
pub use item::NewsItem;
