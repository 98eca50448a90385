//! Discord backing for the platform seam.
//!
//! [`DiscordClient`] implements [`crate::chat::ChatApi`] over the REST API;
//! [`Handler`] receives gateway events and dispatches them into the
//! pipeline. Everything platform-specific (embeds, reaction emoji, forum
//! posts, HTTP status codes) is confined to this module.

mod client;
mod gateway;

pub use client::DiscordClient;
pub use gateway::Handler;
