//! Newsdesk - a Discord bot that ingests MyAnimeList news and publishes
//! items after moderator approval.
//!
//! This library provides the pipeline stages (fetch, post, approve), the
//! durable dedup store, and the platform seam the Discord backend plugs
//! into.

pub mod chat;
pub mod commands;
pub mod config;
pub mod discord;
pub mod fetch;
pub mod moderation;
pub mod scheduler;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod test_utils;
