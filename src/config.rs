//! Deployment configuration, read from environment variables.
//!
//! Variable names match the original deployment so an existing `.env` keeps
//! working. Parsing is factored through a lookup-function seam so tests
//! never mutate the process environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::moderation::ApprovalConfig;
use crate::scheduler::SchedulerConfig;
use crate::types::{ChannelId, RoleId};

/// Default tick period in minutes.
const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 10;

/// Default batch size requested from the source.
const DEFAULT_NEWS_LIMIT: usize = 6;

/// Default dedup snapshot location.
const DEFAULT_DATA_FILE: &str = "data/processed.json";

/// Configuration errors surfaced at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is present but does not parse.
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// All deployment knobs.
///
/// Channel and role ids are nonzero; an optional id set to `0` (the
/// original deployment's "unset" convention) or absent means unset.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gateway/API token.
    pub token: String,

    /// The moderation queue channel.
    pub moderation_channel: ChannelId,

    /// Flat publication fallback channel.
    pub approved_channel: Option<ChannelId>,

    /// Preferred thread-capable publication channel.
    pub forum_channel: Option<ChannelId>,

    /// Role required to approve items.
    pub moderator_role: RoleId,

    /// Period of the ingestion scheduler.
    pub check_interval: Duration,

    /// Batch size requested from the source each tick.
    pub news_limit: usize,

    /// Where the dedup snapshot persists.
    pub data_file: PathBuf,
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Config {
            token: required(&lookup, "DISCORD_TOKEN")?,
            moderation_channel: ChannelId(required_id(&lookup, "MODERATION_CHANNEL_ID")?),
            approved_channel: optional_id(&lookup, "APPROVED_CHANNEL_ID")?.map(ChannelId),
            forum_channel: optional_id(&lookup, "FORUM_CHANNEL_ID")?.map(ChannelId),
            moderator_role: RoleId(required_id(&lookup, "MODERATOR_ROLE_ID")?),
            check_interval: Duration::from_secs(
                60 * parsed_or(&lookup, "CHECK_INTERVAL_MINUTES", DEFAULT_CHECK_INTERVAL_MINUTES)?,
            ),
            news_limit: parsed_or(&lookup, "NEWS_LIMIT", DEFAULT_NEWS_LIMIT)?,
            data_file: lookup("DATA_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
        })
    }

    /// The approval state machine's slice of the configuration.
    pub fn approval(&self) -> ApprovalConfig {
        ApprovalConfig {
            moderation_channel: self.moderation_channel,
            approved_channel: self.approved_channel,
            forum_channel: self.forum_channel,
            moderator_role: self.moderator_role,
        }
    }

    /// The ingestion scheduler's slice of the configuration.
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.check_interval,
            fetch_limit: self.news_limit,
        }
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    lookup(var)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn required_id(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<u64, ConfigError> {
    let value = required(lookup, var)?;
    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::Missing(var)),
        Ok(id) => Ok(id),
        Err(_) => Err(ConfigError::Invalid { var, value }),
    }
}

fn optional_id(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(value) = lookup(var).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match value.parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(id) => Ok(Some(id)),
        Err(_) => Err(ConfigError::Invalid { var, value }),
    }
}

fn parsed_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    let Some(value) = lookup(var).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    value
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { var, value })
}
