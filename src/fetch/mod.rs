//! Source fetcher seam: retrieves candidate items from the upstream site.
//!
//! The scheduler consumes the [`NewsSource`] trait; the production
//! implementation scrapes the MyAnimeList news listing. A fetch failure is
//! reported as a [`FetchError`] which the scheduler logs and skips — ticks
//! are independent and the next one retries from scratch.

mod mal;

pub use mal::{MAL_NEWS_URL, MalNewsSource, fix_image_url, parse_listing};

use std::future::Future;

use thiserror::Error;

use crate::types::NewsItem;

/// Upstream fetch failure: the site was unreachable, answered with an error
/// status, or timed out.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failure or non-success status.
    #[error("news fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The source could not produce a batch for another reason.
    #[error("news source unavailable: {0}")]
    Unavailable(String),
}

/// Produces a batch of candidate items from the external content source.
pub trait NewsSource: Send + Sync {
    /// Fetches up to `limit` of the latest items, newest first.
    fn fetch_latest(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<NewsItem>, FetchError>> + Send;
}
