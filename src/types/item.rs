//! Candidate content items produced by the source fetcher.

use serde::{Deserialize, Serialize};

use super::ItemId;

/// One news item fetched from the upstream listing.
///
/// Items are immutable once produced: the posting stage folds them into a
/// moderation post or drops them via the dedup check, and nothing downstream
/// mutates them. The display payload (`title`, `link`, `image`, `excerpt`) is
/// opaque to the pipeline; only `id` and `title` participate in dedup
/// decisions (`id` for the store, `title` for history scans).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Stable identity, used as the dedup key. In practice the article URL.
    pub id: ItemId,

    /// Headline shown in the moderation post and used to find the post again
    /// during marker repair.
    pub title: String,

    /// Link the moderation post points at. Today this equals `id.as_str()`,
    /// but the pipeline does not rely on that.
    pub link: String,

    /// Full-size preview image, when the listing had one.
    pub image: Option<String>,

    /// Short body text. Truncated at render time, not here.
    pub excerpt: String,
}
