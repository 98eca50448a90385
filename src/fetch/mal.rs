//! MyAnimeList news listing source.
//!
//! Fetches the news index page and parses its `.news-unit` blocks into
//! [`NewsItem`]s. Parsing is a pure function over the HTML string, so it is
//! unit-testable without network access.

use std::time::Duration;

use scraper::{Html, Selector};

use crate::types::{ItemId, NewsItem};

use super::{FetchError, NewsSource};

/// The upstream news listing.
pub const MAL_NEWS_URL: &str = "https://myanimelist.net/news";

/// Request timeout for the listing fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Production [`NewsSource`] backed by the MyAnimeList news listing.
#[derive(Debug, Clone)]
pub struct MalNewsSource {
    client: reqwest::Client,
    url: String,
}

impl MalNewsSource {
    /// Creates a source pointed at the live listing.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_url(MAL_NEWS_URL)
    }

    /// Creates a source pointed at an alternative listing URL.
    pub fn with_url(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(MalNewsSource {
            client,
            url: url.into(),
        })
    }
}

impl NewsSource for MalNewsSource {
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<NewsItem>, FetchError> {
        let html = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_listing(&html, limit))
    }
}

/// Parses the news listing page into at most `limit` items, listing order.
///
/// Units without a title anchor are skipped. The article link doubles as the
/// item identity.
pub fn parse_listing(html: &str, limit: usize) -> Vec<NewsItem> {
    let doc = Html::parse_document(html);
    let unit_sel = Selector::parse(".news-unit").ok();
    let title_sel = Selector::parse("p.title a").ok();
    let img_sel = Selector::parse("img").ok();
    let text_sel = Selector::parse(".text").ok();

    let (Some(unit_sel), Some(title_sel)) = (unit_sel, title_sel) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for unit in doc.select(&unit_sel) {
        if items.len() >= limit {
            break;
        }

        let Some(anchor) = unit.select(&title_sel).next() else {
            continue;
        };
        let Some(link) = anchor.value().attr("href") else {
            continue;
        };
        let title = anchor.text().collect::<String>().trim().to_string();

        let image = img_sel
            .as_ref()
            .and_then(|sel| unit.select(sel).next())
            .and_then(|img| {
                img.value()
                    .attr("data-src")
                    .or_else(|| img.value().attr("src"))
            })
            .map(fix_image_url);

        let excerpt = text_sel
            .as_ref()
            .and_then(|sel| unit.select(sel).next())
            .map(|node| node.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        items.push(NewsItem {
            id: ItemId::from(link),
            title,
            link: link.to_string(),
            image,
            excerpt,
        });
    }
    items
}

/// Rewrites a thumbnail URL to its full-size form.
///
/// Listing thumbnails look like `.../r/100x156/s/common/...`; splicing out
/// the `/r/<dims>` segment yields the original image at `.../s/common/...`.
pub fn fix_image_url(url: &str) -> String {
    if let (Some(r_pos), Some(s_pos)) = (url.find("/r/"), url.find("/s/")) {
        if r_pos < s_pos {
            return format!("{}{}", &url[..r_pos], &url[s_pos..]);
        }
    }
    url.to_string()
}
