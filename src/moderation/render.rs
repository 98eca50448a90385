//! Rendering of items into posts, and identity recovery from posts.
//!
//! Rendering and extraction are paired: the approve path must be able to
//! recover the item identity from any post the posting stage (or an older
//! deployment) produced. New posts carry the identity in the link field;
//! old posts encoded it in a footer string as `id: <identity>`, which the
//! extraction still accepts.

use crate::chat::RenderedPost;
use crate::types::{ItemId, NewsItem};

/// Character cap for the excerpt in a moderation post.
pub const EXCERPT_LIMIT: usize = 300;

/// Character cap for the excerpt in a `lastnews` preview post, which shows
/// the item in full where the platform allows.
pub const PREVIEW_EXCERPT_LIMIT: usize = 3000;

/// Marker string introducing the identity in legacy footers.
const LEGACY_ID_PREFIX: &str = "id:";

/// Renders an item into its moderation post.
///
/// The excerpt is capped at [`EXCERPT_LIMIT`] characters with a trailing
/// ellipsis. The title is what repair and duplicate scans match on, so it is
/// carried verbatim.
pub fn render_item(item: &NewsItem) -> RenderedPost {
    RenderedPost {
        title: item.title.clone(),
        link: Some(item.link.clone()),
        body: format!("{}...", truncate_chars(&item.excerpt, EXCERPT_LIMIT)),
        image: item.image.clone(),
        footer: None,
    }
}

/// Renders an item into a preview post with the larger excerpt cap and no
/// ellipsis.
pub fn render_preview(item: &NewsItem) -> RenderedPost {
    RenderedPost {
        title: item.title.clone(),
        link: Some(item.link.clone()),
        body: truncate_chars(&item.excerpt, PREVIEW_EXCERPT_LIMIT).to_string(),
        image: item.image.clone(),
        footer: None,
    }
}

/// Recovers the item identity from a post.
///
/// Prefers the embedded link; falls back to the legacy `id:` footer for
/// posts created before the link carried the identity. Returns `None` when
/// the post has neither, in which case the approve path publishes without
/// recording a published-flag.
pub fn extract_identity(post: &RenderedPost) -> Option<ItemId> {
    if let Some(link) = post.link.as_deref() {
        if !link.is_empty() {
            return Some(ItemId::from(link));
        }
    }

    let footer = post.footer.as_deref()?;
    let (_, after) = footer.rsplit_once(LEGACY_ID_PREFIX)?;
    let id = after.trim();
    if id.is_empty() {
        None
    } else {
        Some(ItemId::from(id))
    }
}

/// Truncates to at most `max_chars` characters, never splitting a
/// character.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
