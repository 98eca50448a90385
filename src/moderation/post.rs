//! Posting stage: feeds fetched items into the moderation queue.
//!
//! For each unseen item the stage commits the item as seen, sends its
//! rendered post to the moderation destination, and attaches the two action
//! markers. For already-seen items it runs the repair path instead: find the
//! existing post in recent history and attach whatever markers it is
//! missing. Marker attachment is not transactional with the send, so the
//! repair path is what makes the pipeline self-healing across ticks —
//! without ever producing a duplicate post.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::chat::{ChatApi, ChatError, Destination, Marker, MessageRef};
use crate::store::DedupStore;
use crate::types::{ChannelId, NewsItem};

use super::render::{render_item, render_preview};

/// Pause between marker attachments, respecting downstream rate limits.
pub const MARKER_PAUSE: Duration = Duration::from_millis(250);

/// How many recent messages the repair path scans for an existing post.
pub const REPAIR_SCAN_LIMIT: usize = 200;

/// Per-item result of one tick, in batch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// New item: seen-committed, posted, markers attached.
    Posted {
        message: MessageRef,
        markers_attached: usize,
    },

    /// New item whose post could not be sent. The item stays seen; a lost
    /// post is surfaced only by manual reconciliation.
    SendFailed,

    /// Seen item whose post was found missing markers; they were re-attached.
    Repaired {
        message: MessageRef,
        markers_added: usize,
    },

    /// Seen item whose post already carries both action markers.
    MarkersComplete { message: MessageRef },

    /// Seen item with no matching post in the scan window. Nothing is done:
    /// re-posting a previously seen item is disallowed.
    PostNotFound,

    /// Seen item whose repair scan failed; retried implicitly next tick.
    ScanFailed,
}

/// The posting stage, shared between the scheduler and the command entry
/// point.
#[derive(Debug)]
pub struct PostingStage<C> {
    chat: Arc<C>,
    store: Arc<DedupStore>,
    moderation_channel: ChannelId,
}

impl<C: ChatApi> PostingStage<C> {
    pub fn new(chat: Arc<C>, store: Arc<DedupStore>, moderation_channel: ChannelId) -> Self {
        PostingStage {
            chat,
            store,
            moderation_channel,
        }
    }

    /// Processes one fetched batch, in batch order.
    ///
    /// Failures are handled per item; one item's failure never aborts the
    /// tick. An unresolvable moderation destination aborts the whole tick
    /// (there is nowhere to post) with an error log.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn run_tick(&self, items: &[NewsItem]) -> Vec<TickOutcome> {
        let destination = match self.chat.resolve_destination(self.moderation_channel).await {
            Ok(destination) => destination,
            Err(e) => {
                error!(channel = %self.moderation_channel, error = %e, "moderation destination unavailable, skipping tick");
                return Vec::new();
            }
        };

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let outcome = if self.store.seen(&item.id) {
                self.repair(&destination, item).await
            } else {
                self.post_new(&destination, item).await
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Posts a new item: commit seen, send, attach markers.
    async fn post_new(&self, destination: &Destination, item: &NewsItem) -> TickOutcome {
        // Seen is committed before any network post: a crash after this
        // point cannot duplicate the post on the next tick, only leave it
        // missing (the accepted trade-off).
        self.store.add(item.id.clone());

        let post = render_item(item);
        let message = match self.chat.send_post(destination, &post).await {
            Ok(message) => message,
            Err(e) => {
                error!(item = %item.id, error = %e, "failed to send moderation post");
                return TickOutcome::SendFailed;
            }
        };

        let markers_attached = self.attach_markers(&message, &Marker::ACTIONS).await;
        info!(item = %item.id, message = %message.message, markers_attached, "posted item for moderation");
        TickOutcome::Posted {
            message,
            markers_attached,
        }
    }

    /// Repair path: restore missing markers on an already-seen item's post.
    async fn repair(&self, destination: &Destination, item: &NewsItem) -> TickOutcome {
        if !destination.supports_history {
            debug!(item = %item.id, "destination has no history, skipping repair scan");
            return TickOutcome::ScanFailed;
        }

        let history = match self
            .chat
            .list_history(destination.channel, REPAIR_SCAN_LIMIT)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(item = %item.id, error = %e, "repair scan failed");
                return TickOutcome::ScanFailed;
            }
        };

        let Some(found) = history
            .iter()
            .find(|m| m.post.as_ref().is_some_and(|p| p.title == item.title))
        else {
            debug!(item = %item.id, "seen item has no post in scan window, not re-posting");
            return TickOutcome::PostNotFound;
        };

        let missing: Vec<Marker> = Marker::ACTIONS
            .into_iter()
            .filter(|marker| !found.has_marker(*marker))
            .collect();
        if missing.is_empty() {
            debug!(item = %item.id, message = %found.re.message, "markers already complete");
            return TickOutcome::MarkersComplete { message: found.re };
        }

        info!(item = %item.id, message = %found.re.message, missing = missing.len(), "restoring missing markers");
        let markers_added = self.attach_markers(&found.re, &missing).await;
        TickOutcome::Repaired {
            message: found.re,
            markers_added,
        }
    }

    /// Sends a preview of `item` to `channel` with the larger excerpt cap,
    /// under the same marker policy as the moderation queue.
    ///
    /// The preview never touches the dedup store: approving such a post in
    /// the moderation channel runs the ordinary approve flow.
    pub async fn send_preview(
        &self,
        channel: ChannelId,
        item: &NewsItem,
    ) -> Result<MessageRef, ChatError> {
        let destination = self.chat.resolve_destination(channel).await?;
        let post = render_preview(item);
        let message = self.chat.send_post(&destination, &post).await?;
        self.attach_markers(&message, &Marker::ACTIONS).await;
        Ok(message)
    }

    /// Attaches `markers` in order with a pause after each.
    ///
    /// A failure aborts the remaining markers for this post only; the
    /// repair path may retry on a later tick. Returns how many attached.
    async fn attach_markers(&self, message: &MessageRef, markers: &[Marker]) -> usize {
        let mut attached = 0;
        for marker in markers {
            if let Err(e) = self.chat.add_marker(message, *marker).await {
                if e.is_permission() {
                    warn!(message = %message.message, ?marker, "no permission to attach markers, skipping the rest");
                } else {
                    warn!(message = %message.message, ?marker, error = %e, "failed to attach marker, skipping the rest");
                }
                break;
            }
            attached += 1;
            tokio::time::sleep(MARKER_PAUSE).await;
        }
        attached
    }
}
