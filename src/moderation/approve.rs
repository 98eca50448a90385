//! Approval state machine: turns moderator reactions into publications.
//!
//! Every inbound reaction event runs a guard sequence (self-check, channel
//! check, terminal check, role check, emoji check); each guard is an early
//! return with no state change. An event that passes all guards runs the
//! publish flow under a per-message claim from the [`ProcessingGuard`], so
//! two concurrent approvals of the same post cannot double-publish.
//!
//! The publish itself is defended three ways: the store's published-flag
//! (survives restarts), a bounded duplicate-title scan of the target when it
//! supports history (catches legacy publishes the store missed), and the
//! processed marker on the moderation post (makes the post terminal).

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::chat::{ChatApi, ChatMessage, Destination, Marker, ReactionEvent, RenderedPost};
use crate::store::DedupStore;
use crate::types::{ChannelId, RoleId, UserId};

use super::guard::ProcessingGuard;
use super::render::extract_identity;
use super::status::PostState;

/// How many recent target messages the duplicate scan inspects.
pub const DUPLICATE_SCAN_LIMIT: usize = 200;

/// Static wiring of the approval pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ApprovalConfig {
    /// Channel whose posts the state machine acts on.
    pub moderation_channel: ChannelId,

    /// Flat publication fallback destination.
    pub approved_channel: Option<ChannelId>,

    /// Preferred thread-capable publication destination.
    pub forum_channel: Option<ChannelId>,

    /// Role required to drive a transition.
    pub moderator_role: RoleId,
}

/// What one reaction event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveOutcome {
    /// A guard rejected the event; nothing changed.
    Ignored(IgnoreReason),

    /// The item is already recorded published; publication skipped.
    AlreadyPublished,

    /// The target already holds a post with this title; publication skipped.
    DuplicateInTarget,

    /// Exactly one publication happened.
    Published {
        destination: ChannelId,
        threaded: bool,
    },

    /// The attempt aborted; the post stays non-terminal and a future
    /// approve event may retry.
    Failed(FailReason),
}

/// Why an event was ignored. None of these change any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The actor is the bot's own account (marker attachment echoes).
    SelfEvent,

    /// The event happened outside the moderation channel.
    WrongChannel,

    /// The post already carries the processed marker.
    Terminal,

    /// The reaction did not happen in a guild; it cannot be authorized.
    NoGuild,

    /// The actor lacks the moderator role (or is not a resolvable member).
    NotModerator,

    /// The emoji is not the approve marker. Reject is a deliberate no-op.
    NotApprove,

    /// Another attempt holds the claim for this message.
    InFlight,

    /// The message carries no rendered post to publish.
    NoPost,
}

/// Why an approve attempt aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// The moderation post could not be fetched.
    MessageUnavailable,

    /// The acting member could not be resolved (transport failure).
    MemberUnavailable,

    /// Neither publication destination resolved.
    NoTarget,

    /// The publication post or thread could not be created.
    PublishFailed,
}

/// The approval state machine, shared by all dispatched event handlers.
#[derive(Debug)]
pub struct ApprovalPipeline<C> {
    chat: Arc<C>,
    store: Arc<DedupStore>,
    guard: Arc<ProcessingGuard>,
    config: ApprovalConfig,
}

impl<C: ChatApi> ApprovalPipeline<C> {
    pub fn new(
        chat: Arc<C>,
        store: Arc<DedupStore>,
        guard: Arc<ProcessingGuard>,
        config: ApprovalConfig,
    ) -> Self {
        ApprovalPipeline {
            chat,
            store,
            guard,
            config,
        }
    }

    /// Runs one inbound reaction event through the guard sequence and, on
    /// approve, the publish flow.
    #[instrument(skip(self, event), fields(message = %event.message, actor = %event.actor))]
    pub async fn handle(&self, own_user: UserId, event: &ReactionEvent) -> ApproveOutcome {
        // Guard 1: the bot's own marker attachments echo back as events.
        if event.actor == own_user {
            return ApproveOutcome::Ignored(IgnoreReason::SelfEvent);
        }

        // Guard 2: only the moderation channel drives transitions.
        if event.channel != self.config.moderation_channel {
            return ApproveOutcome::Ignored(IgnoreReason::WrongChannel);
        }

        // Guard 3: resolve the post and refuse terminal ones.
        let message = match self.chat.fetch_message(event.channel, event.message).await {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "could not fetch moderation post for reaction");
                return ApproveOutcome::Failed(FailReason::MessageUnavailable);
            }
        };
        if PostState::classify(&message, &self.guard) == PostState::Terminal {
            debug!("post already terminal, ignoring");
            return ApproveOutcome::Ignored(IgnoreReason::Terminal);
        }

        // Guard 4: only moderators may act.
        let Some(guild) = event.guild else {
            return ApproveOutcome::Ignored(IgnoreReason::NoGuild);
        };
        let member = match self.chat.resolve_member(guild, event.actor).await {
            Ok(member) => member,
            Err(e) if e.is_not_found() => {
                return ApproveOutcome::Ignored(IgnoreReason::NotModerator);
            }
            Err(e) => {
                warn!(error = %e, "could not resolve acting member");
                return ApproveOutcome::Failed(FailReason::MemberUnavailable);
            }
        };
        if !member.has_role(self.config.moderator_role) {
            return ApproveOutcome::Ignored(IgnoreReason::NotModerator);
        }

        // Guard 5: only the approve marker drives a transition.
        if event.marker != Some(Marker::Approve) {
            return ApproveOutcome::Ignored(IgnoreReason::NotApprove);
        }

        self.approve(&message).await
    }

    /// The publish flow, entered with all guards passed.
    async fn approve(&self, message: &ChatMessage) -> ApproveOutcome {
        // The claim releases on drop, covering every exit path below.
        let Some(_claim) = self.guard.acquire(message.re.message) else {
            debug!("concurrent approval already in flight");
            return ApproveOutcome::Ignored(IgnoreReason::InFlight);
        };

        let Some(post) = message.post.as_ref() else {
            warn!("moderation post carries no rendered payload");
            return ApproveOutcome::Ignored(IgnoreReason::NoPost);
        };
        let identity = extract_identity(post);

        // Idempotence against replayed approve events across restarts.
        if let Some(id) = &identity {
            if self.store.published(id) {
                debug!(item = %id, "item already published, skipping");
                return ApproveOutcome::AlreadyPublished;
            }
        }

        let Some(target) = self.resolve_target().await else {
            error!("no publication destination resolvable, post stays pending");
            return ApproveOutcome::Failed(FailReason::NoTarget);
        };

        if self.target_has_duplicate(&target, post).await {
            info!(title = %post.title, target = %target.channel, "title already published in target, skipping");
            return ApproveOutcome::DuplicateInTarget;
        }

        let threaded = match self.publish(&target, post).await {
            Ok(threaded) => threaded,
            Err(outcome) => return outcome,
        };

        // Terminal marker is best-effort: a failure here leaves the post
        // re-approvable, and the published-flag below absorbs the replay.
        if let Err(e) = self.chat.add_marker(&message.re, Marker::Processed).await {
            warn!(error = %e, "could not attach processed marker");
        }
        if let Some(id) = identity {
            info!(item = %id, target = %target.channel, threaded, "item published");
            self.store.mark_published(id);
        } else {
            info!(target = %target.channel, threaded, "item published (no recoverable identity)");
        }

        ApproveOutcome::Published {
            destination: target.channel,
            threaded,
        }
    }

    /// Resolves the publication target: the thread-capable destination when
    /// configured and resolvable, else the flat channel.
    async fn resolve_target(&self) -> Option<Destination> {
        for channel in [self.config.forum_channel, self.config.approved_channel]
            .into_iter()
            .flatten()
        {
            match self.chat.resolve_destination(channel).await {
                Ok(destination) => return Some(destination),
                Err(e) => {
                    warn!(%channel, error = %e, "publication destination did not resolve");
                }
            }
        }
        None
    }

    /// Bounded duplicate-title scan of the target destination.
    ///
    /// A failed scan is treated as "no duplicate found": the store's
    /// published-flag already vouched for this item, the scan is only a
    /// second line of defence for legacy publishes.
    async fn target_has_duplicate(&self, target: &Destination, post: &RenderedPost) -> bool {
        if !target.supports_history {
            return false;
        }
        match self
            .chat
            .list_history(target.channel, DUPLICATE_SCAN_LIMIT)
            .await
        {
            Ok(history) => history
                .iter()
                .any(|m| m.post.as_ref().is_some_and(|p| p.title == post.title)),
            Err(e) => {
                warn!(target = %target.channel, error = %e, "duplicate scan failed, proceeding with publish");
                false
            }
        }
    }

    /// Creates the publication post, preferring a discussion thread.
    ///
    /// Returns whether a thread was created; an unsupported-thread error
    /// falls back to a flat send, any other failure aborts the attempt.
    async fn publish(
        &self,
        target: &Destination,
        post: &RenderedPost,
    ) -> Result<bool, ApproveOutcome> {
        if target.supports_threads {
            match self.chat.create_thread(target, &post.title, post).await {
                Ok(_) => return Ok(true),
                Err(e) if e.is_unsupported() => {
                    warn!(target = %target.channel, error = %e, "thread creation unsupported, falling back to flat send");
                }
                Err(e) => {
                    error!(target = %target.channel, error = %e, "failed to publish thread");
                    return Err(ApproveOutcome::Failed(FailReason::PublishFailed));
                }
            }
        }
        match self.chat.send_post(target, post).await {
            Ok(_) => Ok(false),
            Err(e) => {
                error!(target = %target.channel, error = %e, "failed to publish post");
                Err(ApproveOutcome::Failed(FailReason::PublishFailed))
            }
        }
    }
}
