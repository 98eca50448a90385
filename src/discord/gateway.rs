//! Gateway event handler: translates Discord events into pipeline calls.
//!
//! The handler is deliberately thin. Reactions are classified into
//! [`ReactionEvent`]s and handed to the approval pipeline; messages are
//! parsed for commands; everything else is dropped here. Events arriving
//! before the ready signal are discarded, because the bot's own user id is
//! not known yet and the self-check cannot run.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serenity::async_trait;
use serenity::model::channel::{Message, Reaction, ReactionType};
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::chat::{ChatApi, Marker, ReactionEvent};
use crate::commands::{Command, parse_command};
use crate::fetch::NewsSource;
use crate::moderation::{ApprovalPipeline, PostingStage};
use crate::types::{ChannelId, GuildId, UserId};

/// The gateway-facing half of the bot.
///
/// Generic over the platform seam like the pipeline stages it drives, so
/// the command flows are unit-testable against the in-memory backend.
pub struct Handler<C, S> {
    chat: Arc<C>,
    posting: Arc<PostingStage<C>>,
    approvals: Arc<ApprovalPipeline<C>>,
    source: Arc<S>,
    ready_tx: watch::Sender<bool>,

    // The bot's own user id, 0 until the ready event delivers it.
    own_user: AtomicU64,
}

impl<C: ChatApi, S: NewsSource> Handler<C, S> {
    pub fn new(
        chat: Arc<C>,
        posting: Arc<PostingStage<C>>,
        approvals: Arc<ApprovalPipeline<C>>,
        source: Arc<S>,
        ready_tx: watch::Sender<bool>,
    ) -> Self {
        Handler {
            chat,
            posting,
            approvals,
            source,
            ready_tx,
            own_user: AtomicU64::new(0),
        }
    }

    fn own_user(&self) -> Option<UserId> {
        match self.own_user.load(Ordering::SeqCst) {
            0 => None,
            id => Some(UserId(id)),
        }
    }

    /// Runs the `!lastnews` command: fetch the latest item and post a
    /// preview with action markers into the invoking channel.
    ///
    /// Every failure branch replies with human-readable text; the command
    /// entry point never fails silently.
    async fn last_news(&self, channel: ChannelId) {
        let items = match self.source.fetch_latest(1).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "lastnews fetch failed");
                self.reply(channel, &format!("Failed to fetch news: {e}"))
                    .await;
                return;
            }
        };
        let Some(item) = items.first() else {
            self.reply(channel, "No news found.").await;
            return;
        };
        if let Err(e) = self.posting.send_preview(channel, item).await {
            warn!(error = %e, item = %item.id, "lastnews preview failed");
            self.reply(channel, &format!("Failed to post news: {e}"))
                .await;
        }
    }

    async fn reply(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self.chat.send_text(channel, text).await {
            warn!(error = %e, "could not send command reply");
        }
    }
}

#[async_trait]
impl<C: ChatApi + 'static, S: NewsSource + 'static> EventHandler for Handler<C, S> {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.own_user.store(ready.user.id.get(), Ordering::SeqCst);
        info!(user = %ready.user.name, "gateway connected");
        // Unblocks the ingestion scheduler; an error just means it is gone.
        let _ = self.ready_tx.send(true);
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        let Some(own_user) = self.own_user() else {
            debug!("reaction before ready, dropping");
            return;
        };
        let Some(actor) = reaction.user_id else {
            debug!("reaction without actor, dropping");
            return;
        };

        let event = ReactionEvent {
            actor: UserId(actor.get()),
            message: crate::types::MessageId(reaction.message_id.get()),
            channel: ChannelId(reaction.channel_id.get()),
            guild: reaction.guild_id.map(|guild| GuildId(guild.get())),
            marker: match &reaction.emoji {
                ReactionType::Unicode(emoji) => Marker::from_emoji(emoji),
                _ => None,
            },
        };
        let outcome = self.approvals.handle(own_user, &event).await;
        debug!(?outcome, message = %event.message, "reaction handled");
    }

    async fn message(&self, _ctx: Context, message: Message) {
        if message.author.bot {
            return;
        }
        if let Some(Command::LastNews) = parse_command(&message.content) {
            info!(channel = %message.channel_id, "lastnews command received");
            self.last_news(ChannelId(message.channel_id.get())).await;
        }
    }
}
