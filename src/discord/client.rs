//! REST-side implementation of the platform seam.

use std::sync::Arc;

use serenity::builder::{
    CreateEmbed, CreateEmbedFooter, CreateForumPost, CreateMessage, GetMessages,
};
use serenity::http::{Http, HttpError};
use serenity::model::channel::{Channel, ChannelType, Message, ReactionType};
use serenity::model::id::{
    ChannelId as DiscordChannelId, GuildId as DiscordGuildId, MessageId as DiscordMessageId,
    UserId as DiscordUserId,
};

use crate::chat::{
    ChatApi, ChatError, ChatErrorKind, ChatMessage, Destination, Marker, Member, MessageRef,
    RenderedPost,
};
use crate::types::{ChannelId, GuildId, MessageId, UserId};

/// Discord caps thread names at 100 characters.
const THREAD_TITLE_LIMIT: usize = 100;

/// Title used when a post's headline is empty after trimming.
const FALLBACK_THREAD_TITLE: &str = "Untitled";

/// Page size of the message-history endpoint.
const HISTORY_PAGE: usize = 100;

/// [`ChatApi`] over the Discord REST API.
///
/// Holds only an HTTP handle; all state lives server-side. Cheap to clone
/// via the inner `Arc`.
#[derive(Debug)]
pub struct DiscordClient {
    http: Arc<Http>,
}

impl DiscordClient {
    pub fn new(http: Arc<Http>) -> Self {
        DiscordClient { http }
    }

    fn http(&self) -> &Http {
        &self.http
    }
}

impl ChatApi for DiscordClient {
    async fn resolve_destination(&self, channel: ChannelId) -> Result<Destination, ChatError> {
        let fetched = self
            .http()
            .get_channel(DiscordChannelId::new(channel.0))
            .await
            .map_err(|e| map_err("resolve channel", e))?;
        Ok(destination_for(channel, &fetched))
    }

    async fn send_post(
        &self,
        destination: &Destination,
        post: &RenderedPost,
    ) -> Result<MessageRef, ChatError> {
        let message = DiscordChannelId::new(destination.channel.0)
            .send_message(self.http(), CreateMessage::new().embed(build_embed(post)))
            .await
            .map_err(|e| map_err("send post", e))?;
        Ok(MessageRef {
            channel: destination.channel,
            message: MessageId(message.id.get()),
        })
    }

    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<MessageRef, ChatError> {
        let message = DiscordChannelId::new(channel.0)
            .send_message(self.http(), CreateMessage::new().content(text))
            .await
            .map_err(|e| map_err("send text", e))?;
        Ok(MessageRef {
            channel,
            message: MessageId(message.id.get()),
        })
    }

    async fn add_marker(&self, message: &MessageRef, marker: Marker) -> Result<(), ChatError> {
        self.http()
            .create_reaction(
                DiscordChannelId::new(message.channel.0),
                DiscordMessageId::new(message.message.0),
                &ReactionType::Unicode(marker.emoji().to_string()),
            )
            .await
            .map_err(|e| map_err("add marker", e))
    }

    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<ChatMessage, ChatError> {
        let fetched = self
            .http()
            .get_message(
                DiscordChannelId::new(channel.0),
                DiscordMessageId::new(message.0),
            )
            .await
            .map_err(|e| map_err("fetch message", e))?;
        Ok(convert_message(channel, &fetched))
    }

    async fn list_history(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let discord_channel = DiscordChannelId::new(channel.0);
        let mut collected = Vec::new();
        let mut before: Option<DiscordMessageId> = None;

        // The endpoint pages newest-first; walk backwards until `limit`.
        while collected.len() < limit {
            let page = (limit - collected.len()).min(HISTORY_PAGE);
            let mut request = GetMessages::new().limit(page as u8);
            if let Some(cursor) = before {
                request = request.before(cursor);
            }
            let batch = discord_channel
                .messages(self.http(), request)
                .await
                .map_err(|e| map_err("list history", e))?;
            let Some(last) = batch.last() else {
                break;
            };
            before = Some(last.id);
            let exhausted = batch.len() < page;
            collected.extend(batch.iter().map(|m| convert_message(channel, m)));
            if exhausted {
                break;
            }
        }
        Ok(collected)
    }

    async fn resolve_member(&self, guild: GuildId, user: UserId) -> Result<Member, ChatError> {
        let member = self
            .http()
            .get_member(DiscordGuildId::new(guild.0), DiscordUserId::new(user.0))
            .await
            .map_err(|e| map_err("resolve member", e))?;
        Ok(Member {
            user,
            roles: member
                .roles
                .iter()
                .map(|role| crate::types::RoleId(role.get()))
                .collect(),
        })
    }

    async fn create_thread(
        &self,
        destination: &Destination,
        title: &str,
        post: &RenderedPost,
    ) -> Result<MessageRef, ChatError> {
        let thread = DiscordChannelId::new(destination.channel.0)
            .create_forum_post(
                self.http(),
                CreateForumPost::new(
                    thread_title(title),
                    CreateMessage::new().embed(build_embed(post)),
                ),
            )
            .await
            .map_err(|e| map_err("create thread", e))?;
        // The starter message of a forum post shares the thread's id.
        Ok(MessageRef {
            channel: ChannelId(thread.id.get()),
            message: MessageId(thread.id.get()),
        })
    }
}

/// Capability flags for a fetched channel.
///
/// Forum channels take forum posts but have no flat message history to scan
/// and no message to react on; everything else message-shaped supports
/// markers and history.
fn destination_for(channel: ChannelId, fetched: &Channel) -> Destination {
    let kind = match fetched {
        Channel::Guild(guild_channel) => guild_channel.kind,
        Channel::Private(_) => ChannelType::Private,
        _ => ChannelType::Text,
    };
    match kind {
        ChannelType::Forum => Destination {
            channel,
            supports_markers: false,
            supports_threads: true,
            supports_history: false,
        },
        _ => Destination {
            channel,
            supports_markers: true,
            supports_threads: false,
            supports_history: true,
        },
    }
}

/// Renders a post as a Discord embed.
fn build_embed(post: &RenderedPost) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&post.title)
        .description(&post.body);
    if let Some(link) = &post.link {
        embed = embed.url(link);
    }
    if let Some(image) = &post.image {
        embed = embed.image(image);
    }
    if let Some(footer) = &post.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    embed
}

/// Reduces a Discord message to the parts the pipeline inspects.
///
/// The first embed becomes the post payload; non-marker reactions are
/// dropped here.
fn convert_message(channel: ChannelId, message: &Message) -> ChatMessage {
    let post = message.embeds.first().map(|embed| RenderedPost {
        title: embed.title.clone().unwrap_or_default(),
        link: embed.url.clone(),
        body: embed.description.clone().unwrap_or_default(),
        image: embed.image.as_ref().map(|image| image.url.clone()),
        footer: embed.footer.as_ref().map(|footer| footer.text.clone()),
    });
    let markers = message
        .reactions
        .iter()
        .filter_map(|reaction| match &reaction.reaction_type {
            ReactionType::Unicode(emoji) => Marker::from_emoji(emoji),
            _ => None,
        })
        .collect();
    ChatMessage {
        re: MessageRef {
            channel,
            message: MessageId(message.id.get()),
        },
        author: UserId(message.author.id.get()),
        post,
        markers,
    }
}

/// Caps a headline to a valid thread name, falling back when empty.
fn thread_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return FALLBACK_THREAD_TITLE.to_string();
    }
    match trimmed.char_indices().nth(THREAD_TITLE_LIMIT) {
        Some((byte_idx, _)) => trimmed[..byte_idx].to_string(),
        None => trimmed.to_string(),
    }
}

/// Maps a serenity error onto the pipeline's error taxonomy by HTTP status.
fn map_err(context: &str, error: serenity::Error) -> ChatError {
    let status = match &error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            Some(response.status_code.as_u16())
        }
        _ => None,
    };
    let kind = match status {
        Some(403) => ChatErrorKind::Permission,
        Some(404) => ChatErrorKind::NotFound,
        Some(400) => ChatErrorKind::Unsupported,
        Some(_) => ChatErrorKind::Send,
        None => ChatErrorKind::Other,
    };
    let mut chat_error = ChatError::new(kind, format!("{context}: {error}")).with_source(error);
    if let Some(status) = status {
        chat_error = chat_error.with_status(status);
    }
    chat_error
}
