//! Shared test fixtures: proptest generators and an in-memory `ChatApi`.
//!
//! Only compiled for tests. The mock keeps per-channel message lists in
//! insertion order and exposes failure knobs so tests can make individual
//! operations fail with a chosen [`ChatErrorKind`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use proptest::prelude::*;

use crate::chat::{
    ChatApi, ChatError, ChatErrorKind, ChatMessage, Destination, Marker, Member, MessageRef,
    RenderedPost,
};
use crate::types::{ChannelId, GuildId, ItemId, MessageId, NewsItem, RoleId, UserId};

/// Author recorded for messages the mock itself sends.
const MOCK_AUTHOR: UserId = UserId(0);

pub fn arb_item_id() -> impl Strategy<Value = ItemId> {
    "https://example\\.com/news/[a-z0-9]{1,12}".prop_map(ItemId)
}

pub fn arb_news_item() -> impl Strategy<Value = NewsItem> {
    (
        arb_item_id(),
        "[A-Za-z0-9 ]{1,60}",
        proptest::option::of("https://cdn\\.example\\.com/[a-z0-9/]{1,20}\\.jpg"),
        "[A-Za-z0-9 .,]{0,400}",
    )
        .prop_map(|(id, title, image, excerpt)| {
            let link = id.as_str().to_string();
            NewsItem {
                id,
                title,
                link,
                image,
                excerpt,
            }
        })
}

pub fn make_item(id: &str, title: &str) -> NewsItem {
    NewsItem {
        id: ItemId::from(id),
        title: title.to_string(),
        link: id.to_string(),
        image: None,
        excerpt: format!("Excerpt for {title}"),
    }
}

pub fn make_destination(
    channel: ChannelId,
    markers: bool,
    threads: bool,
    history: bool,
) -> Destination {
    Destination {
        channel,
        supports_markers: markers,
        supports_threads: threads,
        supports_history: history,
    }
}

pub fn make_member(user: UserId, roles: &[RoleId]) -> Member {
    Member {
        user,
        roles: roles.to_vec(),
    }
}

/// In-memory [`ChatApi`] implementation.
///
/// Channels, members, and messages must be registered or seeded up front;
/// operations against unknown entities fail with `NotFound`, matching the
/// production backend.
#[derive(Default)]
pub struct MockChat {
    destinations: Mutex<HashMap<ChannelId, Destination>>,
    members: Mutex<HashMap<(GuildId, UserId), Member>>,
    messages: Mutex<HashMap<ChannelId, Vec<ChatMessage>>>,
    texts: Mutex<Vec<(ChannelId, String)>>,
    threads: Mutex<Vec<(ChannelId, String)>>,
    next_message_id: AtomicU64,

    fail_send: Mutex<Option<ChatErrorKind>>,
    fail_markers: Mutex<Option<ChatErrorKind>>,
    fail_threads: Mutex<Option<ChatErrorKind>>,
    fail_history: Mutex<Option<ChatErrorKind>>,
}

impl MockChat {
    pub fn new() -> Self {
        MockChat {
            next_message_id: AtomicU64::new(1),
            ..MockChat::default()
        }
    }

    /// Registers a resolvable destination.
    pub fn add_destination(&self, destination: Destination) {
        self.destinations
            .lock()
            .unwrap()
            .insert(destination.channel, destination);
    }

    /// Registers a resolvable guild member.
    pub fn add_member(&self, guild: GuildId, member: Member) {
        self.members
            .lock()
            .unwrap()
            .insert((guild, member.user), member);
    }

    /// Seeds an existing post with the given markers already attached.
    pub fn seed_post(
        &self,
        channel: ChannelId,
        post: &RenderedPost,
        markers: Vec<Marker>,
    ) -> MessageRef {
        self.push_message(channel, Some(post.clone()), markers)
    }

    /// Seeds an existing plain-text message (no post payload).
    pub fn seed_text(&self, channel: ChannelId, _text: &str) -> MessageRef {
        self.push_message(channel, None, Vec::new())
    }

    /// All messages in `channel`, oldest first.
    pub fn messages_in(&self, channel: ChannelId) -> Vec<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }

    /// One message by id, if it exists.
    pub fn message(&self, channel: ChannelId, message: MessageId) -> Option<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .get(&channel)?
            .iter()
            .find(|m| m.re.message == message)
            .cloned()
    }

    /// Every thread created so far, as `(channel, title)` in creation order.
    pub fn thread_titles(&self) -> Vec<(ChannelId, String)> {
        self.threads.lock().unwrap().clone()
    }

    /// Plain-text messages successfully sent to `channel`, in send order.
    pub fn texts_in(&self, channel: ChannelId) -> Vec<String> {
        self.texts
            .lock()
            .unwrap()
            .iter()
            .filter(|(ch, _)| *ch == channel)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn fail_send(&self, kind: ChatErrorKind) {
        *self.fail_send.lock().unwrap() = Some(kind);
    }

    pub fn fail_markers(&self, kind: ChatErrorKind) {
        *self.fail_markers.lock().unwrap() = Some(kind);
    }

    pub fn clear_marker_failure(&self) {
        *self.fail_markers.lock().unwrap() = None;
    }

    pub fn fail_threads(&self, kind: ChatErrorKind) {
        *self.fail_threads.lock().unwrap() = Some(kind);
    }

    pub fn clear_thread_failure(&self) {
        *self.fail_threads.lock().unwrap() = None;
    }

    pub fn fail_history(&self, kind: ChatErrorKind) {
        *self.fail_history.lock().unwrap() = Some(kind);
    }

    fn push_message(
        &self,
        channel: ChannelId,
        post: Option<RenderedPost>,
        markers: Vec<Marker>,
    ) -> MessageRef {
        let re = MessageRef {
            channel,
            message: MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst)),
        };
        self.messages
            .lock()
            .unwrap()
            .entry(channel)
            .or_default()
            .push(ChatMessage {
                re,
                author: MOCK_AUTHOR,
                post,
                markers,
            });
        re
    }

    fn knob(&self, knob: &Mutex<Option<ChatErrorKind>>, what: &str) -> Result<(), ChatError> {
        match *knob.lock().unwrap() {
            Some(kind) => Err(ChatError::new(kind, format!("mock {what} failure"))),
            None => Ok(()),
        }
    }
}

impl ChatApi for MockChat {
    async fn resolve_destination(&self, channel: ChannelId) -> Result<Destination, ChatError> {
        self.destinations
            .lock()
            .unwrap()
            .get(&channel)
            .copied()
            .ok_or_else(|| {
                ChatError::new(
                    ChatErrorKind::NotFound,
                    format!("unknown channel {channel}"),
                )
            })
    }

    async fn send_post(
        &self,
        destination: &Destination,
        post: &RenderedPost,
    ) -> Result<MessageRef, ChatError> {
        self.knob(&self.fail_send, "send")?;
        Ok(self.push_message(destination.channel, Some(post.clone()), Vec::new()))
    }

    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<MessageRef, ChatError> {
        self.knob(&self.fail_send, "send")?;
        self.texts
            .lock()
            .unwrap()
            .push((channel, text.to_string()));
        Ok(self.push_message(channel, None, Vec::new()))
    }

    async fn add_marker(&self, message: &MessageRef, marker: Marker) -> Result<(), ChatError> {
        self.knob(&self.fail_markers, "marker")?;
        let mut messages = self.messages.lock().unwrap();
        let found = messages
            .get_mut(&message.channel)
            .and_then(|msgs| msgs.iter_mut().find(|m| m.re == *message))
            .ok_or_else(|| {
                ChatError::new(
                    ChatErrorKind::NotFound,
                    format!("unknown message {}", message.message),
                )
            })?;
        if !found.markers.contains(&marker) {
            found.markers.push(marker);
        }
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<ChatMessage, ChatError> {
        self.message(channel, message).ok_or_else(|| {
            ChatError::new(
                ChatErrorKind::NotFound,
                format!("unknown message {message}"),
            )
        })
    }

    async fn list_history(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.knob(&self.fail_history, "history")?;
        let messages = self.messages.lock().unwrap();
        let newest_first: Vec<ChatMessage> = messages
            .get(&channel)
            .map(|msgs| msgs.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default();
        Ok(newest_first)
    }

    async fn resolve_member(&self, guild: GuildId, user: UserId) -> Result<Member, ChatError> {
        self.members
            .lock()
            .unwrap()
            .get(&(guild, user))
            .cloned()
            .ok_or_else(|| {
                ChatError::new(ChatErrorKind::NotFound, format!("unknown member {user}"))
            })
    }

    async fn create_thread(
        &self,
        destination: &Destination,
        title: &str,
        post: &RenderedPost,
    ) -> Result<MessageRef, ChatError> {
        self.knob(&self.fail_threads, "thread")?;
        if !destination.supports_threads {
            return Err(ChatError::new(
                ChatErrorKind::Unsupported,
                format!("channel {} is not thread-capable", destination.channel),
            ));
        }
        self.threads
            .lock()
            .unwrap()
            .push((destination.channel, title.to_string()));
        Ok(self.push_message(destination.channel, Some(post.clone()), Vec::new()))
    }
}
