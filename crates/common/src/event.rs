//! Normalization of raw Telegram updates into canonical [`Event`]s.
//!
//! Exactly one `Event` is produced per inbound update. Normalization is pure:
//! it never touches storage or the network, so the same raw update always
//! yields the same event.

use {
    chrono::{DateTime, Utc},
    teloxide::types::{CallbackQuery, MediaKind, Message, MessageKind, MessageOrigin},
    tracing::debug,
};

/// Payload classification of an inbound update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventKind {
    #[default]
    Unknown,
    Text,
    Photo,
    Document,
    Video,
    Audio,
    Animation,
    Voice,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Text => "text",
            Self::Photo => "photo",
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Animation => "animation",
            Self::Voice => "voice",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "photo" => Self::Photo,
            "document" => Self::Document,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "animation" => Self::Animation,
            "voice" => Self::Voice,
            _ => Self::Unknown,
        }
    }

    /// Whether this kind carries a file attachment.
    pub fn has_file(self) -> bool {
        !matches!(self, Self::Unknown | Self::Text)
    }

    /// Kinds whose text goes through forward-provenance extraction.
    /// Audio and animation carry no meaningful caption path here.
    fn checks_forward_origin(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Photo | Self::Document | Self::Video | Self::Voice
        )
    }
}

/// Sender/transport metadata attached to every event.
#[derive(Debug, Clone)]
pub struct Meta {
    pub user_id: i64,
    pub chat_id: i64,
    pub message_id: i32,
    pub username: String,
    pub callback_id: String,
    pub date: DateTime<Utc>,
}

/// One normalized inbound interaction.
///
/// `folder_id`, `note_id` and `text` may be rewritten by handlers to thread
/// context through a single request; everything else is fixed at creation.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub is_callback: bool,
    pub is_edited: bool,
    pub text: String,
    pub file_id: String,
    pub media_group_id: Option<String>,
    pub note_id: i64,
    pub folder_id: i64,
    pub meta: Meta,
}

impl Event {
    /// Normalize a plain or edited message.
    pub fn from_message(msg: &Message, is_edited: bool) -> Self {
        let kind = classify(msg);
        let mut text = extract_text(msg).unwrap_or_default();
        if kind.checks_forward_origin()
            && let Some(origin) = msg.forward_origin()
        {
            text = with_source(origin, text);
        }

        debug!(kind = kind.as_str(), chat_id = msg.chat.id.0, "normalized message");

        Self {
            kind,
            is_callback: false,
            is_edited,
            text,
            file_id: extract_file_id(msg).unwrap_or_default(),
            media_group_id: msg.media_group_id().map(str::to_owned),
            note_id: 0,
            folder_id: 0,
            meta: Meta {
                user_id: msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or_default(),
                chat_id: msg.chat.id.0,
                message_id: msg.id.0,
                username: msg
                    .from
                    .as_ref()
                    .and_then(|u| u.username.clone())
                    .unwrap_or_default(),
                callback_id: String::new(),
                date: msg.date,
            },
        }
    }

    /// Normalize a button press. The kind is inherited from the message the
    /// button was attached to (photo vs plain message); the timestamp too.
    pub fn from_callback(query: &CallbackQuery) -> Self {
        let message = query.message.as_ref();
        let referenced = message.and_then(|m| m.regular_message());

        let kind = match referenced {
            Some(msg) if msg.photo().is_some() => EventKind::Photo,
            _ => EventKind::Text,
        };

        debug!(kind = kind.as_str(), data = ?query.data, "normalized callback");

        Self {
            kind,
            is_callback: true,
            is_edited: false,
            text: query.data.clone().unwrap_or_default(),
            file_id: String::new(),
            media_group_id: None,
            note_id: 0,
            folder_id: 0,
            meta: Meta {
                user_id: query.from.id.0 as i64,
                chat_id: message.map(|m| m.chat().id.0).unwrap_or_default(),
                message_id: message.map(|m| m.id().0).unwrap_or_default(),
                username: query.from.username.clone().unwrap_or_default(),
                callback_id: query.id.clone(),
                date: referenced.map(|m| m.date).unwrap_or_else(Utc::now),
            },
        }
    }
}

fn classify(msg: &Message) -> EventKind {
    let MessageKind::Common(common) = &msg.kind else {
        return EventKind::Unknown;
    };
    match &common.media_kind {
        MediaKind::Photo(_) => EventKind::Photo,
        MediaKind::Document(_) => EventKind::Document,
        MediaKind::Video(_) => EventKind::Video,
        MediaKind::Audio(_) => EventKind::Audio,
        MediaKind::Animation(_) => EventKind::Animation,
        MediaKind::Voice(_) => EventKind::Voice,
        MediaKind::Text(t) if !t.text.is_empty() => EventKind::Text,
        _ => EventKind::Unknown,
    }
}

fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            MediaKind::Photo(p) => p.caption.clone(),
            MediaKind::Document(d) => d.caption.clone(),
            MediaKind::Video(v) => v.caption.clone(),
            MediaKind::Audio(a) => a.caption.clone(),
            MediaKind::Animation(a) => a.caption.clone(),
            MediaKind::Voice(v) => v.caption.clone(),
            _ => None,
        },
        _ => None,
    }
}

/// File reference of the payload; the largest size for photos.
fn extract_file_id(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Photo(p) => p.photo.last().map(|ps| ps.file.id.clone()),
            MediaKind::Document(d) => Some(d.document.file.id.clone()),
            MediaKind::Video(v) => Some(v.video.file.id.clone()),
            MediaKind::Audio(a) => Some(a.audio.file.id.clone()),
            MediaKind::Animation(a) => Some(a.animation.file.id.clone()),
            MediaKind::Voice(v) => Some(v.voice.file.id.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Prefix forwarded content with its public origin. When the origin has no
/// public handle the text passes through unchanged, which leaves it empty for
/// caption-less forwards.
fn with_source(origin: &MessageOrigin, text: String) -> String {
    let username = match origin {
        MessageOrigin::Channel { chat, .. } => chat.username().map(str::to_owned),
        MessageOrigin::Chat { sender_chat, .. } => sender_chat.username().map(str::to_owned),
        MessageOrigin::HiddenUser { sender_user_name, .. } => Some(sender_user_name.clone()),
        MessageOrigin::User { sender_user, .. } => sender_user.username.clone(),
    };
    match username {
        Some(name) => format!("Source: @{name}\n\n{text}"),
        None => text,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {serde_json::json, teloxide::types::Update};

    use super::*;

    fn message(extra: serde_json::Value) -> Message {
        let mut base = json!({
            "message_id": 100,
            "date": 1_700_000_000,
            "chat": {"id": 10, "type": "private", "first_name": "Alice"},
            "from": {"id": 10, "is_bot": false, "first_name": "Alice", "username": "alice"},
        });
        base.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn text_message_kind_and_meta() {
        let event = Event::from_message(&message(json!({"text": "hello"})), false);
        assert_eq!(event.kind, EventKind::Text);
        assert_eq!(event.text, "hello");
        assert_eq!(event.meta.user_id, 10);
        assert_eq!(event.meta.chat_id, 10);
        assert_eq!(event.meta.message_id, 100);
        assert_eq!(event.meta.username, "alice");
        assert!(!event.is_callback);
    }

    #[test]
    fn photo_takes_largest_size_and_caption() {
        let event = Event::from_message(
            &message(json!({
                "photo": [
                    {"file_id": "small", "file_unique_id": "u1", "width": 90, "height": 90},
                    {"file_id": "large", "file_unique_id": "u2", "width": 800, "height": 800},
                ],
                "caption": "cap",
                "media_group_id": "g1",
            })),
            false,
        );
        assert_eq!(event.kind, EventKind::Photo);
        assert_eq!(event.file_id, "large");
        assert_eq!(event.text, "cap");
        assert_eq!(event.media_group_id.as_deref(), Some("g1"));
    }

    #[test]
    fn document_video_voice_kinds() {
        let doc = message(json!({"document": {"file_id": "d1", "file_unique_id": "ud"}}));
        assert_eq!(Event::from_message(&doc, false).kind, EventKind::Document);

        let video = message(json!({
            // teloxide-core 0.10 requires the `mime_type` key to be present.
            "video": {"file_id": "v1", "file_unique_id": "uv", "width": 1, "height": 1, "duration": 1, "mime_type": null}
        }));
        assert_eq!(Event::from_message(&video, false).kind, EventKind::Video);

        let voice =
            message(json!({"voice": {"file_id": "vo1", "file_unique_id": "uvo", "duration": 2, "mime_type": null}}));
        let event = Event::from_message(&voice, false);
        assert_eq!(event.kind, EventKind::Voice);
        assert_eq!(event.file_id, "vo1");
    }

    #[test]
    fn unrecognized_payload_is_unknown() {
        let contact =
            message(json!({"contact": {"phone_number": "+100", "first_name": "Bob", "user_id": 7}}));
        assert_eq!(Event::from_message(&contact, false).kind, EventKind::Unknown);
    }

    #[test]
    fn forwarded_channel_post_gets_source_prefix() {
        let event = Event::from_message(
            &message(json!({
                "text": "breaking",
                "forward_origin": {
                    "type": "channel",
                    "chat": {"id": -1001, "type": "channel", "title": "News", "username": "newschan"},
                    "message_id": 5,
                    "date": 1_700_000_000,
                },
            })),
            false,
        );
        assert_eq!(event.text, "Source: @newschan\n\nbreaking");
    }

    #[test]
    fn forward_without_public_origin_keeps_text() {
        let event = Event::from_message(
            &message(json!({
                "text": "quote",
                "forward_origin": {
                    "type": "hidden_user",
                    "sender_user_name": "Someone",
                    "date": 1_700_000_000,
                },
            })),
            false,
        );
        assert_eq!(event.text, "Source: @Someone\n\nquote");
    }

    #[test]
    fn audio_forward_keeps_plain_caption() {
        let event = Event::from_message(
            &message(json!({
                "audio": {"file_id": "a1", "file_unique_id": "ua", "duration": 3, "mime_type": null},
                "caption": "song",
                "forward_origin": {
                    "type": "user",
                    "sender_user": {"id": 9, "is_bot": false, "first_name": "C", "username": "carol"},
                    "date": 1_700_000_000,
                },
            })),
            false,
        );
        assert_eq!(event.kind, EventKind::Audio);
        assert_eq!(event.text, "song");
    }

    #[test]
    fn callback_inherits_photo_kind_and_referenced_date() {
        // `UpdateKind`'s hand-rolled deserializer only works from a string
        // input; `serde_json::from_value` yields `UpdateKind::Error`.
        let update: Update = serde_json::from_str(&json!({
            "update_id": 1,
            "callback_query": {
                "id": "cbq1",
                "from": {"id": 10, "is_bot": false, "first_name": "Alice", "username": "alice"},
                "chat_instance": "ci",
                "data": "btn_5",
                "message": {
                    "message_id": 200,
                    "date": 1_700_000_000,
                    "chat": {"id": 10, "type": "private", "first_name": "Alice"},
                    "from": {"id": 42, "is_bot": true, "first_name": "bot"},
                    "photo": [{"file_id": "p", "file_unique_id": "up", "width": 1, "height": 1}],
                },
            },
        })
        .to_string())
        .unwrap();
        let teloxide::types::UpdateKind::CallbackQuery(query) = update.kind else {
            panic!("expected callback query");
        };

        let event = Event::from_callback(&query);
        assert_eq!(event.kind, EventKind::Photo);
        assert!(event.is_callback);
        assert_eq!(event.text, "btn_5");
        assert_eq!(event.meta.callback_id, "cbq1");
        assert_eq!(event.meta.message_id, 200);
        assert_eq!(event.meta.date.timestamp(), 1_700_000_000);
    }

    #[test]
    fn callback_on_plain_message_is_text() {
        let update: Update = serde_json::from_str(&json!({
            "update_id": 2,
            "callback_query": {
                "id": "cbq2",
                "from": {"id": 10, "is_bot": false, "first_name": "Alice"},
                "chat_instance": "ci",
                "data": "btn_create_folder",
                "message": {
                    "message_id": 201,
                    "date": 1_700_000_000,
                    "chat": {"id": 10, "type": "private", "first_name": "Alice"},
                    "from": {"id": 42, "is_bot": true, "first_name": "bot"},
                    "text": "🗂 Your folders",
                },
            },
        })
        .to_string())
        .unwrap();
        let teloxide::types::UpdateKind::CallbackQuery(query) = update.kind else {
            panic!("expected callback query");
        };

        let event = Event::from_callback(&query);
        assert_eq!(event.kind, EventKind::Text);
        assert_eq!(event.text, "btn_create_folder");
    }
}
