//! Platform-neutral outbound message descriptor.
//!
//! Handlers produce [`Answer`]s; the transport crate renders them into actual
//! API calls. Keeping the descriptor free of teloxide types lets the router be
//! tested without a network.

use crate::event::{Event, EventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self { label: label.into(), data: data.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Rows of callback buttons attached to the message.
    Inline(Vec<Vec<InlineButton>>),
    /// A single persistent reply-keyboard button with the given label.
    Reply(String),
}

/// What to send: body text, attachments and keyboard.
#[derive(Debug, Clone, Default)]
pub struct AnswerParams {
    pub kind: EventKind,
    pub message: String,
    pub file_ids: Vec<String>,
    pub keyboard: Option<Keyboard>,
}

impl AnswerParams {
    pub fn text(message: impl Into<String>) -> Self {
        Self { kind: EventKind::Text, message: message.into(), ..Self::default() }
    }
}

/// One outbound delivery: where to send it, whether the resulting message is
/// part of the ephemeral screen (`delete_after`) or becomes the persistent
/// anchor, and whether it edits an existing message or acknowledges a button
/// press along the way.
#[derive(Debug, Clone)]
pub struct Answer {
    pub user_id: i64,
    pub chat_id: i64,
    pub delete_after: bool,
    pub callback_id: Option<String>,
    pub edit_message_id: Option<i32>,
    pub params: AnswerParams,
}

impl Answer {
    pub fn new(event: &Event, delete_after: bool, params: AnswerParams) -> Self {
        Self {
            user_id: event.meta.user_id,
            chat_id: event.meta.chat_id,
            delete_after,
            callback_id: (event.is_callback && !event.meta.callback_id.is_empty())
                .then(|| event.meta.callback_id.clone()),
            edit_message_id: event.is_edited.then_some(event.meta.message_id),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::event::{EventKind, Meta},
        chrono::Utc,
    };

    fn event(is_callback: bool, is_edited: bool) -> Event {
        Event {
            kind: EventKind::Text,
            is_callback,
            is_edited,
            text: String::new(),
            file_id: String::new(),
            media_group_id: None,
            note_id: 0,
            folder_id: 0,
            meta: Meta {
                user_id: 1,
                chat_id: 2,
                message_id: 33,
                username: "alice".into(),
                callback_id: if is_callback { "cb".into() } else { String::new() },
                date: Utc::now(),
            },
        }
    }

    #[test]
    fn plain_answer_has_no_edit_or_ack() {
        let answer = Answer::new(&event(false, false), true, AnswerParams::text("hi"));
        assert!(answer.delete_after);
        assert_eq!(answer.callback_id, None);
        assert_eq!(answer.edit_message_id, None);
        assert_eq!(answer.chat_id, 2);
    }

    #[test]
    fn callback_answer_carries_ack_id() {
        let answer = Answer::new(&event(true, false), false, AnswerParams::text("hi"));
        assert_eq!(answer.callback_id.as_deref(), Some("cb"));
    }

    #[test]
    fn edited_answer_targets_source_message() {
        let answer = Answer::new(&event(false, true), false, AnswerParams::text("hi"));
        assert_eq!(answer.edit_message_id, Some(33));
    }
}
