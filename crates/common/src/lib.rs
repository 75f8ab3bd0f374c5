//! Domain types shared across the arkive crates.
//!
//! Holds the normalized [`Event`] produced from raw Telegram updates, the
//! platform-neutral [`Answer`] descriptor consumed by the outbound renderer,
//! and the button/message constants defining the bot's callback protocol.

pub mod answer;
pub mod buttons;
pub mod event;
pub mod messages;

pub use {
    answer::{Answer, AnswerParams, InlineButton, Keyboard},
    event::{Event, EventKind, Meta},
};
