//! Telegram transport: the long-polling loop feeding the router and the
//! outbound renderer turning [`arkive_common::Answer`]s into API calls.

pub mod bot;
pub mod outbound;

pub use {bot::start_polling, outbound::TelegramOutbound};
