//! Rendering of [`Answer`]s into Telegram API calls.

use {
    async_trait::async_trait,
    teloxide::{
        Bot,
        prelude::*,
        types::{
            ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia,
            InputMediaAudio, InputMediaDocument, InputMediaPhoto, InputMediaVideo, KeyboardButton,
            KeyboardMarkup, MessageId,
        },
    },
    tracing::{debug, warn},
};

use {
    arkive_common::{Answer, EventKind, Keyboard},
    arkive_router::Outbound,
};

/// Telegram caps captions at this many characters; longer note bodies travel
/// as a separate text message after the media.
const CAPTION_LIMIT: usize = 1024;

pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn ack(&self, answer: &Answer) {
        if let Some(callback_id) = &answer.callback_id
            && let Err(e) = self.bot.answer_callback_query(callback_id).await
        {
            debug!(error = %e, "failed to ack callback query");
        }
    }

    async fn edit(&self, answer: &Answer, message_id: i32) -> anyhow::Result<Vec<i32>> {
        let mut request = self.bot.edit_message_text(
            ChatId(answer.chat_id),
            MessageId(message_id),
            &answer.params.message,
        );
        if let Some(Keyboard::Inline(rows)) = &answer.params.keyboard {
            request = request.reply_markup(inline_markup(rows));
        }
        request.await?;
        Ok(vec![message_id])
    }

    async fn send_text(&self, answer: &Answer) -> anyhow::Result<Vec<i32>> {
        let chat_id = ChatId(answer.chat_id);
        let request = self.bot.send_message(chat_id, &answer.params.message);
        let message = match &answer.params.keyboard {
            Some(Keyboard::Inline(rows)) => request.reply_markup(inline_markup(rows)).await?,
            Some(Keyboard::Reply(label)) => request.reply_markup(reply_markup(label)).await?,
            None => request.await?,
        };
        Ok(vec![message.id.0])
    }

    /// One attachment: the body rides along as the caption when it fits,
    /// otherwise it follows as a separate message carrying the keyboard.
    async fn send_media(&self, answer: &Answer, file_id: &str) -> anyhow::Result<Vec<i32>> {
        let chat_id = ChatId(answer.chat_id);
        let input = InputFile::file_id(file_id);
        let body = &answer.params.message;
        let captionable = !body.is_empty() && body.chars().count() <= CAPTION_LIMIT;

        let caption = captionable.then(|| body.clone());
        let keyboard = captionable
            .then(|| answer.params.keyboard.clone())
            .flatten()
            .and_then(|kb| match kb {
                Keyboard::Inline(rows) => Some(inline_markup(&rows)),
                Keyboard::Reply(_) => None,
            });

        let message = match answer.params.kind {
            EventKind::Document => {
                let mut req = self.bot.send_document(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(kb) = keyboard {
                    req = req.reply_markup(kb);
                }
                req.await?
            },
            EventKind::Video => {
                let mut req = self.bot.send_video(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(kb) = keyboard {
                    req = req.reply_markup(kb);
                }
                req.await?
            },
            EventKind::Audio => {
                let mut req = self.bot.send_audio(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(kb) = keyboard {
                    req = req.reply_markup(kb);
                }
                req.await?
            },
            EventKind::Animation => {
                let mut req = self.bot.send_animation(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(kb) = keyboard {
                    req = req.reply_markup(kb);
                }
                req.await?
            },
            EventKind::Voice => {
                let mut req = self.bot.send_voice(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(kb) = keyboard {
                    req = req.reply_markup(kb);
                }
                req.await?
            },
            _ => {
                let mut req = self.bot.send_photo(chat_id, input);
                if let Some(c) = caption {
                    req = req.caption(c);
                }
                if let Some(kb) = keyboard {
                    req = req.reply_markup(kb);
                }
                req.await?
            },
        };

        let mut ids = vec![message.id.0];
        if !captionable && !body.is_empty() {
            ids.extend(self.send_text(answer).await?);
        }
        Ok(ids)
    }

    /// A media group cannot carry a keyboard, so the body and buttons always
    /// follow as a separate message.
    async fn send_group(&self, answer: &Answer) -> anyhow::Result<Vec<i32>> {
        let media: Vec<InputMedia> = answer
            .params
            .file_ids
            .iter()
            .map(|file_id| input_media(answer.params.kind, file_id))
            .collect();

        let sent = self.bot.send_media_group(ChatId(answer.chat_id), media).await?;
        let mut ids: Vec<i32> = sent.into_iter().map(|m| m.id.0).collect();
        if !answer.params.message.is_empty() {
            ids.extend(self.send_text(answer).await?);
        }
        Ok(ids)
    }
}

#[async_trait]
impl Outbound for TelegramOutbound {
    async fn deliver(&self, answer: &Answer) -> anyhow::Result<Vec<i32>> {
        self.ack(answer).await;

        if let Some(message_id) = answer.edit_message_id
            && message_id != 0
        {
            return self.edit(answer, message_id).await;
        }

        match answer.params.file_ids.len() {
            0 => self.send_text(answer).await,
            1 => self.send_media(answer, &answer.params.file_ids[0]).await,
            _ => self.send_group(answer).await,
        }
    }

    async fn delete_messages(&self, chat_id: i64, message_ids: &[i32]) -> anyhow::Result<()> {
        for &message_id in message_ids {
            if let Err(e) =
                self.bot.delete_message(ChatId(chat_id), MessageId(message_id)).await
            {
                warn!(chat_id, message_id, error = %e, "failed to delete message");
            }
        }
        Ok(())
    }
}

fn inline_markup(rows: &[Vec<arkive_common::InlineButton>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
            .collect::<Vec<_>>()
    }))
}

fn reply_markup(label: &str) -> KeyboardMarkup {
    KeyboardMarkup::new([[KeyboardButton::new(label)]]).resize_keyboard()
}

fn input_media(kind: EventKind, file_id: &str) -> InputMedia {
    let input = InputFile::file_id(file_id);
    match kind {
        EventKind::Video => InputMedia::Video(InputMediaVideo::new(input)),
        EventKind::Audio => InputMedia::Audio(InputMediaAudio::new(input)),
        EventKind::Document => InputMedia::Document(InputMediaDocument::new(input)),
        _ => InputMedia::Photo(InputMediaPhoto::new(input)),
    }
}
