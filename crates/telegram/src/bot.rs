use std::sync::Arc;

use {
    secrecy::{ExposeSecret, SecretString},
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    arkive_common::Event,
    arkive_router::{Router, admin},
};

use crate::outbound::TelegramOutbound;

/// Connect the bot and start the long-polling loop.
///
/// Spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled. Each update is handled in its own task so
/// a slow handler never stalls the poll.
pub async fn start_polling(
    token: &SecretString,
    build_router: impl FnOnce(Arc<TelegramOutbound>) -> Router,
) -> anyhow::Result<CancellationToken> {
    // Client timeout longer than the long-polling timeout (30s) so the HTTP
    // client doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    let me = bot.get_me().await?;

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    let commands = vec![
        BotCommand::new("start", "Reset the screen and show the greeting"),
        BotCommand::new("folders", "Show your folders"),
        BotCommand::new("move_note", "Move the last note into a folder"),
        BotCommand::new("info", "Show help"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    let router = build_router(Arc::new(TelegramOutbound::new(bot.clone())));
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![
                    AllowedUpdate::Message,
                    AllowedUpdate::EditedMessage,
                    AllowedUpdate::CallbackQuery,
                ])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        dispatch(&router, update.kind);
                    }
                },
                Err(e) => {
                    // Another instance is polling with the same token.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!("another bot instance is already running with this token");
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(cancel)
}

/// Fan one update out into its own task.
fn dispatch(router: &Router, kind: UpdateKind) {
    match kind {
        UpdateKind::Message(msg) => {
            let router = router.clone();
            let is_admin = msg.text().is_some_and(|t| t.starts_with(admin::ADMIN_COMMAND));
            let event = Event::from_message(&msg, false);
            tokio::spawn(async move {
                if is_admin {
                    router.route_admin_message(event).await;
                } else {
                    router.route_message(event).await;
                }
            });
        },
        UpdateKind::EditedMessage(msg) => {
            // Only album caption edits are interesting: they feed the
            // longest-description-wins merge. Other edits change nothing.
            if msg.media_group_id().is_none() {
                return;
            }
            let router = router.clone();
            let event = Event::from_message(&msg, true);
            tokio::spawn(async move { router.route_message(event).await });
        },
        UpdateKind::CallbackQuery(query) => {
            let router = router.clone();
            let is_admin = query.data.as_deref() == Some(admin::COUNT_USERS);
            let event = Event::from_callback(&query);
            tokio::spawn(async move {
                if is_admin {
                    router.route_admin_callback(event).await;
                } else {
                    router.route_callback(event).await;
                }
            });
        },
        other => debug!("ignoring non-message update: {other:?}"),
    }
}
