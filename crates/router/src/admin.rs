//! Admin-only entry points, gated on the configured admin id.

use tracing::warn;

use arkive_common::{Answer, AnswerParams, Event, EventKind, InlineButton, Keyboard, messages};

use crate::router::Router;

pub const ADMIN_COMMAND: &str = "/adm";
pub const COUNT_USERS: &str = "adm_count_users";

impl Router {
    /// `/adm`: draw the admin panel. Non-admin senders are dropped before
    /// anything is recorded.
    pub async fn route_admin_message(&self, event: Event) {
        if !self.is_admin(&event) {
            return;
        }
        self.processor.add_message_id(event.meta.user_id, event.meta.message_id).await;
        self.deliver(admin_panel(&event)).await;
    }

    pub async fn route_admin_callback(&self, event: Event) {
        if !self.is_admin(&event) {
            return;
        }
        match event.text.as_str() {
            COUNT_USERS => {
                let message = self.processor.count_users().await;
                self.deliver(Answer::new(&event, true, AnswerParams::text(&message))).await;
            },
            _ => self.handle_unknown(&event).await,
        }
    }

    fn is_admin(&self, event: &Event) -> bool {
        if event.meta.user_id == self.admin_id {
            return true;
        }
        warn!(user_id = event.meta.user_id, "admin path hit by non-admin");
        false
    }
}

fn admin_panel(event: &Event) -> Answer {
    let rows = vec![vec![InlineButton::new(messages::ADMIN_COUNT_USERS, COUNT_USERS)]];
    Answer::new(
        event,
        true,
        AnswerParams {
            kind: EventKind::Text,
            message: messages::ADMIN_PANEL.to_owned(),
            keyboard: Some(Keyboard::Inline(rows)),
            ..AnswerParams::default()
        },
    )
}
