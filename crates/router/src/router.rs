//! Dispatch of normalized events to their handlers.
//!
//! The transport fans one task out per inbound update and awaits nothing;
//! each entry point here runs its handler to completion and keeps every
//! failure local to its own event.

use std::sync::Arc;

use tracing::{debug, error};

use arkive_common::{Answer, Event, EventKind, buttons, messages};

use crate::{answers, outbound::Outbound, parse, processor::Processor};

#[derive(Clone)]
pub struct Router {
    pub(crate) processor: Arc<Processor>,
    pub(crate) outbound: Arc<dyn Outbound>,
    pub(crate) admin_id: i64,
}

impl Router {
    pub fn new(processor: Processor, outbound: Arc<dyn Outbound>, admin_id: i64) -> Self {
        Self { processor: Arc::new(processor), outbound, admin_id }
    }

    /// Handle one inbound message-like event.
    pub async fn route_message(&self, mut event: Event) {
        self.processor.add_message_id(event.meta.user_id, event.meta.message_id).await;
        self.processor.init_user(&event).await;

        let (command, text) = parse::command_and_text(&event.text);
        if !text.is_empty() {
            event.text = text;
        }

        if event.kind == EventKind::Unknown {
            self.handle_unknown(&event).await;
            return;
        }

        debug!(user_id = event.meta.user_id, command, "dispatch message");
        match command.as_str() {
            "" => self.handle_save(event).await,
            parse::START => self.handle_start(event).await,
            parse::INFO => self.handle_info(&event).await,
            parse::FOLDERS => self.handle_show_folders(&event).await,
            parse::MOVE_LAST_NOTE => self.handle_save_to(event).await,
            _ => self.handle_unknown(&event).await,
        }
    }

    /// Handle one inbound button press.
    pub async fn route_callback(&self, event: Event) {
        self.processor.init_user(&event).await;

        debug!(user_id = event.meta.user_id, data = %event.text, "dispatch callback");
        if event.text == buttons::CREATE_FOLDER {
            self.handle_create_folder(&event).await;
        } else if event.text == buttons::DELETE_FOLDER {
            self.handle_delete_folder(&event).await;
        } else if event.text.starts_with(buttons::DELETE_NOTE) {
            self.handle_delete_note(event).await;
        } else if event.text.starts_with(buttons::MOVE_NOTE) {
            self.handle_move_note(event).await;
        } else {
            self.handle_default_callback(event).await;
        }
    }

    // --- delivery plumbing ---

    /// Send one answer and record the produced message ids: ephemeral ones in
    /// the ledger, the rest as the persistent anchor.
    pub(crate) async fn deliver(&self, answer: Answer) {
        match self.outbound.deliver(&answer).await {
            Ok(ids) => {
                for id in ids {
                    if answer.delete_after {
                        self.processor.add_message_id(answer.user_id, id).await;
                    } else {
                        self.processor.set_anchor(answer.user_id, id).await;
                    }
                }
            },
            Err(e) => error!(chat_id = answer.chat_id, error = %e, "failed to deliver answer"),
        }
    }

    /// Bulk-delete the previous ephemeral screen.
    async fn delete_screen(&self, event: &Event) {
        let ids = self.processor.drain_message_ids(event.meta.user_id).await;
        if ids.is_empty() {
            return;
        }
        if let Err(e) = self.outbound.delete_messages(event.meta.chat_id, &ids).await {
            error!(chat_id = event.meta.chat_id, error = %e, "failed to delete screen");
        }
    }

    async fn delete_message(&self, event: &Event) {
        if event.meta.message_id == 0 {
            return;
        }
        let ids = [event.meta.message_id];
        if let Err(e) = self.outbound.delete_messages(event.meta.chat_id, &ids).await {
            error!(chat_id = event.meta.chat_id, error = %e, "failed to delete message");
        }
    }

    // --- message handlers ---

    /// Empty command: either the name completing a pending create-folder
    /// flow, or a plain note to save.
    async fn handle_save(&self, mut event: Event) {
        if self.processor.add_folder_end(&mut event).await.is_some() {
            let folder_buttons = self.processor.folders(&event).await;
            event.is_edited = true;
            self.delete_screen(&event).await;
            self.deliver(answers::folders_list(&event, folder_buttons, false)).await;
            self.processor.set_folders_shown(event.meta.user_id, true).await;
            return;
        }

        let params = self.processor.save(&mut event).await;
        // Edited messages merge into an existing note; the echo was already
        // sent when the note was first created.
        if !params.message.is_empty() && !event.is_edited {
            self.deliver(answers::note(&event, event.note_id, event.folder_id, true, params))
                .await;
        }
    }

    async fn handle_start(&self, mut event: Event) {
        let (greeting, button) = self.processor.start(&event).await;
        event.meta.message_id = self.processor.anchor(event.meta.user_id).await;
        self.delete_screen(&event).await;
        self.delete_message(&event).await;
        self.processor.set_folders_shown(event.meta.user_id, false).await;
        self.deliver(answers::folders_button(&event, greeting, button, true)).await;
    }

    async fn handle_show_folders(&self, event: &Event) {
        let folder_buttons = self.processor.folders(event).await;
        let shown = self.processor.folders_shown(event.meta.user_id).await;
        self.delete_screen(event).await;
        if !shown {
            self.deliver(answers::folders_list(event, folder_buttons, false)).await;
            self.processor.set_folders_shown(event.meta.user_id, true).await;
        }
    }

    async fn handle_save_to(&self, mut event: Event) {
        let message = self.processor.save_to(&mut event).await;
        let folder_buttons = self.processor.folders(&event).await;
        event.meta.message_id = self.processor.anchor(event.meta.user_id).await;
        self.delete_screen(&event).await;
        self.deliver(answers::message(&event, &message)).await;
        // Redraw the folders screen by editing the anchor in place.
        event.is_edited = true;
        self.deliver(answers::folders_list(&event, folder_buttons, false)).await;
        self.processor.set_folders_shown(event.meta.user_id, true).await;
    }

    async fn handle_info(&self, event: &Event) {
        self.delete_message(event).await;
        self.deliver(answers::message(event, messages::HELP)).await;
    }

    pub(crate) async fn handle_unknown(&self, event: &Event) {
        self.deliver(answers::message(event, messages::UNKNOWN_COMMAND)).await;
    }

    // --- callback handlers ---

    async fn handle_create_folder(&self, event: &Event) {
        let message = self.processor.add_folder_start(event);
        self.deliver(answers::message(event, message)).await;
    }

    async fn handle_delete_folder(&self, event: &Event) {
        let message = self.processor.delete_folder_start(event);
        self.deliver(answers::message(event, message)).await;
    }

    async fn handle_delete_note(&self, mut event: Event) {
        (event.note_id, event.folder_id, _) = parse::parse_button_callback(&event.text);
        let message = self.processor.remove_note(&event).await;
        self.delete_message(&event).await;
        self.deliver(answers::message(&event, &message)).await;
    }

    async fn handle_move_note(&self, mut event: Event) {
        (event.note_id, event.folder_id, _) = parse::parse_button_callback(&event.text);
        let message = self.processor.move_note_start(&event);
        // Turn the pressed note into the flow prompt.
        event.is_edited = true;
        self.delete_screen(&event).await;
        self.deliver(answers::message(&event, message)).await;
    }

    /// Everything else: first try to complete a pending delete-folder flow,
    /// then a pending move-note flow, then treat the payload as "open this
    /// folder".
    async fn handle_default_callback(&self, mut event: Event) {
        if let Some(message) = self.processor.delete_folder_end(&event).await {
            let folder_buttons = self.processor.folders(&event).await;
            event.is_edited = true;
            self.delete_screen(&event).await;
            if message == messages::CANNOT_DELETE_DEFAULT {
                event.is_edited = false;
                self.deliver(answers::message(&event, &message)).await;
            } else {
                self.deliver(answers::folders_list(&event, folder_buttons, false)).await;
                self.processor.set_folders_shown(event.meta.user_id, true).await;
            }
            return;
        }

        let mut queue: Vec<Answer> = Vec::new();
        if let Some(message) = self.processor.move_note_end(&mut event).await {
            queue.push(answers::message(&event, &message));
        }

        if let Some((notes, folder_name)) = self.processor.select_folder(&mut event).await {
            queue.push(answers::folder_header(&event, &folder_name));
            answers::collect_notes(&mut queue, &event, notes);
        }

        self.delete_screen(&event).await;
        for answer in queue {
            self.deliver(answer).await;
        }
    }
}
