//! Operations behind the router: user bootstrap, note saving, folder
//! navigation and the three conversational flows.
//!
//! All dependencies are constructor-injected; the processor owns the flow
//! registries and the folder context, and talks to persistence through the
//! store traits only.

use std::sync::Arc;

use tracing::{error, warn};

use {
    arkive_common::{AnswerParams, Event, EventKind, buttons, messages},
    arkive_flows::{FlowRegistry, FolderContext},
    arkive_store::{
        Fragment, FragmentStore, FolderStore, KvStore, Note, NoteStore, SqliteFolderStore,
        SqliteFragmentStore, SqliteKvStore, SqliteNoteStore, SqliteUserStore, User, UserStore,
    },
};

use crate::parse;

/// How close to its note an attachment must arrive for `/move_note` to treat
/// it as part of the note just sent.
const LAST_NOTE_WINDOW_SECS: i64 = 5;

/// One fragment store per attachment kind; the kinds stay independent even
/// though the implementation is shared.
pub struct Fragments {
    pub photos: Arc<dyn FragmentStore>,
    pub documents: Arc<dyn FragmentStore>,
    pub videos: Arc<dyn FragmentStore>,
    pub audios: Arc<dyn FragmentStore>,
    pub animations: Arc<dyn FragmentStore>,
    pub voices: Arc<dyn FragmentStore>,
}

impl Fragments {
    fn for_kind(&self, kind: EventKind) -> Option<&Arc<dyn FragmentStore>> {
        match kind {
            EventKind::Photo => Some(&self.photos),
            EventKind::Document => Some(&self.documents),
            EventKind::Video => Some(&self.videos),
            EventKind::Audio => Some(&self.audios),
            EventKind::Animation => Some(&self.animations),
            EventKind::Voice => Some(&self.voices),
            EventKind::Text | EventKind::Unknown => None,
        }
    }
}

pub struct Processor {
    users: Arc<dyn UserStore>,
    folders: Arc<dyn FolderStore>,
    notes: Arc<dyn NoteStore>,
    fragments: Fragments,
    kv: Arc<dyn KvStore>,
    flows: FlowRegistry,
    context: FolderContext,
}

fn ledger_key(user_id: i64) -> String {
    format!("msg:{user_id}")
}

fn anchor_key(user_id: i64) -> String {
    format!("user-msg:{user_id}")
}

fn folders_shown_key(user_id: i64) -> String {
    format!("folders-shown:{user_id}")
}

impl Processor {
    pub fn new(
        users: Arc<dyn UserStore>,
        folders: Arc<dyn FolderStore>,
        notes: Arc<dyn NoteStore>,
        fragments: Fragments,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        let context = FolderContext::new(Arc::clone(&folders));
        Self { users, folders, notes, fragments, kv, flows: FlowRegistry::new(), context }
    }

    /// Convenience constructor wiring every store onto one SQLite pool.
    pub fn sqlite(pool: sqlx::SqlitePool) -> Self {
        Self::new(
            Arc::new(SqliteUserStore::new(pool.clone())),
            Arc::new(SqliteFolderStore::new(pool.clone())),
            Arc::new(SqliteNoteStore::new(pool.clone())),
            Fragments {
                photos: Arc::new(SqliteFragmentStore::photos(pool.clone())),
                documents: Arc::new(SqliteFragmentStore::documents(pool.clone())),
                videos: Arc::new(SqliteFragmentStore::videos(pool.clone())),
                audios: Arc::new(SqliteFragmentStore::audios(pool.clone())),
                animations: Arc::new(SqliteFragmentStore::animations(pool.clone())),
                voices: Arc::new(SqliteFragmentStore::voices(pool.clone())),
            },
            Arc::new(SqliteKvStore::new(pool)),
        )
    }

    /// Ensure the sender exists, creating the user record and their default
    /// folder on first contact. Must run before any command or flow logic.
    pub async fn init_user(&self, event: &Event) {
        let user_id = event.meta.user_id;
        match self.users.exists(user_id).await {
            Ok(true) => return,
            Ok(false) => {},
            Err(e) => {
                error!(user_id, error = %e, "user lookup failed");
                return;
            },
        }

        let user = User { id: user_id, username: event.meta.username.clone() };
        if let Err(e) = self.users.save(&user).await {
            error!(user_id, error = %e, "failed to save user");
            return;
        }
        match self.folders.save(user_id, buttons::DEFAULT_FOLDER_NAME).await {
            Ok(id) => self.context.cache_default(user_id, id),
            Err(e) => error!(user_id, error = %e, "failed to create default folder"),
        }
    }

    pub async fn count_users(&self) -> String {
        match self.users.count().await {
            Ok(count) => format!("Users count: {count}"),
            Err(e) => {
                error!(error = %e, "failed to count users");
                messages::ERROR.to_owned()
            },
        }
    }

    // --- message ledger, anchor and session flag ---

    pub async fn add_message_id(&self, user_id: i64, message_id: i32) {
        if let Err(e) = self.kv.append(&ledger_key(user_id), i64::from(message_id)).await {
            error!(user_id, error = %e, "failed to record message id");
        }
    }

    /// Atomically take the ids of the previous screen.
    pub async fn drain_message_ids(&self, user_id: i64) -> Vec<i32> {
        match self.kv.drain(&ledger_key(user_id)).await {
            Ok(ids) => ids.into_iter().filter_map(|id| i32::try_from(id).ok()).collect(),
            Err(e) => {
                error!(user_id, error = %e, "failed to drain message ids");
                Vec::new()
            },
        }
    }

    pub async fn set_anchor(&self, user_id: i64, message_id: i32) {
        if let Err(e) = self.kv.set_int(&anchor_key(user_id), i64::from(message_id)).await {
            error!(user_id, error = %e, "failed to record anchor message");
        }
    }

    /// Id of the persistent anchor message, 0 when none was drawn yet.
    pub async fn anchor(&self, user_id: i64) -> i32 {
        match self.kv.int(&anchor_key(user_id)).await {
            Ok(id) => i32::try_from(id).unwrap_or_default(),
            Err(e) => {
                error!(user_id, error = %e, "failed to read anchor message");
                0
            },
        }
    }

    pub async fn set_folders_shown(&self, user_id: i64, shown: bool) {
        if let Err(e) = self.kv.set_int(&folders_shown_key(user_id), i64::from(shown)).await {
            error!(user_id, error = %e, "failed to set folders flag");
        }
    }

    pub async fn folders_shown(&self, user_id: i64) -> bool {
        match self.kv.int(&folders_shown_key(user_id)).await {
            Ok(value) => value != 0,
            Err(e) => {
                error!(user_id, error = %e, "failed to read folders flag");
                false
            },
        }
    }

    // --- commands ---

    /// Greeting for `/start`; re-ensures the default folder exists.
    pub async fn start(&self, event: &Event) -> (&'static str, &'static str) {
        let user_id = event.meta.user_id;
        if self.context.default_folder_id(user_id).await == 0 {
            match self.folders.save(user_id, buttons::DEFAULT_FOLDER_NAME).await {
                Ok(id) => self.context.cache_default(user_id, id),
                Err(e) => error!(user_id, error = %e, "failed to create default folder"),
            }
        }
        (messages::START, buttons::FOLDERS_MENU)
    }

    /// Folder buttons for the user, as (callback data, label) pairs. Also
    /// resets the current folder to whatever the event carries.
    pub async fn folders(&self, event: &Event) -> Vec<(String, String)> {
        let user_id = event.meta.user_id;
        self.context.set_current_folder(user_id, event.folder_id);

        match self.folders.list_by_user(user_id).await {
            Ok(folders) => folders
                .into_iter()
                .map(|folder| {
                    let label = if folder.name == buttons::DEFAULT_FOLDER_NAME {
                        buttons::DEFAULT_FOLDER_LABEL.to_owned()
                    } else {
                        folder.name
                    };
                    (buttons::folder_button(folder.id), label)
                })
                .collect(),
            Err(e) => {
                error!(user_id, error = %e, "failed to list folders");
                Vec::new()
            },
        }
    }

    /// Persist the event as a note in the current (or default) folder and
    /// record its attachment fragment. The returned message is empty when a
    /// caption-less media-group fragment merged into an existing note, in
    /// which case no echo should be sent.
    pub async fn save(&self, event: &mut Event) -> AnswerParams {
        let user_id = event.meta.user_id;
        event.folder_id = self.context.save_folder_id(user_id).await;

        let note = Note {
            id: 0,
            user_id,
            folder_id: event.folder_id,
            description: event.text.clone(),
            kind: event.kind,
            media_group_id: event.media_group_id.clone(),
            created_at: event.meta.date,
        };
        let note_id = match self.notes.save(&note).await {
            Ok(id) => id,
            Err(e) => {
                error!(user_id, error = %e, "failed to save note");
                return AnswerParams::text(messages::ERROR);
            },
        };
        event.note_id = note_id;

        if let Some(store) = self.fragments.for_kind(event.kind) {
            // An edit re-delivers the same attachment; replace instead of
            // stacking a duplicate fragment.
            let result = if event.is_edited {
                store.update_by_note_id(note_id, &event.file_id).await
            } else {
                store
                    .save(&Fragment {
                        note_id,
                        file_id: event.file_id.clone(),
                        media_group_id: event.media_group_id.clone(),
                    })
                    .await
                    .map(|_| ())
            };
            if let Err(e) = result {
                error!(user_id, note_id, error = %e, "failed to save fragment");
            }
        }

        let message = if event.media_group_id.is_some() && event.text.is_empty() {
            String::new()
        } else {
            messages::NOTE_CREATED.to_owned()
        };
        AnswerParams { kind: event.kind, message, ..AnswerParams::default() }
    }

    /// `/move_note <name>`: find or create the folder; if the user's latest
    /// note just landed, move it there, else make the folder current.
    pub async fn save_to(&self, event: &mut Event) -> String {
        let user_id = event.meta.user_id;
        let folder_id = match self.folders.find_or_create(user_id, &event.text).await {
            Ok(id) => id,
            Err(e) => {
                error!(user_id, error = %e, "failed to find or create folder");
                return messages::ERROR.to_owned();
            },
        };
        event.folder_id = folder_id;

        match self.notes.find_last(user_id).await {
            Ok(Some(last))
                if (event.meta.date - last.created_at).num_seconds() < LAST_NOTE_WINDOW_SECS => {
                if let Err(e) = self.notes.move_last(user_id, folder_id).await {
                    error!(user_id, error = %e, "failed to move last note");
                    return messages::ERROR.to_owned();
                }
                return messages::NOTE_MOVED.to_owned();
            },
            Ok(_) => {},
            Err(e) => error!(user_id, error = %e, "failed to look up last note"),
        }

        self.context.set_current_folder(user_id, folder_id);
        messages::NOTE_MOVED.to_owned()
    }

    // --- buttons and flows ---

    /// Open a folder: make it current and collect its notes with their files,
    /// sorted by note id. `None` when the payload is not a folder button.
    pub async fn select_folder(
        &self,
        event: &mut Event,
    ) -> Option<(Vec<(i64, AnswerParams)>, String)> {
        let user_id = event.meta.user_id;
        let folder_id = if event.folder_id != 0 {
            event.folder_id
        } else {
            parse::folder_id_from_button(&event.text)?
        };
        event.folder_id = folder_id;
        self.context.set_current_folder(user_id, folder_id);

        let folder_name = self.folders.find(folder_id).await.ok().flatten()?;

        let notes = match self.notes.list_folder(user_id, folder_id).await {
            Ok(notes) => notes,
            Err(e) => {
                error!(user_id, folder_id, error = %e, "failed to list notes");
                Vec::new()
            },
        };

        let mut items = Vec::with_capacity(notes.len());
        for note in notes {
            let mut params = AnswerParams {
                kind: note.kind,
                message: if note.description.is_empty() {
                    messages::EMPTY_NOTE.to_owned()
                } else {
                    note.description
                },
                ..AnswerParams::default()
            };
            if let Some(store) = self.fragments.for_kind(note.kind) {
                match store.find_by_note_id(note.id).await {
                    Ok(file_ids) => params.file_ids = file_ids,
                    Err(e) => error!(note_id = note.id, error = %e, "failed to load fragments"),
                }
            }
            items.push((note.id, params));
        }
        items.sort_by_key(|(id, _)| *id);

        Some((items, folder_name))
    }

    pub async fn remove_note(&self, event: &Event) -> String {
        if let Err(e) = self.notes.delete(event.note_id).await {
            error!(note_id = event.note_id, error = %e, "failed to delete note");
            return messages::ERROR.to_owned();
        }
        messages::NOTE_REMOVED.to_owned()
    }

    /// Enter the create-folder flow, remembering the pressed message for the
    /// final edit-in-place.
    pub fn add_folder_start(&self, event: &Event) -> &'static str {
        match self.flows.begin_create(event.meta.user_id, event.meta.message_id) {
            Ok(()) => messages::ASK_FOLDER_NAME,
            Err(e) => {
                warn!(user_id = event.meta.user_id, error = %e, "create folder flow");
                messages::ERROR
            },
        }
    }

    /// Complete a pending create-folder flow using the event text as the
    /// name. Retargets the event at the message recorded when the flow began.
    /// `None` when the user is not mid-flow.
    pub async fn add_folder_end(&self, event: &mut Event) -> Option<String> {
        let message_id = self.flows.complete_create(event.meta.user_id)?;
        event.meta.message_id = message_id;

        match self.folders.save(event.meta.user_id, &event.text).await {
            Ok(_) => Some(messages::FOLDER_CREATED.to_owned()),
            Err(e) => {
                error!(user_id = event.meta.user_id, error = %e, "failed to save folder");
                Some(messages::ERROR.to_owned())
            },
        }
    }

    pub fn delete_folder_start(&self, event: &Event) -> &'static str {
        match self.flows.begin_delete(event.meta.user_id) {
            Ok(()) => messages::CHOOSE_FOLDER_TO_DELETE,
            Err(e) => {
                warn!(user_id = event.meta.user_id, error = %e, "delete folder flow");
                messages::ERROR
            },
        }
    }

    /// Complete a pending delete-folder flow; the event text carries the
    /// chosen folder button. The default folder is refused.
    pub async fn delete_folder_end(&self, event: &Event) -> Option<String> {
        let user_id = event.meta.user_id;
        if !self.flows.complete_delete(user_id) {
            return None;
        }

        let Some(folder_id) = parse::folder_id_from_button(&event.text) else {
            return Some(messages::FOLDER_NOT_EXISTS.to_owned());
        };
        if folder_id == self.context.default_folder_id(user_id).await {
            return Some(messages::CANNOT_DELETE_DEFAULT.to_owned());
        }

        match self.folders.delete(folder_id).await {
            Ok(()) => Some(messages::FOLDER_DELETED.to_owned()),
            Err(e) => {
                error!(user_id, folder_id, error = %e, "failed to delete folder");
                Some(messages::FOLDER_NOT_EXISTS.to_owned())
            },
        }
    }

    /// Enter the move-note flow, capturing the note and its current folder
    /// from the pressed button payload.
    pub fn move_note_start(&self, event: &Event) -> &'static str {
        match self.flows.begin_move(event.meta.user_id, event.folder_id, event.note_id) {
            Ok(()) => messages::CHOOSE_FOLDER_TO_MOVE,
            Err(e) => {
                warn!(user_id = event.meta.user_id, error = %e, "move note flow");
                messages::ERROR
            },
        }
    }

    /// Complete a pending move-note flow; the event text carries the
    /// destination folder button. Rewrites the event to the remembered parent
    /// folder so the subsequent redraw returns the user where they were
    /// browsing. `None` when the user is not mid-flow.
    pub async fn move_note_end(&self, event: &mut Event) -> Option<String> {
        let completion = self.flows.complete_move(event.meta.user_id)?;
        let destination = parse::folder_id_from_button(&event.text).unwrap_or_default();
        event.note_id = completion.note_id;

        let message = match self.notes.move_note(completion.note_id, destination).await {
            Ok(()) => messages::NOTE_MOVED.to_owned(),
            Err(e) => {
                error!(note_id = completion.note_id, error = %e, "failed to move note");
                messages::ERROR.to_owned()
            },
        };
        event.folder_id = completion.parent_folder_id;
        Some(message)
    }
}
