//! Callback payload constants and button labels.
//!
//! Folder buttons carry `btn_<folder_id>` as callback data. Note action
//! buttons carry `<action>:<note_id>:<folder_id>` with an optional trailing
//! `ph` marker for single-photo notes.

pub const PREFIX: &str = "btn_";
pub const DELIMITER: &str = ":";
pub const WITH_PHOTO: &str = "ph";

pub const CREATE_FOLDER: &str = "btn_create_folder";
pub const DELETE_FOLDER: &str = "btn_delete_folder";
pub const MOVE_NOTE: &str = "btn_1_move";
pub const DELETE_NOTE: &str = "btn_3_delete";

/// Label of the persistent reply-keyboard button that opens the folders list.
pub const FOLDERS_MENU: &str = "📁📁📁";

/// Internal name of the always-present folder. Shown to users as
/// [`DEFAULT_FOLDER_LABEL`].
pub const DEFAULT_FOLDER_NAME: &str = "default";
pub const DEFAULT_FOLDER_LABEL: &str = "General";

pub const CREATE_FOLDER_LABEL: &str = "✅";
pub const DELETE_FOLDER_LABEL: &str = "❌";
pub const MOVE_NOTE_LABEL: &str = "📤";
pub const DELETE_NOTE_LABEL: &str = "🗑";

/// Callback data for a folder selection button.
pub fn folder_button(folder_id: i64) -> String {
    format!("{PREFIX}{folder_id}")
}
