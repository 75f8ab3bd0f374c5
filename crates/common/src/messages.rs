//! User-facing message strings.

pub const START: &str =
    "Hi! Send me anything — text, photos, files, voice — and I will file it into your folders.";
pub const HELP: &str = "Send any message to save it as a note.\n\
    /folders — show your folders\n\
    /move_note <name> (or !<name>) — move your latest note into a folder\n\
    Tap a note's 📤 to move it, 🗑 to delete it.";
pub const FOLDERS_CAPTION: &str = "🗂 Your folders";
pub const FOLDER_EMOJI: &str = "📁 ";

pub const UNKNOWN_COMMAND: &str = "I don't know this command.";
pub const ERROR: &str = "Something went wrong, please try again.";

pub const NOTE_CREATED: &str = "Note saved.";
pub const NOTE_REMOVED: &str = "Note deleted.";
pub const NOTE_MOVED: &str = "Done, moved.";
pub const NOTES_EMPTY: &str = "This folder is empty.";
/// Stand-in body for a note whose fragments carry no caption at all.
pub const EMPTY_NOTE: &str = "▲▲▲▲▲";

pub const ASK_FOLDER_NAME: &str = "Send me a name for the new folder.";
pub const FOLDER_CREATED: &str = "Folder created.";
pub const FOLDER_DELETED: &str = "Folder deleted.";
pub const FOLDER_NOT_EXISTS: &str = "This folder does not exist.";
pub const CANNOT_DELETE_DEFAULT: &str = "The default folder cannot be deleted.";
pub const CHOOSE_FOLDER_TO_DELETE: &str = "Choose the folder to delete.";
pub const CHOOSE_FOLDER_TO_MOVE: &str = "Choose the folder to move the note into.";

pub const ADMIN_PANEL: &str = "Welcome to the admin panel!";
pub const ADMIN_COUNT_USERS: &str = "Count of users";
