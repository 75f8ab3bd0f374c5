//! SQLite persistence for arkive.
//!
//! Users, folders, notes and their per-kind attachment fragments, plus the
//! small key/value store backing session flags and the sent-message ledger.
//! Everything lives in one database; migrations are embedded.

pub mod error;
pub mod folders;
pub mod fragments;
pub mod kv;
pub mod notes;
pub mod schema;
pub mod users;

pub use {
    error::{Error, Result},
    folders::{Folder, FolderStore, SqliteFolderStore},
    fragments::{Fragment, FragmentStore, SqliteFragmentStore},
    kv::{KvStore, SqliteKvStore},
    notes::{Note, NoteStore, SqliteNoteStore},
    schema::run_migrations,
    users::{SqliteUserStore, User, UserStore},
};
