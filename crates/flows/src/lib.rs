//! Conversation state engine.
//!
//! Three independent two-state flows per user (create folder, delete folder,
//! move note), plus the folder context that tracks which folder a user is
//! currently inside and resolves their default folder.

pub mod context;
pub mod machine;
pub mod registry;

pub use {
    context::FolderContext,
    machine::{FlowEvent, FlowState, TransitionError},
    registry::{FlowRegistry, MoveCompletion},
};
