//! Per-user flow state registries.
//!
//! Each registry is a mutex-guarded map keyed by user id; the guards are
//! never held across await points. Entering a flow from the wrong state is an
//! error surfaced to the user; completing from the wrong state is a no-op, so
//! a rejected transition never corrupts scratch data.

use std::{collections::HashMap, sync::Mutex};

use crate::machine::{self, FlowEvent, FlowState, TransitionError};

#[derive(Debug, Default, Clone, Copy)]
struct CreateState {
    state: FlowState,
    /// Message to edit into the folders list once the name arrives.
    message_id: i32,
}

#[derive(Debug, Default, Clone, Copy)]
struct DeleteState {
    state: FlowState,
}

#[derive(Debug, Default, Clone, Copy)]
struct MoveState {
    state: FlowState,
    parent_folder_id: i64,
    note_id: i64,
}

/// Scratch data handed back when a move flow completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCompletion {
    pub note_id: i64,
    pub parent_folder_id: i64,
}

#[derive(Debug, Default)]
pub struct FlowRegistry {
    create: Mutex<HashMap<i64, CreateState>>,
    delete: Mutex<HashMap<i64, DeleteState>>,
    moves: Mutex<HashMap<i64, MoveState>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the create-folder flow, remembering which message to edit at
    /// completion. The first recorded message id sticks until the cycle ends.
    pub fn begin_create(&self, user_id: i64, message_id: i32) -> Result<(), TransitionError> {
        let mut map = self.create.lock().unwrap_or_else(|e| e.into_inner());
        let state = map.entry(user_id).or_default();
        if state.message_id == 0 {
            state.message_id = message_id;
        }
        state.state = machine::transition(state.state, FlowEvent::Begin)?;
        Ok(())
    }

    /// Complete the create-folder flow, returning the message id recorded at
    /// `begin`. `None` when the user is not mid-flow.
    pub fn complete_create(&self, user_id: i64) -> Option<i32> {
        let mut map = self.create.lock().unwrap_or_else(|e| e.into_inner());
        let state = map.get_mut(&user_id)?;
        state.state = machine::transition(state.state, FlowEvent::Provide).ok()?;
        let message_id = state.message_id;
        state.message_id = 0;
        Some(message_id)
    }

    pub fn begin_delete(&self, user_id: i64) -> Result<(), TransitionError> {
        let mut map = self.delete.lock().unwrap_or_else(|e| e.into_inner());
        let state = map.entry(user_id).or_default();
        state.state = machine::transition(state.state, FlowEvent::Begin)?;
        Ok(())
    }

    /// True when a pending delete-folder flow was completed by this event.
    pub fn complete_delete(&self, user_id: i64) -> bool {
        let mut map = self.delete.lock().unwrap_or_else(|e| e.into_inner());
        let Some(state) = map.get_mut(&user_id) else {
            return false;
        };
        match machine::transition(state.state, FlowEvent::Provide) {
            Ok(next) => {
                state.state = next;
                true
            },
            Err(_) => false,
        }
    }

    /// Enter the move-note flow. The note and its current folder are captured
    /// from the first entry only; non-zero scratch marks "already mid-flow".
    pub fn begin_move(
        &self,
        user_id: i64,
        parent_folder_id: i64,
        note_id: i64,
    ) -> Result<(), TransitionError> {
        let mut map = self.moves.lock().unwrap_or_else(|e| e.into_inner());
        let state = map.entry(user_id).or_default();
        if state.parent_folder_id == 0 && state.note_id == 0 {
            state.parent_folder_id = parent_folder_id;
            state.note_id = note_id;
        }
        state.state = machine::transition(state.state, FlowEvent::Begin)?;
        Ok(())
    }

    pub fn complete_move(&self, user_id: i64) -> Option<MoveCompletion> {
        let mut map = self.moves.lock().unwrap_or_else(|e| e.into_inner());
        let state = map.entry(user_id).or_default();
        state.state = machine::transition(state.state, FlowEvent::Provide).ok()?;
        let completion =
            MoveCompletion { note_id: state.note_id, parent_folder_id: state.parent_folder_id };
        state.note_id = 0;
        state.parent_folder_id = 0;
        Some(completion)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn create_cycle_round_trips_message_id() {
        let registry = FlowRegistry::new();
        registry.begin_create(1, 42).unwrap();
        assert_eq!(registry.complete_create(1), Some(42));
        // Fresh cycle records a fresh message id.
        registry.begin_create(1, 43).unwrap();
        assert_eq!(registry.complete_create(1), Some(43));
    }

    #[test]
    fn double_begin_is_an_error() {
        let registry = FlowRegistry::new();
        registry.begin_create(1, 42).unwrap();
        assert!(registry.begin_create(1, 99).is_err());
        // The pending cycle is intact.
        assert_eq!(registry.complete_create(1), Some(42));
    }

    #[test]
    fn completion_is_idempotent() {
        let registry = FlowRegistry::new();
        registry.begin_create(1, 42).unwrap();
        assert_eq!(registry.complete_create(1), Some(42));
        assert_eq!(registry.complete_create(1), None);

        registry.begin_delete(2).unwrap();
        assert!(registry.complete_delete(2));
        assert!(!registry.complete_delete(2));

        registry.begin_move(3, 10, 5).unwrap();
        assert!(registry.complete_move(3).is_some());
        assert_eq!(registry.complete_move(3), None);
    }

    #[test]
    fn completion_without_begin_is_noop() {
        let registry = FlowRegistry::new();
        assert_eq!(registry.complete_create(1), None);
        assert!(!registry.complete_delete(1));
        assert_eq!(registry.complete_move(1), None);
    }

    #[test]
    fn move_scratch_sticks_to_first_entry_and_clears() {
        let registry = FlowRegistry::new();
        registry.begin_move(1, 10, 5).unwrap();
        // A second begin mid-flow is rejected and must not overwrite scratch.
        assert!(registry.begin_move(1, 77, 88).is_err());
        assert_eq!(
            registry.complete_move(1),
            Some(MoveCompletion { note_id: 5, parent_folder_id: 10 })
        );
        // Next cycle starts with cleared scratch.
        registry.begin_move(1, 20, 6).unwrap();
        assert_eq!(
            registry.complete_move(1),
            Some(MoveCompletion { note_id: 6, parent_folder_id: 20 })
        );
    }

    #[test]
    fn users_do_not_cross_talk() {
        let registry = FlowRegistry::new();
        registry.begin_create(1, 42).unwrap();
        registry.begin_create(2, 77).unwrap();
        assert_eq!(registry.complete_create(2), Some(77));
        assert_eq!(registry.complete_create(1), Some(42));
    }
}
