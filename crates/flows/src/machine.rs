//! The two-state flow machine.
//!
//! Every flow cycles `Start → Waiting → Start`. A `(state, event)` pair
//! outside the transition table is rejected without touching the state, which
//! is what makes duplicate or out-of-order button presses harmless.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Start,
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    Begin,
    Provide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition {event:?} from {state:?}")]
pub struct TransitionError {
    pub state: FlowState,
    pub event: FlowEvent,
}

pub fn transition(state: FlowState, event: FlowEvent) -> Result<FlowState, TransitionError> {
    match (state, event) {
        (FlowState::Start, FlowEvent::Begin) => Ok(FlowState::Waiting),
        (FlowState::Waiting, FlowEvent::Provide) => Ok(FlowState::Start),
        _ => Err(TransitionError { state, event }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_returns_to_start() {
        let waiting = transition(FlowState::Start, FlowEvent::Begin).unwrap();
        assert_eq!(waiting, FlowState::Waiting);
        let done = transition(waiting, FlowEvent::Provide).unwrap();
        assert_eq!(done, FlowState::Start);
    }

    #[test]
    fn begin_while_waiting_is_rejected() {
        let err = transition(FlowState::Waiting, FlowEvent::Begin).unwrap_err();
        assert_eq!(err.state, FlowState::Waiting);
        assert_eq!(err.event, FlowEvent::Begin);
    }

    #[test]
    fn provide_from_start_is_rejected() {
        assert!(transition(FlowState::Start, FlowEvent::Provide).is_err());
    }
}
