//! State machine traits for lifecycle entities
//!
//! Status enums implement [`StateTransitions`] to declare which moves are
//! reachable; [`transition`] is the single guard every status change goes
//! through, so an unreachable move always fails with
//! [`DomainError::InvalidTransition`] and never mutates state.

use crate::errors::{DomainError, DomainResult};
use std::fmt::Debug;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + Copy + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Declares the reachable transitions for a state type
pub trait StateTransitions: State {
    /// Check if a transition to the target state is valid
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Get all valid target states from this state
    fn valid_transitions(&self) -> Vec<Self>;
}

/// Validate and perform a state transition
///
/// Terminal states admit no transitions. Returns the new state so callers
/// write `status = transition(status, target)?`.
pub fn transition<S: StateTransitions>(current: S, target: S) -> DomainResult<S> {
    if current.is_terminal() || !current.can_transition_to(&target) {
        return Err(DomainError::InvalidTransition {
            from: current.name().to_string(),
            to: target.name().to_string(),
        });
    }
    Ok(target)
}
