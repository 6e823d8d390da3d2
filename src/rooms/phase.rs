//! Phase state machine: the legal edges between `waiting`, `swiping`, and
//! `matched`. The room itself is terminated by membership (last member
//! leaving), not by a phase edge.

use thiserror::Error;

use crate::model::RoomStatus;

/// Events that drive the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Host starts the session from the waiting lobby.
    Start,
    /// The arbiter observed unanimity on a card.
    Match,
    /// Host restarts a matched session back into swiping.
    Restart,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the room was in when the invalid event was received.
    pub from: RoomStatus,
    /// The event that cannot be applied from this phase.
    pub event: PhaseEvent,
}

/// Compute the next phase for an event if the transition is legal.
pub fn compute_transition(
    from: RoomStatus,
    event: PhaseEvent,
) -> Result<RoomStatus, InvalidTransition> {
    match (from, event) {
        (RoomStatus::Waiting, PhaseEvent::Start) => Ok(RoomStatus::Swiping),
        (RoomStatus::Swiping, PhaseEvent::Match) => Ok(RoomStatus::Matched),
        (RoomStatus::Matched, PhaseEvent::Restart) => Ok(RoomStatus::Swiping),
        (from, event) => Err(InvalidTransition { from, event }),
    }
}
