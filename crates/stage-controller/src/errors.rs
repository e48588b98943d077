//! Stage Controller error types.
//!
//! Nothing in the stage core is fatal to a call session. Routine races
//! (events for participants that already left, inconsistent LastN payloads)
//! are logged and turned into no-ops; only wiring mistakes reach the caller.

use thiserror::Error;

/// Stage Controller error type.
#[derive(Debug, Error)]
pub enum StageError {
    /// A participant with this ID is already registered.
    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(String),

    /// The referenced participant is not in the registry.
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    /// Server-supplied LastN update is internally inconsistent.
    #[error("Malformed LastN update: {0}")]
    MalformedLastNUpdate(String),

    /// A delivery-layer collaborator call failed.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The participant ID is unusable (empty).
    #[error("Invalid participant id: {0}")]
    InvalidParticipantId(String),

    /// Internal error (mailbox closed, response dropped).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Display switch failures reported by the rendering collaborator.
///
/// Both variants are routine: the user moved on, or the renderer could not
/// attach the stream. Neither is surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    /// A newer display switch replaced this one mid-flight.
    #[error("Display switch superseded")]
    Superseded,

    /// The renderer could not complete the switch.
    #[error("Display switch failed: {0}")]
    Failed(String),
}

impl StageError {
    /// Whether this error is an expected race that is logged and swallowed.
    ///
    /// Routine errors never propagate out of an event handler.
    #[must_use]
    pub fn is_routine(&self) -> bool {
        matches!(
            self,
            StageError::UnknownParticipant(_) | StageError::MalformedLastNUpdate(_)
        )
    }

    /// Returns a bounded label for metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            StageError::DuplicateParticipant(_) => "duplicate_participant",
            StageError::UnknownParticipant(_) => "unknown_participant",
            StageError::MalformedLastNUpdate(_) => "malformed_last_n",
            StageError::Delivery(_) => "delivery",
            StageError::InvalidParticipantId(_) => "invalid_participant_id",
            StageError::Internal(_) => "internal",
        }
    }
}
