//! Message types for the session actor.

use crate::errors::{DisplayError, StageError};
use crate::stage::coordinator::StageSnapshot;
use crate::stage::display::DisplayToken;
use crate::stage::events::StageEvent;
use tokio::sync::oneshot;

/// Messages accepted by the `SessionActor` mailbox.
#[derive(Debug)]
pub enum SessionMessage {
    /// Route an inbound event. With `respond_to`, the reply is sent after the
    /// resulting commands have been dispatched.
    Event {
        event: StageEvent,
        respond_to: Option<oneshot::Sender<Result<(), StageError>>>,
    },

    /// Get a diagnostic snapshot of the stage.
    GetSnapshot {
        respond_to: oneshot::Sender<StageSnapshot>,
    },
}

/// Outcome of a detached display switch, fed back to the actor.
#[derive(Debug)]
pub struct DisplayCompletion {
    pub token: DisplayToken,
    pub result: Result<(), DisplayError>,
}
