//! Console collaborators for the `stage-controller` binary.
//!
//! Every collaborator call is written as one JSON line (the serialized
//! [`StageCommand`]) to a shared sink. The binary drains the sink to stdout.

use crate::collaborators::{DeliveryLayer, StageRenderer};
use crate::errors::{DisplayError, StageError};
use crate::stage::commands::{DisplayRequest, StageCommand};
use async_trait::async_trait;
use common::types::{ParticipantId, Visibility};
use std::time::Duration;
use tokio::sync::mpsc;

/// Line sink shared by the console collaborators.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    lines: mpsc::UnboundedSender<String>,
}

impl ConsoleSink {
    /// Create a sink and the receiver that drains it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (lines, receiver) = mpsc::unbounded_channel();
        (Self { lines }, receiver)
    }

    fn emit(&self, command: &StageCommand) -> Result<(), StageError> {
        let line = serde_json::to_string(command)
            .map_err(|e| StageError::Internal(format!("command serialization failed: {e}")))?;
        self.emit_raw(line)
    }

    /// Write a pre-serialized line (the binary's final snapshot).
    ///
    /// # Errors
    ///
    /// Returns `StageError::Delivery` once the receiver is gone.
    pub fn emit_raw(&self, line: String) -> Result<(), StageError> {
        self.lines
            .send(line)
            .map_err(|_| StageError::Delivery("console output closed".to_string()))
    }
}

/// Delivery layer that prints pin and endpoint requests.
#[derive(Debug, Clone)]
pub struct ConsoleDelivery {
    sink: ConsoleSink,
}

impl ConsoleDelivery {
    #[must_use]
    pub fn new(sink: ConsoleSink) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl DeliveryLayer for ConsoleDelivery {
    async fn request_pin(
        &self,
        participant_id: &ParticipantId,
        active: bool,
    ) -> Result<(), StageError> {
        self.sink.emit(&StageCommand::RequestPin {
            participant_id: participant_id.clone(),
            active,
        })
    }

    async fn request_selected_endpoint(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<(), StageError> {
        self.sink.emit(&StageCommand::RequestSelectedEndpoint {
            participant_id: participant_id.clone(),
        })
    }
}

/// Renderer that prints commands and simulates display switch latency.
#[derive(Debug, Clone)]
pub struct ConsoleRenderer {
    sink: ConsoleSink,
    switch_delay: Duration,
}

impl ConsoleRenderer {
    #[must_use]
    pub fn new(sink: ConsoleSink, switch_delay: Duration) -> Self {
        Self { sink, switch_delay }
    }
}

#[async_trait]
impl StageRenderer for ConsoleRenderer {
    async fn display_large(&self, request: DisplayRequest) -> Result<(), DisplayError> {
        self.sink
            .emit(&StageCommand::DisplayLarge(request))
            .map_err(|e| DisplayError::Failed(e.to_string()))?;
        if !self.switch_delay.is_zero() {
            tokio::time::sleep(self.switch_delay).await;
        }
        Ok(())
    }

    async fn set_visibility(
        &self,
        participant_id: &ParticipantId,
        visibility: Visibility,
    ) -> Result<(), StageError> {
        self.sink.emit(&StageCommand::SetVisibility {
            participant_id: participant_id.clone(),
            visibility,
        })
    }

    async fn refresh_view(&self, participant_id: &ParticipantId) -> Result<(), StageError> {
        self.sink.emit(&StageCommand::RefreshView {
            participant_id: participant_id.clone(),
        })
    }
}
