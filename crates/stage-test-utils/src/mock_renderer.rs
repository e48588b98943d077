//! Mock renderer for stage testing.
//!
//! Display switches run in detached tasks inside the session actor. This
//! mock can complete them immediately, fail them, or hold them open until the
//! test calls [`RecordingRenderer::release`], which is how tests reorder
//! completions to exercise stale tokens.
//!
//! # Example
//!
//! ```rust,ignore
//! let log = CommandLog::new();
//! let renderer = RecordingRenderer::gated(log.clone());
//!
//! // ... two clicks in a row ...
//! log.wait_for_displays(2).await;
//! let requests = log.display_requests();
//!
//! // Finish the newer switch first, then the older one
//! renderer.release(requests[1].0, Ok(()));
//! renderer.release(requests[0].0, Ok(()));
//! ```

use crate::mock_delivery::CommandLog;
use async_trait::async_trait;
use common::types::{ParticipantId, Visibility};
use stage_controller::collaborators::StageRenderer;
use stage_controller::errors::{DisplayError, StageError};
use stage_controller::stage::{DisplayRequest, DisplayToken, StageCommand};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// How `display_large` completes.
#[derive(Debug, Clone)]
enum DisplayMode {
    Immediate,
    Gated,
    Failing(DisplayError),
}

/// Renderer that records calls into a shared `CommandLog`.
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    log: CommandLog,
    mode: DisplayMode,
    gates: Arc<Mutex<HashMap<DisplayToken, oneshot::Sender<Result<(), DisplayError>>>>>,
}

impl RecordingRenderer {
    /// Display switches complete successfully right away.
    #[must_use]
    pub fn new(log: CommandLog) -> Self {
        Self::with_mode(log, DisplayMode::Immediate)
    }

    /// Display switches wait for [`Self::release`].
    #[must_use]
    pub fn gated(log: CommandLog) -> Self {
        Self::with_mode(log, DisplayMode::Gated)
    }

    /// Display switches fail with `error`.
    #[must_use]
    pub fn failing(log: CommandLog, error: DisplayError) -> Self {
        Self::with_mode(log, DisplayMode::Failing(error))
    }

    fn with_mode(log: CommandLog, mode: DisplayMode) -> Self {
        Self {
            log,
            mode,
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Finish a gated display switch.
    ///
    /// Panics if no switch with this token is waiting.
    pub fn release(&self, token: DisplayToken, result: Result<(), DisplayError>) {
        let gate = self
            .gates
            .lock()
            .unwrap()
            .remove(&token)
            .unwrap_or_else(|| panic!("no gated display switch for token {token}"));
        let _ = gate.send(result);
    }

    /// Number of gated switches still waiting.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.gates.lock().unwrap().len()
    }
}

#[async_trait]
impl StageRenderer for RecordingRenderer {
    async fn display_large(&self, request: DisplayRequest) -> Result<(), DisplayError> {
        let token = request.token;
        match &self.mode {
            DisplayMode::Immediate => {
                self.log.record(StageCommand::DisplayLarge(request));
                Ok(())
            }
            DisplayMode::Failing(error) => {
                self.log.record(StageCommand::DisplayLarge(request));
                Err(error.clone())
            }
            DisplayMode::Gated => {
                let (tx, rx) = oneshot::channel();
                // Register the gate before the request becomes visible in the log
                self.gates.lock().unwrap().insert(token, tx);
                self.log.record(StageCommand::DisplayLarge(request));
                rx.await
                    .unwrap_or_else(|_| Err(DisplayError::Failed("gate dropped".to_string())))
            }
        }
    }

    async fn set_visibility(
        &self,
        participant_id: &ParticipantId,
        visibility: Visibility,
    ) -> Result<(), StageError> {
        self.log.record(StageCommand::SetVisibility {
            participant_id: participant_id.clone(),
            visibility,
        });
        Ok(())
    }

    async fn refresh_view(&self, participant_id: &ParticipantId) -> Result<(), StageError> {
        self.log.record(StageCommand::RefreshView {
            participant_id: participant_id.clone(),
        });
        Ok(())
    }
}
