//! Mock delivery layer for stage testing.
//!
//! Recording collaborators share a `CommandLog`, so a test sees delivery and
//! renderer calls interleaved in the order the session actor made them.
//!
//! # Example
//!
//! ```rust,ignore
//! use stage_test_utils::{CommandLog, RecordingDelivery};
//!
//! let log = CommandLog::new();
//! let delivery = RecordingDelivery::new(log.clone());
//!
//! // ... drive the actor ...
//!
//! assert_eq!(log.pins(), vec![(pid("alice"), true)]);
//! ```

use async_trait::async_trait;
use common::types::ParticipantId;
use stage_controller::collaborators::DeliveryLayer;
use stage_controller::errors::StageError;
use stage_controller::stage::{DisplayToken, StageCommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Ordered record of every collaborator call.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Arc<Mutex<Vec<StageCommand>>>,
    changed: Arc<Notify>,
}

impl CommandLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call.
    pub fn record(&self, command: StageCommand) {
        self.commands.lock().unwrap().push(command);
        self.changed.notify_waiters();
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn commands(&self) -> Vec<StageCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Command names in call order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(StageCommand::name)
            .collect()
    }

    /// Pin requests as `(participant, active)`.
    #[must_use]
    pub fn pins(&self) -> Vec<(ParticipantId, bool)> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                StageCommand::RequestPin {
                    participant_id,
                    active,
                } => Some((participant_id.clone(), *active)),
                _ => None,
            })
            .collect()
    }

    /// Participants sent to the large video, in request order.
    #[must_use]
    pub fn displayed(&self) -> Vec<ParticipantId> {
        self.display_requests()
            .into_iter()
            .map(|(_, participant_id)| participant_id)
            .collect()
    }

    /// Display requests as `(token, participant)`.
    #[must_use]
    pub fn display_requests(&self) -> Vec<(DisplayToken, ParticipantId)> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                StageCommand::DisplayLarge(request) => {
                    Some((request.token, request.participant_id.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }

    /// Wait until at least `count` display requests have been recorded.
    pub async fn wait_for_displays(&self, count: usize) {
        self.wait_until(|log| log.display_requests().len() >= count)
            .await;
    }

    /// Wait until `condition` holds for the log.
    ///
    /// Panics after one second so a broken test fails instead of hanging.
    pub async fn wait_until(&self, condition: impl Fn(&CommandLog) -> bool) {
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                let notified = self.changed.notified();
                if condition(self) {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("timed out waiting for collaborator calls");
    }

    /// Number of recorded calls named `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }

    /// Participants whose views were refreshed, in call order.
    #[must_use]
    pub fn refreshed(&self) -> Vec<ParticipantId> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                StageCommand::RefreshView { participant_id } => Some(participant_id.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Delivery layer that records pin and endpoint requests.
#[derive(Debug, Clone)]
pub struct RecordingDelivery {
    log: CommandLog,
    fail: Arc<AtomicBool>,
}

impl RecordingDelivery {
    /// Create a delivery layer writing into `log`.
    #[must_use]
    pub fn new(log: CommandLog) -> Self {
        Self {
            log,
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent call fail after being recorded.
    pub fn fail_calls(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn outcome(&self) -> Result<(), StageError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StageError::Delivery("bridge channel closed".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeliveryLayer for RecordingDelivery {
    async fn request_pin(
        &self,
        participant_id: &ParticipantId,
        active: bool,
    ) -> Result<(), StageError> {
        self.log.record(StageCommand::RequestPin {
            participant_id: participant_id.clone(),
            active,
        });
        self.outcome()
    }

    async fn request_selected_endpoint(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<(), StageError> {
        self.log.record(StageCommand::RequestSelectedEndpoint {
            participant_id: participant_id.clone(),
        });
        self.outcome()
    }
}
