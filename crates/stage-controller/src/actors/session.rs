//! `SessionActor` - the Event Router for one call session.
//!
//! Each `SessionActor`:
//! - Owns the `StageCoordinator` (registry, selection, LastN)
//! - Handles mailbox messages strictly one at a time, in arrival order
//! - Dispatches the coordinator's commands to the collaborators after each
//!   message, in emission order
//! - Runs display switches in detached tasks and feeds their completions
//!   back through a dedicated channel
//!
//! A superseded display switch is never aborted. Its completion arrives with
//! an old token and the coordinator discards it.

use crate::collaborators::{DeliveryLayer, StageRenderer};
use crate::errors::StageError;
use crate::observability::metrics;
use crate::stage::commands::{DisplayRequest, StageCommand};
use crate::stage::coordinator::{StageCoordinator, StageSnapshot};
use crate::stage::events::StageEvent;
use crate::stage::registry::ParticipantInit;

use super::mailbox::MailboxMonitor;
use super::messages::{DisplayCompletion, SessionMessage};

use common::types::ParticipantId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Handle to a `SessionActor`.
#[derive(Clone)]
pub struct SessionActorHandle {
    sender: mpsc::Sender<SessionMessage>,
    cancel_token: CancellationToken,
    session_id: String,
}

impl SessionActorHandle {
    /// Get the session ID.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Route an event and wait until it has been handled and its commands
    /// dispatched.
    ///
    /// # Errors
    ///
    /// Returns `StageError::DuplicateParticipant` for a duplicate join, or
    /// `StageError::Internal` if the actor is gone.
    pub async fn dispatch(&self, event: StageEvent) -> Result<(), StageError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::Event {
                event,
                respond_to: Some(tx),
            })
            .await
            .map_err(|e| StageError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| StageError::Internal(format!("response receive failed: {e}")))?
    }

    /// Enqueue an event without waiting for it to be handled.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Internal` if the actor is gone.
    pub async fn notify(&self, event: StageEvent) -> Result<(), StageError> {
        self.sender
            .send(SessionMessage::Event {
                event,
                respond_to: None,
            })
            .await
            .map_err(|e| StageError::Internal(format!("channel send failed: {e}")))
    }

    /// A remote participant joined.
    ///
    /// # Errors
    ///
    /// Returns `StageError::DuplicateParticipant` if the ID is already known.
    pub async fn participant_joined(&self, init: ParticipantInit) -> Result<(), StageError> {
        self.dispatch(StageEvent::ParticipantJoined(init)).await
    }

    /// A remote participant left.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Internal` if the actor is gone.
    pub async fn participant_left(&self, participant_id: ParticipantId) -> Result<(), StageError> {
        self.dispatch(StageEvent::ParticipantLeft { participant_id })
            .await
    }

    /// The user clicked a thumbnail.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Internal` if the actor is gone.
    pub async fn user_clicked(&self, participant_id: ParticipantId) -> Result<(), StageError> {
        self.dispatch(StageEvent::UserClicked { participant_id })
            .await
    }

    /// Dominant speaker notification.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Internal` if the actor is gone.
    pub async fn dominant_speaker_changed(
        &self,
        participant_id: ParticipantId,
    ) -> Result<(), StageError> {
        self.dispatch(StageEvent::DominantSpeakerChanged { participant_id })
            .await
    }

    /// Server LastN announcement.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Internal` if the actor is gone.
    pub async fn server_last_n_changed(
        &self,
        server_set: Vec<ParticipantId>,
        entering: Option<Vec<ParticipantId>>,
    ) -> Result<(), StageError> {
        self.dispatch(StageEvent::ServerLastNChanged {
            server_set,
            entering,
        })
        .await
    }

    /// Playback started.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Internal` if the actor is gone.
    pub async fn stream_started(&self, participant_id: ParticipantId) -> Result<(), StageError> {
        self.dispatch(StageEvent::StreamStarted { participant_id })
            .await
    }

    /// Playback ended.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Internal` if the actor is gone.
    pub async fn stream_ended(&self, participant_id: ParticipantId) -> Result<(), StageError> {
        self.dispatch(StageEvent::StreamEnded { participant_id })
            .await
    }

    /// Get a snapshot of the stage.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Internal` if the actor is gone.
    pub async fn get_snapshot(&self) -> Result<StageSnapshot, StageError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::GetSnapshot { respond_to: tx })
            .await
            .map_err(|e| StageError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| StageError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the session actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The `SessionActor` implementation.
pub struct SessionActor {
    /// Session ID (log label).
    session_id: String,
    /// Message receiver.
    receiver: mpsc::Receiver<SessionMessage>,
    /// Display switch completions from detached tasks.
    completion_rx: mpsc::UnboundedReceiver<DisplayCompletion>,
    /// Cloned into every display switch task.
    completion_tx: mpsc::UnboundedSender<DisplayCompletion>,
    /// Cancellation token.
    cancel_token: CancellationToken,
    /// Stage state for this session.
    coordinator: StageCoordinator,
    delivery: Arc<dyn DeliveryLayer>,
    renderer: Arc<dyn StageRenderer>,
    /// Mailbox monitor.
    mailbox: MailboxMonitor,
}

impl SessionActor {
    /// Spawn a new session actor.
    ///
    /// Returns a handle and the task join handle.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Session label for logs
    /// * `coordinator` - Stage state, usually fresh from `StageCoordinator::from_config`
    /// * `delivery` - Delivery layer collaborator
    /// * `renderer` - Rendering collaborator
    /// * `mailbox_capacity` - Bounded mailbox size
    /// * `cancel_token` - Cancellation token
    pub fn spawn(
        session_id: String,
        coordinator: StageCoordinator,
        delivery: Arc<dyn DeliveryLayer>,
        renderer: Arc<dyn StageRenderer>,
        mailbox_capacity: usize,
        cancel_token: CancellationToken,
    ) -> (SessionActorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(mailbox_capacity);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let actor = Self {
            session_id: session_id.clone(),
            receiver,
            completion_rx,
            completion_tx,
            cancel_token: cancel_token.clone(),
            coordinator,
            delivery,
            renderer,
            mailbox: MailboxMonitor::new(&session_id),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = SessionActorHandle {
            sender,
            cancel_token,
            session_id,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "stage.actor.session", fields(session_id = %self.session_id))]
    async fn run(mut self) {
        info!(
            target: "stage.actor.session",
            session_id = %self.session_id,
            local_participant_id = %self.coordinator.local_id(),
            "SessionActor started"
        );

        loop {
            tokio::select! {
                biased;

                // Handle cancellation
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "stage.actor.session",
                        session_id = %self.session_id,
                        "SessionActor received cancellation signal"
                    );
                    break;
                }

                // Display switch completions. The actor holds a sender, so
                // this channel never closes while the loop runs.
                Some(completion) = self.completion_rx.recv() => {
                    self.coordinator
                        .display_switch_completed(completion.token, completion.result);
                    self.dispatch_commands().await;
                }

                // Handle messages
                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.record_receive(self.receiver.len());
                            self.handle_message(message).await;
                            self.mailbox.record_processed();
                        }
                        None => {
                            info!(
                                target: "stage.actor.session",
                                session_id = %self.session_id,
                                "SessionActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "stage.actor.session",
            session_id = %self.session_id,
            participants = self.coordinator.registry().len(),
            messages_processed = self.mailbox.messages_processed(),
            peak_mailbox_depth = self.mailbox.peak_depth(),
            "SessionActor stopped"
        );
    }

    /// Handle a single message.
    async fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Event { event, respond_to } => {
                let name = event.name();
                let started = Instant::now();
                let result = self.coordinator.handle_event(event);
                metrics::record_event(name, started.elapsed());

                if let Err(err) = &result {
                    warn!(
                        target: "stage.actor.session",
                        session_id = %self.session_id,
                        event = name,
                        error = %err,
                        error_kind = err.label(),
                        "Event rejected"
                    );
                }

                self.dispatch_commands().await;

                if let Some(respond_to) = respond_to {
                    let _ = respond_to.send(result);
                }
            }

            SessionMessage::GetSnapshot { respond_to } => {
                let _ = respond_to.send(self.coordinator.snapshot());
            }
        }
    }

    /// Dispatch queued commands in emission order.
    ///
    /// Collaborator failures are logged; the stage state is already
    /// committed and stays authoritative.
    async fn dispatch_commands(&mut self) {
        for command in self.coordinator.take_commands() {
            let name = command.name();
            debug!(
                target: "stage.actor.session",
                session_id = %self.session_id,
                command = name,
                "Dispatching command"
            );

            let result = match command {
                StageCommand::RequestPin {
                    participant_id,
                    active,
                } => self.delivery.request_pin(&participant_id, active).await,
                StageCommand::RequestSelectedEndpoint { participant_id } => {
                    self.delivery
                        .request_selected_endpoint(&participant_id)
                        .await
                }
                StageCommand::SetVisibility {
                    participant_id,
                    visibility,
                } => {
                    self.renderer
                        .set_visibility(&participant_id, visibility)
                        .await
                }
                StageCommand::RefreshView { participant_id } => {
                    self.renderer.refresh_view(&participant_id).await
                }
                StageCommand::DisplayLarge(request) => {
                    self.spawn_display_switch(request);
                    Ok(())
                }
            };

            if let Err(err) = result {
                warn!(
                    target: "stage.actor.session",
                    session_id = %self.session_id,
                    command = name,
                    error = %err,
                    "Collaborator call failed"
                );
            }
        }
    }

    /// Run a display switch detached from the mailbox loop.
    fn spawn_display_switch(&self, request: DisplayRequest) {
        let renderer = Arc::clone(&self.renderer);
        let completions = self.completion_tx.clone();
        let token = request.token;

        tokio::spawn(async move {
            let result = renderer.display_large(request).await;
            // Actor gone: nobody cares about the outcome
            let _ = completions.send(DisplayCompletion { token, result });
        });
    }
}
