//! Session-scoped stage coordinator.
//!
//! Owns the participant registry, the selection state and the LastN state of
//! one call. Every handler runs to completion synchronously and queues its
//! side effects as [`StageCommand`]s; the session actor drains and dispatches
//! them after each event.
//!
//! Large target precedence, highest first: explicit pin, dominant speaker,
//! last visible thumbnail, first known remote, local participant.
//!
//! Handlers return `StageError::UnknownParticipant` for IDs that are not
//! registered, leaving all state untouched. [`StageCoordinator::handle_event`]
//! logs and swallows those; only wiring mistakes reach the caller.

use crate::config::Config;
use crate::errors::{DisplayError, StageError};
use crate::observability::metrics;
use crate::stage::commands::{DisplayRequest, StageCommand};
use crate::stage::display::{DisplaySwitchTracker, DisplayToken};
use crate::stage::events::StageEvent;
use crate::stage::last_n::LastNState;
use crate::stage::registry::{Participant, ParticipantInit, ParticipantRef, ParticipantRegistry};
use crate::stage::selection::{SelectionState, TargetReason};
use common::types::{ParticipantId, StreamHandle, VideoType, Visibility};
use serde::Serialize;
use std::mem;
use tracing::{debug, error, info, warn};

/// Serializable view of the whole stage, for diagnostics and tests.
#[derive(Debug, Clone, Serialize)]
pub struct StageSnapshot {
    pub local_participant_id: ParticipantId,
    pub selection: SelectionState,
    pub sticky_stage: bool,
    pub last_n: LastNState,
    /// Local participant first, then remotes in join order.
    pub participants: Vec<Participant>,
    /// Latest display switch token issued, if any.
    pub display_token: Option<DisplayToken>,
}

impl StageSnapshot {
    #[must_use]
    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id() == id)
    }
}

/// Stage state for one call session.
#[derive(Debug)]
pub struct StageCoordinator {
    registry: ParticipantRegistry,
    selection: SelectionState,
    last_n: LastNState,
    display: DisplaySwitchTracker,
    /// Thumbnail order reported by the renderer; join order when unset.
    presentation_order: Option<Vec<ParticipantId>>,
    /// Large container "stays on stage": dominant speaker changes do not retarget.
    sticky_stage: bool,
    filmstrip_only: bool,
    commands: Vec<StageCommand>,
}

impl StageCoordinator {
    /// Create a coordinator holding only the local participant.
    #[must_use]
    pub fn new(local_id: ParticipantId, channel_last_n: Option<usize>) -> Self {
        let last_n = LastNState::new(channel_last_n);
        metrics::set_participants(1);
        metrics::set_local_last_n_capacity(last_n.local_capacity());

        Self {
            registry: ParticipantRegistry::new(local_id),
            selection: SelectionState::default(),
            last_n,
            display: DisplaySwitchTracker::new(),
            presentation_order: None,
            sticky_stage: false,
            filmstrip_only: false,
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.local_participant_id.clone(), config.channel_last_n)
            .with_filmstrip_only(config.filmstrip_only)
    }

    /// Filmstrip-only UIs never move the stage on dominant speaker changes.
    #[must_use]
    pub fn with_filmstrip_only(mut self, filmstrip_only: bool) -> Self {
        self.filmstrip_only = filmstrip_only;
        self
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[must_use]
    pub fn last_n(&self) -> &LastNState {
        &self.last_n
    }

    #[must_use]
    pub fn local_id(&self) -> &ParticipantId {
        self.registry.local_id()
    }

    #[must_use]
    pub fn is_currently_on_large(&self, id: &ParticipantId) -> bool {
        self.selection.is_on_large(id)
    }

    #[must_use]
    pub fn is_in_last_n(&self, id: &ParticipantId) -> bool {
        self.last_n.is_in_last_n(id)
    }

    #[must_use]
    pub fn sticky_stage(&self) -> bool {
        self.sticky_stage
    }

    /// Commands queued since the last drain.
    #[must_use]
    pub fn pending_commands(&self) -> &[StageCommand] {
        &self.commands
    }

    /// Drain queued commands in emission order.
    pub fn take_commands(&mut self) -> Vec<StageCommand> {
        mem::take(&mut self.commands)
    }

    #[must_use]
    pub fn snapshot(&self) -> StageSnapshot {
        let participants = self
            .registry
            .get(self.registry.local_id())
            .into_iter()
            .chain(self.registry.remotes())
            .cloned()
            .collect();

        StageSnapshot {
            local_participant_id: self.registry.local_id().clone(),
            selection: self.selection.clone(),
            sticky_stage: self.sticky_stage,
            last_n: self.last_n.clone(),
            participants,
            display_token: self.display.latest(),
        }
    }

    // ------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------

    /// Route one inbound event to its handler.
    ///
    /// Routine races (unknown participants) are logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns `StageError::DuplicateParticipant` when a join event names a
    /// participant that is already registered. The session stays usable.
    pub fn handle_event(&mut self, event: StageEvent) -> Result<(), StageError> {
        let name = event.name();
        let result = match event {
            StageEvent::ParticipantJoined(init) => self.participant_joined(init),
            StageEvent::ParticipantLeft { participant_id } => {
                self.participant_left(&participant_id)
            }
            StageEvent::UserClicked { participant_id } => self.user_clicked(&participant_id),
            StageEvent::TogglePin { participant_id } => self.toggle_pin(&participant_id),
            StageEvent::DominantSpeakerChanged { participant_id } => {
                self.dominant_speaker_changed(&participant_id)
            }
            StageEvent::ServerLastNChanged {
                server_set,
                entering,
            } => {
                self.server_last_n_changed(server_set, entering);
                Ok(())
            }
            StageEvent::StreamAdded {
                participant_id,
                stream,
            } => self.stream_added(&participant_id, stream),
            StageEvent::StreamRemoved { participant_id } => self.stream_removed(&participant_id),
            StageEvent::StreamStarted { participant_id } => self.stream_started(&participant_id),
            StageEvent::StreamEnded { participant_id } => self.stream_ended(&participant_id),
            StageEvent::VideoTypeChanged {
                participant_id,
                video_type,
            } => self.video_type_changed(&participant_id, video_type),
            StageEvent::VideoMuteChanged {
                participant_id,
                muted,
            } => self.video_mute_changed(&participant_id, muted),
            StageEvent::ConnectionStatusChanged {
                participant_id,
                active,
            } => self.connection_status_changed(&participant_id, active),
            StageEvent::ConferenceJoined => self.conference_joined(),
            StageEvent::StageLockChanged { sticky } => {
                self.stage_lock_changed(sticky);
                Ok(())
            }
            StageEvent::PresentationOrderChanged { order } => {
                self.presentation_order_changed(order);
                Ok(())
            }
        };

        match result {
            Err(err) if err.is_routine() => {
                debug!(
                    target: "stage.selection",
                    event = name,
                    error = %err,
                    "Ignoring routine race"
                );
                Ok(())
            }
            other => other,
        }
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Register a remote participant and announce its initial visibility.
    ///
    /// # Errors
    ///
    /// Returns `StageError::DuplicateParticipant` if the ID is already known,
    /// `StageError::InvalidParticipantId` if it is empty.
    pub fn participant_joined(&mut self, init: ParticipantInit) -> Result<(), StageError> {
        let visibility = self
            .last_n
            .initial_visibility(self.registry.remote_count() + 1);

        let participant_id = self
            .registry
            .add(init, visibility)
            .map(|participant| participant.id().clone())
            .inspect_err(|err| {
                error!(
                    target: "stage.registry",
                    error = %err,
                    error_kind = err.label(),
                    "Participant join rejected"
                );
            })?;

        info!(
            target: "stage.selection",
            participant_id = %participant_id,
            visibility = visibility.as_str(),
            "Participant joined"
        );
        metrics::set_participants(self.registry.len());
        self.commands.push(StageCommand::SetVisibility {
            participant_id,
            visibility,
        });
        Ok(())
    }

    /// Remove a participant and cascade: pin, dominant speaker, pending pin
    /// and the large target never keep pointing at a departed ID.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn participant_left(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        if self.registry.is_local(id) {
            warn!(
                target: "stage.selection",
                participant_id = %id,
                "Ignoring leave event for the local participant"
            );
            return Ok(());
        }
        if self.registry.remove(id).is_none() {
            return Err(StageError::UnknownParticipant(id.to_string()));
        }

        if self.selection.is_pinned(id) {
            info!(target: "stage.selection", participant_id = %id, "Pinned participant has left");
        }
        if self.selection.is_dominant_speaker(id) {
            info!(target: "stage.selection", participant_id = %id, "Dominant speaker has left");
        }
        self.selection.forget(id);
        self.last_n.forget(id);
        if let Some(order) = self.presentation_order.as_mut() {
            order.retain(|listed| listed != id);
        }

        info!(target: "stage.selection", participant_id = %id, "Participant left");
        metrics::set_participants(self.registry.len());

        if self.selection.is_on_large(id) {
            let next = self.fallback_target();
            self.switch_large_target(&next, false, TargetReason::ParticipantLeft)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// Thumbnail click.
    ///
    /// Local: release any pin and show local. Remote without video: ask the
    /// delivery layer for admission and complete the pin once LastN admits
    /// the participant. Remote with video: toggle the pin.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn user_clicked(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        match self.registry.resolve(id) {
            None => Err(StageError::UnknownParticipant(id.to_string())),
            Some(ParticipantRef::Local(_)) => self.select_local(),
            Some(ParticipantRef::Remote(participant)) if !participant.has_video() => {
                info!(
                    target: "stage.selection",
                    participant_id = %id,
                    "No deliverable video, requesting LastN admission"
                );
                self.selection.pending_pin = Some(id.clone());
                self.commands.push(StageCommand::RequestPin {
                    participant_id: id.clone(),
                    active: true,
                });
                Ok(())
            }
            Some(ParticipantRef::Remote(_)) => self.toggle_pin(id),
        }
    }

    /// Pin `id`, or unpin it if it is already pinned.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn toggle_pin(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        match self.registry.resolve(id) {
            None => return Err(StageError::UnknownParticipant(id.to_string())),
            Some(ParticipantRef::Local(_)) => return self.select_local(),
            Some(ParticipantRef::Remote(_)) => {}
        }

        if !self.selection.is_pinned(id) {
            return self.pin(id, TargetReason::Pin);
        }

        self.selection.pinned = None;
        info!(target: "stage.selection", participant_id = %id, "Participant unpinned");

        let next = self.fallback_target();
        self.switch_large_target(&next, false, TargetReason::Unpin)?;
        self.commands.push(StageCommand::RequestPin {
            participant_id: id.clone(),
            active: false,
        });
        Ok(())
    }

    fn pin(&mut self, id: &ParticipantId, reason: TargetReason) -> Result<(), StageError> {
        if self.selection.is_pinned(id) {
            return self.switch_large_target(id, false, reason);
        }

        // Unpin notification for the previous pin goes out first
        if let Some(previous) = self.selection.pinned.take() {
            self.commands.push(StageCommand::RequestPin {
                participant_id: previous,
                active: false,
            });
        }
        // An explicit pin supersedes any admission still outstanding
        if let Some(pending) = self.selection.pending_pin.take() {
            if pending != *id {
                info!(
                    target: "stage.selection",
                    participant_id = %pending,
                    "Pending pin superseded"
                );
            }
        }

        self.selection.pinned = Some(id.clone());
        info!(
            target: "stage.selection",
            participant_id = %id,
            reason = reason.as_str(),
            "Participant pinned"
        );
        self.commands.push(StageCommand::RequestPin {
            participant_id: id.clone(),
            active: true,
        });
        self.switch_large_target(id, false, reason)
    }

    fn select_local(&mut self) -> Result<(), StageError> {
        if let Some(previous) = self.selection.pinned.take() {
            info!(
                target: "stage.selection",
                participant_id = %previous,
                "Local click releases pin"
            );
            self.commands.push(StageCommand::RequestPin {
                participant_id: previous,
                active: false,
            });
        }
        let local_id = self.registry.local_id().clone();
        self.switch_large_target(&local_id, false, TargetReason::LocalClick)
    }

    // ------------------------------------------------------------------
    // Dominant speaker
    // ------------------------------------------------------------------

    /// Dominant speaker notification.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn dominant_speaker_changed(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        if self.selection.is_dominant_speaker(id) {
            return Ok(());
        }

        let video_started = match self.registry.resolve(id) {
            None => return Err(StageError::UnknownParticipant(id.to_string())),
            Some(ParticipantRef::Local(_)) => {
                if let Some(previous) = self.selection.dominant_speaker.take() {
                    self.registry.set_dominant_speaker(&previous, false)?;
                }
                self.registry.set_dominant_speaker(id, true)?;
                debug!(target: "stage.selection", "Local participant is dominant speaker");
                return Ok(());
            }
            Some(ParticipantRef::Remote(participant)) => participant.has_video_started(),
        };

        if let Some(previous) = self.selection.dominant_speaker.replace(id.clone()) {
            self.registry.set_dominant_speaker(&previous, false)?;
        }
        self.registry.set_dominant_speaker(id, true)?;
        let local_id = self.registry.local_id().clone();
        self.registry.set_dominant_speaker(&local_id, false)?;

        debug!(
            target: "stage.selection",
            participant_id = %id,
            video_started,
            "Dominant speaker changed"
        );

        if self.selection.pinned.is_none()
            && video_started
            && !self.sticky_stage
            && !self.filmstrip_only
        {
            self.switch_large_target(id, false, TargetReason::DominantSpeaker)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // LastN
    // ------------------------------------------------------------------

    /// Server LastN announcement.
    ///
    /// Dispatch order is fixed: set update, drop detection and visibility
    /// changes, admission and deferred pin, then large target reassignment.
    pub fn server_last_n_changed(
        &mut self,
        server_set: Vec<ParticipantId>,
        entering: Option<Vec<ParticipantId>>,
    ) {
        let outcome = self.last_n.apply_server_update(
            server_set,
            entering,
            &self.registry,
            self.selection.large_target.as_ref(),
            self.selection.pending_pin.as_ref(),
        );

        metrics::set_local_last_n_capacity(self.last_n.local_capacity());
        if !outcome.ignored_entering.is_empty() {
            metrics::record_last_n_ignored(outcome.ignored_entering.len());
        }

        for (participant_id, visibility) in outcome.visibility_changes {
            if let Err(err) = self.registry.set_visibility(&participant_id, visibility) {
                debug!(target: "stage.last_n", error = %err, "Visibility change for departed participant");
                continue;
            }
            self.commands.push(StageCommand::SetVisibility {
                participant_id,
                visibility,
            });
        }

        if let Some(id) = outcome.deferred_pin {
            info!(target: "stage.selection", participant_id = %id, "Completing deferred pin");
            self.selection.pending_pin = None;
            if let Err(err) = self.pin(&id, TargetReason::DeferredPin) {
                debug!(target: "stage.selection", error = %err, "Deferred pin target vanished");
            }
        }

        if outcome.reassign_large_target {
            self.last_n_reassignment_required();
        }
    }

    /// The large target stopped being received. Pins are left alone.
    fn last_n_reassignment_required(&mut self) {
        if self.selection.pinned.is_some() {
            debug!(target: "stage.selection", "Pin active, skipping LastN reassignment");
            return;
        }

        let next = self
            .last_n
            .server_set()
            .iter()
            .find(|id| {
                !id.is_empty()
                    && matches!(self.registry.resolve(id), Some(ParticipantRef::Remote(_)))
            })
            .cloned()
            .unwrap_or_else(|| self.elect_last_visible());

        if let Err(err) = self.switch_large_target(&next, false, TargetReason::LastNReassignment) {
            debug!(target: "stage.selection", error = %err, "LastN reassignment target vanished");
        }
    }

    // ------------------------------------------------------------------
    // Media lifecycle
    // ------------------------------------------------------------------

    /// A stream was attached to the participant.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn stream_added(
        &mut self,
        id: &ParticipantId,
        stream: StreamHandle,
    ) -> Result<(), StageError> {
        self.registry.set_stream(id, Some(stream))?;
        self.registry.set_has_video(id, true)?;
        debug!(target: "stage.selection", participant_id = %id, "Stream attached");
        Ok(())
    }

    /// The participant's stream was detached.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn stream_removed(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        self.registry.set_stream(id, None)?;
        self.registry.set_has_video(id, false)?;
        self.registry.set_has_video_started(id, false)?;
        debug!(target: "stage.selection", participant_id = %id, "Stream detached");
        self.refresh_if_on_large(id)
    }

    /// Playback began.
    ///
    /// Retargets to the participant when nothing else claims the stage, when
    /// it is pinned, when it is the dominant speaker without a pin, or when it
    /// is already on large and the stream must be reattached.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn stream_started(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        let is_remote = match self.registry.resolve(id) {
            None => return Err(StageError::UnknownParticipant(id.to_string())),
            Some(participant) => !participant.is_local(),
        };
        self.registry.set_has_video_started(id, true)?;
        info!(target: "stage.selection", participant_id = %id, "Video is now active");

        let unpinned = self.selection.pinned.is_none();
        let unclaimed =
            unpinned && self.selection.dominant_speaker.is_none() && !self.sticky_stage;

        if (is_remote && unclaimed)
            || self.selection.is_pinned(id)
            || (unpinned && self.selection.is_dominant_speaker(id))
            || self.selection.is_on_large(id)
        {
            self.switch_large_target(id, true, TargetReason::StreamStarted)?;
        }
        Ok(())
    }

    /// Playback stopped.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn stream_ended(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        self.registry.set_has_video_started(id, false)?;
        debug!(target: "stage.selection", participant_id = %id, "Video playback ended");
        self.refresh_if_on_large(id)
    }

    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn video_type_changed(
        &mut self,
        id: &ParticipantId,
        video_type: VideoType,
    ) -> Result<(), StageError> {
        let current = self
            .registry
            .get(id)
            .map(Participant::video_type)
            .ok_or_else(|| StageError::UnknownParticipant(id.to_string()))?;
        if current == video_type {
            return Ok(());
        }

        info!(
            target: "stage.selection",
            participant_id = %id,
            video_type = video_type.as_str(),
            "Video type changed"
        );
        self.registry.set_video_type(id, video_type)?;
        self.refresh_if_on_large(id)
    }

    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn video_mute_changed(&mut self, id: &ParticipantId, muted: bool) -> Result<(), StageError> {
        self.registry.set_video_muted(id, muted)?;
        self.refresh_view(id)
    }

    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn connection_status_changed(
        &mut self,
        id: &ParticipantId,
        active: bool,
    ) -> Result<(), StageError> {
        self.registry.set_connection_active(id, active)?;
        self.refresh_view(id)
    }

    /// Force-update the large video if `id` is on it.
    fn refresh_if_on_large(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        if self.selection.is_on_large(id) {
            self.switch_large_target(id, true, TargetReason::MediaChanged)?;
        }
        Ok(())
    }

    /// Force-update the large video if `id` is on it, else refresh its thumbnail.
    fn refresh_view(&mut self, id: &ParticipantId) -> Result<(), StageError> {
        if self.selection.is_on_large(id) {
            return self.switch_large_target(id, true, TargetReason::MediaChanged);
        }
        self.commands.push(StageCommand::RefreshView {
            participant_id: id.clone(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Session and renderer state
    // ------------------------------------------------------------------

    /// The local participant joined the conference room.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the local participant is always registered.
    pub fn conference_joined(&mut self) -> Result<(), StageError> {
        if self.selection.large_target.is_some() {
            return Ok(());
        }
        let local_id = self.registry.local_id().clone();
        self.switch_large_target(&local_id, true, TargetReason::ConferenceJoined)
    }

    pub fn stage_lock_changed(&mut self, sticky: bool) {
        debug!(target: "stage.selection", sticky, "Stage lock changed");
        self.sticky_stage = sticky;
    }

    /// Thumbnail order as currently presented by the renderer.
    pub fn presentation_order_changed(&mut self, order: Vec<ParticipantId>) {
        debug!(target: "stage.selection", count = order.len(), "Presentation order changed");
        self.presentation_order = Some(order);
    }

    // ------------------------------------------------------------------
    // Display switching
    // ------------------------------------------------------------------

    /// Completion of a display switch issued through `DisplayLarge`.
    ///
    /// Only the latest token has any effect. Failures are routine
    /// cancellations (the user moved on mid-switch).
    pub fn display_switch_completed(
        &mut self,
        token: DisplayToken,
        result: Result<(), DisplayError>,
    ) {
        let Some(switch) = self.display.complete(token) else {
            debug!(target: "stage.selection", token = token.value(), "Discarding stale display switch");
            metrics::record_display_switch("stale");
            return;
        };

        if let Err(err) = result {
            debug!(
                target: "stage.selection",
                token = token.value(),
                participant_id = %switch.participant_id,
                error = %err,
                "Display switch cancelled"
            );
            metrics::record_display_switch("cancelled");
            return;
        }

        metrics::record_display_switch("completed");
        if self.registry.contains(&switch.participant_id) {
            self.commands.push(StageCommand::RefreshView {
                participant_id: switch.participant_id.clone(),
            });
        }
        if let Some(previous) = switch.previous {
            if previous != switch.participant_id && self.registry.contains(&previous) {
                self.commands.push(StageCommand::RefreshView {
                    participant_id: previous,
                });
            }
        }
    }

    /// Retarget the large video.
    ///
    /// No-op when `id` is already on large and `force` is false.
    ///
    /// # Errors
    ///
    /// Returns `StageError::UnknownParticipant` if the ID is not registered.
    pub fn update_large_target(&mut self, id: &ParticipantId, force: bool) -> Result<(), StageError> {
        self.switch_large_target(id, force, TargetReason::MediaChanged)
    }

    fn switch_large_target(
        &mut self,
        id: &ParticipantId,
        force: bool,
        reason: TargetReason,
    ) -> Result<(), StageError> {
        let (video_type, stream) = self
            .registry
            .get(id)
            .map(|p| (p.video_type(), p.stream().cloned()))
            .ok_or_else(|| StageError::UnknownParticipant(id.to_string()))?;

        let previous = self.selection.large_target.clone();
        let changed = previous.as_ref() != Some(id);
        if !changed && !force {
            return Ok(());
        }

        if changed && video_type == VideoType::Camera {
            self.commands.push(StageCommand::RequestSelectedEndpoint {
                participant_id: id.clone(),
            });
        }

        self.selection.large_target = Some(id.clone());
        let token = self.display.begin(id.clone(), previous.clone());

        info!(
            target: "stage.selection",
            participant_id = %id,
            previous = ?previous.as_ref().map(ParticipantId::as_str),
            reason = reason.as_str(),
            token = token.value(),
            force,
            "Switching large video"
        );
        metrics::record_large_target_switch(reason.as_str());

        self.commands.push(StageCommand::DisplayLarge(DisplayRequest {
            token,
            participant_id: id.clone(),
            stream,
            video_type,
        }));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Target election
    // ------------------------------------------------------------------

    /// Target when the current one must be replaced: pin, then dominant
    /// speaker with video, then the last visible thumbnail.
    fn fallback_target(&self) -> ParticipantId {
        if let Some(pinned) = self
            .selection
            .pinned
            .as_ref()
            .filter(|id| self.registry.contains(id))
        {
            return pinned.clone();
        }

        if let Some(dominant) = self
            .selection
            .dominant_speaker
            .as_ref()
            .filter(|id| self.registry.get(id).is_some_and(Participant::has_video))
        {
            return dominant.clone();
        }

        self.elect_last_visible()
    }

    /// Last shown remote thumbnail in presentation order, else the first
    /// known remote, else the local participant.
    ///
    /// Always returns a registered ID.
    #[must_use]
    pub fn elect_last_visible(&self) -> ParticipantId {
        let order = self
            .presentation_order
            .as_deref()
            .unwrap_or_else(|| self.registry.join_order());

        let is_remote = |id: &&ParticipantId| {
            matches!(self.registry.resolve(id), Some(ParticipantRef::Remote(_)))
        };

        if let Some(id) = order.iter().rev().filter(is_remote).find(|id| {
            self.registry
                .get(id)
                .is_some_and(|p| p.visibility() == Visibility::Shown)
        }) {
            debug!(target: "stage.selection", participant_id = %id, "Elected last visible video");
            return id.clone();
        }

        if let Some(id) = order
            .iter()
            .find(is_remote)
            .or_else(|| self.registry.join_order().first())
        {
            debug!(
                target: "stage.selection",
                participant_id = %id,
                "No visible video, electing first remote"
            );
            return id.clone();
        }

        debug!(target: "stage.selection", "Falling back to local video");
        self.registry.local_id().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn ids(list: &[&str]) -> Vec<ParticipantId> {
        list.iter().map(|id| pid(id)).collect()
    }

    fn with_video(id: &str) -> ParticipantInit {
        ParticipantInit {
            id: pid(id),
            video_type: VideoType::Camera,
            stream: Some(StreamHandle::new(format!("stream-{id}"))),
            video_started: true,
        }
    }

    /// Local "me" plus remotes with started camera video.
    fn coordinator_with(remotes: &[&str]) -> StageCoordinator {
        let mut coordinator = StageCoordinator::new(pid("me"), None);
        for id in remotes {
            coordinator.participant_joined(with_video(id)).unwrap();
        }
        coordinator.take_commands();
        coordinator
    }

    fn large(coordinator: &StageCoordinator) -> Option<&str> {
        coordinator
            .selection()
            .large_target()
            .map(ParticipantId::as_str)
    }

    fn pins(commands: &[StageCommand]) -> Vec<(&str, bool)> {
        commands
            .iter()
            .filter_map(|command| match command {
                StageCommand::RequestPin {
                    participant_id,
                    active,
                } => Some((participant_id.as_str(), *active)),
                _ => None,
            })
            .collect()
    }

    fn display_tokens(commands: &[StageCommand]) -> Vec<DisplayToken> {
        commands
            .iter()
            .filter_map(|command| match command {
                StageCommand::DisplayLarge(request) => Some(request.token),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_join_announces_initial_visibility() {
        let mut coordinator = StageCoordinator::new(pid("me"), Some(1));

        coordinator.participant_joined(with_video("a")).unwrap();
        coordinator.participant_joined(with_video("b")).unwrap();

        assert_eq!(
            coordinator.take_commands(),
            vec![
                StageCommand::SetVisibility {
                    participant_id: pid("a"),
                    visibility: Visibility::Shown,
                },
                StageCommand::SetVisibility {
                    participant_id: pid("b"),
                    visibility: Visibility::Hidden,
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_join_fails_and_session_continues() {
        let mut coordinator = coordinator_with(&["a"]);

        let result = coordinator.handle_event(StageEvent::ParticipantJoined(with_video("a")));
        assert!(matches!(result, Err(StageError::DuplicateParticipant(id)) if id == "a"));

        coordinator.toggle_pin(&pid("a")).unwrap();
        assert_eq!(large(&coordinator), Some("a"));
    }

    #[test]
    fn test_pin_exclusivity() {
        let mut coordinator = coordinator_with(&["a", "b", "c"]);

        for id in ["a", "b", "c", "b", "a"] {
            coordinator.toggle_pin(&pid(id)).unwrap();
        }

        // Every toggle names someone other than the current pin
        assert_eq!(coordinator.selection().pinned(), Some(&pid("a")));
        assert_eq!(large(&coordinator), Some("a"));
    }

    #[test]
    fn test_repin_unpins_previous_first() {
        let mut coordinator = coordinator_with(&["a", "b"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator.toggle_pin(&pid("b")).unwrap();

        let commands = coordinator.take_commands();
        assert_eq!(pins(&commands), vec![("a", false), ("b", true)]);
        assert!(commands.contains(&StageCommand::RequestSelectedEndpoint {
            participant_id: pid("b")
        }));
    }

    #[test]
    fn test_toggle_twice_pins_then_unpins() {
        let mut coordinator = coordinator_with(&["a", "b"]);

        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.toggle_pin(&pid("a")).unwrap();

        assert!(coordinator.selection().pinned().is_none());
        assert_eq!(
            pins(&coordinator.take_commands()),
            vec![("a", true), ("a", false)]
        );
        // No dominant speaker: the last visible thumbnail takes the stage
        assert_eq!(large(&coordinator), Some("b"));
    }

    #[test]
    fn test_precedence_pin_over_dominant_speaker() {
        let mut coordinator = coordinator_with(&["b", "c"]);

        coordinator.toggle_pin(&pid("b")).unwrap();
        coordinator.dominant_speaker_changed(&pid("c")).unwrap();
        assert_eq!(large(&coordinator), Some("b"));

        coordinator.toggle_pin(&pid("b")).unwrap();
        assert_eq!(large(&coordinator), Some("c"));
    }

    #[test]
    fn test_dominant_speaker_without_started_video_does_not_retarget() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator
            .participant_joined(ParticipantInit::new("b"))
            .unwrap();
        coordinator.conference_joined().unwrap();

        coordinator.dominant_speaker_changed(&pid("b")).unwrap();

        assert_eq!(coordinator.selection().dominant_speaker(), Some(&pid("b")));
        assert_eq!(large(&coordinator), Some("me"));
        assert!(coordinator
            .registry()
            .get(&pid("b"))
            .unwrap()
            .is_dominant_speaker());
    }

    #[test]
    fn test_dominant_speaker_dedupes() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator.dominant_speaker_changed(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator.dominant_speaker_changed(&pid("a")).unwrap();

        assert!(coordinator.take_commands().is_empty());
    }

    #[test]
    fn test_local_dominance_is_a_flag_only() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator.dominant_speaker_changed(&pid("a")).unwrap();
        assert_eq!(large(&coordinator), Some("a"));

        coordinator.dominant_speaker_changed(&pid("me")).unwrap();

        let selection = coordinator.selection();
        assert!(selection.dominant_speaker().is_none());
        assert_eq!(large(&coordinator), Some("a"));
        let registry = coordinator.registry();
        assert!(registry.get(&pid("me")).unwrap().is_dominant_speaker());
        assert!(!registry.get(&pid("a")).unwrap().is_dominant_speaker());
    }

    #[test]
    fn test_sticky_stage_and_filmstrip_block_dominant_retarget() {
        let mut coordinator = coordinator_with(&["a", "b"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.toggle_pin(&pid("a")).unwrap();
        let before = large(&coordinator).map(str::to_string);

        coordinator.stage_lock_changed(true);
        coordinator.dominant_speaker_changed(&pid("a")).unwrap();
        assert_eq!(large(&coordinator).map(str::to_string), before);

        let mut filmstrip = StageCoordinator::new(pid("me"), None).with_filmstrip_only(true);
        filmstrip.participant_joined(with_video("a")).unwrap();
        filmstrip.dominant_speaker_changed(&pid("a")).unwrap();
        assert!(filmstrip.selection().large_target().is_none());
    }

    #[test]
    fn test_click_without_video_defers_pin_until_admission() {
        let mut coordinator = StageCoordinator::new(pid("me"), Some(1));
        coordinator.participant_joined(with_video("a")).unwrap();
        coordinator
            .participant_joined(ParticipantInit::new("x"))
            .unwrap();
        coordinator.server_last_n_changed(ids(&["a"]), None);
        coordinator.conference_joined().unwrap();
        coordinator.take_commands();

        coordinator.user_clicked(&pid("x")).unwrap();

        assert_eq!(coordinator.selection().pending_pin(), Some(&pid("x")));
        assert_eq!(large(&coordinator), Some("me"));
        assert_eq!(pins(&coordinator.take_commands()), vec![("x", true)]);

        coordinator.server_last_n_changed(ids(&["x"]), Some(ids(&["x"])));

        assert_eq!(large(&coordinator), Some("x"));
        assert_eq!(coordinator.selection().pinned(), Some(&pid("x")));
        assert!(coordinator.selection().pending_pin().is_none());
    }

    #[test]
    fn test_explicit_pin_supersedes_pending_pin() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator
            .participant_joined(ParticipantInit::new("x"))
            .unwrap();

        coordinator.user_clicked(&pid("x")).unwrap();
        coordinator.toggle_pin(&pid("a")).unwrap();
        assert!(coordinator.selection().pending_pin().is_none());
        coordinator.take_commands();

        // Late admission of x must not steal the newer pin
        coordinator.server_last_n_changed(ids(&["a", "x"]), Some(ids(&["x"])));

        assert_eq!(coordinator.selection().pinned(), Some(&pid("a")));
        assert_eq!(large(&coordinator), Some("a"));
        assert!(pins(&coordinator.take_commands()).is_empty());
    }

    #[test]
    fn test_local_click_releases_pin() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator.user_clicked(&pid("me")).unwrap();

        assert!(coordinator.selection().pinned().is_none());
        assert_eq!(large(&coordinator), Some("me"));
        let commands = coordinator.take_commands();
        assert_eq!(pins(&commands), vec![("a", false)]);
        // Local camera on large is hinted like any other camera
        assert!(commands.contains(&StageCommand::RequestSelectedEndpoint {
            participant_id: pid("me")
        }));
    }

    #[test]
    fn test_drop_and_reassign_to_first_server_member() {
        let mut coordinator = StageCoordinator::new(pid("me"), Some(3));
        for id in ["a", "b", "c"] {
            coordinator
                .participant_joined(ParticipantInit::new(id))
                .unwrap();
        }
        coordinator.server_last_n_changed(ids(&["a", "b", "c"]), None);
        for id in ["a", "b", "c"] {
            coordinator
                .stream_added(&pid(id), StreamHandle::new(id))
                .unwrap();
        }
        // Nothing claims the stage, so each started stream takes it
        for id in ["a", "c", "b"] {
            coordinator.stream_started(&pid(id)).unwrap();
        }
        assert_eq!(large(&coordinator), Some("b"));
        coordinator.take_commands();

        coordinator.server_last_n_changed(ids(&["a", "c"]), Some(vec![]));

        assert_eq!(large(&coordinator), Some("a"));
        let commands = coordinator.take_commands();
        assert_eq!(
            commands.first(),
            Some(&StageCommand::SetVisibility {
                participant_id: pid("b"),
                visibility: Visibility::Avatar,
            })
        );
    }

    #[test]
    fn test_reassignment_skipped_while_pinned() {
        let mut coordinator = StageCoordinator::new(pid("me"), Some(2));
        coordinator.participant_joined(with_video("a")).unwrap();
        coordinator.participant_joined(with_video("b")).unwrap();
        coordinator.server_last_n_changed(ids(&["a", "b"]), None);
        coordinator.toggle_pin(&pid("b")).unwrap();

        coordinator.server_last_n_changed(ids(&["a"]), Some(vec![]));

        assert_eq!(large(&coordinator), Some("b"));
    }

    #[test]
    fn test_removal_of_pinned_participant() {
        let mut coordinator = coordinator_with(&["a", "d"]);
        coordinator.toggle_pin(&pid("d")).unwrap();

        coordinator.participant_left(&pid("d")).unwrap();

        assert!(coordinator.selection().pinned().is_none());
        assert_eq!(large(&coordinator), Some("a"));
        assert!(!coordinator.registry().contains(&pid("d")));
    }

    #[test]
    fn test_removal_clears_dominant_and_pending_pin() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator
            .participant_joined(ParticipantInit::new("x"))
            .unwrap();
        coordinator.dominant_speaker_changed(&pid("a")).unwrap();
        coordinator.user_clicked(&pid("x")).unwrap();

        coordinator.participant_left(&pid("x")).unwrap();
        coordinator.participant_left(&pid("a")).unwrap();

        let selection = coordinator.selection();
        assert!(selection.dominant_speaker().is_none());
        assert!(selection.pending_pin().is_none());
        assert_eq!(large(&coordinator), Some("me"));
    }

    #[test]
    fn test_elect_last_visible_never_dangles() {
        let mut coordinator = coordinator_with(&[]);
        assert_eq!(coordinator.elect_last_visible(), pid("me"));

        coordinator.participant_joined(with_video("a")).unwrap();
        coordinator.participant_joined(with_video("b")).unwrap();
        assert_eq!(coordinator.elect_last_visible(), pid("b"));

        // Stale presentation order naming departed participants
        coordinator.presentation_order_changed(ids(&["ghost", "a", "b", "gone"]));
        coordinator.participant_left(&pid("b")).unwrap();
        assert_eq!(coordinator.elect_last_visible(), pid("a"));

        coordinator.participant_left(&pid("a")).unwrap();
        assert_eq!(coordinator.elect_last_visible(), pid("me"));
    }

    #[test]
    fn test_elect_last_visible_skips_hidden_thumbnails() {
        let mut coordinator = StageCoordinator::new(pid("me"), Some(1));
        coordinator.participant_joined(with_video("a")).unwrap();
        coordinator.participant_joined(with_video("b")).unwrap();
        coordinator.server_last_n_changed(ids(&["a"]), None);
        assert_eq!(coordinator.elect_last_visible(), pid("a"));

        // Nobody shown: first remote still known
        coordinator.server_last_n_changed(ids(&[]), Some(vec![]));
        coordinator.presentation_order_changed(ids(&["b", "a"]));
        assert_eq!(coordinator.elect_last_visible(), pid("b"));
    }

    #[test]
    fn test_unchanged_target_is_noop_unless_forced() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator.update_large_target(&pid("a"), false).unwrap();
        assert!(coordinator.take_commands().is_empty());

        coordinator.update_large_target(&pid("a"), true).unwrap();
        let commands = coordinator.take_commands();
        assert_eq!(display_tokens(&commands).len(), 1);
        // Same target: no repeated selected endpoint hint
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_stale_display_completion_is_discarded() {
        let mut coordinator = coordinator_with(&["a", "b"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        let stale = display_tokens(&coordinator.take_commands())[0];
        coordinator.toggle_pin(&pid("b")).unwrap();
        let current = display_tokens(&coordinator.take_commands())[0];

        coordinator.display_switch_completed(stale, Ok(()));
        assert!(coordinator.take_commands().is_empty());

        coordinator.display_switch_completed(current, Ok(()));
        assert_eq!(
            coordinator.take_commands(),
            vec![
                StageCommand::RefreshView {
                    participant_id: pid("b")
                },
                StageCommand::RefreshView {
                    participant_id: pid("a")
                },
            ]
        );
    }

    #[test]
    fn test_failed_display_switch_is_routine() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        let token = display_tokens(&coordinator.take_commands())[0];

        coordinator.display_switch_completed(token, Err(DisplayError::Superseded));

        assert!(coordinator.take_commands().is_empty());
        assert_eq!(large(&coordinator), Some("a"));
    }

    #[test]
    fn test_stream_started_rule() {
        let mut coordinator = coordinator_with(&[]);
        coordinator
            .participant_joined(ParticipantInit::new("a"))
            .unwrap();
        coordinator
            .participant_joined(ParticipantInit::new("b"))
            .unwrap();
        coordinator.stream_added(&pid("a"), StreamHandle::new("sa")).unwrap();
        coordinator.stream_added(&pid("b"), StreamHandle::new("sb")).unwrap();

        coordinator.stream_started(&pid("a")).unwrap();
        assert_eq!(large(&coordinator), Some("a"));

        // A dominant speaker now claims the stage; other streams do not steal it
        coordinator.dominant_speaker_changed(&pid("a")).unwrap();
        coordinator.stream_started(&pid("b")).unwrap();
        assert_eq!(large(&coordinator), Some("a"));

        // Restart on large force-updates with the current stream
        coordinator.take_commands();
        coordinator.stream_started(&pid("a")).unwrap();
        let commands = coordinator.take_commands();
        assert!(matches!(
            commands.as_slice(),
            [StageCommand::DisplayLarge(DisplayRequest { participant_id, stream: Some(stream), .. })]
                if participant_id == &pid("a") && stream.as_str() == "sa"
        ));
    }

    #[test]
    fn test_media_changes_on_large_force_update() {
        let mut coordinator = coordinator_with(&["a", "b"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator
            .video_type_changed(&pid("a"), VideoType::Screen)
            .unwrap();
        coordinator.video_mute_changed(&pid("a"), true).unwrap();
        coordinator.video_mute_changed(&pid("b"), true).unwrap();

        let commands = coordinator.take_commands();
        assert_eq!(display_tokens(&commands).len(), 2);
        assert_eq!(
            commands.last(),
            Some(&StageCommand::RefreshView {
                participant_id: pid("b")
            })
        );

        // Unchanged video type is a no-op
        coordinator
            .video_type_changed(&pid("a"), VideoType::Screen)
            .unwrap();
        assert!(coordinator.take_commands().is_empty());
    }

    #[test]
    fn test_stream_ended_on_large_forces_update() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator.stream_ended(&pid("a")).unwrap();

        assert!(!coordinator
            .registry()
            .get(&pid("a"))
            .unwrap()
            .has_video_started());
        let commands = coordinator.take_commands();
        assert!(matches!(
            commands.as_slice(),
            [StageCommand::DisplayLarge(DisplayRequest { participant_id, .. })]
                if participant_id == &pid("a")
        ));
        assert_eq!(large(&coordinator), Some("a"));
    }

    #[test]
    fn test_stream_ended_off_large_is_quiet() {
        let mut coordinator = coordinator_with(&["a", "b"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator.stream_ended(&pid("b")).unwrap();

        assert!(!coordinator
            .registry()
            .get(&pid("b"))
            .unwrap()
            .has_video_started());
        assert!(coordinator.take_commands().is_empty());
    }

    #[test]
    fn test_stream_removed_clears_media_state() {
        let mut coordinator = coordinator_with(&["a"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator.stream_removed(&pid("a")).unwrap();

        let a = coordinator.registry().get(&pid("a")).unwrap();
        assert!(a.stream().is_none());
        assert!(!a.has_video());
        assert!(!a.has_video_started());
        let commands = coordinator.take_commands();
        assert!(matches!(
            commands.as_slice(),
            [StageCommand::DisplayLarge(DisplayRequest { participant_id, stream: None, .. })]
                if participant_id == &pid("a")
        ));
    }

    #[test]
    fn test_connection_status_change_refreshes_view() {
        let mut coordinator = coordinator_with(&["a", "b"]);
        coordinator.toggle_pin(&pid("a")).unwrap();
        coordinator.take_commands();

        coordinator.connection_status_changed(&pid("a"), false).unwrap();
        let commands = coordinator.take_commands();
        assert_eq!(display_tokens(&commands).len(), 1);
        assert_eq!(commands.len(), 1);

        coordinator.connection_status_changed(&pid("b"), false).unwrap();
        assert_eq!(
            coordinator.take_commands(),
            vec![StageCommand::RefreshView {
                participant_id: pid("b")
            }]
        );
        assert!(!coordinator
            .registry()
            .get(&pid("b"))
            .unwrap()
            .connection_active());
    }

    #[test]
    fn test_conference_joined_targets_local_once() {
        let mut coordinator = coordinator_with(&[]);

        coordinator.conference_joined().unwrap();
        assert_eq!(large(&coordinator), Some("me"));
        let commands = coordinator.take_commands();
        assert_eq!(
            commands.first(),
            Some(&StageCommand::RequestSelectedEndpoint {
                participant_id: pid("me")
            })
        );
        assert_eq!(display_tokens(&commands).len(), 1);

        coordinator.conference_joined().unwrap();
        assert!(coordinator.take_commands().is_empty());
    }

    #[test]
    fn test_unknown_participant_events_are_noops() {
        let mut coordinator = coordinator_with(&["a"]);
        let before = coordinator.selection().clone();

        for event in [
            StageEvent::UserClicked {
                participant_id: pid("ghost"),
            },
            StageEvent::TogglePin {
                participant_id: pid("ghost"),
            },
            StageEvent::DominantSpeakerChanged {
                participant_id: pid("ghost"),
            },
            StageEvent::StreamStarted {
                participant_id: pid("ghost"),
            },
            StageEvent::ParticipantLeft {
                participant_id: pid("ghost"),
            },
        ] {
            assert!(coordinator.handle_event(event).is_ok());
        }

        assert_eq!(coordinator.selection(), &before);
        assert!(coordinator.take_commands().is_empty());
        assert!(matches!(
            coordinator.user_clicked(&pid("ghost")),
            Err(StageError::UnknownParticipant(_))
        ));
    }

    #[test]
    fn test_snapshot_lists_local_first() {
        let mut coordinator = coordinator_with(&["b", "a"]);
        coordinator.toggle_pin(&pid("a")).unwrap();

        let snapshot = coordinator.snapshot();

        let order: Vec<&str> = snapshot
            .participants
            .iter()
            .map(|p| p.id().as_str())
            .collect();
        assert_eq!(order, vec!["me", "b", "a"]);
        assert_eq!(snapshot.selection.pinned(), Some(&pid("a")));
        assert!(snapshot.display_token.is_some());
        assert!(snapshot.participant(&pid("b")).is_some());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["selection"]["large_target"], "a");
    }
}
