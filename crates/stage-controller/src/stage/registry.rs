//! Participant registry.
//!
//! Maps participant IDs to their media state. The local participant is
//! inserted at construction and never removed; remote participants come and
//! go with join/leave events. Join order is kept because it is the default
//! thumbnail presentation order.
//!
//! The registry performs no selection logic. Callers orchestrate whatever
//! the mutation implies for the stage.

use crate::errors::StageError;
use common::types::{ParticipantId, StreamHandle, VideoType, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Media state of one call member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    id: ParticipantId,
    is_local: bool,
    video_type: VideoType,
    has_video: bool,
    has_video_started: bool,
    visibility: Visibility,
    is_dominant_speaker: bool,
    video_muted: bool,
    connection_active: bool,
    stream: Option<StreamHandle>,
}

impl Participant {
    fn local(id: ParticipantId) -> Self {
        Self {
            id,
            is_local: true,
            video_type: VideoType::Camera,
            has_video: false,
            has_video_started: false,
            visibility: Visibility::Shown,
            is_dominant_speaker: false,
            video_muted: false,
            connection_active: true,
            stream: None,
        }
    }

    fn remote(init: ParticipantInit, visibility: Visibility) -> Self {
        Self {
            id: init.id,
            is_local: false,
            video_type: init.video_type,
            has_video: init.stream.is_some(),
            has_video_started: init.stream.is_some() && init.video_started,
            visibility,
            is_dominant_speaker: false,
            video_muted: false,
            connection_active: true,
            stream: init.stream,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    #[must_use]
    pub fn video_type(&self) -> VideoType {
        self.video_type
    }

    /// Whether a renderable stream exists at all.
    #[must_use]
    pub fn has_video(&self) -> bool {
        self.has_video
    }

    /// Whether playback has actually begun.
    #[must_use]
    pub fn has_video_started(&self) -> bool {
        self.has_video_started
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[must_use]
    pub fn is_dominant_speaker(&self) -> bool {
        self.is_dominant_speaker
    }

    #[must_use]
    pub fn video_muted(&self) -> bool {
        self.video_muted
    }

    #[must_use]
    pub fn connection_active(&self) -> bool {
        self.connection_active
    }

    #[must_use]
    pub fn stream(&self) -> Option<&StreamHandle> {
        self.stream.as_ref()
    }
}

/// Everything known about a remote participant at join time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInit {
    pub id: ParticipantId,
    #[serde(default)]
    pub video_type: VideoType,
    /// Stream already attached at join time, if any.
    #[serde(default)]
    pub stream: Option<StreamHandle>,
    /// Playback already running (only meaningful with a stream).
    #[serde(default)]
    pub video_started: bool,
}

impl ParticipantInit {
    /// A participant with no stream yet.
    #[must_use]
    pub fn new(id: impl Into<ParticipantId>) -> Self {
        Self {
            id: id.into(),
            video_type: VideoType::Camera,
            stream: None,
            video_started: false,
        }
    }
}

/// A resolved participant, classified once as local or remote.
///
/// Event handlers match on this instead of re-checking the local ID in
/// every branch.
#[derive(Debug, Clone, Copy)]
pub enum ParticipantRef<'a> {
    Local(&'a Participant),
    Remote(&'a Participant),
}

impl<'a> ParticipantRef<'a> {
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, ParticipantRef::Local(_))
    }

    #[must_use]
    pub fn participant(&self) -> &'a Participant {
        match self {
            ParticipantRef::Local(p) | ParticipantRef::Remote(p) => p,
        }
    }

    #[must_use]
    pub fn id(&self) -> &'a ParticipantId {
        self.participant().id()
    }
}

/// Participant registry for one call session.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    local_id: ParticipantId,
    participants: HashMap<ParticipantId, Participant>,
    /// Remote participant IDs in join order.
    join_order: Vec<ParticipantId>,
}

impl ParticipantRegistry {
    /// Create a registry holding only the local participant.
    #[must_use]
    pub fn new(local_id: ParticipantId) -> Self {
        let mut participants = HashMap::new();
        participants.insert(local_id.clone(), Participant::local(local_id.clone()));
        Self {
            local_id,
            participants,
            join_order: Vec::new(),
        }
    }

    /// Insert a remote participant.
    ///
    /// # Errors
    ///
    /// Returns `StageError::InvalidParticipantId` for an empty ID and
    /// `StageError::DuplicateParticipant` if the ID is already present
    /// (including the local ID).
    pub fn add(
        &mut self,
        init: ParticipantInit,
        visibility: Visibility,
    ) -> Result<&Participant, StageError> {
        if init.id.is_empty() {
            return Err(StageError::InvalidParticipantId(
                "empty participant id".to_string(),
            ));
        }
        if self.participants.contains_key(&init.id) {
            return Err(StageError::DuplicateParticipant(init.id.to_string()));
        }

        let id = init.id.clone();
        debug!(
            target: "stage.registry",
            participant_id = %id,
            visibility = visibility.as_str(),
            "Participant added"
        );
        self.join_order.push(id.clone());
        let participant = self
            .participants
            .entry(id)
            .or_insert_with(|| Participant::remote(init, visibility));
        Ok(&*participant)
    }

    /// Remove a remote participant. Absent IDs are a no-op.
    ///
    /// The local participant lives as long as the registry.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        if *id == self.local_id {
            warn!(
                target: "stage.registry",
                participant_id = %id,
                "Ignoring removal of the local participant"
            );
            return None;
        }

        let removed = self.participants.remove(id);
        if removed.is_some() {
            self.join_order.retain(|joined| joined != id);
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Look up a participant and classify it as local or remote.
    #[must_use]
    pub fn resolve(&self, id: &ParticipantId) -> Option<ParticipantRef<'_>> {
        self.participants.get(id).map(|p| {
            if p.is_local {
                ParticipantRef::Local(p)
            } else {
                ParticipantRef::Remote(p)
            }
        })
    }

    #[must_use]
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    #[must_use]
    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }

    #[must_use]
    pub fn is_local(&self, id: &ParticipantId) -> bool {
        *id == self.local_id
    }

    /// Remote participants in join order.
    pub fn remotes(&self) -> impl Iterator<Item = &Participant> {
        self.join_order
            .iter()
            .filter_map(|id| self.participants.get(id))
    }

    /// Remote participant IDs in join order.
    #[must_use]
    pub fn join_order(&self) -> &[ParticipantId] {
        &self.join_order
    }

    #[must_use]
    pub fn remote_count(&self) -> usize {
        self.join_order.len()
    }

    /// Total participant count, local included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn set_video_type(
        &mut self,
        id: &ParticipantId,
        video_type: VideoType,
    ) -> Result<(), StageError> {
        self.participant_mut(id)?.video_type = video_type;
        Ok(())
    }

    pub fn set_has_video(&mut self, id: &ParticipantId, has_video: bool) -> Result<(), StageError> {
        self.participant_mut(id)?.has_video = has_video;
        Ok(())
    }

    pub fn set_has_video_started(
        &mut self,
        id: &ParticipantId,
        started: bool,
    ) -> Result<(), StageError> {
        self.participant_mut(id)?.has_video_started = started;
        Ok(())
    }

    pub fn set_stream(
        &mut self,
        id: &ParticipantId,
        stream: Option<StreamHandle>,
    ) -> Result<(), StageError> {
        self.participant_mut(id)?.stream = stream;
        Ok(())
    }

    pub(crate) fn set_visibility(
        &mut self,
        id: &ParticipantId,
        visibility: Visibility,
    ) -> Result<(), StageError> {
        self.participant_mut(id)?.visibility = visibility;
        Ok(())
    }

    pub(crate) fn set_dominant_speaker(
        &mut self,
        id: &ParticipantId,
        dominant: bool,
    ) -> Result<(), StageError> {
        self.participant_mut(id)?.is_dominant_speaker = dominant;
        Ok(())
    }

    pub(crate) fn set_video_muted(
        &mut self,
        id: &ParticipantId,
        muted: bool,
    ) -> Result<(), StageError> {
        self.participant_mut(id)?.video_muted = muted;
        Ok(())
    }

    pub(crate) fn set_connection_active(
        &mut self,
        id: &ParticipantId,
        active: bool,
    ) -> Result<(), StageError> {
        self.participant_mut(id)?.connection_active = active;
        Ok(())
    }

    fn participant_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant, StageError> {
        self.participants
            .get_mut(id)
            .ok_or_else(|| StageError::UnknownParticipant(id.to_string()))
    }
}
