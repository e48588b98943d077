//! Selection state: pin, dominant speaker, large target and pending pin.
//!
//! The fields are only ever written by the stage coordinator; everything
//! else reads them through accessors or a snapshot.

use common::types::ParticipantId;
use serde::Serialize;

/// Who owns the stage right now, and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    /// Explicit user pin. At most one.
    pub(crate) pinned: Option<ParticipantId>,
    /// Remote dominant speaker. Never the local participant.
    pub(crate) dominant_speaker: Option<ParticipantId>,
    /// Participant currently (or about to be) displayed large.
    pub(crate) large_target: Option<ParticipantId>,
    /// Requested pin waiting for LastN admission.
    pub(crate) pending_pin: Option<ParticipantId>,
}

impl SelectionState {
    #[must_use]
    pub fn pinned(&self) -> Option<&ParticipantId> {
        self.pinned.as_ref()
    }

    #[must_use]
    pub fn dominant_speaker(&self) -> Option<&ParticipantId> {
        self.dominant_speaker.as_ref()
    }

    #[must_use]
    pub fn large_target(&self) -> Option<&ParticipantId> {
        self.large_target.as_ref()
    }

    #[must_use]
    pub fn pending_pin(&self) -> Option<&ParticipantId> {
        self.pending_pin.as_ref()
    }

    #[must_use]
    pub fn is_pinned(&self, id: &ParticipantId) -> bool {
        self.pinned.as_ref() == Some(id)
    }

    #[must_use]
    pub fn is_on_large(&self, id: &ParticipantId) -> bool {
        self.large_target.as_ref() == Some(id)
    }

    #[must_use]
    pub fn is_dominant_speaker(&self, id: &ParticipantId) -> bool {
        self.dominant_speaker.as_ref() == Some(id)
    }

    /// Drop every reference to a departed participant.
    ///
    /// The large target is left alone; the caller recomputes it.
    pub(crate) fn forget(&mut self, id: &ParticipantId) {
        for slot in [
            &mut self.pinned,
            &mut self.dominant_speaker,
            &mut self.pending_pin,
        ] {
            if slot.as_ref() == Some(id) {
                *slot = None;
            }
        }
    }
}

/// Why the large target moved. Used as a bounded metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetReason {
    LocalClick,
    Pin,
    Unpin,
    DeferredPin,
    DominantSpeaker,
    StreamStarted,
    MediaChanged,
    LastNReassignment,
    ParticipantLeft,
    ConferenceJoined,
}

impl TargetReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TargetReason::LocalClick => "local_click",
            TargetReason::Pin => "pin",
            TargetReason::Unpin => "unpin",
            TargetReason::DeferredPin => "deferred_pin",
            TargetReason::DominantSpeaker => "dominant_speaker",
            TargetReason::StreamStarted => "stream_started",
            TargetReason::MediaChanged => "media_changed",
            TargetReason::LastNReassignment => "last_n_reassignment",
            TargetReason::ParticipantLeft => "participant_left",
            TargetReason::ConferenceJoined => "conference_joined",
        }
    }
}
