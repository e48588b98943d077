//! Inbound events from the signaling layer and the renderer.

use crate::stage::registry::ParticipantInit;
use common::types::{ParticipantId, StreamHandle, VideoType};
use serde::{Deserialize, Serialize};

/// An external event routed into the stage coordinator.
///
/// The wire shape is one JSON object per event, tagged by `event`:
///
/// ```json
/// {"event": "server_last_n_changed", "server_set": ["a", "c"], "entering": []}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StageEvent {
    ParticipantJoined(ParticipantInit),
    ParticipantLeft {
        participant_id: ParticipantId,
    },
    UserClicked {
        participant_id: ParticipantId,
    },
    TogglePin {
        participant_id: ParticipantId,
    },
    DominantSpeakerChanged {
        participant_id: ParticipantId,
    },
    /// `entering` absent means every server-set member is entering.
    ServerLastNChanged {
        server_set: Vec<ParticipantId>,
        #[serde(default)]
        entering: Option<Vec<ParticipantId>>,
    },
    StreamAdded {
        participant_id: ParticipantId,
        stream: StreamHandle,
    },
    StreamRemoved {
        participant_id: ParticipantId,
    },
    StreamStarted {
        participant_id: ParticipantId,
    },
    StreamEnded {
        participant_id: ParticipantId,
    },
    VideoTypeChanged {
        participant_id: ParticipantId,
        video_type: VideoType,
    },
    VideoMuteChanged {
        participant_id: ParticipantId,
        muted: bool,
    },
    ConnectionStatusChanged {
        participant_id: ParticipantId,
        active: bool,
    },
    ConferenceJoined,
    StageLockChanged {
        sticky: bool,
    },
    PresentationOrderChanged {
        order: Vec<ParticipantId>,
    },
}

impl StageEvent {
    /// Returns the event name for logs and metric labels.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            StageEvent::ParticipantJoined(_) => "participant_joined",
            StageEvent::ParticipantLeft { .. } => "participant_left",
            StageEvent::UserClicked { .. } => "user_clicked",
            StageEvent::TogglePin { .. } => "toggle_pin",
            StageEvent::DominantSpeakerChanged { .. } => "dominant_speaker_changed",
            StageEvent::ServerLastNChanged { .. } => "server_last_n_changed",
            StageEvent::StreamAdded { .. } => "stream_added",
            StageEvent::StreamRemoved { .. } => "stream_removed",
            StageEvent::StreamStarted { .. } => "stream_started",
            StageEvent::StreamEnded { .. } => "stream_ended",
            StageEvent::VideoTypeChanged { .. } => "video_type_changed",
            StageEvent::VideoMuteChanged { .. } => "video_mute_changed",
            StageEvent::ConnectionStatusChanged { .. } => "connection_status_changed",
            StageEvent::ConferenceJoined => "conference_joined",
            StageEvent::StageLockChanged { .. } => "stage_lock_changed",
            StageEvent::PresentationOrderChanged { .. } => "presentation_order_changed",
        }
    }
}
