//! Participant fixtures for stage testing.

use common::types::{ParticipantId, StreamHandle, VideoType};
use stage_controller::stage::ParticipantInit;

/// Shorthand for a participant ID.
#[must_use]
pub fn pid(id: &str) -> ParticipantId {
    ParticipantId::new(id)
}

/// Shorthand for a list of participant IDs.
#[must_use]
pub fn ids(list: &[&str]) -> Vec<ParticipantId> {
    list.iter().map(|id| ParticipantId::new(*id)).collect()
}

/// Test participant fixture.
#[derive(Debug, Clone)]
pub struct TestParticipant {
    /// Participant ID.
    pub id: String,
    /// Camera or screen share.
    pub video_type: VideoType,
    /// Stream attached at join time.
    pub stream: Option<String>,
    /// Playback already running at join time.
    pub video_started: bool,
}

impl TestParticipant {
    /// Create a participant with no stream.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            video_type: VideoType::Camera,
            stream: None,
            video_started: false,
        }
    }

    /// Attach a stream named after the participant.
    #[must_use]
    pub fn with_video(mut self) -> Self {
        self.stream = Some(format!("stream-{}", self.id));
        self
    }

    /// Attach a stream that is already playing.
    #[must_use]
    pub fn with_started_video(mut self) -> Self {
        self.video_started = true;
        self.with_video()
    }

    /// Mark the video as a screen share.
    #[must_use]
    pub fn screen_share(mut self) -> Self {
        self.video_type = VideoType::Screen;
        self
    }

    /// Build the join payload.
    #[must_use]
    pub fn build(self) -> ParticipantInit {
        ParticipantInit {
            id: ParticipantId::new(self.id),
            video_type: self.video_type,
            stream: self.stream.map(StreamHandle::new),
            video_started: self.video_started,
        }
    }
}
