//! Outbound commands emitted by the stage coordinator.
//!
//! The coordinator never calls collaborators directly. Handlers push
//! commands in emission order; the session actor drains and dispatches them
//! after each event.

use crate::stage::display::DisplayToken;
use common::types::{ParticipantId, StreamHandle, VideoType, Visibility};
use serde::Serialize;

/// A request to show one participant on the large video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRequest {
    /// Request token; only the latest token's completion has any effect.
    pub token: DisplayToken,
    pub participant_id: ParticipantId,
    pub stream: Option<StreamHandle>,
    pub video_type: VideoType,
}

/// Side effect for a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum StageCommand {
    /// Pin or unpin intent for the delivery layer (drives LastN admission).
    RequestPin {
        participant_id: ParticipantId,
        active: bool,
    },

    /// Stream quality prioritization hint for the delivery layer.
    RequestSelectedEndpoint { participant_id: ParticipantId },

    /// Asynchronous large video switch for the renderer.
    DisplayLarge(DisplayRequest),

    /// Thumbnail materialization for the renderer.
    SetVisibility {
        participant_id: ParticipantId,
        visibility: Visibility,
    },

    /// Thumbnail refresh after a display switch or a media state change.
    RefreshView { participant_id: ParticipantId },
}

impl StageCommand {
    /// Returns the command name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            StageCommand::RequestPin { .. } => "request_pin",
            StageCommand::RequestSelectedEndpoint { .. } => "request_selected_endpoint",
            StageCommand::DisplayLarge(_) => "display_large",
            StageCommand::SetVisibility { .. } => "set_visibility",
            StageCommand::RefreshView { .. } => "refresh_view",
        }
    }
}
