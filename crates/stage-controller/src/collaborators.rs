//! Collaborator seams.
//!
//! The stage core decides; these traits act. The delivery layer talks to the
//! bridge (pin intent, stream quality hints) and the renderer owns thumbnails
//! and the large video element. Both are `Send + Sync` and shared behind
//! `Arc<dyn ...>` by the session actor.

use crate::errors::{DisplayError, StageError};
use crate::stage::commands::DisplayRequest;
use async_trait::async_trait;
use common::types::{ParticipantId, Visibility};

/// Signaling towards the media bridge.
#[async_trait]
pub trait DeliveryLayer: Send + Sync {
    /// Pin or unpin intent. Drives server-side LastN admission.
    async fn request_pin(
        &self,
        participant_id: &ParticipantId,
        active: bool,
    ) -> Result<(), StageError>;

    /// Ask the bridge to prioritize this participant's stream quality.
    async fn request_selected_endpoint(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<(), StageError>;
}

/// Thumbnail and large video rendering.
#[async_trait]
pub trait StageRenderer: Send + Sync {
    /// Switch the large video. Runs detached from the session actor; the
    /// outcome is reported back with the request token.
    async fn display_large(&self, request: DisplayRequest) -> Result<(), DisplayError>;

    async fn set_visibility(
        &self,
        participant_id: &ParticipantId,
        visibility: Visibility,
    ) -> Result<(), StageError>;

    async fn refresh_view(&self, participant_id: &ParticipantId) -> Result<(), StageError>;
}
