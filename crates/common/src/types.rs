//! Common data types for Dark Tower stage components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a call participant.
///
/// Opaque and stable for the lifetime of the participant's membership. The
/// signaling layer owns the format; the stage core only compares ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a participant ID from its signaling representation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is an empty slot (the server pads LastN lists with them).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque handle to a media stream, resolved by the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamHandle(String);

impl StreamHandle {
    /// Create a stream handle.
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Get the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of video a participant is currently sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    /// Camera video, shown in the primary video container.
    #[default]
    Camera,
    /// Desktop/screen share.
    Screen,
    /// No video source.
    None,
}

impl VideoType {
    /// Returns the video type as a string for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            VideoType::Camera => "camera",
            VideoType::Screen => "screen",
            VideoType::None => "none",
        }
    }
}

/// How a participant's thumbnail is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Not rendered at all.
    Hidden,
    /// Placeholder only; the stream is not being delivered.
    Avatar,
    /// Live video thumbnail.
    Shown,
}

impl Visibility {
    /// Returns the visibility as a string for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Visibility::Hidden => "hidden",
            Visibility::Avatar => "avatar",
            Visibility::Shown => "shown",
        }
    }
}
