//! Display switch tracking.
//!
//! Every large video switch gets a token from a monotonic counter. Only the
//! switch holding the latest token is in flight; issuing a new one silently
//! cancels the previous one, whose completion is discarded when it arrives.

use common::types::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic display switch request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayToken(u64);

impl DisplayToken {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DisplayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The display switch currently awaiting completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSwitch {
    pub token: DisplayToken,
    pub participant_id: ParticipantId,
    /// Participant shown before this switch, refreshed on completion.
    pub previous: Option<ParticipantId>,
}

/// Last-writer-wins tracker for display switches.
#[derive(Debug, Default)]
pub struct DisplaySwitchTracker {
    last_issued: u64,
    in_flight: Option<PendingSwitch>,
}

impl DisplaySwitchTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new switch, superseding any switch still in flight.
    pub fn begin(
        &mut self,
        participant_id: ParticipantId,
        previous: Option<ParticipantId>,
    ) -> DisplayToken {
        self.last_issued += 1;
        let token = DisplayToken(self.last_issued);
        self.in_flight = Some(PendingSwitch {
            token,
            participant_id,
            previous,
        });
        token
    }

    /// Resolve a completion. Returns `None` for stale or unknown tokens.
    pub fn complete(&mut self, token: DisplayToken) -> Option<PendingSwitch> {
        if self.in_flight.as_ref().is_some_and(|p| p.token == token) {
            self.in_flight.take()
        } else {
            None
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<&PendingSwitch> {
        self.in_flight.as_ref()
    }

    /// Latest token issued, if any.
    #[must_use]
    pub fn latest(&self) -> Option<DisplayToken> {
        (self.last_issued > 0).then_some(DisplayToken(self.last_issued))
    }
}
