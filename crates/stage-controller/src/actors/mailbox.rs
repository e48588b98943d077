//! Mailbox depth monitoring for the session actor.
//!
//! | Level    | Depth     |
//! |----------|-----------|
//! | Normal   | < 100     |
//! | Warning  | 100 - 500 |
//! | Critical | > 500     |

use crate::observability::metrics;
use tracing::{debug, warn};

pub const SESSION_MAILBOX_NORMAL: usize = 100;
pub const SESSION_MAILBOX_WARNING: usize = 500;

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    Normal,
    Warning,
    Critical,
}

impl MailboxLevel {
    #[must_use]
    pub const fn for_depth(depth: usize) -> Self {
        if depth > SESSION_MAILBOX_WARNING {
            MailboxLevel::Critical
        } else if depth >= SESSION_MAILBOX_NORMAL {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}

/// Tracks queue depth for one session actor.
///
/// Owned by the actor task, so no atomics are needed.
#[derive(Debug)]
pub struct MailboxMonitor {
    session_id: String,
    depth: usize,
    peak_depth: usize,
    messages_processed: u64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            depth: 0,
            peak_depth: 0,
            messages_processed: 0,
        }
    }

    /// Record the backlog observed when a message was received.
    pub fn record_receive(&mut self, queued: usize) {
        self.depth = queued + 1;
        self.peak_depth = self.peak_depth.max(self.depth);
        metrics::set_mailbox_depth(self.depth);

        match MailboxLevel::for_depth(self.depth) {
            MailboxLevel::Critical => warn!(
                target: "stage.actor.session",
                session_id = %self.session_id,
                depth = self.depth,
                threshold = SESSION_MAILBOX_WARNING,
                "Mailbox depth critical"
            ),
            MailboxLevel::Warning if self.depth == SESSION_MAILBOX_NORMAL => debug!(
                target: "stage.actor.session",
                session_id = %self.session_id,
                depth = self.depth,
                "Mailbox depth elevated"
            ),
            _ => {}
        }
    }

    /// Record that the current message has been fully handled.
    pub fn record_processed(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.messages_processed += 1;
        metrics::set_mailbox_depth(self.depth);
    }

    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth
    }

    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed
    }
}
