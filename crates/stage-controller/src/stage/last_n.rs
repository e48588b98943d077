//! LastN reconciliation.
//!
//! The bridge delivers video for at most N participants (the server set).
//! The client keeps a local set on top of it: every server-set member plus
//! recently delivered participants, up to a local capacity that only grows.
//! Participants that fall out of the server set but stay in the local set
//! keep an avatar thumbnail instead of disappearing.
//!
//! Say A, B, C, D, E and F are in a call and LastN = 3. If LastN drops to 2,
//! E still sees thumbnails for A, B and C: A and B are in the server set, C
//! only in the local set. If F starts talking with LastN = 3 again, E sees
//! F, A and B; B was ejected from the server set but stays local, ejecting C.
//!
//! Invariants after every update:
//! - `server_set` is a subset of `local_set`
//! - `server_set.len() <= local_capacity` and `local_set.len() <= local_capacity`
//! - `local_capacity` never decreases

use crate::errors::StageError;
use crate::stage::registry::{ParticipantRef, ParticipantRegistry};
use common::types::{ParticipantId, Visibility};
use serde::Serialize;
use tracing::{debug, warn};

/// Side effects of one server LastN update.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LastNOutcome {
    /// Visibility transitions, in the order they were decided.
    pub visibility_changes: Vec<(ParticipantId, Visibility)>,
    /// The large-video participant stopped being received and nothing else
    /// has claimed the stage.
    pub reassign_large_target: bool,
    /// Pending pin request satisfied by this update.
    pub deferred_pin: Option<ParticipantId>,
    /// Entering IDs rejected as inconsistent with the server set.
    pub ignored_entering: Vec<ParticipantId>,
}

/// Server-announced and locally extended LastN sets.
#[derive(Debug, Clone, Serialize)]
pub struct LastNState {
    server_set: Vec<ParticipantId>,
    local_set: Vec<ParticipantId>,
    local_capacity: usize,
    /// Current LastN value; `None` while LastN is disabled.
    last_n_count: Option<usize>,
}

impl LastNState {
    /// Create LastN state from the configured channel LastN.
    #[must_use]
    pub fn new(channel_last_n: Option<usize>) -> Self {
        Self {
            server_set: Vec::new(),
            local_set: Vec::new(),
            local_capacity: channel_last_n.unwrap_or(0),
            last_n_count: channel_last_n,
        }
    }

    #[must_use]
    pub fn server_set(&self) -> &[ParticipantId] {
        &self.server_set
    }

    #[must_use]
    pub fn local_set(&self) -> &[ParticipantId] {
        &self.local_set
    }

    #[must_use]
    pub fn local_capacity(&self) -> usize {
        self.local_capacity
    }

    #[must_use]
    pub fn last_n_count(&self) -> Option<usize> {
        self.last_n_count
    }

    /// Whether the bridge is (or is assumed to be) delivering this participant.
    ///
    /// True when LastN is disabled, when LastN is positive but no server set
    /// has been announced yet, or when the ID is in the server set.
    #[must_use]
    pub fn is_in_last_n(&self, id: &ParticipantId) -> bool {
        match self.last_n_count {
            None => true,
            Some(n) if n > 0 && self.server_set.is_empty() => true,
            Some(_) => self.server_set.contains(id),
        }
    }

    /// Visibility for a newly joined remote participant.
    ///
    /// `remote_count` includes the joining participant.
    #[must_use]
    pub fn initial_visibility(&self, remote_count: usize) -> Visibility {
        match self.last_n_count {
            Some(_) if self.local_capacity > 0 && remote_count > self.local_capacity => {
                Visibility::Hidden
            }
            _ => Visibility::Shown,
        }
    }

    /// Drop a departed participant from the local set.
    ///
    /// Server-set members are left alone; the next server update removes them.
    pub fn forget(&mut self, id: &ParticipantId) {
        if !self.server_set.contains(id) {
            self.local_set.retain(|kept| kept != id);
        }
    }

    /// Apply a server LastN announcement.
    ///
    /// `entering` lists the IDs newly gaining delivery; `None` treats the
    /// whole server set as entering. Drop detection always runs before
    /// admission, so admission wins for any ID touched by both.
    pub fn apply_server_update(
        &mut self,
        new_server_set: Vec<ParticipantId>,
        entering: Option<Vec<ParticipantId>>,
        registry: &ParticipantRegistry,
        large_target: Option<&ParticipantId>,
        pending_pin: Option<&ParticipantId>,
    ) -> LastNOutcome {
        let new_server_set = dedup(new_server_set);

        // 1. Grow the local capacity if the server now delivers more
        if new_server_set.len() > self.local_capacity {
            debug!(
                target: "stage.last_n",
                from = self.local_capacity,
                to = new_server_set.len(),
                "Local LastN capacity raised"
            );
            self.local_capacity = new_server_set.len();
        }
        self.last_n_count = Some(new_server_set.len());

        // 2. Server set first, then previously kept IDs in their old order
        let mut next_local_set = new_server_set.clone();
        for id in &self.local_set {
            if next_local_set.len() >= self.local_capacity {
                break;
            }
            if !next_local_set.contains(id) {
                next_local_set.push(id.clone());
            }
        }

        // 3. Commit both sets
        self.local_set = next_local_set;
        self.server_set = new_server_set;

        let mut outcome = LastNOutcome::default();
        let mut targets: Vec<(ParticipantId, Visibility)> = Vec::new();

        // 4. Drop detection. The local participant is never subject to LastN
        for participant in registry.remotes() {
            let id = participant.id();
            let in_server = self.server_set.contains(id);
            let in_local = self.local_set.contains(id);

            let mut received = true;
            if !in_server && !in_local {
                debug!(target: "stage.last_n", participant_id = %id, "Removed from LastN");
                set_target(&mut targets, id, Visibility::Hidden);
                received = false;
            } else if !in_server && participant.visibility() == Visibility::Shown {
                debug!(target: "stage.last_n", participant_id = %id, "Kept in local LastN only");
                set_target(&mut targets, id, Visibility::Avatar);
                received = false;
            }

            if !received && large_target == Some(id) {
                outcome.reassign_large_target = true;
            }
        }

        // 5. Admission
        let entering = entering.map_or_else(|| self.server_set.clone(), dedup);
        for id in entering {
            if id.is_empty() {
                continue;
            }

            if !self.server_set.contains(&id) && !self.local_set.contains(&id) {
                let err = StageError::MalformedLastNUpdate(format!(
                    "entering id {id} is not in the server or local set"
                ));
                warn!(target: "stage.last_n", error = %err, "Ignoring stray entering id");
                outcome.ignored_entering.push(id);
                continue;
            }

            match registry.resolve(&id) {
                Some(ParticipantRef::Remote(_)) => {}
                Some(ParticipantRef::Local(_)) => continue,
                None => {
                    debug!(
                        target: "stage.last_n",
                        participant_id = %id,
                        "Entering id not in registry, skipping"
                    );
                    continue;
                }
            }

            debug!(target: "stage.last_n", participant_id = %id, "Added to LastN");
            set_target(&mut targets, &id, Visibility::Shown);

            if outcome.deferred_pin.is_none() && pending_pin == Some(&id) {
                outcome.deferred_pin = Some(id);
                outcome.reassign_large_target = false;
            }
        }

        // 6. Only report real transitions
        outcome.visibility_changes = targets
            .into_iter()
            .filter(|(id, visibility)| {
                registry
                    .get(id)
                    .is_some_and(|p| p.visibility() != *visibility)
            })
            .collect();

        outcome
    }
}

fn set_target(
    targets: &mut Vec<(ParticipantId, Visibility)>,
    id: &ParticipantId,
    visibility: Visibility,
) {
    if let Some(entry) = targets.iter_mut().find(|(existing, _)| existing == id) {
        entry.1 = visibility;
    } else {
        targets.push((id.clone(), visibility));
    }
}

fn dedup(ids: Vec<ParticipantId>) -> Vec<ParticipantId> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
