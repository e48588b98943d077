//! Stage core: who is shown large, and which thumbnails exist at all.
//!
//! Everything here is synchronous and single-owner. The session actor
//! serializes inbound events; nothing in this module is `Send`-sensitive or
//! async.
//!
//! # Components
//!
//! - [`registry`]: participant media state, local and remote
//! - [`last_n`]: server and local LastN sets, visibility transitions
//! - [`selection`]: pin, dominant speaker, large target, pending pin
//! - [`display`]: display switch tokens (last writer wins)
//! - [`coordinator`]: event handlers tying the above together
//! - [`events`] / [`commands`]: inbound events and outbound side effects

pub mod commands;
pub mod coordinator;
pub mod display;
pub mod events;
pub mod last_n;
pub mod registry;
pub mod selection;

pub use commands::{DisplayRequest, StageCommand};
pub use coordinator::{StageCoordinator, StageSnapshot};
pub use display::DisplayToken;
pub use events::StageEvent;
pub use last_n::LastNState;
pub use registry::{Participant, ParticipantInit, ParticipantRef, ParticipantRegistry};
pub use selection::SelectionState;
