//! Event Router actor.
//!
//! ```text
//! signaling / UI callbacks
//!         │  SessionActorHandle (mpsc mailbox)
//!         ▼
//! SessionActor ── owns StageCoordinator
//!         │  drains StageCommands after every message
//!         ├──► DeliveryLayer (request_pin, request_selected_endpoint)
//!         └──► StageRenderer (set_visibility, refresh_view,
//!                              display_large in a detached task)
//!                    │
//!                    └── completion channel (token, result) ──► SessionActor
//! ```
//!
//! # Modules
//!
//! - [`session`] - `SessionActor` and its handle
//! - [`messages`] - Mailbox and completion message types
//! - [`mailbox`] - Mailbox depth monitoring

pub mod mailbox;
pub mod messages;
pub mod session;

pub use mailbox::{MailboxLevel, MailboxMonitor};
pub use messages::{DisplayCompletion, SessionMessage};
pub use session::{SessionActor, SessionActorHandle};
