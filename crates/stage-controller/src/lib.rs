//! Stage Controller Library
//!
//! This library decides which participant of a call is shown on the large
//! video ("the stage") and which thumbnails are backed by real video, for
//! conferences too large for every stream to be delivered. It provides:
//!
//! - Participant registry with per-participant media state
//! - LastN reconciliation (server-announced set vs. locally forwarded set)
//! - Large video target selection with pin, dominant speaker, and deferred pin
//! - Display switch tokens so only the most recent switch is reflected
//! - A per-session Event Router actor dispatching side effects to collaborators
//!
//! # Architecture
//!
//! ```text
//! SessionActor (one per call session)
//! └── owns StageCoordinator
//!     ├── ParticipantRegistry
//!     ├── LastNState
//!     ├── SelectionState
//!     └── DisplaySwitchTracker
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single owner**: one actor owns all stage state; events are serialized
//! - **Commands out**: the coordinator never calls collaborators directly, it
//!   queues `StageCommand`s that the actor dispatches in order
//! - **Last writer wins**: display completions carry a token; stale ones are
//!   discarded
//! - **Nothing fatal**: unknown IDs and inconsistent LastN payloads are logged
//!   and ignored
//!
//! # Modules
//!
//! - [`actors`] - Event Router actor and mailbox monitoring
//! - [`collaborators`] - Delivery layer and renderer traits
//! - [`config`] - Configuration from environment
//! - [`console`] - JSON-lines collaborators used by the binary
//! - [`errors`] - Error types
//! - [`observability`] - Prometheus metrics
//! - [`stage`] - Synchronous stage core

pub mod actors;
pub mod collaborators;
pub mod config;
pub mod console;
pub mod errors;
pub mod observability;
pub mod stage;
