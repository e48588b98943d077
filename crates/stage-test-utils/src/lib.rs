//! # Stage Test Utilities
//!
//! Shared test utilities for the Stage Controller.
//!
//! This crate provides recording collaborators and participant fixtures for
//! driving a `SessionActor` end to end without a real bridge or renderer.
//!
//! ## Modules
//!
//! - `fixtures` - Participant builders and ID helpers
//! - `mock_delivery` - Delivery layer that records pin and endpoint requests
//! - `mock_renderer` - Renderer that records calls and can hold display
//!   switches open until the test releases them
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stage_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let log = CommandLog::new();
//!     let delivery = RecordingDelivery::new(log.clone());
//!     let renderer = RecordingRenderer::gated(log.clone());
//!
//!     let alice = TestParticipant::new("alice").with_started_video().build();
//!
//!     // Spawn a SessionActor with Arc::new(delivery), Arc::new(renderer)...
//! }
//! ```

pub mod fixtures;
pub mod mock_delivery;
pub mod mock_renderer;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_delivery::*;
pub use mock_renderer::*;
