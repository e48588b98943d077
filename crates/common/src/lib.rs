//! Common utilities and types shared across Dark Tower stage components.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;
