//! Storage abstractions for service layer
//!
//! Contains the file-backed engine that owns all persistent state for
//! kvstash; no other component touches the map or the file directly.

pub mod engine;
