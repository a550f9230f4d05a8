// Coordinate reprojection
pub mod geo;

// Frame decoding and message classification
pub mod event;

// Error taxonomy
pub mod error;

// Push channel sessions
pub mod channel;

// Entity table and reconciliation
pub mod state;

// Renderer-facing collaborator traits
pub mod render;

// Configuration
pub mod config;

// Sync context driving the event loop
pub mod client;

pub use client::{Handled, SyncClient};
pub use error::SyncError;
