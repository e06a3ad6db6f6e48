//! Shared types for the booking wizard workspace.

pub mod types;

pub use types::{BookingId, SessionId};
