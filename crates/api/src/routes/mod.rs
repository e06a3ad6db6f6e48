//! HTTP route handlers.

pub mod booking;
pub mod config;
pub mod health;
pub mod metrics;
pub mod wizards;
