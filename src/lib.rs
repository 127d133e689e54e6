//! demoreel - demo video assembly
//!
//! This library crate exposes configuration loading and the health monitor
//! for the binary and for integration testing.

pub mod config;
pub mod health;
