//! # Campus Application Library
//!
//! The sidecar, CLI and configuration layers around `campus-core`, exposed
//! as a library so integration tests can drive the router directly.

pub mod api;
pub mod cli;
pub mod config;
