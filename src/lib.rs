//! slircd-core - Straylight IRC Daemon core
//!
//! A single-actor IRC daemon built around three pieces: a hook registry that
//! orders extensions and reduces their ALLOW/DENY/PASSTHRU verdicts, a mode
//! engine that validates and applies mode batches atomically, and a typed
//! extension store that lets runtime-loaded modules attach state to users,
//! channels, memberships and the server.

pub mod config;
pub mod error;
pub mod extensible;
pub mod handlers;
pub mod hooks;
pub mod http;
pub mod metrics;
pub mod modes;
pub mod modules;
pub mod network;
pub mod state;
pub mod telemetry;
