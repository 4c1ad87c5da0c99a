//! Network module.
//!
//! The Gateway accepts TCP clients; each Connection task shuttles lines
//! between its socket and the core actor.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;
