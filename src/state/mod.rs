//! State management module.
//!
//! Contains the Matrix (all daemon state) and the entities it owns.

pub mod actor;
mod channel;
mod matrix;
mod server;
mod uid;
mod user;

pub use actor::{CoreEvent, CoreHandle, Deferred};
pub use channel::{Channel, ListEntry, Membership};
pub use matrix::{Actor, Matrix};
pub use server::ServerInfo;
pub use uid::{Uid, UidGenerator};
pub use user::User;
