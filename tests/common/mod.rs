//! Integration test common infrastructure.
//!
//! [`Harness`] drives a `Matrix` synchronously, one core event at a time.
//! [`TestServer`] and [`TestClient`] run the real daemon over TCP.

pub mod client;
pub mod harness;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use harness::{Harness, test_config};
#[allow(unused_imports)]
pub use server::TestServer;
