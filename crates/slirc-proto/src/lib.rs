//! # slirc-proto
//!
//! The thin wire layer under `slircd-core`: just enough of the IRC line
//! protocol to route commands into the daemon core and to render replies.
//!
//! ## Parsing
//!
//! ```rust
//! use slirc_proto::Message;
//!
//! let msg: Message = ":alice!a@host MODE #rust +b-o *!*@evil.example bob".parse().unwrap();
//! assert_eq!(msg.command, "MODE");
//! assert_eq!(msg.params, vec!["#rust", "+b-o", "*!*@evil.example", "bob"]);
//! ```
//!
//! ## Building replies
//!
//! ```rust
//! use slirc_proto::{Message, Response};
//!
//! let reply = Message::numeric("irc.example", Response::ERR_NOSUCHNICK, &["alice", "bob", "No such nick/channel"]);
//! assert_eq!(reply.to_string(), ":irc.example 401 alice bob :No such nick/channel");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod error;
pub mod message;
mod parse;
pub mod response;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower, wildcard_match};
pub use self::error::MessageParseError;
pub use self::message::{Message, MAX_LINE_LEN};
pub use self::response::Response;

/// Returns true if `name` looks like a channel name (`#` or `&` prefix).
pub fn is_channel_name(name: &str) -> bool {
    matches!(name.as_bytes().first(), Some(b'#') | Some(b'&')) && name.len() > 1
}
