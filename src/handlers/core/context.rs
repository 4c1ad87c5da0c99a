//! Command handler context and trait.

use slirc_proto::{Message, Response};

use crate::error::HandlerResult;
use crate::state::{Actor, Matrix, User};

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The issuing user's UID.
    pub uid: &'a str,
    pub matrix: &'a mut Matrix,
}

impl<'a> Context<'a> {
    pub fn new(uid: &'a str, matrix: &'a mut Matrix) -> Self {
        Self { uid, matrix }
    }

    pub fn user(&self) -> Option<&User> {
        self.matrix.users.get(self.uid)
    }

    pub fn nick(&self) -> String {
        self.matrix.nick_of(self.uid).to_string()
    }

    pub fn actor(&self) -> Actor {
        Actor::User(self.uid.to_string())
    }

    pub fn server_name(&self) -> &str {
        &self.matrix.server.name
    }

    pub fn is_oper(&self) -> bool {
        self.user().is_some_and(User::is_oper)
    }

    pub fn send(&mut self, msg: Message) {
        self.matrix.send_to(self.uid, msg);
    }

    /// Numeric to the issuing user; their nick is prepended.
    pub fn reply(&mut self, response: Response, args: &[&str]) {
        self.matrix.reply(self.uid, response, args);
    }
}

/// A command implementation.
///
/// Handlers run on the core actor with exclusive access to the `Matrix`;
/// they must not block.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;
}
