//! OPER.

use slirc_proto::{Message, Response};
use tracing::{info, warn};

use super::mode::broadcast;
use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::Actor;

pub struct OperHandler;

impl Handler for OperHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).unwrap_or_default();
        let password = msg.arg(1).unwrap_or_default();

        let authorised = ctx
            .matrix
            .config
            .find_oper(name)
            .is_some_and(|block| block.verify_password(password));
        if !authorised {
            warn!(uid = %ctx.uid, oper = %name, "Failed OPER attempt");
            return Err(HandlerError::PasswordMismatch);
        }

        let nick = ctx.nick();
        let actor = ctx.actor();
        // The server grants +o, bypassing the oper-only check on user modes.
        match ctx.matrix.process_mode(&Actor::Server, &nick, "+o", &[]) {
            Ok(outcome) => broadcast(ctx.matrix, &actor, &outcome),
            Err(e) => return Err(HandlerError::Internal(e.to_string())),
        }
        info!(uid = %ctx.uid, oper = %name, "Operator authenticated");
        ctx.reply(Response::RPL_YOUREOPER, &["You are now an IRC operator"]);
        Ok(())
    }
}
