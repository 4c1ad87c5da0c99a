//! Channel mode `+C`: block CTCP other than ACTION.

use slirc_proto::{Message, Response, is_channel_name};

use crate::error::ModuleError;
use crate::hooks::{EventKind, ModResult, Priority};
use crate::modes::{ModeDescriptor, ModeTarget};
use crate::modules::{MessageEvent, Module, ModuleContext};
use crate::state::Matrix;

pub struct NoCtcp;

fn is_blocked_ctcp(text: &str) -> bool {
    let Some(body) = text.strip_prefix('\x01') else {
        return false;
    };
    let body = body.trim_end_matches('\x01');
    let verb = body.split(' ').next().unwrap_or_default();
    !verb.eq_ignore_ascii_case("ACTION")
}

impl Module for NoCtcp {
    fn name(&self) -> &str {
        "no_ctcp"
    }

    fn description(&self) -> &str {
        "Provides channel mode +C (no CTCP)"
    }

    fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.add_mode(ModeDescriptor::simple('C', ModeTarget::Channel))?;
        ctx.subscribe(EventKind::UserPreMessage, Priority::Default);
        Ok(())
    }

    fn on_user_pre_message(&self, matrix: &mut Matrix, event: &MessageEvent) -> ModResult {
        if !is_channel_name(&event.target) || !is_blocked_ctcp(&event.text) {
            return ModResult::PassThru;
        }
        let Some(display) = matrix
            .channel(&event.target)
            .filter(|c| c.has_mode('C'))
            .map(|c| c.name.clone())
        else {
            return ModResult::PassThru;
        };

        if !event.notice {
            let nick = matrix.nick_of(&event.uid).to_string();
            let reply = Message::numeric(
                &matrix.server.name,
                Response::ERR_CANNOTSENDTOCHAN,
                &[&nick, &display, "Cannot send CTCP to channel (+C)"],
            );
            matrix.send_to(&event.uid, reply);
        }
        ModResult::Deny
    }
}
