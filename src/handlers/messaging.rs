//! PRIVMSG and NOTICE.
//!
//! NOTICE never generates error replies.

use slirc_proto::{Message, Response, is_channel_name};

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::hooks::ModResult;
use crate::modes::VOICE_RANK;
use crate::modules::MessageEvent;
use crate::state::{Actor, Matrix};

pub struct MessageHandler {
    notice: bool,
}

impl MessageHandler {
    pub fn privmsg() -> Self {
        Self { notice: false }
    }

    pub fn notice() -> Self {
        Self { notice: true }
    }

    fn command(&self) -> &'static str {
        if self.notice { "NOTICE" } else { "PRIVMSG" }
    }

    fn error(&self, ctx: &mut Context<'_>, response: Response, args: &[&str]) {
        if !self.notice {
            ctx.reply(response, args);
        }
    }

    fn deliver(&self, ctx: &mut Context<'_>, target: &str, text: &str) {
        let event = MessageEvent {
            uid: ctx.uid.to_string(),
            target: target.to_string(),
            text: text.to_string(),
            notice: self.notice,
        };

        let verdict = ctx.matrix.fire_user_pre_message(&event);
        if verdict == ModResult::Deny {
            return;
        }

        let mask = ctx.matrix.actor_mask(&Actor::User(ctx.uid.to_string()));
        if is_channel_name(target) {
            let Some(display) = ctx.matrix.channel(target).map(|c| c.name.clone()) else {
                self.error(ctx, Response::ERR_NOSUCHCHANNEL, &[target, "No such channel"]);
                return;
            };
            if verdict == ModResult::PassThru && !may_speak(ctx.matrix, &display, ctx.uid) {
                self.error(ctx, Response::ERR_CANNOTSENDTOCHAN, &[&display, "Cannot send to channel"]);
                return;
            }
            let line = Message::new(self.command(), vec![display.clone(), text.to_string()]).with_prefix(mask);
            ctx.matrix.broadcast_channel(&display, &line, Some(ctx.uid));
        } else {
            let Some(recipient) = ctx.matrix.find_uid(target) else {
                self.error(ctx, Response::ERR_NOSUCHNICK, &[target, "No such nick/channel"]);
                return;
            };
            let nick = ctx.matrix.nick_of(&recipient).to_string();
            let line = Message::new(self.command(), vec![nick, text.to_string()]).with_prefix(mask);
            ctx.matrix.send_to(&recipient, line);
        }

        ctx.matrix.fire_user_message(&event);
    }
}

/// Built-in send checks: `+n`, `+m`, and bans for unvoiced users.
fn may_speak(matrix: &mut Matrix, channel: &str, uid: &str) -> bool {
    let Some(chan) = matrix.channel(channel) else {
        return false;
    };
    let member = chan.is_member(uid);
    let (no_external, moderated) = (chan.has_mode('n'), chan.has_mode('m'));
    if no_external && !member {
        return false;
    }
    let voiced = matrix.member_rank(channel, uid) >= VOICE_RANK;
    if moderated && !voiced {
        return false;
    }
    voiced || !matrix.is_banned(channel, uid)
}

impl Handler for MessageHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let targets = msg.arg(0).unwrap_or_default();
        let text = match msg.arg(1) {
            Some(t) if !t.is_empty() => t,
            _ if self.notice => return Ok(()),
            _ => return Err(HandlerError::NeedMoreParams),
        };
        for target in targets.split(',').filter(|t| !t.is_empty()) {
            self.deliver(ctx, target, text);
        }
        Ok(())
    }
}
