//! MODE: queries, list views and changes for channels and users.
//!
//! The handler is a thin shell over [`Matrix::process_mode`]: it turns the
//! outcome's per-item rejections into numerics and broadcasts the applied
//! change record.

use slirc_proto::{Message, Response, is_channel_name};

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult, ModeError};
use crate::modes::{ModeOutcome, ModeTarget, ModeTargetRef, list_query};
use crate::state::{Actor, Matrix};

pub struct ModeHandler;

impl Handler for ModeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let target = msg.arg(0).unwrap_or_default();
        let Some(modestr) = msg.arg(1) else {
            return show_modes(ctx, target);
        };
        let params = &msg.params[2..];

        if is_channel_name(target) && ctx.matrix.channel(target).is_some() {
            let lookup = |l: char| ctx.matrix.modes.get(ModeTarget::Channel, l);
            if let Some(letters) = list_query(modestr, params, lookup) {
                for letter in letters {
                    send_list(ctx, target, letter);
                }
                return Ok(());
            }
        }

        let actor = ctx.actor();
        match ctx.matrix.process_mode(&actor, target, modestr, params) {
            Ok(outcome) => {
                report(ctx, target, &outcome);
                broadcast(ctx.matrix, &actor, &outcome);
                Ok(())
            }
            Err(ModeError::MalformedRequest(_)) => Err(HandlerError::NeedMoreParams),
            Err(ModeError::Rejected) => Err(HandlerError::Vetoed),
            Err(ModeError::NoSuchTarget(t)) if is_channel_name(&t) => Err(HandlerError::NoSuchChannel(t)),
            Err(ModeError::NoSuchTarget(t)) => Err(HandlerError::NoSuchNick(t)),
        }
    }
}

fn show_modes(ctx: &mut Context<'_>, target: &str) -> HandlerResult {
    if is_channel_name(target) {
        let chan = ctx
            .matrix
            .channel(target)
            .ok_or_else(|| HandlerError::NoSuchChannel(target.to_string()))?;
        let display = chan.name.clone();
        let created = chan.created.to_string();
        let (modes, params) = chan.mode_string(chan.is_member(ctx.uid));
        let mut args = vec![display.as_str(), modes.as_str()];
        args.extend(params.iter().map(String::as_str));
        ctx.reply(Response::RPL_CHANNELMODEIS, &args);
        ctx.reply(Response::RPL_CREATIONTIME, &[&display, &created]);
        return Ok(());
    }

    let uid = ctx
        .matrix
        .find_uid(target)
        .ok_or_else(|| HandlerError::NoSuchNick(target.to_string()))?;
    if uid != ctx.uid {
        ctx.reply(Response::ERR_USERSDONTMATCH, &["Can't view modes for other users"]);
        return Ok(());
    }
    let modes = ctx.user().map(|u| u.mode_string()).unwrap_or_default();
    ctx.reply(Response::RPL_UMODEIS, &[&modes]);
    Ok(())
}

fn send_list(ctx: &mut Context<'_>, channel: &str, letter: char) {
    let Some(chan) = ctx.matrix.channel(channel) else {
        return;
    };
    let display = chan.name.clone();
    let entries: Vec<(String, String, String)> = chan
        .list(letter)
        .iter()
        .map(|e| (e.mask.clone(), e.set_by.clone(), e.set_at.to_string()))
        .collect();

    let (item, end, end_text) = match letter {
        'e' => (
            Response::RPL_EXCEPTLIST,
            Response::RPL_ENDOFEXCEPTLIST,
            "End of channel exception list",
        ),
        _ => (Response::RPL_BANLIST, Response::RPL_ENDOFBANLIST, "End of channel ban list"),
    };
    for (mask, by, at) in &entries {
        ctx.reply(item, &[&display, mask, by, at]);
    }
    ctx.reply(end, &[&display, end_text]);
}

/// One numeric per distinct rejection.
fn report(ctx: &mut Context<'_>, target: &str, outcome: &ModeOutcome) {
    let nick = ctx.nick();
    let server = ctx.server_name().to_string();
    let mut sent: Vec<String> = Vec::new();
    for rejection in &outcome.rejected {
        let change = &rejection.change;
        let Some(reply) =
            rejection
                .reason
                .to_irc_reply(&server, &nick, target, change.letter, change.param.as_deref())
        else {
            continue;
        };
        let line = reply.to_string();
        if !sent.contains(&line) {
            sent.push(line);
            ctx.send(reply);
        }
    }
}

/// Announce what changed, split to the advertised MODES limit.
pub fn broadcast(matrix: &mut Matrix, actor: &Actor, outcome: &ModeOutcome) {
    if outcome.applied.is_empty() {
        return;
    }
    let mask = matrix.actor_mask(actor);
    let max = matrix.config.limits.max_modes;
    for line in outcome.applied.lines(max) {
        match &outcome.target {
            ModeTargetRef::Channel(name) => {
                let mut params = vec![name.clone()];
                params.extend(line);
                let msg = Message::new("MODE", params).with_prefix(mask.clone());
                matrix.broadcast_channel(name, &msg, None);
            }
            ModeTargetRef::User(uid) => {
                let mut params = vec![matrix.nick_of(uid).to_string()];
                params.extend(line);
                let msg = Message::new("MODE", params).with_prefix(mask.clone());
                matrix.send_to(uid, msg);
            }
        }
    }
}
