//! Channel membership commands: JOIN, PART.

use slirc_proto::{Message, Response, is_channel_name};
use tracing::debug;

use super::{Context, Handler};
use crate::error::HandlerResult;
use crate::hooks::ModResult;
use crate::modules::JoinEvent;
use crate::state::{Actor, Matrix};

const MAX_CHANNEL_LEN: usize = 50;

fn valid_channel_name(name: &str) -> bool {
    is_channel_name(name)
        && name.len() <= MAX_CHANNEL_LEN
        && !name.contains([' ', ',', '\x07', ':'])
}

/// Why the built-in checks refuse a join.
fn join_refusal(matrix: &mut Matrix, uid: &str, channel: &str, key: Option<&str>) -> Option<(Response, &'static str)> {
    let chan = matrix.channel(channel)?;
    if let Some(expected) = chan.mode_param('k')
        && key != Some(expected)
    {
        return Some((Response::ERR_BADCHANNELKEY, "Cannot join channel (+k)"));
    }
    if let Some(limit) = chan.mode_param('l').and_then(|l| l.parse::<usize>().ok())
        && chan.members.len() >= limit
    {
        return Some((Response::ERR_CHANNELISFULL, "Cannot join channel (+l)"));
    }
    if chan.has_mode('i') {
        return Some((Response::ERR_INVITEONLYCHAN, "Cannot join channel (+i)"));
    }
    if matrix.is_banned(channel, uid) {
        return Some((Response::ERR_BANNEDFROMCHAN, "Cannot join channel (+b)"));
    }
    None
}

/// RPL_NAMREPLY / RPL_ENDOFNAMES for one channel.
pub fn send_names(matrix: &mut Matrix, uid: &str, channel: &str) {
    let Some(chan) = matrix.channel(channel) else {
        return;
    };
    let display = chan.name.clone();
    let kind = if chan.has_mode('s') {
        "@"
    } else if chan.has_mode('p') {
        "*"
    } else {
        "="
    };
    let names: Vec<String> = chan
        .members
        .iter()
        .filter_map(|(member, m)| {
            let nick = &matrix.users.get(member)?.nick;
            let symbols = matrix.modes.symbols_for(&m.prefixes);
            Some(format!("{}{nick}", symbols.chars().next().map(String::from).unwrap_or_default()))
        })
        .collect();

    for chunk in names.chunks(20) {
        let list = chunk.join(" ");
        matrix.reply(uid, Response::RPL_NAMREPLY, &[kind, &display, &list]);
    }
    matrix.reply(uid, Response::RPL_ENDOFNAMES, &[&display, "End of /NAMES list"]);
}

pub struct JoinHandler;

impl JoinHandler {
    fn join_one(&self, ctx: &mut Context<'_>, name: &str, key: Option<&str>) {
        if !valid_channel_name(name) {
            ctx.reply(Response::ERR_NOSUCHCHANNEL, &[name, "No such channel"]);
            return;
        }
        if ctx.matrix.is_member(name, ctx.uid) {
            return;
        }

        let event = JoinEvent {
            uid: ctx.uid.to_string(),
            channel: name.to_string(),
            key: key.map(str::to_string),
            created: ctx.matrix.channel(name).is_none(),
        };
        match ctx.matrix.fire_user_pre_join(&event) {
            ModResult::Deny => {
                debug!(channel = %name, "Join vetoed by extension");
                return;
            }
            ModResult::Allow => {}
            ModResult::PassThru => {
                if let Some((response, text)) = join_refusal(ctx.matrix, ctx.uid, name, key) {
                    let display = ctx.matrix.channel(name).map(|c| c.name.clone()).unwrap_or_default();
                    ctx.reply(response, &[&display, text]);
                    return;
                }
            }
        }

        ctx.matrix.add_member(ctx.uid, name);
        let display = ctx
            .matrix
            .channel(name)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| name.to_string());
        let mask = ctx.matrix.actor_mask(&Actor::User(ctx.uid.to_string()));
        let join = Message::new("JOIN", vec![display.clone()]).with_prefix(mask);
        ctx.matrix.broadcast_channel(&display, &join, None);
        send_names(ctx.matrix, ctx.uid, &display);

        ctx.matrix.fire_user_join(&JoinEvent {
            channel: display,
            ..event
        });
    }
}

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let targets = msg.arg(0).unwrap_or_default();
        if targets == "0" {
            let joined: Vec<String> = ctx
                .user()
                .map(|u| u.channels.iter().cloned().collect())
                .unwrap_or_default();
            for chan in joined {
                ctx.matrix.part_user(ctx.uid, &chan, None);
            }
            return Ok(());
        }

        let mut keys = msg.arg(1).map(|k| k.split(',')).into_iter().flatten();
        for name in targets.split(',').filter(|n| !n.is_empty()) {
            let key = keys.next().filter(|k| !k.is_empty());
            self.join_one(ctx, name, key);
        }
        Ok(())
    }
}

pub struct PartHandler;

impl Handler for PartHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let reason = msg.arg(1);
        for name in msg.arg(0).unwrap_or_default().split(',').filter(|n| !n.is_empty()) {
            if ctx.matrix.channel(name).is_none() {
                ctx.reply(Response::ERR_NOSUCHCHANNEL, &[name, "No such channel"]);
                continue;
            }
            if !ctx.matrix.is_member(name, ctx.uid) {
                ctx.reply(Response::ERR_NOTONCHANNEL, &[name, "You're not on that channel"]);
                continue;
            }
            ctx.matrix.part_user(ctx.uid, name, reason);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names() {
        assert!(valid_channel_name("#rust"));
        assert!(valid_channel_name("&local"));
        assert!(!valid_channel_name("rust"));
        assert!(!valid_channel_name("#a,b"));
        assert!(!valid_channel_name("#"));
    }
}
