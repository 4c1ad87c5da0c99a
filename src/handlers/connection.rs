//! Registration and connection commands: NICK, USER, PING, PONG, QUIT.

use slirc_proto::{Message, Response};
use tracing::info;

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::modules::ConnectEvent;
use crate::state::Matrix;

const MAX_NICK_LEN: usize = 30;
const MAX_IDENT_LEN: usize = 10;

/// RFC 2812 nickname: letter or special first, then letters, digits,
/// specials or `-`.
pub fn is_valid_nick(nick: &str) -> bool {
    let is_special = |c: char| matches!(c, '[' | ']' | '\\' | '`' | '_' | '^' | '{' | '|' | '}');
    let mut chars = nick.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || is_special(first) => {}
        _ => return false,
    }
    nick.len() <= MAX_NICK_LEN && chars.all(|c| c.is_ascii_alphanumeric() || is_special(c) || c == '-')
}

pub struct NickHandler;

impl Handler for NickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = msg.arg(0).filter(|n| !n.is_empty()).ok_or(HandlerError::NoNicknameGiven)?;
        if !is_valid_nick(nick) {
            return Err(HandlerError::ErroneousNickname(nick.to_string()));
        }

        let (registered, old_mask) = match ctx.user() {
            Some(u) => (u.registered, u.hostmask()),
            None => return Err(HandlerError::Internal("no such user".into())),
        };
        let old = ctx.matrix.set_nick(ctx.uid, nick)?;

        if registered {
            if old.as_deref() != Some(nick) {
                let change = Message::new("NICK", vec![nick.to_string()]).with_prefix(old_mask);
                ctx.matrix.broadcast_peers(ctx.uid, &change, true);
            }
        } else {
            try_register(ctx.matrix, ctx.uid);
        }
        Ok(())
    }
}

pub struct UserHandler;

impl Handler for UserHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let ident = msg.arg(0).filter(|i| !i.is_empty()).ok_or(HandlerError::NeedMoreParams)?;
        let realname = msg.arg(3).unwrap_or_default();

        let user = ctx
            .matrix
            .users
            .get_mut(ctx.uid)
            .ok_or_else(|| HandlerError::Internal("no such user".into()))?;
        user.ident = ident.chars().take(MAX_IDENT_LEN).collect();
        user.realname = realname.to_string();

        try_register(ctx.matrix, ctx.uid);
        Ok(())
    }
}

/// Complete registration once both NICK and USER arrived.
fn try_register(matrix: &mut Matrix, uid: &str) {
    let ready = matrix
        .users
        .get(uid)
        .is_some_and(|u| !u.registered && !u.nick.is_empty() && !u.ident.is_empty());
    if !ready {
        return;
    }
    if let Some(user) = matrix.users.get_mut(uid) {
        user.registered = true;
        info!(uid = %uid, mask = %user.hostmask(), "Client registered");
    }
    send_welcome(matrix, uid);
    matrix.fire_user_connect(&ConnectEvent { uid: uid.to_string() });
}

/// RPL_WELCOME through RPL_ISUPPORT.
fn send_welcome(matrix: &mut Matrix, uid: &str) {
    let mask = matrix.users.get(uid).map(|u| u.hostmask()).unwrap_or_default();
    let server = matrix.server.name.clone();
    let network = matrix.server.network.clone();
    let version = concat!("slircd-core-", env!("CARGO_PKG_VERSION"));
    let created = chrono::DateTime::from_timestamp(matrix.server.created, 0)
        .map(|t| t.to_rfc2822())
        .unwrap_or_default();
    let (umodes, cmodes) = matrix.modes.letters();

    let welcome = format!("Welcome to the {network} Internet Relay Chat Network {mask}");
    matrix.reply(uid, Response::RPL_WELCOME, &[&welcome]);
    let yourhost = format!("Your host is {server}, running version {version}");
    matrix.reply(uid, Response::RPL_YOURHOST, &[&yourhost]);
    let created = format!("This server was created {created}");
    matrix.reply(uid, Response::RPL_CREATED, &[&created]);
    matrix.reply(uid, Response::RPL_MYINFO, &[&server, version, &umodes, &cmodes]);

    let mut tokens = vec![
        format!("PREFIX={}", matrix.modes.isupport_prefix()),
        format!("CHANMODES={}", matrix.modes.isupport_chanmodes()),
        format!("MODES={}", matrix.config.limits.max_modes),
        format!("MAXLIST=b:{}", matrix.config.limits.list_cap('b')),
        format!("NETWORK={network}"),
        "CASEMAPPING=rfc1459".to_string(),
        "CHANTYPES=#&".to_string(),
    ];
    let extbans = matrix.extbans.letters();
    if !extbans.is_empty() {
        tokens.push(format!("EXTBAN=$,{extbans}"));
    }
    let mut args: Vec<&str> = tokens.iter().map(String::as_str).collect();
    args.push("are supported by this server");
    matrix.reply(uid, Response::RPL_ISUPPORT, &args);
}

pub struct PingHandler;

impl Handler for PingHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let token = msg.arg(0).unwrap_or_default();
        let server = ctx.server_name().to_string();
        let pong = Message::new("PONG", vec![server.clone(), token.to_string()]).with_prefix(server);
        ctx.send(pong);
        Ok(())
    }
}

pub struct PongHandler;

impl Handler for PongHandler {
    fn handle(&self, _ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        Ok(())
    }
}

pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let reason = match msg.arg(0) {
            Some(text) if !text.is_empty() => format!("Quit: {text}"),
            _ => "Client Quit".to_string(),
        };
        ctx.matrix.request_disconnect(ctx.uid, reason);
        Ok(())
    }
}
