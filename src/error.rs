//! Unified error handling for slircd-core.
//!
//! Command handlers, the mode engine, the hook registry, the extension store
//! and the module manager each have their own error enum. Errors that reach a
//! client are rendered with `to_irc_reply`; every enum has a static
//! `error_code` used for metric labels.

use slirc_proto::{Message, Response};
use thiserror::Error;

use crate::extensible::ExtensibleKind;
use crate::hooks::EventKind;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("no such nick: {0}")]
    NoSuchNick(String),

    #[error("not on channel: {0}")]
    NotOnChannel(String),

    #[error("cannot send to channel: {0}")]
    CannotSendToChan(String),

    #[error("permission denied")]
    NoPrivileges,

    #[error("password incorrect")]
    PasswordMismatch,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// An extension vetoed the command; it is responsible for any reply.
    #[error("vetoed by extension")]
    Vetoed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreParams => "need_more_params",
            Self::NoNicknameGiven => "no_nickname_given",
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::ErroneousNickname(_) => "erroneous_nickname",
            Self::NotRegistered => "not_registered",
            Self::AlreadyRegistered => "already_registered",
            Self::NoSuchChannel(_) => "no_such_channel",
            Self::NoSuchNick(_) => "no_such_nick",
            Self::NotOnChannel(_) => "not_on_channel",
            Self::CannotSendToChan(_) => "cannot_send_to_chan",
            Self::NoPrivileges => "no_privileges",
            Self::PasswordMismatch => "password_mismatch",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Vetoed => "vetoed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Convert to an IRC error reply message.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, cmd_name: &str) -> Option<Message> {
        let (response, args): (Response, Vec<&str>) = match self {
            Self::NeedMoreParams => (
                Response::ERR_NEEDMOREPARAMS,
                vec![nick, cmd_name, "Not enough parameters"],
            ),
            Self::NoNicknameGiven => (Response::ERR_NONICKNAMEGIVEN, vec![nick, "No nickname given"]),
            Self::NicknameInUse(bad) => (
                Response::ERR_NICKNAMEINUSE,
                vec![nick, bad, "Nickname is already in use"],
            ),
            Self::ErroneousNickname(bad) => (
                Response::ERR_ERRONEUSNICKNAME,
                vec![nick, bad, "Erroneous nickname"],
            ),
            Self::NotRegistered => (Response::ERR_NOTREGISTERED, vec![nick, "You have not registered"]),
            Self::AlreadyRegistered => (
                Response::ERR_ALREADYREGISTRED,
                vec![nick, "You may not reregister"],
            ),
            Self::NoSuchChannel(chan) => (Response::ERR_NOSUCHCHANNEL, vec![nick, chan, "No such channel"]),
            Self::NoSuchNick(target) => (
                Response::ERR_NOSUCHNICK,
                vec![nick, target, "No such nick/channel"],
            ),
            Self::NotOnChannel(chan) => (
                Response::ERR_NOTONCHANNEL,
                vec![nick, chan, "You're not on that channel"],
            ),
            Self::CannotSendToChan(chan) => (
                Response::ERR_CANNOTSENDTOCHAN,
                vec![nick, chan, "Cannot send to channel"],
            ),
            Self::NoPrivileges => (
                Response::ERR_NOPRIVILEGES,
                vec![nick, "Permission Denied- You're not an IRC operator"],
            ),
            Self::PasswordMismatch => (Response::ERR_PASSWDMISMATCH, vec![nick, "Password incorrect"]),
            Self::UnknownCommand(cmd) => (Response::ERR_UNKNOWNCOMMAND, vec![nick, cmd, "Unknown command"]),

            Self::Vetoed | Self::Internal(_) => return None,
        };

        Some(Message::numeric(server_name, response, &args))
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Mode Errors (mode change engine)
// ============================================================================

/// Batch-level mode failures. Nothing was applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    /// The letter string could not be tokenized against its parameters.
    #[error("malformed mode request: {0}")]
    MalformedRequest(String),

    /// A `PreMode` hook vetoed the whole batch.
    #[error("mode change rejected by extension")]
    Rejected,

    /// The target channel or nick does not exist.
    #[error("no such target: {0}")]
    NoSuchTarget(String),
}

impl ModeError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::Rejected => "rejected",
            Self::NoSuchTarget(_) => "no_such_target",
        }
    }
}

/// Why one item of a mode batch was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("unknown mode character")]
    UnknownMode,

    #[error("too many modes in one request")]
    TooManyModes,

    #[error("channel rank {required} required")]
    NoPrivileges { required: u32 },

    /// A `RawMode` hook returned DENY.
    #[error("denied by extension")]
    Denied,

    #[error("oper-only mode")]
    OperOnly,

    #[error("cannot change mode for other users")]
    CannotChangeOther,

    #[error("no such nick: {0}")]
    NoSuchNick(String),

    #[error("{0} is not on that channel")]
    NotOnChannel(String),

    #[error("list is full ({limit} entries)")]
    ListFull { limit: usize },

    #[error("entry already present")]
    Duplicate,

    #[error("no matching entry")]
    NotFound,

    #[error("mode already in that state")]
    Unchanged,

    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}

impl RejectReason {
    /// Get a static reason string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownMode => "unknown_mode",
            Self::TooManyModes => "too_many_modes",
            Self::NoPrivileges { .. } => "no_privileges",
            Self::Denied => "denied",
            Self::OperOnly => "oper_only",
            Self::CannotChangeOther => "cannot_change_other",
            Self::NoSuchNick(_) => "no_such_nick",
            Self::NotOnChannel(_) => "not_on_channel",
            Self::ListFull { .. } => "list_full",
            Self::Duplicate => "duplicate",
            Self::NotFound => "not_found",
            Self::Unchanged => "unchanged",
            Self::InvalidParam(_) => "invalid_param",
        }
    }

    /// Render the diagnostic for one dropped item.
    ///
    /// Silent drops (duplicates, no-ops, extension denials) return `None`.
    pub fn to_irc_reply(
        &self,
        server_name: &str,
        nick: &str,
        target: &str,
        letter: char,
        param: Option<&str>,
    ) -> Option<Message> {
        let letter_str = letter.to_string();
        let msg = match self {
            Self::UnknownMode if target.starts_with(['#', '&']) => Message::numeric(
                server_name,
                Response::ERR_UNKNOWNMODE,
                &[nick, &letter_str, "is unknown mode char to me"],
            ),
            Self::UnknownMode => Message::numeric(
                server_name,
                Response::ERR_UMODEUNKNOWNFLAG,
                &[nick, "Unknown MODE flag"],
            ),
            Self::NoPrivileges { .. } => Message::numeric(
                server_name,
                Response::ERR_CHANOPRIVSNEEDED,
                &[nick, target, "You're not channel operator"],
            ),
            Self::OperOnly => Message::numeric(
                server_name,
                Response::ERR_NOPRIVILEGES,
                &[nick, "Permission Denied- You're not an IRC operator"],
            ),
            Self::CannotChangeOther => Message::numeric(
                server_name,
                Response::ERR_USERSDONTMATCH,
                &[nick, "Can't change mode for other users"],
            ),
            Self::NoSuchNick(who) => Message::numeric(
                server_name,
                Response::ERR_NOSUCHNICK,
                &[nick, who, "No such nick/channel"],
            ),
            Self::NotOnChannel(who) => Message::numeric(
                server_name,
                Response::ERR_USERNOTINCHANNEL,
                &[nick, who, target, "They aren't on that channel"],
            ),
            Self::ListFull { .. } => Message::numeric(
                server_name,
                Response::ERR_BANLISTFULL,
                &[nick, target, param.unwrap_or("*"), "Channel list is full"],
            ),
            Self::InvalidParam(why) => Message::numeric(
                server_name,
                Response::ERR_INVALIDMODEPARAM,
                &[nick, target, &letter_str, param.unwrap_or("*"), why],
            ),
            Self::TooManyModes
            | Self::Denied
            | Self::Duplicate
            | Self::NotFound
            | Self::Unchanged => return None,
        };
        Some(msg)
    }
}

// ============================================================================
// Extension store, hook and module errors
// ============================================================================

/// Extension store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtError {
    /// The descriptor's owning extension has been unloaded.
    #[error("unknown extension descriptor: {0}")]
    UnknownDescriptor(String),

    #[error("extension item {name} already registered for {kind}")]
    DuplicateDescriptor { kind: ExtensibleKind, name: String },

    #[error("extension item {name} is for {expected}, not {found}")]
    WrongTarget {
        name: String,
        expected: ExtensibleKind,
        found: ExtensibleKind,
    },

    #[error("extension item {0} holds a value of another type")]
    TypeMismatch(String),
}

/// Hook ordering failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("hook ordering conflict for {event}: cycle among {modules:?}")]
    OrderingConflict {
        event: EventKind,
        modules: Vec<String>,
    },
}

/// Module load/unload failures.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module {0} is already loaded")]
    AlreadyLoaded(String),

    #[error("module {0} is not loaded")]
    NotLoaded(String),

    #[error("no such module: {0}")]
    UnknownModule(String),

    #[error("module {module} failed to initialise: {reason}")]
    Init { module: String, reason: String },

    #[error("mode {letter} already registered for {target}")]
    DuplicateMode { letter: char, target: &'static str },

    #[error("prefix symbol {0} already in use")]
    DuplicatePrefix(char),

    #[error("extban {0} already registered")]
    DuplicateExtban(char),

    #[error("command {0} already registered")]
    DuplicateCommand(String),

    #[error(transparent)]
    Ext(#[from] ExtError),
}

impl ModuleError {
    /// Convert to an IRC reply for LOADMODULE / UNLOADMODULE.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, module: &str, loading: bool) -> Message {
        let response = if loading {
            Response::ERR_CANTLOADMODULE
        } else {
            Response::ERR_CANTUNLOADMODULE
        };
        let reason = self.to_string();
        Message::numeric(server_name, response, &[nick, module, &reason])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_replies_carry_nick_and_command() {
        let reply = HandlerError::NeedMoreParams
            .to_irc_reply("irc.test", "alice", "MODE")
            .unwrap();
        assert_eq!(reply.to_string(), ":irc.test 461 alice MODE :Not enough parameters");
        assert!(HandlerError::Vetoed.to_irc_reply("irc.test", "alice", "X").is_none());
    }

    #[test]
    fn reject_reason_numerics() {
        let reply = RejectReason::NoPrivileges { required: 30000 }
            .to_irc_reply("irc.test", "alice", "#rust", 'o', Some("bob"))
            .unwrap();
        assert_eq!(reply.command, "482");

        let reply = RejectReason::UnknownMode
            .to_irc_reply("irc.test", "alice", "#rust", 'Z', None)
            .unwrap();
        assert_eq!(reply.to_string(), ":irc.test 472 alice Z :is unknown mode char to me");

        let reply = RejectReason::ListFull { limit: 2 }
            .to_irc_reply("irc.test", "alice", "#rust", 'b', Some("*!*@x"))
            .unwrap();
        assert_eq!(reply.command, "478");

        assert!(RejectReason::Duplicate
            .to_irc_reply("irc.test", "alice", "#rust", 'b', None)
            .is_none());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ModeError::Rejected.error_code(), "rejected");
        assert_eq!(RejectReason::Unchanged.error_code(), "unchanged");
        assert_eq!(HandlerError::NoPrivileges.error_code(), "no_privileges");
    }
}
