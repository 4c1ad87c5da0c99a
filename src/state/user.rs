//! Connected users.

use std::collections::BTreeSet;

use slirc_proto::Message;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::Uid;
use crate::extensible::{Extensible, ExtensibleKind};

/// A local client.
#[derive(Debug)]
pub struct User {
    pub uid: Uid,
    /// Empty until NICK.
    pub nick: String,
    pub ident: String,
    pub host: String,
    pub realname: String,
    pub registered: bool,
    pub modes: BTreeSet<char>,
    /// Channels joined (casefolded keys).
    pub channels: BTreeSet<String>,
    /// Unix timestamp of connection.
    pub signon: i64,
    pub ext: Extensible,
    sender: Option<mpsc::Sender<Message>>,
}

impl User {
    pub fn new(uid: Uid, host: impl Into<String>, sender: Option<mpsc::Sender<Message>>) -> Self {
        Self {
            uid,
            nick: String::new(),
            ident: String::new(),
            host: host.into(),
            realname: String::new(),
            registered: false,
            modes: BTreeSet::new(),
            channels: BTreeSet::new(),
            signon: chrono::Utc::now().timestamp(),
            ext: Extensible::new(ExtensibleKind::User),
            sender,
        }
    }

    /// Nick for numerics, `*` before one is set.
    pub fn nick_or_star(&self) -> &str {
        if self.nick.is_empty() { "*" } else { &self.nick }
    }

    /// `nick!ident@host`.
    pub fn hostmask(&self) -> String {
        let ident = if self.ident.is_empty() { "*" } else { &self.ident };
        format!("{}!{}@{}", self.nick_or_star(), ident, self.host)
    }

    #[inline]
    pub fn is_oper(&self) -> bool {
        self.modes.contains(&'o')
    }

    pub fn mode_string(&self) -> String {
        let mut s = String::from("+");
        s.extend(self.modes.iter());
        s
    }

    /// Queue `msg` without blocking. Users without a connection accept and
    /// drop everything.
    pub fn try_send(&self, msg: Message) -> Result<(), TrySendError<Message>> {
        match &self.sender {
            Some(tx) => tx.try_send(msg),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostmask_and_modes() {
        let mut user = User::new("001AAAAAA".into(), "host.example", None);
        assert_eq!(user.hostmask(), "*!*@host.example");
        user.nick = "alice".into();
        user.ident = "al".into();
        user.modes.extend(['w', 'i']);
        assert_eq!(user.hostmask(), "alice!al@host.example");
        assert_eq!(user.mode_string(), "+iw");
        assert!(!user.is_oper());
    }

    #[test]
    fn full_queue_reports_error() {
        let (tx, _rx) = mpsc::channel(1);
        let user = User::new("001AAAAAA".into(), "h", Some(tx));
        assert!(user.try_send(Message::new("PING", vec!["a".into()])).is_ok());
        assert!(matches!(
            user.try_send(Message::new("PING", vec!["b".into()])),
            Err(TrySendError::Full(_))
        ));
    }
}
