//! Ban masks and extended bans.
//!
//! A list-mode entry is either a hostmask (`nick!ident@host` glob) or an
//! extban of the form `$<letter>[:<value>]`, whose matching is delegated to
//! the [`ExtbanMatcher`] an extension registered for `<letter>`.

use std::collections::BTreeMap;
use std::sync::Arc;

use slirc_proto::wildcard_match;

use crate::error::{ModuleError, RejectReason};
use crate::hooks::ModResult;
use crate::modules::CheckBanEvent;
use crate::state::{Matrix, User};

/// Matching logic for one extban letter.
pub trait ExtbanMatcher: Send + Sync {
    /// Check and normalize the value part of `$x:value`.
    fn validate(&self, value: Option<&str>) -> Result<Option<String>, String> {
        Ok(value.map(str::to_string))
    }

    fn matches(&self, matrix: &Matrix, user: &User, value: Option<&str>) -> bool;
}

struct Entry {
    owner: String,
    matcher: Arc<dyn ExtbanMatcher>,
}

#[derive(Default)]
pub struct ExtbanRegistry {
    entries: BTreeMap<char, Entry>,
}

impl ExtbanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        owner: &str,
        letter: char,
        matcher: Arc<dyn ExtbanMatcher>,
    ) -> Result<(), ModuleError> {
        if self.entries.contains_key(&letter) {
            return Err(ModuleError::DuplicateExtban(letter));
        }
        self.entries.insert(
            letter,
            Entry {
                owner: owner.to_string(),
                matcher,
            },
        );
        Ok(())
    }

    pub fn unregister_owner(&mut self, owner: &str) -> Vec<char> {
        let letters: Vec<char> = self
            .entries
            .iter()
            .filter(|(_, e)| e.owner == owner)
            .map(|(l, _)| *l)
            .collect();
        for l in &letters {
            self.entries.remove(l);
        }
        letters
    }

    pub fn get(&self, letter: char) -> Option<Arc<dyn ExtbanMatcher>> {
        self.entries.get(&letter).map(|e| Arc::clone(&e.matcher))
    }

    /// Registered letters, for ISUPPORT `EXTBAN=$,ab`.
    pub fn letters(&self) -> String {
        self.entries.keys().collect()
    }
}

/// Split `$a:value` into `('a', Some("value"))`.
pub fn parse_extban(pattern: &str) -> Option<(char, Option<&str>)> {
    let rest = pattern.strip_prefix('$')?;
    let mut chars = rest.chars();
    let letter = chars.next().filter(|c| c.is_ascii_alphabetic())?;
    let tail = chars.as_str();
    if tail.is_empty() {
        Some((letter, None))
    } else {
        tail.strip_prefix(':').map(|v| (letter, Some(v)))
    }
}

/// Expand a partial hostmask to `nick!ident@host` form.
///
/// `bob` → `bob!*@*`, `user@host` → `*!user@host`, `bob!user` → `bob!user@*`.
pub fn canonicalize_mask(mask: &str) -> String {
    let or_star = |s: &str| if s.is_empty() { "*".to_string() } else { s.to_string() };

    let (nick, rest) = match mask.split_once('!') {
        Some((n, r)) => (n, Some(r)),
        None => (mask, None),
    };
    let (nick, ident, host) = match rest {
        Some(r) => match r.split_once('@') {
            Some((u, h)) => (nick, u, h),
            None => (nick, r, ""),
        },
        None => match nick.split_once('@') {
            Some((u, h)) => ("", u, h),
            None => (nick, "", ""),
        },
    };
    format!("{}!{}@{}", or_star(nick), or_star(ident), or_star(host))
}

impl Matrix {
    /// Does `pattern` (hostmask or extban) match `user`?
    ///
    /// Extbans whose letter is not registered never match.
    pub fn mask_matches(&self, user: &User, pattern: &str) -> bool {
        match parse_extban(pattern) {
            Some((letter, value)) => self
                .extbans
                .get(letter)
                .is_some_and(|m| m.matches(self, user, value)),
            None => wildcard_match(pattern, &user.hostmask()),
        }
    }

    /// Validate and normalize a list-mode pattern before it is stored.
    pub fn normalize_list_pattern(&self, pattern: &str) -> Result<String, RejectReason> {
        if pattern.is_empty() || pattern.contains(' ') {
            return Err(RejectReason::InvalidParam("empty or malformed mask".into()));
        }
        if pattern.starts_with('$') {
            let (letter, value) = parse_extban(pattern)
                .ok_or_else(|| RejectReason::InvalidParam("malformed extban".into()))?;
            let matcher = self
                .extbans
                .get(letter)
                .ok_or_else(|| RejectReason::InvalidParam(format!("unknown extban type {letter}")))?;
            let value = matcher.validate(value).map_err(RejectReason::InvalidParam)?;
            return Ok(match value {
                Some(v) => format!("${letter}:{v}"),
                None => format!("${letter}"),
            });
        }
        Ok(canonicalize_mask(pattern))
    }

    /// Does any entry of list `letter` on `channel` match `uid`?
    pub fn list_matches(&self, channel: &str, letter: char, uid: &str) -> bool {
        let (Some(chan), Some(user)) = (self.channel(channel), self.users.get(uid)) else {
            return false;
        };
        chan.list(letter)
            .iter()
            .any(|entry| self.mask_matches(user, &entry.mask))
    }

    /// Is `uid` banned from `channel`?
    ///
    /// `CheckBan` hooks decide first: ALLOW means not banned, DENY banned.
    pub fn is_banned(&mut self, channel: &str, uid: &str) -> bool {
        let event = CheckBanEvent {
            channel: channel.to_string(),
            uid: uid.to_string(),
        };
        match self.fire_check_ban(&event) {
            ModResult::Allow => false,
            ModResult::Deny => true,
            ModResult::PassThru => self.list_matches(channel, 'b', uid),
        }
    }
}
