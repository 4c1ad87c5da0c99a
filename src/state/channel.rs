//! Channels and memberships.

use std::collections::{BTreeMap, BTreeSet};

use super::Uid;
use crate::extensible::{Extensible, ExtensibleKind};

/// One entry of a list mode (`+b`, `+e`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub mask: String,
    pub set_by: String,
    pub set_at: i64,
}

/// A user's presence in a channel.
#[derive(Debug)]
pub struct Membership {
    /// Prefix mode letters held (`o`, `h`, `v`, ...).
    pub prefixes: BTreeSet<char>,
    pub joined_at: i64,
    pub ext: Extensible,
}

impl Membership {
    pub fn new() -> Self {
        Self {
            prefixes: BTreeSet::new(),
            joined_at: chrono::Utc::now().timestamp(),
            ext: Extensible::new(ExtensibleKind::Membership),
        }
    }
}

impl Default for Membership {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Channel {
    /// Display name as first created.
    pub name: String,
    pub created: i64,
    /// Set simple and parameter modes; `None` for modes without a value.
    pub modes: BTreeMap<char, Option<String>>,
    pub lists: BTreeMap<char, Vec<ListEntry>>,
    pub members: BTreeMap<Uid, Membership>,
    pub ext: Extensible,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: chrono::Utc::now().timestamp(),
            modes: BTreeMap::new(),
            lists: BTreeMap::new(),
            members: BTreeMap::new(),
            ext: Extensible::new(ExtensibleKind::Channel),
        }
    }

    /// Entries of list mode `letter`; empty if none were ever set.
    pub fn list(&self, letter: char) -> &[ListEntry] {
        self.lists.get(&letter).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_mode(&self, letter: char) -> bool {
        self.modes.contains_key(&letter)
    }

    pub fn mode_param(&self, letter: char) -> Option<&str> {
        self.modes.get(&letter).and_then(|p| p.as_deref())
    }

    pub fn is_member(&self, uid: &str) -> bool {
        self.members.contains_key(uid)
    }

    /// Mode string and its parameters for RPL_CHANNELMODEIS.
    ///
    /// Parameter values (the key in particular) are only shown when
    /// `with_params` is set.
    pub fn mode_string(&self, with_params: bool) -> (String, Vec<String>) {
        let mut letters = String::from("+");
        let mut params = Vec::new();
        for (letter, param) in &self.modes {
            letters.push(*letter);
            if let (true, Some(p)) = (with_params, param) {
                params.push(p.clone());
            }
        }
        (letters, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_string_hides_params_on_request() {
        let mut chan = Channel::new("#rust");
        chan.modes.insert('n', None);
        chan.modes.insert('k', Some("secret".into()));
        chan.modes.insert('l', Some("10".into()));
        assert_eq!(chan.mode_string(true), ("+kln".to_string(), vec!["secret".to_string(), "10".to_string()]));
        assert_eq!(chan.mode_string(false).1.len(), 0);
        assert_eq!(chan.mode_param('l'), Some("10"));
        assert!(chan.list('b').is_empty());
    }
}
