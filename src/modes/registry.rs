//! Letter → descriptor tables for user and channel modes.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::descriptor::{ModeClass, ModeDescriptor, ModeTarget, PrefixSpec};
use crate::error::ModuleError;

#[derive(Debug, Default)]
pub struct ModeRegistry {
    channel: BTreeMap<char, Arc<ModeDescriptor>>,
    user: BTreeMap<char, Arc<ModeDescriptor>>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, target: ModeTarget) -> &BTreeMap<char, Arc<ModeDescriptor>> {
        match target {
            ModeTarget::User => &self.user,
            ModeTarget::Channel => &self.channel,
        }
    }

    /// Register a descriptor. Letters are unique per target; prefix symbols
    /// are unique across all prefix modes.
    pub fn register(&mut self, desc: ModeDescriptor) -> Result<(), ModuleError> {
        if self.table(desc.target).contains_key(&desc.letter) {
            return Err(ModuleError::DuplicateMode {
                letter: desc.letter,
                target: desc.target.as_str(),
            });
        }
        if let ModeClass::Prefix(spec) = desc.class
            && self.prefixes().iter().any(|(_, other)| other.symbol == spec.symbol)
        {
            return Err(ModuleError::DuplicatePrefix(spec.symbol));
        }

        debug!(letter = %desc.letter, target = %desc.target, owner = %desc.owner, "Registered mode");
        let table = match desc.target {
            ModeTarget::User => &mut self.user,
            ModeTarget::Channel => &mut self.channel,
        };
        table.insert(desc.letter, Arc::new(desc));
        Ok(())
    }

    /// Remove every descriptor registered by `owner`.
    pub fn unregister_owner(&mut self, owner: &str) -> Vec<Arc<ModeDescriptor>> {
        let mut removed = Vec::new();
        for table in [&mut self.channel, &mut self.user] {
            let letters: Vec<char> = table
                .iter()
                .filter(|(_, d)| d.owner == owner)
                .map(|(l, _)| *l)
                .collect();
            for letter in letters {
                if let Some(desc) = table.remove(&letter) {
                    removed.push(desc);
                }
            }
        }
        removed
    }

    pub fn get(&self, target: ModeTarget, letter: char) -> Option<Arc<ModeDescriptor>> {
        self.table(target).get(&letter).cloned()
    }

    pub fn iter(&self, target: ModeTarget) -> impl Iterator<Item = &Arc<ModeDescriptor>> {
        self.table(target).values()
    }

    /// Prefix modes, highest rank first.
    pub fn prefixes(&self) -> Vec<(char, PrefixSpec)> {
        let mut out: Vec<(char, PrefixSpec)> = self
            .channel
            .values()
            .filter_map(|d| d.prefix_spec().map(|s| (d.letter, s)))
            .collect();
        out.sort_by(|a, b| b.1.rank.cmp(&a.1.rank));
        out
    }

    /// Rank conferred by a set of prefix letters (highest wins, 0 if none).
    pub fn rank_of<'a>(&self, letters: impl IntoIterator<Item = &'a char>) -> u32 {
        letters
            .into_iter()
            .filter_map(|l| self.channel.get(l).and_then(|d| d.prefix_spec()))
            .map(|s| s.rank)
            .max()
            .unwrap_or(0)
    }

    /// Status symbols for a set of prefix letters, highest rank first.
    pub fn symbols_for<'a>(&self, letters: impl IntoIterator<Item = &'a char>) -> String {
        let held: Vec<&char> = letters.into_iter().collect();
        self.prefixes()
            .into_iter()
            .filter(|(l, _)| held.contains(&l))
            .map(|(_, s)| s.symbol)
            .collect()
    }

    /// Letter of the highest prefix mode, given to channel creators.
    pub fn top_prefix(&self) -> Option<char> {
        self.prefixes().first().map(|(l, _)| *l)
    }

    /// ISUPPORT `PREFIX=(ohv)@%+`.
    pub fn isupport_prefix(&self) -> String {
        let prefixes = self.prefixes();
        let letters: String = prefixes.iter().map(|(l, _)| *l).collect();
        let symbols: String = prefixes.iter().map(|(_, s)| s.symbol).collect();
        format!("({letters}){symbols}")
    }

    /// ISUPPORT `CHANMODES=A,B,C,D`.
    pub fn isupport_chanmodes(&self) -> String {
        let mut groups: [String; 4] = Default::default();
        for desc in self.channel.values() {
            let idx = match desc.class {
                ModeClass::List => 0,
                ModeClass::Param { unset_takes_param: true } => 1,
                ModeClass::Param { unset_takes_param: false } => 2,
                ModeClass::Simple => 3,
                ModeClass::Prefix(_) => continue,
            };
            groups[idx].push(desc.letter);
        }
        groups.join(",")
    }

    /// Letters for RPL_MYINFO: (user modes, channel modes).
    pub fn letters(&self) -> (String, String) {
        (
            self.user.keys().collect(),
            self.channel.keys().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::descriptor::{HALFOP_RANK, OP_RANK, VOICE_RANK};

    fn registry() -> ModeRegistry {
        let mut r = ModeRegistry::new();
        r.register(ModeDescriptor::list('b')).unwrap();
        r.register(ModeDescriptor::param('k', true)).unwrap();
        r.register(ModeDescriptor::param('l', false)).unwrap();
        r.register(ModeDescriptor::simple('n', ModeTarget::Channel)).unwrap();
        r.register(ModeDescriptor::simple('t', ModeTarget::Channel)).unwrap();
        r.register(ModeDescriptor::prefix('o', PrefixSpec::new(OP_RANK, '@'))).unwrap();
        r.register(ModeDescriptor::prefix('v', PrefixSpec::new(VOICE_RANK, '+'))).unwrap();
        r.register(ModeDescriptor::prefix('h', PrefixSpec::new(HALFOP_RANK, '%'))).unwrap();
        r
    }

    #[test]
    fn isupport_strings() {
        let r = registry();
        assert_eq!(r.isupport_prefix(), "(ohv)@%+");
        assert_eq!(r.isupport_chanmodes(), "b,k,l,nt");
    }

    #[test]
    fn ranks_and_symbols() {
        let r = registry();
        assert_eq!(r.rank_of(&['v', 'h']), HALFOP_RANK);
        assert_eq!(r.rank_of(&[]), 0);
        assert_eq!(r.symbols_for(&['v', 'o']), "@+");
        assert_eq!(r.top_prefix(), Some('o'));
    }

    #[test]
    fn duplicates_rejected() {
        let mut r = registry();
        assert!(matches!(
            r.register(ModeDescriptor::simple('n', ModeTarget::Channel)),
            Err(ModuleError::DuplicateMode { letter: 'n', .. })
        ));
        // Same letter on the other target is fine.
        r.register(ModeDescriptor::simple('n', ModeTarget::User)).unwrap();
        assert!(matches!(
            r.register(ModeDescriptor::prefix('y', PrefixSpec::new(5, '@'))),
            Err(ModuleError::DuplicatePrefix('@'))
        ));
    }

    #[test]
    fn unregister_by_owner() {
        let mut r = registry();
        let mut e = ModeDescriptor::list('e');
        e.owner = "ban_exception".into();
        r.register(e).unwrap();
        let removed = r.unregister_owner("ban_exception");
        assert_eq!(removed.len(), 1);
        assert!(r.get(ModeTarget::Channel, 'e').is_none());
        assert!(r.get(ModeTarget::Channel, 'b').is_some());
    }
}
