//! Mode change engine: parse → validate → apply.
//!
//! A request is tokenized as a whole (a malformed request changes nothing),
//! then every item is validated in order against a staged copy of the
//! target's state so caps and duplicates hold across the batch. Items that
//! fail are reported individually; the survivors pass through the `PreMode`
//! veto and are applied in their original order. The applied subsequence is
//! returned as a [`ChangeRecord`] and announced through the `Mode` event.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use slirc_proto::{irc_eq, is_channel_name};
use tracing::debug;

use super::change::{ChangeRecord, ModeChange};
use super::descriptor::{ModeClass, ModeDescriptor, ModeTarget};
use super::parse::{ParsedItem, parse_request};
use crate::error::{ModeError, RejectReason};
use crate::hooks::ModResult;
use crate::metrics;
use crate::modules::{ModeEvent, PreModeEvent, RawModeEvent};
use crate::state::{Actor, ListEntry, Matrix, Uid};

/// What a mode request is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeTargetRef {
    /// Channel display name.
    Channel(String),
    User(Uid),
}

impl ModeTargetRef {
    pub fn kind(&self) -> ModeTarget {
        match self {
            Self::Channel(_) => ModeTarget::Channel,
            Self::User(_) => ModeTarget::User,
        }
    }
}

/// One dropped item and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub change: ModeChange,
    pub reason: RejectReason,
}

/// Result of a request that was not rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeOutcome {
    pub target: ModeTargetRef,
    pub applied: ChangeRecord,
    pub rejected: Vec<Rejection>,
}

impl ModeOutcome {
    /// Reason the item with `letter` was rejected, if it was.
    pub fn rejection_for(&self, letter: char) -> Option<&RejectReason> {
        self.rejected
            .iter()
            .find(|r| r.change.letter == letter)
            .map(|r| &r.reason)
    }
}

/// State as seen by later items of the same batch.
#[derive(Default)]
struct Staging {
    modes: Option<BTreeMap<char, Option<String>>>,
    lists: HashMap<char, Vec<String>>,
    prefixes: HashMap<Uid, BTreeSet<char>>,
}

impl Matrix {
    /// Process one MODE request from `actor` against `target`.
    pub fn process_mode(
        &mut self,
        actor: &Actor,
        target: &str,
        modestr: &str,
        params: &[String],
    ) -> Result<ModeOutcome, ModeError> {
        let target_ref = self.resolve_mode_target(target)?;
        let kind = target_ref.kind();
        let items = parse_request(modestr, params, |letter| self.modes.get(kind, letter))?;

        let max_modes = self.config.limits.max_modes;
        let mut rejected = Vec::new();
        let mut accepted = Vec::new();
        let mut staging = Staging::default();
        let mut counted = 0usize;

        for ParsedItem { change, desc } in items {
            let Some(desc) = desc else {
                rejected.push(Rejection {
                    change,
                    reason: RejectReason::UnknownMode,
                });
                continue;
            };
            counted += 1;
            if counted > max_modes {
                rejected.push(Rejection {
                    change,
                    reason: RejectReason::TooManyModes,
                });
                continue;
            }

            let result = match &target_ref {
                ModeTargetRef::Channel(name) => {
                    self.validate_channel_item(actor, name, &desc, change.clone(), &mut staging)
                }
                ModeTargetRef::User(uid) => {
                    self.validate_user_item(actor, uid, &desc, change.clone(), &mut staging)
                }
            };
            match result {
                Ok(valid) => accepted.push(valid),
                Err(reason) => rejected.push(Rejection { change, reason }),
            }
        }

        if !accepted.is_empty() {
            let mut event = PreModeEvent {
                actor: actor.clone(),
                target: target_ref.clone(),
                changes: accepted,
            };
            if self.fire_pre_mode(&mut event) == ModResult::Deny {
                debug!(target = %target, "Mode batch vetoed");
                return Err(ModeError::Rejected);
            }
            accepted = event.changes;
        }

        let applied = self.apply_changes(actor, &target_ref, accepted, &mut rejected);

        for r in &rejected {
            metrics::record_mode_rejection(r.reason.error_code());
        }
        if !applied.is_empty() {
            for change in &applied {
                metrics::record_mode_change(change.letter);
            }
            debug!(target = %target, changes = %applied, "Modes applied");
            self.fire_mode(&ModeEvent {
                actor: actor.clone(),
                target: target_ref.clone(),
                changes: applied.clone(),
            });
        }

        Ok(ModeOutcome {
            target: target_ref,
            applied,
            rejected,
        })
    }

    fn resolve_mode_target(&self, target: &str) -> Result<ModeTargetRef, ModeError> {
        if is_channel_name(target) {
            self.channel(target)
                .map(|c| ModeTargetRef::Channel(c.name.clone()))
                .ok_or_else(|| ModeError::NoSuchTarget(target.to_string()))
        } else {
            self.find_uid(target)
                .map(ModeTargetRef::User)
                .ok_or_else(|| ModeError::NoSuchTarget(target.to_string()))
        }
    }

    /// Effective channel rank of `uid`, honouring earlier items of the batch.
    fn staged_rank(&self, staging: &Staging, channel: &str, uid: &str) -> u32 {
        match staging.prefixes.get(uid) {
            Some(held) => self.modes.rank_of(held),
            None => self.member_rank(channel, uid),
        }
    }

    fn staged_list_contains(&self, staging: &Staging, channel: &str, letter: char, mask: &str) -> bool {
        match staging.lists.get(&letter) {
            Some(list) => list.iter().any(|m| irc_eq(m, mask)),
            None => self
                .channel(channel)
                .is_some_and(|chan| chan.list(letter).iter().any(|e| irc_eq(&e.mask, mask))),
        }
    }

    fn validate_channel_item(
        &mut self,
        actor: &Actor,
        channel: &str,
        desc: &ModeDescriptor,
        mut change: ModeChange,
        staging: &mut Staging,
    ) -> Result<ModeChange, RejectReason> {
        // Parameter normalization and prefix target lookup.
        let mut prefix_target: Option<Uid> = None;
        match desc.class {
            ModeClass::Simple => change.param = None,
            ModeClass::Param { .. } => {
                if let (true, Some(validator), Some(raw)) =
                    (change.adding, &desc.validator, change.param.as_deref())
                {
                    change.param = Some(validator(raw).map_err(RejectReason::InvalidParam)?);
                }
            }
            ModeClass::List => {
                let raw = change.param.as_deref().unwrap_or_default();
                let normalized = match &desc.validator {
                    Some(validator) => validator(raw).map_err(RejectReason::InvalidParam),
                    None => self.normalize_list_pattern(raw),
                };
                change.param = Some(if change.adding {
                    normalized?
                } else if self.staged_list_contains(staging, channel, change.letter, raw) {
                    // Entries whose extban owner is gone must stay removable.
                    raw.to_string()
                } else {
                    normalized.unwrap_or_else(|_| raw.to_string())
                });
            }
            ModeClass::Prefix(_) => {
                let nick = change.param.as_deref().unwrap_or_default();
                let uid = self
                    .find_uid(nick)
                    .ok_or_else(|| RejectReason::NoSuchNick(nick.to_string()))?;
                if !self.is_member(channel, &uid) {
                    return Err(RejectReason::NotOnChannel(nick.to_string()));
                }
                change.param = self.users.get(&uid).map(|u| u.nick.clone());
                prefix_target = Some(uid);
            }
        }

        // Privilege: extensions first, then static rank.
        if let Actor::User(actor_uid) = actor {
            let event = RawModeEvent {
                actor: actor.clone(),
                target: ModeTargetRef::Channel(channel.to_string()),
                change: change.clone(),
            };
            match self.fire_raw_mode(&event) {
                ModResult::Deny => return Err(RejectReason::Denied),
                ModResult::Allow => {}
                ModResult::PassThru => {
                    let actor_rank = self.staged_rank(staging, channel, actor_uid);
                    match (desc.class, &prefix_target) {
                        (ModeClass::Prefix(spec), Some(target_uid)) => {
                            let self_removal =
                                !change.adding && target_uid == actor_uid && spec.self_remove;
                            if !self_removal {
                                if actor_rank < spec.rank_to_set {
                                    return Err(RejectReason::NoPrivileges {
                                        required: spec.rank_to_set,
                                    });
                                }
                                if !change.adding && target_uid != actor_uid {
                                    let target_rank = self.staged_rank(staging, channel, target_uid);
                                    if actor_rank < target_rank {
                                        return Err(RejectReason::NoPrivileges {
                                            required: target_rank,
                                        });
                                    }
                                }
                            }
                        }
                        _ => {
                            if actor_rank < desc.rank_required {
                                return Err(RejectReason::NoPrivileges {
                                    required: desc.rank_required,
                                });
                            }
                        }
                    }
                }
            }
        }

        // State checks against the staged view.
        let chan = self
            .channel(channel)
            .ok_or_else(|| RejectReason::InvalidParam("channel vanished".into()))?;
        let letter = change.letter;
        match desc.class {
            ModeClass::Simple | ModeClass::Param { .. } => {
                let modes = staging.modes.get_or_insert_with(|| chan.modes.clone());
                if change.adding {
                    if modes.get(&letter) == Some(&change.param) {
                        return Err(RejectReason::Unchanged);
                    }
                    modes.insert(letter, change.param.clone());
                } else if modes.remove(&letter).is_none() {
                    return Err(RejectReason::Unchanged);
                }
            }
            ModeClass::List => {
                let cap = self.config.limits.list_cap(letter);
                let list = staging
                    .lists
                    .entry(letter)
                    .or_insert_with(|| chan.list(letter).iter().map(|e| e.mask.clone()).collect());
                let mask = change.param.clone().unwrap_or_default();
                let pos = list.iter().position(|m| irc_eq(m, &mask));
                if change.adding {
                    if pos.is_some() {
                        return Err(RejectReason::Duplicate);
                    }
                    if list.len() >= cap {
                        return Err(RejectReason::ListFull { limit: cap });
                    }
                    list.push(mask);
                } else {
                    match pos {
                        Some(i) => change.param = Some(list.remove(i)),
                        None => return Err(RejectReason::NotFound),
                    }
                }
            }
            ModeClass::Prefix(_) => {
                let Some(target_uid) = prefix_target else {
                    return Err(RejectReason::InvalidParam("missing nick".into()));
                };
                let held = staging.prefixes.entry(target_uid.clone()).or_insert_with(|| {
                    chan.members
                        .get(&target_uid)
                        .map(|m| m.prefixes.clone())
                        .unwrap_or_default()
                });
                if change.adding == held.contains(&letter) {
                    return Err(RejectReason::Unchanged);
                }
                if change.adding {
                    held.insert(letter);
                } else {
                    held.remove(&letter);
                }
            }
        }

        Ok(change)
    }

    fn validate_user_item(
        &mut self,
        actor: &Actor,
        target_uid: &Uid,
        desc: &ModeDescriptor,
        mut change: ModeChange,
        staging: &mut Staging,
    ) -> Result<ModeChange, RejectReason> {
        change.param = None;

        if let Actor::User(actor_uid) = actor {
            let event = RawModeEvent {
                actor: actor.clone(),
                target: ModeTargetRef::User(target_uid.clone()),
                change: change.clone(),
            };
            match self.fire_raw_mode(&event) {
                ModResult::Deny => return Err(RejectReason::Denied),
                ModResult::Allow => {}
                ModResult::PassThru => {
                    if actor_uid != target_uid {
                        return Err(RejectReason::CannotChangeOther);
                    }
                    if desc.oper_only && change.adding {
                        return Err(RejectReason::OperOnly);
                    }
                }
            }
        }

        let user = self
            .users
            .get(target_uid)
            .ok_or_else(|| RejectReason::NoSuchNick(target_uid.clone()))?;
        let modes = staging
            .modes
            .get_or_insert_with(|| user.modes.iter().map(|c| (*c, None)).collect());
        let present = modes.contains_key(&change.letter);
        if change.adding == present {
            return Err(RejectReason::Unchanged);
        }
        if change.adding {
            modes.insert(change.letter, None);
        } else {
            modes.remove(&change.letter);
        }
        Ok(change)
    }

    /// Mutate the target for each change, re-checking caps and duplicates
    /// since `PreMode` hooks may have rewritten the list.
    fn apply_changes(
        &mut self,
        actor: &Actor,
        target: &ModeTargetRef,
        changes: Vec<ModeChange>,
        rejected: &mut Vec<Rejection>,
    ) -> ChangeRecord {
        let mut record = ChangeRecord::new();
        if changes.is_empty() {
            return record;
        }

        match target {
            ModeTargetRef::User(uid) => {
                let Some(user) = self.users.get_mut(uid) else {
                    return record;
                };
                for change in changes {
                    if self.modes.get(ModeTarget::User, change.letter).is_none() {
                        rejected.push(Rejection {
                            change,
                            reason: RejectReason::UnknownMode,
                        });
                        continue;
                    }
                    let changed = if change.adding {
                        user.modes.insert(change.letter)
                    } else {
                        user.modes.remove(&change.letter)
                    };
                    if changed {
                        record.push(change);
                    } else {
                        rejected.push(Rejection {
                            change,
                            reason: RejectReason::Unchanged,
                        });
                    }
                }
            }
            ModeTargetRef::Channel(name) => {
                let setter = self.actor_mask(actor);
                let now = chrono::Utc::now().timestamp();
                let resolved: Vec<(ModeChange, Option<Uid>)> = changes
                    .into_iter()
                    .map(|c| {
                        let uid = match self.modes.get(ModeTarget::Channel, c.letter) {
                            Some(d) if d.prefix_spec().is_some() => {
                                c.param.as_deref().and_then(|n| self.find_uid(n))
                            }
                            _ => None,
                        };
                        (c, uid)
                    })
                    .collect();

                let key = slirc_proto::irc_to_lower(name);
                let Some(chan) = self.channels.get_mut(&key) else {
                    return record;
                };

                for (mut change, uid) in resolved {
                    let letter = change.letter;
                    let Some(desc) = self.modes.get(ModeTarget::Channel, letter) else {
                        rejected.push(Rejection {
                            change,
                            reason: RejectReason::UnknownMode,
                        });
                        continue;
                    };

                    let outcome: Result<(), RejectReason> = match desc.class {
                        ModeClass::Simple => {
                            change.param = None;
                            let changed = if change.adding {
                                chan.modes.insert(letter, None) != Some(None)
                            } else {
                                chan.modes.remove(&letter).is_some()
                            };
                            if changed { Ok(()) } else { Err(RejectReason::Unchanged) }
                        }
                        ModeClass::Param { unset_takes_param } => {
                            if change.adding {
                                match change.param.clone() {
                                    Some(value) => {
                                        let old = chan.modes.insert(letter, Some(value.clone()));
                                        if old == Some(Some(value)) {
                                            Err(RejectReason::Unchanged)
                                        } else {
                                            Ok(())
                                        }
                                    }
                                    None => Err(RejectReason::InvalidParam("missing parameter".into())),
                                }
                            } else {
                                if !unset_takes_param {
                                    change.param = None;
                                }
                                match chan.modes.remove(&letter) {
                                    Some(_) => Ok(()),
                                    None => Err(RejectReason::Unchanged),
                                }
                            }
                        }
                        ModeClass::List => {
                            let cap = self.config.limits.list_cap(letter);
                            let mask = change.param.clone().unwrap_or_default();
                            let list = chan.lists.entry(letter).or_default();
                            let pos = list.iter().position(|e| irc_eq(&e.mask, &mask));
                            if change.adding {
                                if mask.is_empty() {
                                    Err(RejectReason::InvalidParam("missing parameter".into()))
                                } else if pos.is_some() {
                                    Err(RejectReason::Duplicate)
                                } else if list.len() >= cap {
                                    Err(RejectReason::ListFull { limit: cap })
                                } else {
                                    list.push(ListEntry {
                                        mask,
                                        set_by: setter.clone(),
                                        set_at: now,
                                    });
                                    Ok(())
                                }
                            } else {
                                match pos {
                                    Some(i) => {
                                        change.param = Some(list.remove(i).mask);
                                        if list.is_empty() {
                                            chan.lists.remove(&letter);
                                        }
                                        Ok(())
                                    }
                                    None => Err(RejectReason::NotFound),
                                }
                            }
                        }
                        ModeClass::Prefix(_) => {
                            let nick = change.param.clone().unwrap_or_default();
                            match uid.as_ref().map(|u| chan.members.get_mut(u)) {
                                None => Err(RejectReason::NoSuchNick(nick)),
                                Some(None) => Err(RejectReason::NotOnChannel(nick)),
                                Some(Some(member)) => {
                                    let changed = if change.adding {
                                        member.prefixes.insert(letter)
                                    } else {
                                        member.prefixes.remove(&letter)
                                    };
                                    if changed { Ok(()) } else { Err(RejectReason::Unchanged) }
                                }
                            }
                        }
                    };

                    match outcome {
                        Ok(()) => record.push(change),
                        Err(reason) => rejected.push(Rejection { change, reason }),
                    }
                }
            }
        }

        record
    }
}
