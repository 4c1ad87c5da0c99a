//! The Matrix: all daemon state, owned by the core actor.
//!
//! Nothing in here is shared between tasks. Connections talk to the core
//! through [`CoreEvent`](super::CoreEvent)s and the core owns the `Matrix`
//! outright, so every hook, mode change and extension attachment is
//! mutated from exactly one place.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use slirc_proto::{Message, Response, irc_to_lower};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::actor::CoreHandle;
use super::{Channel, Membership, ServerInfo, Uid, UidGenerator, User};
use crate::config::Config;
use crate::error::{HandlerError, ModuleError};
use crate::extensible::ExtensionManager;
use crate::handlers::{CommandRegistry, register_core_commands};
use crate::hooks::HookRegistry;
use crate::metrics;
use crate::modes::{ExtbanRegistry, ModeRegistry, ModeTarget, register_core_modes};
use crate::modules::{ChannelDeleteEvent, ModuleManager, PartEvent, QuitEvent};

/// Who is changing something: a local user, or the server itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    User(Uid),
    Server,
}

impl Actor {
    pub fn uid(&self) -> Option<&str> {
        match self {
            Self::User(uid) => Some(uid),
            Self::Server => None,
        }
    }
}

pub struct Matrix {
    pub config: Arc<Config>,
    pub server: ServerInfo,

    /// Users by UID.
    pub users: HashMap<Uid, User>,
    /// Casefolded nick → UID.
    pub nicks: HashMap<String, Uid>,
    /// Channels by casefolded name.
    pub channels: HashMap<String, Channel>,

    pub extensions: ExtensionManager,
    pub hooks: HookRegistry,
    pub modules: ModuleManager,
    pub modes: ModeRegistry,
    pub extbans: ExtbanRegistry,
    pub commands: CommandRegistry,

    pub uid_gen: Arc<UidGenerator>,
    disconnects: Vec<(Uid, String)>,
    handle: Option<CoreHandle>,
}

impl Matrix {
    /// Build an empty matrix with the core modes and commands registered.
    pub fn new(config: Arc<Config>) -> Result<Self, ModuleError> {
        let mut modes = ModeRegistry::new();
        register_core_modes(&mut modes, &config)?;
        let mut commands = CommandRegistry::new();
        register_core_commands(&mut commands)?;

        Ok(Self {
            server: ServerInfo::from_config(&config.server),
            uid_gen: Arc::new(UidGenerator::new(config.server.sid.clone())),
            config,
            users: HashMap::new(),
            nicks: HashMap::new(),
            channels: HashMap::new(),
            extensions: ExtensionManager::new(),
            hooks: HookRegistry::new(),
            modules: ModuleManager::new(),
            modes,
            extbans: ExtbanRegistry::new(),
            commands,
            disconnects: Vec::new(),
            handle: None,
        })
    }

    pub(crate) fn set_handle(&mut self, handle: CoreHandle) {
        self.handle = Some(handle);
    }

    /// Handle for re-entering the core from spawned work. `None` until the
    /// core actor is running.
    pub fn handle(&self) -> Option<&CoreHandle> {
        self.handle.as_ref()
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&irc_to_lower(name))
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(&irc_to_lower(name))
    }

    pub fn find_uid(&self, nick: &str) -> Option<Uid> {
        self.nicks.get(&irc_to_lower(nick)).cloned()
    }

    pub fn user_by_nick(&self, nick: &str) -> Option<&User> {
        self.nicks.get(&irc_to_lower(nick)).and_then(|uid| self.users.get(uid))
    }

    pub fn nick_of(&self, uid: &str) -> &str {
        self.users.get(uid).map(User::nick_or_star).unwrap_or("*")
    }

    pub fn is_member(&self, channel: &str, uid: &str) -> bool {
        self.channel(channel).is_some_and(|c| c.is_member(uid))
    }

    /// Highest prefix rank `uid` holds on `channel`, 0 for none.
    pub fn member_rank(&self, channel: &str, uid: &str) -> u32 {
        self.channel(channel)
            .and_then(|c| c.members.get(uid))
            .map(|m| self.modes.rank_of(&m.prefixes))
            .unwrap_or(0)
    }

    /// Source prefix for messages caused by `actor`.
    pub fn actor_mask(&self, actor: &Actor) -> String {
        match actor {
            Actor::User(uid) => self
                .users
                .get(uid)
                .map(User::hostmask)
                .unwrap_or_else(|| self.server.name.clone()),
            Actor::Server => self.server.name.clone(),
        }
    }

    /// UIDs sharing at least one channel with `uid`, not including it.
    pub fn peers_of(&self, uid: &str) -> BTreeSet<Uid> {
        let Some(user) = self.users.get(uid) else {
            return BTreeSet::new();
        };
        user.channels
            .iter()
            .filter_map(|key| self.channels.get(key))
            .flat_map(|c| c.members.keys())
            .filter(|m| m.as_str() != uid)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    /// Queue `msg` for `uid`. A full queue schedules a disconnect instead of
    /// blocking the core.
    pub fn send_to(&mut self, uid: &str, msg: Message) {
        let Some(user) = self.users.get(uid) else {
            return;
        };
        if let Err(TrySendError::Full(_)) = user.try_send(msg) {
            metrics::record_sendq_drop();
            self.request_disconnect(uid, "SendQ exceeded");
        }
    }

    /// Send a numeric to `uid`; the target nick is filled in.
    pub fn reply(&mut self, uid: &str, response: Response, args: &[&str]) {
        let nick = self.nick_of(uid).to_string();
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(nick.as_str());
        params.extend_from_slice(args);
        let msg = Message::numeric(&self.server.name, response, &params);
        self.send_to(uid, msg);
    }

    pub fn broadcast_channel(&mut self, channel: &str, msg: &Message, except: Option<&str>) {
        let Some(chan) = self.channel(channel) else {
            return;
        };
        let targets: Vec<Uid> = chan
            .members
            .keys()
            .filter(|uid| Some(uid.as_str()) != except)
            .cloned()
            .collect();
        for uid in targets {
            self.send_to(&uid, msg.clone());
        }
    }

    /// Send to everyone sharing a channel with `uid`, and to `uid` itself
    /// when `include_self` is set.
    pub fn broadcast_peers(&mut self, uid: &str, msg: &Message, include_self: bool) {
        let mut targets = self.peers_of(uid);
        if include_self {
            targets.insert(uid.to_string());
        }
        for target in targets {
            self.send_to(&target, msg.clone());
        }
    }

    pub fn request_disconnect(&mut self, uid: &str, reason: impl Into<String>) {
        if !self.disconnects.iter().any(|(u, _)| u == uid) {
            self.disconnects.push((uid.to_string(), reason.into()));
        }
    }

    pub(crate) fn take_disconnects(&mut self) -> Vec<(Uid, String)> {
        std::mem::take(&mut self.disconnects)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn add_user(&mut self, uid: Uid, host: &str, sender: Option<mpsc::Sender<Message>>) {
        debug!(uid = %uid, host = %host, "User connected");
        self.users.insert(uid.clone(), User::new(uid, host, sender));
        metrics::set_connected_users(self.users.len());
    }

    /// Claim `nick` for `uid`, releasing the previous one. Returns the old
    /// nick if there was one.
    pub fn set_nick(&mut self, uid: &str, nick: &str) -> Result<Option<String>, HandlerError> {
        let folded = irc_to_lower(nick);
        if let Some(owner) = self.nicks.get(&folded)
            && owner != uid
        {
            return Err(HandlerError::NicknameInUse(nick.to_string()));
        }
        let user = self
            .users
            .get_mut(uid)
            .ok_or_else(|| HandlerError::Internal(format!("unknown uid {uid}")))?;
        let old = std::mem::replace(&mut user.nick, nick.to_string());
        if !old.is_empty() {
            self.nicks.remove(&irc_to_lower(&old));
        }
        self.nicks.insert(folded, uid.to_string());
        Ok((!old.is_empty()).then_some(old))
    }

    /// Add `uid` to `name`, creating the channel if needed. The creator of a
    /// new channel receives the highest prefix and the configured default
    /// modes. Returns whether the channel was created.
    pub fn add_member(&mut self, uid: &str, name: &str) -> bool {
        let key = irc_to_lower(name);
        let created = !self.channels.contains_key(&key);
        let top = self.modes.top_prefix();

        let chan = self.channels.entry(key.clone()).or_insert_with(|| Channel::new(name));
        let mut membership = Membership::new();
        if created {
            for letter in self.config.channels.default_modes.chars() {
                if self.modes.get(ModeTarget::Channel, letter).is_some() {
                    chan.modes.insert(letter, None);
                }
            }
            if let Some(letter) = top {
                membership.prefixes.insert(letter);
            }
        }
        chan.members.insert(uid.to_string(), membership);

        if let Some(user) = self.users.get_mut(uid) {
            user.channels.insert(key);
        }
        if created {
            metrics::set_active_channels(self.channels.len());
        }
        created
    }

    /// Remove `uid` from `channel`, destroying the membership's attachments
    /// and the channel itself once empty.
    pub fn remove_member(&mut self, channel: &str, uid: &str) {
        let key = irc_to_lower(channel);
        let Some(chan) = self.channels.get_mut(&key) else {
            return;
        };
        if let Some(mut membership) = chan.members.remove(uid) {
            membership.ext.unset_all(&self.extensions);
        }
        let now_empty = chan.members.is_empty();
        if let Some(user) = self.users.get_mut(uid) {
            user.channels.remove(&key);
        }
        if now_empty {
            self.delete_channel(&key);
        }
    }

    fn delete_channel(&mut self, key: &str) {
        let Some(name) = self.channels.get(key).map(|c| c.name.clone()) else {
            return;
        };
        self.fire_channel_delete(&ChannelDeleteEvent { channel: name.clone() });
        // A ChannelDelete hook may have re-joined someone.
        if self.channels.get(key).is_some_and(|c| !c.members.is_empty()) {
            return;
        }
        if let Some(mut chan) = self.channels.remove(key) {
            chan.ext.unset_all(&self.extensions);
        }
        debug!(channel = %name, "Channel destroyed");
        metrics::set_active_channels(self.channels.len());
    }

    /// Remove `uid` from `channel` after telling the channel.
    pub fn part_user(&mut self, uid: &str, channel: &str, reason: Option<&str>) {
        let Some(display) = self.channel(channel).map(|c| c.name.clone()) else {
            return;
        };
        let mut params = vec![display.clone()];
        if let Some(r) = reason {
            params.push(r.to_string());
        }
        let msg = Message::new("PART", params).with_prefix(self.actor_mask(&Actor::User(uid.to_string())));
        self.broadcast_channel(&display, &msg, None);
        self.fire_user_part(&PartEvent {
            uid: uid.to_string(),
            channel: display.clone(),
            reason: reason.map(str::to_string),
        });
        self.remove_member(&display, uid);
    }

    /// Destroy a user: notify peers, leave every channel, release the nick
    /// and every attachment.
    pub fn remove_user(&mut self, uid: &str, reason: &str) {
        let Some(user) = self.users.get(uid) else {
            return;
        };
        let nick = user.nick.clone();
        let registered = user.registered;
        let mask = user.hostmask();

        if registered {
            self.fire_user_quit(&QuitEvent {
                uid: uid.to_string(),
                nick: nick.clone(),
                reason: reason.to_string(),
            });
            let quit = Message::new("QUIT", vec![reason.to_string()]).with_prefix(mask);
            self.broadcast_peers(uid, &quit, false);
        }

        let joined: Vec<String> = self
            .users
            .get(uid)
            .map(|u| u.channels.iter().cloned().collect())
            .unwrap_or_default();
        for key in joined {
            self.remove_member(&key, uid);
        }

        if !nick.is_empty() && self.nicks.get(&irc_to_lower(&nick)).is_some_and(|u| u == uid) {
            self.nicks.remove(&irc_to_lower(&nick));
        }
        if let Some(mut user) = self.users.remove(uid) {
            user.ext.unset_all(&self.extensions);
        } else {
            warn!(uid = %uid, "User vanished during quit");
        }
        debug!(uid = %uid, nick = %nick, reason = %reason, "User removed");
        metrics::set_connected_users(self.users.len());
    }
}
