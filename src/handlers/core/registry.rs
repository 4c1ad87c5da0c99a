//! Command handler registry and dispatch.
//!
//! Every command passes through the same pipeline: lookup, registration
//! phase, parameter count, oper check, `PreCommand` veto, the handler, then
//! `PostCommand`. Each run is wrapped in an `irc.command` span and timed.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use slirc_proto::{Message, is_channel_name};
use tracing::{debug, debug_span, error};

use super::context::{Context, Handler};
use crate::error::{HandlerError, HandlerResult, ModuleError};
use crate::hooks::{ModResult, panic_message};
use crate::metrics;
use crate::modules::CommandEvent;
use crate::state::Matrix;
use crate::telemetry::CommandTimer;

/// When a command may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerPhase {
    /// Before and after registration (NICK, PING, QUIT).
    Any,
    /// Only before registration (USER).
    Unregistered,
    /// Only after registration.
    Registered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub min_params: usize,
    pub phase: HandlerPhase,
    pub oper_only: bool,
}

impl CommandSpec {
    pub fn registered(min_params: usize) -> Self {
        Self {
            min_params,
            phase: HandlerPhase::Registered,
            oper_only: false,
        }
    }

    pub fn any(min_params: usize) -> Self {
        Self {
            phase: HandlerPhase::Any,
            ..Self::registered(min_params)
        }
    }

    pub fn unregistered(min_params: usize) -> Self {
        Self {
            phase: HandlerPhase::Unregistered,
            ..Self::registered(min_params)
        }
    }

    #[must_use]
    pub fn oper_only(mut self) -> Self {
        self.oper_only = true;
        self
    }
}

#[derive(Clone)]
pub struct CommandEntry {
    pub handler: Arc<dyn Handler>,
    pub spec: CommandSpec,
    pub owner: String,
}

/// Uppercased command name → handler.
#[derive(Default)]
pub struct CommandRegistry {
    entries: HashMap<String, CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        owner: &str,
        name: &str,
        handler: Arc<dyn Handler>,
        spec: CommandSpec,
    ) -> Result<(), ModuleError> {
        let name = name.to_ascii_uppercase();
        if self.entries.contains_key(&name) {
            return Err(ModuleError::DuplicateCommand(name));
        }
        self.entries.insert(
            name,
            CommandEntry {
                handler,
                spec,
                owner: owner.to_string(),
            },
        );
        Ok(())
    }

    pub fn unregister_owner(&mut self, owner: &str) -> Vec<String> {
        let names: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.owner == owner)
            .map(|(n, _)| n.clone())
            .collect();
        for name in &names {
            self.entries.remove(name);
        }
        names
    }

    pub fn get(&self, name: &str) -> Option<CommandEntry> {
        self.entries.get(&name.to_ascii_uppercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Matrix {
    /// Route one client line to its handler.
    pub fn dispatch_command(&mut self, uid: &str, msg: &Message) {
        let command = msg.command.to_ascii_uppercase();
        let channel = msg.arg(0).filter(|a| is_channel_name(a));
        let span = debug_span!("irc.command", command = %command, uid = %uid, channel = channel);
        let _enter = span.enter();

        let result = match self.commands.get(&command) {
            Some(entry) => {
                let _timer = CommandTimer::new(&command);
                self.run_command(uid, &command, &entry, msg)
            }
            None => Err(HandlerError::UnknownCommand(command.clone())),
        };

        if let Err(e) = result {
            metrics::record_command_error(&command, e.error_code());
            debug!(command = %command, error = %e, "Command error");
            let nick = self.nick_of(uid).to_string();
            if let Some(reply) = e.to_irc_reply(&self.server.name, &nick, &command) {
                self.send_to(uid, reply);
            }
        }
    }

    fn run_command(&mut self, uid: &str, command: &str, entry: &CommandEntry, msg: &Message) -> HandlerResult {
        let (registered, oper) = self
            .users
            .get(uid)
            .map(|u| (u.registered, u.is_oper()))
            .unwrap_or_default();

        match entry.spec.phase {
            HandlerPhase::Registered if !registered => return Err(HandlerError::NotRegistered),
            HandlerPhase::Unregistered if registered => return Err(HandlerError::AlreadyRegistered),
            _ => {}
        }
        if msg.params.len() < entry.spec.min_params {
            return Err(HandlerError::NeedMoreParams);
        }
        if entry.spec.oper_only && !oper {
            return Err(HandlerError::NoPrivileges);
        }

        let event = CommandEvent {
            uid: uid.to_string(),
            command: command.to_string(),
            params: msg.params.clone(),
        };
        if registered && self.fire_pre_command(&event) == ModResult::Deny {
            return Err(HandlerError::Vetoed);
        }

        let mut ctx = Context::new(uid, self);
        match panic::catch_unwind(AssertUnwindSafe(|| entry.handler.handle(&mut ctx, msg))) {
            Ok(result) => result?,
            Err(payload) => {
                let reason = panic_message(payload.as_ref()).to_string();
                error!(command = %command, owner = %entry.owner, panic = %reason, "Command handler panicked");
                return Err(HandlerError::Internal(format!("handler panicked: {reason}")));
            }
        }

        if self.users.contains_key(uid) {
            self.fire_post_command(&event);
        }
        Ok(())
    }
}
