//! Hook payloads and the typed `fire_*` entry points on [`Matrix`].

use std::sync::Arc;

use super::Module;
use crate::hooks::{EventKind, HookHost, HookRegistry, ModResult, fire_notify, fire_veto};
use crate::modes::{ChangeRecord, ModeChange, ModeTargetRef};
use crate::state::{Actor, Matrix, Uid};

/// `PreCommand` / `PostCommand`.
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub uid: Uid,
    /// Uppercased command name.
    pub command: String,
    pub params: Vec<String>,
}

/// Per-item permission check, fired once per mode item.
#[derive(Debug, Clone)]
pub struct RawModeEvent {
    pub actor: Actor,
    pub target: ModeTargetRef,
    pub change: ModeChange,
}

/// The validated batch, about to be applied. Hooks may edit `changes`.
#[derive(Debug, Clone)]
pub struct PreModeEvent {
    pub actor: Actor,
    pub target: ModeTargetRef,
    pub changes: Vec<ModeChange>,
}

/// What was actually applied.
#[derive(Debug, Clone)]
pub struct ModeEvent {
    pub actor: Actor,
    pub target: ModeTargetRef,
    pub changes: ChangeRecord,
}

#[derive(Debug, Clone)]
pub struct ConnectEvent {
    pub uid: Uid,
}

/// `UserPreJoin` / `UserJoin`.
#[derive(Debug, Clone)]
pub struct JoinEvent {
    pub uid: Uid,
    pub channel: String,
    pub key: Option<String>,
    /// The join creates the channel.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct PartEvent {
    pub uid: Uid,
    pub channel: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuitEvent {
    pub uid: Uid,
    pub nick: String,
    pub reason: String,
}

/// `UserPreMessage` / `UserMessage`.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub uid: Uid,
    pub target: String,
    pub text: String,
    pub notice: bool,
}

#[derive(Debug, Clone)]
pub struct CheckBanEvent {
    pub channel: String,
    pub uid: Uid,
}

#[derive(Debug, Clone)]
pub struct ChannelDeleteEvent {
    pub channel: String,
}

/// `LoadModule` / `UnloadModule`.
#[derive(Debug, Clone)]
pub struct ModuleEvent {
    pub name: String,
}

impl HookHost for Matrix {
    type Subscriber = dyn Module;

    fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    fn subscriber(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name)
    }
}

impl Matrix {
    pub fn fire_pre_command(&mut self, event: &CommandEvent) -> ModResult {
        fire_veto(self, EventKind::PreCommand, ModResult::PassThru, |module, matrix| {
            module.on_pre_command(matrix, event)
        })
    }

    pub fn fire_raw_mode(&mut self, event: &RawModeEvent) -> ModResult {
        fire_veto(self, EventKind::RawMode, ModResult::PassThru, |module, matrix| {
            module.on_raw_mode(matrix, event)
        })
    }

    pub fn fire_pre_mode(&mut self, event: &mut PreModeEvent) -> ModResult {
        fire_veto(self, EventKind::PreMode, ModResult::PassThru, |module, matrix| {
            module.on_pre_mode(matrix, &mut *event)
        })
    }

    pub fn fire_user_pre_join(&mut self, event: &JoinEvent) -> ModResult {
        fire_veto(self, EventKind::UserPreJoin, ModResult::PassThru, |module, matrix| {
            module.on_user_pre_join(matrix, event)
        })
    }

    pub fn fire_user_pre_message(&mut self, event: &MessageEvent) -> ModResult {
        fire_veto(self, EventKind::UserPreMessage, ModResult::PassThru, |module, matrix| {
            module.on_user_pre_message(matrix, event)
        })
    }

    pub fn fire_check_ban(&mut self, event: &CheckBanEvent) -> ModResult {
        fire_veto(self, EventKind::CheckBan, ModResult::PassThru, |module, matrix| {
            module.on_check_ban(matrix, event)
        })
    }

    pub fn fire_post_command(&mut self, event: &CommandEvent) {
        fire_notify(self, EventKind::PostCommand, |module, matrix| {
            module.on_post_command(matrix, event)
        });
    }

    pub fn fire_mode(&mut self, event: &ModeEvent) {
        fire_notify(self, EventKind::Mode, |module, matrix| module.on_mode(matrix, event));
    }

    pub fn fire_user_connect(&mut self, event: &ConnectEvent) {
        fire_notify(self, EventKind::UserConnect, |module, matrix| {
            module.on_user_connect(matrix, event)
        });
    }

    pub fn fire_user_join(&mut self, event: &JoinEvent) {
        fire_notify(self, EventKind::UserJoin, |module, matrix| module.on_user_join(matrix, event));
    }

    pub fn fire_user_part(&mut self, event: &PartEvent) {
        fire_notify(self, EventKind::UserPart, |module, matrix| module.on_user_part(matrix, event));
    }

    pub fn fire_user_quit(&mut self, event: &QuitEvent) {
        fire_notify(self, EventKind::UserQuit, |module, matrix| module.on_user_quit(matrix, event));
    }

    pub fn fire_user_message(&mut self, event: &MessageEvent) {
        fire_notify(self, EventKind::UserMessage, |module, matrix| {
            module.on_user_message(matrix, event)
        });
    }

    pub fn fire_channel_delete(&mut self, event: &ChannelDeleteEvent) {
        fire_notify(self, EventKind::ChannelDelete, |module, matrix| {
            module.on_channel_delete(matrix, event)
        });
    }

    pub fn fire_load_module(&mut self, event: &ModuleEvent) {
        fire_notify(self, EventKind::LoadModule, |module, matrix| {
            module.on_load_module(matrix, event)
        });
    }

    pub fn fire_unload_module(&mut self, event: &ModuleEvent) {
        fire_notify(self, EventKind::UnloadModule, |module, matrix| {
            module.on_unload_module(matrix, event)
        });
    }
}
