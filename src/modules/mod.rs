//! Loadable extensions.
//!
//! A [`Module`] registers what it needs in [`Module::init`] through a
//! [`ModuleContext`]: hook subscriptions, extension-store descriptors, mode
//! letters, extban matchers and commands. Everything registered there is
//! owned by the module and released by the daemon when it unloads, so
//! modules never have to undo their own registrations.
//!
//! Veto hooks default to PASSTHRU and notification hooks to no-ops, so a
//! module only implements what it subscribed to.

pub mod bundled;
mod context;
mod events;
mod manager;

pub use context::ModuleContext;
pub use events::{
    ChannelDeleteEvent, CheckBanEvent, CommandEvent, ConnectEvent, JoinEvent, MessageEvent,
    ModeEvent, ModuleEvent, PartEvent, PreModeEvent, QuitEvent, RawModeEvent,
};
pub use manager::ModuleManager;

use crate::error::ModuleError;
use crate::hooks::ModResult;
use crate::state::Matrix;

#[allow(unused_variables)]
pub trait Module: Send + Sync {
    /// Unique module name, used for hook ordering and ownership.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Called once before the module goes live. An error aborts the load and
    /// rolls back anything registered so far.
    fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError>;

    /// Called before the daemon releases the module's registrations.
    fn on_unload(&self, matrix: &mut Matrix) {}

    // Veto events.

    fn on_pre_command(&self, matrix: &mut Matrix, event: &CommandEvent) -> ModResult {
        ModResult::PassThru
    }

    fn on_raw_mode(&self, matrix: &mut Matrix, event: &RawModeEvent) -> ModResult {
        ModResult::PassThru
    }

    fn on_pre_mode(&self, matrix: &mut Matrix, event: &mut PreModeEvent) -> ModResult {
        ModResult::PassThru
    }

    fn on_user_pre_join(&self, matrix: &mut Matrix, event: &JoinEvent) -> ModResult {
        ModResult::PassThru
    }

    fn on_user_pre_message(&self, matrix: &mut Matrix, event: &MessageEvent) -> ModResult {
        ModResult::PassThru
    }

    /// ALLOW: not banned. DENY: banned.
    fn on_check_ban(&self, matrix: &mut Matrix, event: &CheckBanEvent) -> ModResult {
        ModResult::PassThru
    }

    // Notifications.

    fn on_post_command(&self, matrix: &mut Matrix, event: &CommandEvent) {}

    fn on_mode(&self, matrix: &mut Matrix, event: &ModeEvent) {}

    fn on_user_connect(&self, matrix: &mut Matrix, event: &ConnectEvent) {}

    fn on_user_join(&self, matrix: &mut Matrix, event: &JoinEvent) {}

    fn on_user_part(&self, matrix: &mut Matrix, event: &PartEvent) {}

    fn on_user_quit(&self, matrix: &mut Matrix, event: &QuitEvent) {}

    fn on_user_message(&self, matrix: &mut Matrix, event: &MessageEvent) {}

    fn on_channel_delete(&self, matrix: &mut Matrix, event: &ChannelDeleteEvent) {}

    fn on_load_module(&self, matrix: &mut Matrix, event: &ModuleEvent) {}

    fn on_unload_module(&self, matrix: &mut Matrix, event: &ModuleEvent) {}
}
