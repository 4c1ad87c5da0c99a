//! IRC command handlers.
//!
//! Handlers are registered in a [`CommandRegistry`] that lives in the
//! `Matrix`; modules may add their own through their `ModuleContext`.

mod admin;
mod channel;
mod connection;
mod core;
mod messaging;
mod mode;
mod oper;

use std::sync::Arc;

pub use self::channel::send_names;
pub use self::connection::is_valid_nick;
pub use self::core::{CommandEntry, CommandRegistry, CommandSpec, Context, Handler, HandlerPhase};
pub use self::mode::broadcast as broadcast_mode_change;

use crate::error::ModuleError;
use crate::modes::CORE_OWNER;

/// Register the commands the daemon answers without any module loaded.
pub fn register_core_commands(registry: &mut CommandRegistry) -> Result<(), ModuleError> {
    let core: [(&str, Arc<dyn Handler>, CommandSpec); 14] = [
        ("NICK", Arc::new(connection::NickHandler), CommandSpec::any(0)),
        ("USER", Arc::new(connection::UserHandler), CommandSpec::unregistered(4)),
        ("PING", Arc::new(connection::PingHandler), CommandSpec::any(1)),
        ("PONG", Arc::new(connection::PongHandler), CommandSpec::any(0)),
        ("QUIT", Arc::new(connection::QuitHandler), CommandSpec::any(0)),
        ("JOIN", Arc::new(channel::JoinHandler), CommandSpec::registered(1)),
        ("PART", Arc::new(channel::PartHandler), CommandSpec::registered(1)),
        ("PRIVMSG", Arc::new(messaging::MessageHandler::privmsg()), CommandSpec::registered(1)),
        ("NOTICE", Arc::new(messaging::MessageHandler::notice()), CommandSpec::registered(1)),
        ("MODE", Arc::new(mode::ModeHandler), CommandSpec::registered(1)),
        ("OPER", Arc::new(oper::OperHandler), CommandSpec::registered(2)),
        ("LOADMODULE", Arc::new(admin::LoadModuleHandler), CommandSpec::registered(1).oper_only()),
        ("UNLOADMODULE", Arc::new(admin::UnloadModuleHandler), CommandSpec::registered(1).oper_only()),
        ("MODULES", Arc::new(admin::ModulesHandler), CommandSpec::registered(0)),
    ];
    for (name, handler, spec) in core {
        registry.register(CORE_OWNER, name, handler, spec)?;
    }
    Ok(())
}
