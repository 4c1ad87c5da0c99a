//! Runtime module management: LOADMODULE, UNLOADMODULE, MODULES.

use slirc_proto::{Message, Response};

use super::{Context, Handler};
use crate::error::HandlerResult;
use crate::modules::bundled;

pub struct LoadModuleHandler;

impl Handler for LoadModuleHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).unwrap_or_default();
        match ctx.matrix.load_bundled(name) {
            Ok(()) => ctx.reply(Response::RPL_LOADEDMODULE, &[name, "Module loaded"]),
            Err(e) => {
                let reply = e.to_irc_reply(ctx.server_name(), &ctx.nick(), name, true);
                ctx.send(reply);
            }
        }
        Ok(())
    }
}

pub struct UnloadModuleHandler;

impl Handler for UnloadModuleHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).unwrap_or_default();
        match ctx.matrix.unload_module(name) {
            Ok(()) => ctx.reply(Response::RPL_UNLOADEDMODULE, &[name, "Module unloaded"]),
            Err(e) => {
                let reply = e.to_irc_reply(ctx.server_name(), &ctx.nick(), name, false);
                ctx.send(reply);
            }
        }
        Ok(())
    }
}

/// Lists loaded modules; opers also see what else could be loaded.
pub struct ModulesHandler;

impl Handler for ModulesHandler {
    fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        for (name, description) in ctx.matrix.modules.describe() {
            ctx.reply(Response::RPL_MODLIST, &[&name, &description]);
        }
        if ctx.is_oper() {
            let available: Vec<&str> = bundled::NAMES
                .iter()
                .copied()
                .filter(|n| !ctx.matrix.modules.contains(n))
                .collect();
            if !available.is_empty() {
                let text = format!("Available: {}", available.join(" "));
                ctx.reply(Response::RPL_MODLIST, &["*", &text]);
            }
        }
        ctx.reply(Response::RPL_ENDOFMODLIST, &["End of MODULES list"]);
        Ok(())
    }
}
