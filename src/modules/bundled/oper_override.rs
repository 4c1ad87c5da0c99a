//! Lets IRC operators bypass channel privilege and join checks.

use tracing::info;

use crate::error::ModuleError;
use crate::hooks::{EventKind, ModResult, Priority};
use crate::modules::{JoinEvent, Module, ModuleContext, RawModeEvent};
use crate::state::Matrix;

pub struct OperOverride;

impl OperOverride {
    fn is_oper(matrix: &Matrix, uid: &str) -> bool {
        matrix.users.get(uid).is_some_and(|u| u.is_oper())
    }
}

impl Module for OperOverride {
    fn name(&self) -> &str {
        "oper_override"
    }

    fn description(&self) -> &str {
        "Operators may change any channel mode and join past +ikl and bans"
    }

    fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.subscribe(EventKind::RawMode, Priority::First);
        ctx.subscribe(EventKind::UserPreJoin, Priority::First);
        Ok(())
    }

    fn on_raw_mode(&self, matrix: &mut Matrix, event: &RawModeEvent) -> ModResult {
        match event.actor.uid() {
            Some(uid) if Self::is_oper(matrix, uid) => {
                info!(uid = %uid, letter = %event.change.letter, "Oper override on mode change");
                ModResult::Allow
            }
            _ => ModResult::PassThru,
        }
    }

    fn on_user_pre_join(&self, matrix: &mut Matrix, event: &JoinEvent) -> ModResult {
        if Self::is_oper(matrix, &event.uid) {
            ModResult::Allow
        } else {
            ModResult::PassThru
        }
    }
}
