//! Channel ban exceptions (`+e`).

use crate::error::ModuleError;
use crate::hooks::{EventKind, ModResult, Priority};
use crate::modes::ModeDescriptor;
use crate::modules::{CheckBanEvent, Module, ModuleContext};
use crate::state::Matrix;

/// Adds list mode `e`; a user matching any entry is never banned.
pub struct BanException;

impl Module for BanException {
    fn name(&self) -> &str {
        "ban_exception"
    }

    fn description(&self) -> &str {
        "Provides channel mode +e (ban exceptions)"
    }

    fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.add_mode(ModeDescriptor::list('e'))?;
        ctx.subscribe(EventKind::CheckBan, Priority::Default);
        Ok(())
    }

    fn on_check_ban(&self, matrix: &mut Matrix, event: &CheckBanEvent) -> ModResult {
        if matrix.list_matches(&event.channel, 'e', &event.uid) {
            ModResult::Allow
        } else {
            ModResult::PassThru
        }
    }
}
