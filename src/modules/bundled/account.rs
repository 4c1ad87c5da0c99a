//! Account names attached to users, with `$a` and `$U` extbans.
//!
//! Accounts are set by operators with `SETACCOUNT <nick> [account]`; there
//! is no services integration. The account lives in the extension store, so
//! unloading the module drops every account and disables both extbans.

use std::sync::Arc;

use slirc_proto::{Message, irc_eq, irc_to_lower};
use tracing::info;

use crate::error::{HandlerError, HandlerResult, ModuleError};
use crate::extensible::{ExtItem, ExtensibleKind};
use crate::handlers::{CommandSpec, Context, Handler};
use crate::modes::ExtbanMatcher;
use crate::modules::{Module, ModuleContext};
use crate::state::{Matrix, User};

pub struct Account;

fn account_of<'a>(item: &ExtItem<String>, matrix: &Matrix, user: &'a User) -> Option<&'a str> {
    item.get(&matrix.extensions, &user.ext)
        .ok()
        .flatten()
        .map(String::as_str)
}

/// `$a:name` matches users identified as `name`; `$a` matches any account.
struct AccountBan {
    item: ExtItem<String>,
}

impl ExtbanMatcher for AccountBan {
    fn validate(&self, value: Option<&str>) -> Result<Option<String>, String> {
        match value {
            Some("") => Err("empty account name".to_string()),
            Some(v) => Ok(Some(irc_to_lower(v))),
            None => Ok(None),
        }
    }

    fn matches(&self, matrix: &Matrix, user: &User, value: Option<&str>) -> bool {
        match (account_of(&self.item, matrix, user), value) {
            (Some(account), Some(wanted)) => irc_eq(account, wanted),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// `$U` matches users with no account.
struct UnidentifiedBan {
    item: ExtItem<String>,
}

impl ExtbanMatcher for UnidentifiedBan {
    fn validate(&self, value: Option<&str>) -> Result<Option<String>, String> {
        match value {
            Some(_) => Err("$U takes no value".to_string()),
            None => Ok(None),
        }
    }

    fn matches(&self, matrix: &Matrix, user: &User, _value: Option<&str>) -> bool {
        account_of(&self.item, matrix, user).is_none()
    }
}

struct SetAccountHandler {
    item: ExtItem<String>,
}

impl Handler for SetAccountHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let target = msg.arg(0).unwrap_or_default();
        let account = msg.arg(1).filter(|a| !a.is_empty());

        let uid = ctx
            .matrix
            .find_uid(target)
            .ok_or_else(|| HandlerError::NoSuchNick(target.to_string()))?;
        let matrix = &mut *ctx.matrix;
        let user = matrix
            .users
            .get_mut(&uid)
            .ok_or_else(|| HandlerError::NoSuchNick(target.to_string()))?;

        let result = match account {
            Some(name) => self.item.set(&matrix.extensions, &mut user.ext, name.to_string()),
            None => self.item.unset(&matrix.extensions, &mut user.ext),
        };
        result.map_err(|e| HandlerError::Internal(e.to_string()))?;

        let nick = user.nick.clone();
        info!(uid = %uid, account = ?account, setter = %ctx.uid, "Account changed");
        let text = match account {
            Some(name) => format!("{nick} is now identified as {name}"),
            None => format!("{nick} is no longer identified"),
        };
        let notice = Message::new("NOTICE", vec![ctx.nick(), text]).with_prefix(ctx.server_name());
        ctx.send(notice);
        Ok(())
    }
}

impl Module for Account {
    fn name(&self) -> &str {
        "account"
    }

    fn description(&self) -> &str {
        "User accounts with $a and $U extbans"
    }

    fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let item = ctx.register_ext::<String>(ExtensibleKind::User, "account")?;
        ctx.add_extban('a', Arc::new(AccountBan { item: item.clone() }))?;
        ctx.add_extban('U', Arc::new(UnidentifiedBan { item: item.clone() }))?;
        ctx.add_command(
            "SETACCOUNT",
            Arc::new(SetAccountHandler { item }),
            CommandSpec::registered(1).oper_only(),
        )?;
        Ok(())
    }
}
