//! Hook registry, priority scheduler and consensus dispatch.
//!
//! Extensions subscribe to [`EventKind`]s with a [`Priority`]. The
//! [`HookRegistry`] resolves each kind's subscribers into a deterministic
//! total order, cached until the next subscribe/unsubscribe for that kind.
//! [`fire_veto`] and [`fire_notify`] walk that order on any [`HookHost`].

mod dispatch;
mod event;
mod priority;
mod registry;

pub(crate) use dispatch::panic_message;
pub use dispatch::{HookHost, fire_notify, fire_veto};
pub use event::EventKind;
pub use priority::Priority;
pub use registry::HookRegistry;

/// Three-valued verdict of a veto-style hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModResult {
    /// Permit the action, overriding later subscribers and core checks.
    Allow,
    /// Block the action.
    Deny,
    /// No opinion; defer to the next subscriber or the default.
    #[default]
    PassThru,
}

impl ModResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::PassThru => "passthru",
        }
    }

    /// Resolve against a boolean core check: ALLOW and DENY win outright.
    #[inline]
    pub fn check(self, default: bool) -> bool {
        match self {
            Self::Allow => true,
            Self::Deny => false,
            Self::PassThru => default,
        }
    }
}
