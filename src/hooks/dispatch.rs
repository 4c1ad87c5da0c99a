//! Consensus dispatch over a resolved subscriber order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, trace};

use super::{EventKind, HookRegistry, ModResult};
use crate::metrics;

/// Anything that owns a [`HookRegistry`] and can look subscribers up by name.
///
/// The daemon's `Matrix` is the production host; tests use small fakes.
pub trait HookHost {
    type Subscriber: ?Sized;

    fn hooks_mut(&mut self) -> &mut HookRegistry;

    /// Live subscriber for `name`, or `None` if it has been unloaded.
    fn subscriber(&self, name: &str) -> Option<Arc<Self::Subscriber>>;
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Fire a veto event.
///
/// The first subscriber returning ALLOW or DENY decides and later
/// subscribers are not invoked. If everyone passes, `default` is returned.
/// A panicking subscriber is logged and counts as PASSTHRU.
pub fn fire_veto<H, F>(host: &mut H, kind: EventKind, default: ModResult, mut call: F) -> ModResult
where
    H: HookHost,
    F: FnMut(&H::Subscriber, &mut H) -> ModResult,
{
    let order = host.hooks_mut().dispatch_order(kind);
    metrics::record_hook_dispatch(kind.as_str());

    for name in order.iter() {
        let Some(sub) = host.subscriber(name) else {
            continue;
        };
        let verdict = match panic::catch_unwind(AssertUnwindSafe(|| call(&sub, host))) {
            Ok(verdict) => verdict,
            Err(payload) => {
                error!(module = %name, event = %kind, panic = panic_message(payload.as_ref()), "Hook panicked");
                metrics::record_hook_error(kind.as_str());
                ModResult::PassThru
            }
        };
        if verdict != ModResult::PassThru {
            trace!(module = %name, event = %kind, verdict = verdict.as_str(), "Hook decided");
            metrics::record_hook_verdict(kind.as_str(), verdict.as_str());
            return verdict;
        }
    }

    metrics::record_hook_verdict(kind.as_str(), ModResult::PassThru.as_str());
    default
}

/// Fire a notification event: every subscriber runs in order.
///
/// A panicking subscriber is logged and delivery continues.
pub fn fire_notify<H, F>(host: &mut H, kind: EventKind, mut call: F)
where
    H: HookHost,
    F: FnMut(&H::Subscriber, &mut H),
{
    let order = host.hooks_mut().dispatch_order(kind);
    metrics::record_hook_dispatch(kind.as_str());

    for name in order.iter() {
        let Some(sub) = host.subscriber(name) else {
            continue;
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| call(&sub, host))) {
            error!(module = %name, event = %kind, panic = panic_message(payload.as_ref()), "Hook panicked");
            metrics::record_hook_error(kind.as_str());
        }
    }
}
