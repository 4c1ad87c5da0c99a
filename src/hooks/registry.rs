//! Per-event subscriber lists with a lazily resolved, cached order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::priority::{self, Priority};
use super::EventKind;
use crate::error::HookError;

#[derive(Debug, Clone)]
struct Subscription {
    module: String,
    priority: Priority,
}

#[derive(Debug, Default)]
struct Slot {
    /// Registration order.
    subs: Vec<Subscription>,
    resolved: Option<Arc<[String]>>,
    /// Registration order, cached after an ordering conflict.
    fallback: Option<Arc<[String]>>,
}

impl Slot {
    fn invalidate(&mut self) {
        self.resolved = None;
        self.fallback = None;
    }

    fn registration_order(&self) -> Arc<[String]> {
        self.subs.iter().map(|s| s.module.clone()).collect()
    }
}

/// Tracks which modules listen to which events, and in what order.
#[derive(Debug, Default)]
pub struct HookRegistry {
    slots: HashMap<EventKind, Slot>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `module` to `kind`.
    ///
    /// Re-subscribing replaces the constraint but keeps the original
    /// registration position.
    pub fn subscribe(&mut self, module: &str, kind: EventKind, priority: Priority) {
        let slot = self.slots.entry(kind).or_default();
        match slot.subs.iter_mut().find(|s| s.module == module) {
            Some(existing) => existing.priority = priority,
            None => slot.subs.push(Subscription {
                module: module.to_string(),
                priority,
            }),
        }
        slot.invalidate();
        debug!(module = %module, event = %kind, "Hook subscribed");
    }

    /// Remove one subscription. Returns true if it existed.
    pub fn unsubscribe(&mut self, module: &str, kind: EventKind) -> bool {
        let Some(slot) = self.slots.get_mut(&kind) else {
            return false;
        };
        let before = slot.subs.len();
        slot.subs.retain(|s| s.module != module);
        let removed = slot.subs.len() != before;
        if removed {
            slot.invalidate();
        }
        removed
    }

    /// Remove every subscription held by `module`.
    pub fn unsubscribe_all(&mut self, module: &str) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.subs.iter().any(|s| s.module == module))
            .map(|(kind, _)| *kind)
            .collect();
        kinds.sort();
        for kind in &kinds {
            self.unsubscribe(module, *kind);
        }
        kinds
    }

    pub fn is_subscribed(&self, module: &str, kind: EventKind) -> bool {
        self.slots
            .get(&kind)
            .is_some_and(|slot| slot.subs.iter().any(|s| s.module == module))
    }

    /// Event kinds `module` currently listens to.
    pub fn subscriptions_of(&self, module: &str) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|k| self.is_subscribed(module, *k))
            .collect();
        kinds.sort();
        kinds
    }

    /// Resolved invocation order for `kind`.
    pub fn resolve(&mut self, kind: EventKind) -> Result<Arc<[String]>, HookError> {
        let Some(slot) = self.slots.get_mut(&kind) else {
            return Ok(Arc::from(Vec::new()));
        };
        if let Some(cached) = &slot.resolved {
            return Ok(Arc::clone(cached));
        }

        let view: Vec<(&str, &Priority)> = slot
            .subs
            .iter()
            .map(|s| (s.module.as_str(), &s.priority))
            .collect();
        match priority::resolve(&view) {
            Ok(indices) => {
                let order: Arc<[String]> = indices
                    .into_iter()
                    .map(|i| slot.subs[i].module.clone())
                    .collect();
                slot.resolved = Some(Arc::clone(&order));
                Ok(order)
            }
            Err(cycle) => Err(HookError::OrderingConflict {
                event: kind,
                modules: cycle.into_iter().map(|i| slot.subs[i].module.clone()).collect(),
            }),
        }
    }

    /// Order used by the dispatcher.
    ///
    /// On an ordering conflict this logs once and falls back to
    /// registration order until the next change to `kind`.
    pub fn dispatch_order(&mut self, kind: EventKind) -> Arc<[String]> {
        if let Some(fallback) = self.slots.get(&kind).and_then(|s| s.fallback.clone()) {
            return fallback;
        }
        match self.resolve(kind) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "Using registration order");
                match self.slots.get_mut(&kind) {
                    Some(slot) => {
                        let order = slot.registration_order();
                        slot.fallback = Some(Arc::clone(&order));
                        order
                    }
                    None => Arc::from(Vec::new()),
                }
            }
        }
    }
}
