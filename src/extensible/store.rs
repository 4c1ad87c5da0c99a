//! Per-object attachment storage.

use std::any::Any;
use std::collections::HashMap;

use super::{ExtId, ExtensibleKind, ExtensionManager};

/// Attachment slots embedded in every user, channel, membership and server.
///
/// Holds opaque payloads keyed by descriptor id; typing lives in
/// [`ExtItem`](super::ExtItem).
pub struct Extensible {
    kind: ExtensibleKind,
    items: HashMap<ExtId, Box<dyn Any + Send + Sync>>,
}

impl Extensible {
    pub fn new(kind: ExtensibleKind) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ExtensibleKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ExtId) -> bool {
        self.items.contains_key(&id)
    }

    pub(crate) fn get_raw(&self, id: ExtId) -> Option<&(dyn Any + Send + Sync)> {
        self.items.get(&id).map(|b| b.as_ref())
    }

    pub(crate) fn get_raw_mut(&mut self, id: ExtId) -> Option<&mut (dyn Any + Send + Sync)> {
        self.items.get_mut(&id).map(|b| b.as_mut())
    }

    pub(crate) fn insert_raw(
        &mut self,
        id: ExtId,
        value: Box<dyn Any + Send + Sync>,
    ) -> Option<Box<dyn Any + Send + Sync>> {
        self.items.insert(id, value)
    }

    pub(crate) fn remove_raw(&mut self, id: ExtId) -> Option<Box<dyn Any + Send + Sync>> {
        self.items.remove(&id)
    }

    /// Remove every attachment, running release actions.
    ///
    /// Called when the owning object is destroyed.
    pub fn unset_all(&mut self, manager: &ExtensionManager) {
        for (id, value) in self.items.drain() {
            manager.release(id, value);
        }
    }

    /// Remove attachments stored under any of `ids`.
    pub(crate) fn purge(&mut self, ids: &[ExtId], manager: &ExtensionManager) -> usize {
        let mut removed = 0;
        for id in ids {
            if let Some(value) = self.items.remove(id) {
                manager.release(*id, value);
                removed += 1;
            }
        }
        removed
    }
}

impl std::fmt::Debug for Extensible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensible")
            .field("kind", &self.kind)
            .field("items", &self.items.len())
            .finish()
    }
}
