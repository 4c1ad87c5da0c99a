//! Descriptor registry.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{ExtId, ExtItem, ExtensibleKind};
use crate::error::ExtError;

/// Type-erased release action run when a value leaves the store.
pub(crate) type ReleaseFn = Arc<dyn Fn(Box<dyn Any + Send + Sync>) + Send + Sync>;

struct Descriptor {
    owner: String,
    name: String,
    kind: ExtensibleKind,
    release: Option<ReleaseFn>,
}

/// Public view of a registered descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorInfo {
    pub id: ExtId,
    pub owner: String,
    pub name: String,
    pub kind: ExtensibleKind,
}

/// Owns every live descriptor. Lives in the `Matrix`.
#[derive(Default)]
pub struct ExtensionManager {
    next_id: u64,
    descriptors: HashMap<ExtId, Descriptor>,
    names: HashMap<(ExtensibleKind, String), ExtId>,
}

impl ExtensionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor with no release action.
    pub fn register<T: Any + Send + Sync>(
        &mut self,
        owner: &str,
        kind: ExtensibleKind,
        name: &str,
    ) -> Result<ExtItem<T>, ExtError> {
        self.insert(owner, kind, name, None)
    }

    /// Register a descriptor whose `release` runs on every value that is
    /// unset, replaced, or purged.
    pub fn register_with_release<T, F>(
        &mut self,
        owner: &str,
        kind: ExtensibleKind,
        name: &str,
        release: F,
    ) -> Result<ExtItem<T>, ExtError>
    where
        T: Any + Send + Sync,
        F: Fn(T) + Send + Sync + 'static,
    {
        let erased: ReleaseFn = Arc::new(move |value: Box<dyn Any + Send + Sync>| {
            if let Ok(value) = value.downcast::<T>() {
                release(*value);
            }
        });
        self.insert(owner, kind, name, Some(erased))
    }

    fn insert<T: Any + Send + Sync>(
        &mut self,
        owner: &str,
        kind: ExtensibleKind,
        name: &str,
        release: Option<ReleaseFn>,
    ) -> Result<ExtItem<T>, ExtError> {
        let key = (kind, name.to_string());
        if self.names.contains_key(&key) {
            return Err(ExtError::DuplicateDescriptor {
                kind,
                name: name.to_string(),
            });
        }

        self.next_id += 1;
        let id = ExtId(self.next_id);
        self.descriptors.insert(
            id,
            Descriptor {
                owner: owner.to_string(),
                name: name.to_string(),
                kind,
                release,
            },
        );
        self.names.insert(key, id);
        debug!(owner = %owner, kind = %kind, name = %name, "Registered extension item");

        Ok(ExtItem::new(id, kind, name))
    }

    /// Look a descriptor up by name.
    pub fn find(&self, kind: ExtensibleKind, name: &str) -> Option<DescriptorInfo> {
        let id = *self.names.get(&(kind, name.to_string()))?;
        self.info(id)
    }

    pub fn info(&self, id: ExtId) -> Option<DescriptorInfo> {
        self.descriptors.get(&id).map(|d| DescriptorInfo {
            id,
            owner: d.owner.clone(),
            name: d.name.clone(),
            kind: d.kind,
        })
    }

    /// Ids of every descriptor registered by `owner`.
    pub fn owned_by(&self, owner: &str) -> Vec<ExtId> {
        let mut ids: Vec<ExtId> = self
            .descriptors
            .iter()
            .filter(|(_, d)| d.owner == owner)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Drop every descriptor registered by `owner`.
    ///
    /// Callers must purge stored values first, while release actions are
    /// still reachable.
    pub fn unregister_owner(&mut self, owner: &str) -> usize {
        let ids = self.owned_by(owner);
        for id in &ids {
            if let Some(d) = self.descriptors.remove(id) {
                self.names.remove(&(d.kind, d.name));
            }
        }
        ids.len()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Validate a handle against the live registry and the object's kind.
    pub(crate) fn check(&self, id: ExtId, name: &str, found: ExtensibleKind) -> Result<(), ExtError> {
        let d = self
            .descriptors
            .get(&id)
            .ok_or_else(|| ExtError::UnknownDescriptor(name.to_string()))?;
        if d.kind != found {
            return Err(ExtError::WrongTarget {
                name: name.to_string(),
                expected: d.kind,
                found,
            });
        }
        Ok(())
    }

    /// Run the release action for a value leaving the store.
    pub(crate) fn release(&self, id: ExtId, value: Box<dyn Any + Send + Sync>) {
        match self.descriptors.get(&id).and_then(|d| d.release.as_ref()) {
            Some(release) => release(value),
            None => drop(value),
        }
    }
}
