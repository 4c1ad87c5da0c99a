//! Typed descriptor handle.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{ExtId, Extensible, ExtensibleKind, ExtensionManager};
use crate::error::ExtError;

/// Handle to one registered descriptor carrying values of type `T`.
///
/// Every operation re-validates the handle, so use after the owning
/// extension unloads fails with [`ExtError::UnknownDescriptor`].
pub struct ExtItem<T> {
    id: ExtId,
    kind: ExtensibleKind,
    name: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ExtItem<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            name: Arc::clone(&self.name),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for ExtItem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtItem")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

impl<T: Any + Send + Sync> ExtItem<T> {
    pub(crate) fn new(id: ExtId, kind: ExtensibleKind, name: &str) -> Self {
        Self {
            id,
            kind,
            name: Arc::from(name),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn id(&self) -> ExtId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> ExtensibleKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get<'a>(
        &self,
        manager: &ExtensionManager,
        obj: &'a Extensible,
    ) -> Result<Option<&'a T>, ExtError> {
        manager.check(self.id, &self.name, obj.kind())?;
        match obj.get_raw(self.id) {
            Some(raw) => raw
                .downcast_ref::<T>()
                .map(Some)
                .ok_or_else(|| ExtError::TypeMismatch(self.name.to_string())),
            None => Ok(None),
        }
    }

    pub fn get_mut<'a>(
        &self,
        manager: &ExtensionManager,
        obj: &'a mut Extensible,
    ) -> Result<Option<&'a mut T>, ExtError> {
        manager.check(self.id, &self.name, obj.kind())?;
        match obj.get_raw_mut(self.id) {
            Some(raw) => raw
                .downcast_mut::<T>()
                .map(Some)
                .ok_or_else(|| ExtError::TypeMismatch(self.name.to_string())),
            None => Ok(None),
        }
    }

    /// Store `value`, returning true if a previous value was replaced.
    ///
    /// The replaced value goes through the descriptor's release action.
    pub fn set(
        &self,
        manager: &ExtensionManager,
        obj: &mut Extensible,
        value: T,
    ) -> Result<bool, ExtError> {
        manager.check(self.id, &self.name, obj.kind())?;
        match obj.insert_raw(self.id, Box::new(value)) {
            Some(old) => {
                manager.release(self.id, old);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the value, returning true if one was present.
    pub fn unset(&self, manager: &ExtensionManager, obj: &mut Extensible) -> Result<bool, ExtError> {
        manager.check(self.id, &self.name, obj.kind())?;
        match obj.remove_raw(self.id) {
            Some(old) => {
                manager.release(self.id, old);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn set_get_unset() {
        let mut m = ExtensionManager::new();
        let item = m.register::<u32>("test", ExtensibleKind::Channel, "count").unwrap();
        let mut chan = Extensible::new(ExtensibleKind::Channel);

        assert_eq!(item.get(&m, &chan).unwrap(), None);
        assert!(!item.set(&m, &mut chan, 1).unwrap());
        assert!(item.set(&m, &mut chan, 2).unwrap());
        *item.get_mut(&m, &mut chan).unwrap().unwrap() += 1;
        assert_eq!(item.get(&m, &chan).unwrap(), Some(&3));
        assert!(item.unset(&m, &mut chan).unwrap());
        assert!(!item.unset(&m, &mut chan).unwrap());
    }

    #[test]
    fn wrong_target_kind() {
        let mut m = ExtensionManager::new();
        let item = m.register::<u32>("test", ExtensibleKind::User, "count").unwrap();
        let mut chan = Extensible::new(ExtensibleKind::Channel);
        assert!(matches!(
            item.set(&m, &mut chan, 1),
            Err(ExtError::WrongTarget { .. })
        ));
    }

    #[test]
    fn stale_handle_fails_loudly() {
        let mut m = ExtensionManager::new();
        let item = m.register::<u32>("gone", ExtensibleKind::User, "x").unwrap();
        let mut user = Extensible::new(ExtensibleKind::User);
        item.set(&m, &mut user, 7).unwrap();

        user.purge(&m.owned_by("gone"), &m);
        m.unregister_owner("gone");

        assert_eq!(
            item.get(&m, &user),
            Err(ExtError::UnknownDescriptor("x".to_string()))
        );
        assert!(user.is_empty());
    }

    #[test]
    fn release_runs_on_replace_unset_and_unset_all() {
        static RELEASED: AtomicUsize = AtomicUsize::new(0);

        let mut m = ExtensionManager::new();
        let item = m
            .register_with_release::<String, _>("t", ExtensibleKind::User, "r", |_| {
                RELEASED.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let mut user = Extensible::new(ExtensibleKind::User);

        item.set(&m, &mut user, "a".into()).unwrap();
        item.set(&m, &mut user, "b".into()).unwrap();
        assert_eq!(RELEASED.load(Ordering::SeqCst), 1);
        item.unset(&m, &mut user).unwrap();
        assert_eq!(RELEASED.load(Ordering::SeqCst), 2);
        item.set(&m, &mut user, "c".into()).unwrap();
        user.unset_all(&m);
        assert_eq!(RELEASED.load(Ordering::SeqCst), 3);
        assert!(user.is_empty());
    }
}
