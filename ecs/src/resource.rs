use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::error::EcsError;

/// A single type-erased resource with per-resource borrow tracking.
struct ResourceEntry {
    value: RwLock<Box<dyn Any>>,
    type_name: &'static str,
}

/// Container for typed singleton resources.
///
/// Exactly zero or one value per type. Exclusive access through `&mut self`
/// needs no bookkeeping; shared access through `&self` hands out
/// [`ResourceRef`] / [`ResourceRefMut`] guards so a subsystem can hold several
/// resources at once. Conflicting guards are reported as
/// [`EcsError::ResourceBorrowed`] instead of blocking.
///
/// Resources are dropped in reverse registration order.
pub(crate) struct Resources {
    entries: HashMap<TypeId, ResourceEntry>,
    order: Vec<TypeId>,
}

impl Resources {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Stores `value` as the resource of type `T`.
    pub fn insert<T: 'static>(&mut self, value: T) -> Result<&mut T, EcsError> {
        let id = TypeId::of::<T>();
        if self.entries.contains_key(&id) {
            return Err(EcsError::AlreadyRegistered(type_name::<T>()));
        }
        self.entries.insert(
            id,
            ResourceEntry {
                value: RwLock::new(Box::new(value)),
                type_name: type_name::<T>(),
            },
        );
        self.order.push(id);
        self.get_mut::<T>()
    }

    /// Removes the resource of type T, returning it if present.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        let id = TypeId::of::<T>();
        let entry = self.entries.remove(&id)?;
        self.order.retain(|other| *other != id);
        entry.value.into_inner().downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Returns whether a resource of type T exists.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Unchecked exclusive access; `&mut self` rules out live guards.
    pub fn get_mut<T: 'static>(&mut self) -> Result<&mut T, EcsError> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|entry| entry.value.get_mut().downcast_mut::<T>())
            .ok_or(EcsError::MissingResource(type_name::<T>()))
    }

    /// Borrows a resource of type T immutably.
    pub fn borrow<T: 'static>(&self) -> Result<ResourceRef<'_, T>, EcsError> {
        let entry = self.entry::<T>()?;
        let guard = entry
            .value
            .try_read()
            .ok_or(EcsError::ResourceBorrowed(entry.type_name))?;
        RwLockReadGuard::try_map(guard, |value| value.downcast_ref::<T>())
            .map(|guard| ResourceRef { guard })
            .map_err(|_| EcsError::MissingResource(type_name::<T>()))
    }

    /// Borrows a resource of type T mutably.
    pub fn borrow_mut<T: 'static>(&self) -> Result<ResourceRefMut<'_, T>, EcsError> {
        let entry = self.entry::<T>()?;
        let guard = entry
            .value
            .try_write()
            .ok_or(EcsError::ResourceBorrowed(entry.type_name))?;
        RwLockWriteGuard::try_map(guard, |value| value.downcast_mut::<T>())
            .map(|guard| ResourceRefMut { guard })
            .map_err(|_| EcsError::MissingResource(type_name::<T>()))
    }

    fn entry<T: 'static>(&self) -> Result<&ResourceEntry, EcsError> {
        self.entries
            .get(&TypeId::of::<T>())
            .ok_or(EcsError::MissingResource(type_name::<T>()))
    }

    /// Drops every resource, most recently registered first.
    pub fn clear(&mut self) {
        while let Some(id) = self.order.pop() {
            self.entries.remove(&id);
        }
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Resources {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Shared borrow of a resource.
///
/// Automatically releases the borrow when dropped.
pub struct ResourceRef<'a, T: 'static> {
    guard: MappedRwLockReadGuard<'a, T>,
}

impl<T: 'static> Deref for ResourceRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Exclusive borrow of a resource.
///
/// Automatically releases the borrow when dropped.
pub struct ResourceRefMut<'a, T: 'static> {
    guard: MappedRwLockWriteGuard<'a, T>,
}

impl<T: 'static> Deref for ResourceRefMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T: 'static> DerefMut for ResourceRefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
