//! Insertion-ordered keyed cache.
//!
//! [`ResourceManager<T>`] owns values addressed by [`HashedStr`]. It is the
//! storage behind every named GPU object (shaders, textures, samplers, bind
//! groups, buffers, render graphs). Iteration follows insertion order and a
//! removal keeps the relative order of the remaining entries.
//!
//! The manager is not thread-safe; callers serialize through the engine core.

use std::collections::HashMap;

use crate::HashedStr;

/// Errors returned by [`ResourceManager`] lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceManagerError {
    /// No value under the key and no default to fall back on.
    #[error("Resource with id {0} not found.")]
    NotFound(String),
}

/// Keyed cache of owned `T` values with an optional fallback default.
pub struct ResourceManager<T> {
    entries: Vec<(HashedStr, T)>,
    index: HashMap<u32, usize>,
    default_value: Option<T>,
}

impl<T> ResourceManager<T> {
    /// Creates an empty manager without a default.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            default_value: None,
        }
    }

    /// Stores `value` under `id` and returns a reference to it.
    ///
    /// A present key (including a hash collision with a different text) is
    /// overwritten with a warning.
    pub fn add(&mut self, id: impl Into<HashedStr>, value: T) -> &mut T {
        let id = id.into();
        let hash = id.value();
        self.insert(id, value);
        let slot = self.index[&hash];
        &mut self.entries[slot].1
    }

    /// Stores `value` under `id`, returning the value it replaced.
    pub fn insert(&mut self, id: impl Into<HashedStr>, value: T) -> Option<T> {
        let id = id.into();
        match self.index.get(&id.value()) {
            Some(&slot) => {
                let (stored_id, stored) = &mut self.entries[slot];
                if stored_id.as_str() == id.as_str() {
                    log::warn!("Resource with id {id} already exists. Overwriting.");
                } else {
                    log::warn!(
                        "Resource with id {id} collides with {stored_id} ({:#010x}). Overwriting.",
                        id.value()
                    );
                }
                *stored_id = id;
                Some(std::mem::replace(stored, value))
            }
            None => {
                self.index.insert(id.value(), self.entries.len());
                self.entries.push((id, value));
                None
            }
        }
    }

    /// Returns the value stored under `id`.
    ///
    /// # Errors
    ///
    /// [`ResourceManagerError::NotFound`] when `id` is absent.
    pub fn get(&self, id: impl Into<HashedStr>) -> Result<&T, ResourceManagerError> {
        let id = id.into();
        match self.index.get(&id.value()) {
            Some(&slot) => Ok(&self.entries[slot].1),
            None => Err(not_found(&id)),
        }
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, id: impl Into<HashedStr>) -> Result<&mut T, ResourceManagerError> {
        let id = id.into();
        match self.index.get(&id.value()) {
            Some(&slot) => Ok(&mut self.entries[slot].1),
            None => Err(not_found(&id)),
        }
    }

    /// Returns the value stored under `id`, without logging a miss.
    pub fn try_get(&self, id: impl Into<HashedStr>) -> Option<&T> {
        let slot = *self.index.get(&id.into().value())?;
        Some(&self.entries[slot].1)
    }

    /// Mutable variant of [`try_get`](Self::try_get).
    pub fn try_get_mut(&mut self, id: impl Into<HashedStr>) -> Option<&mut T> {
        let slot = *self.index.get(&id.into().value())?;
        Some(&mut self.entries[slot].1)
    }

    /// Returns the value under `id`, or the default when `id` is absent.
    ///
    /// # Errors
    ///
    /// [`ResourceManagerError::NotFound`] when `id` is absent and no default
    /// is set.
    pub fn get_or_default(&self, id: impl Into<HashedStr>) -> Result<&T, ResourceManagerError> {
        let id = id.into();
        if let Some(&slot) = self.index.get(&id.value()) {
            return Ok(&self.entries[slot].1);
        }
        self.default_value.as_ref().ok_or_else(|| not_found(&id))
    }

    /// Mutable variant of [`get_or_default`](Self::get_or_default).
    pub fn get_or_default_mut(
        &mut self,
        id: impl Into<HashedStr>,
    ) -> Result<&mut T, ResourceManagerError> {
        let id = id.into();
        if let Some(&slot) = self.index.get(&id.value()) {
            return Ok(&mut self.entries[slot].1);
        }
        self.default_value.as_mut().ok_or_else(|| not_found(&id))
    }

    /// Replaces the fallback value.
    pub fn set_default(&mut self, value: T) {
        self.default_value = Some(value);
    }

    /// Whether a fallback value is set.
    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }

    /// The fallback value, if any.
    pub fn default_value(&self) -> Option<&T> {
        self.default_value.as_ref()
    }

    /// Removes the value under `id`; absent keys are ignored.
    pub fn remove(&mut self, id: impl Into<HashedStr>) -> Option<T> {
        let id = id.into();
        let slot = self.index.remove(&id.value())?;
        let (_, value) = self.entries.remove(slot);
        for later in &self.entries[slot..] {
            if let Some(position) = self.index.get_mut(&later.0.value()) {
                *position -= 1;
            }
        }
        Some(value)
    }

    /// Whether `id` has a value (the default does not count).
    pub fn contains(&self, id: impl Into<HashedStr>) -> bool {
        self.index.contains_key(&id.into().value())
    }

    /// Number of stored values, excluding the default.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no value is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(id, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&HashedStr, &T)> {
        self.entries.iter().map(|(id, value)| (id, value))
    }

    /// Mutable iteration in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&HashedStr, &mut T)> {
        self.entries.iter_mut().map(|(id, value)| (&*id, value))
    }

    /// Keys in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &HashedStr> {
        self.entries.iter().map(|(id, _)| id)
    }

    /// Drops every stored value. The default is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl<T> Default for ResourceManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ResourceManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("entries", &self.entries)
            .field("default_value", &self.default_value)
            .finish()
    }
}

fn not_found(id: &HashedStr) -> ResourceManagerError {
    log::error!("Resource with id {id} not found.");
    ResourceManagerError::NotFound(id.as_str().to_owned())
}
