use std::any::Any;

use crate::entity::Entity;

/// Typed sparse set storing components of type T.
///
/// Uses a sparse array (entity index → dense index) and a dense array
/// (contiguous component data + owning entity) for O(1) insert/remove/get
/// and cache-friendly iteration. Removal swaps the last element into the
/// hole, so dense order depends only on the insert/remove history.
pub struct SparseSet<T: 'static> {
    /// Sparse array: `entity_index -> dense_index`. `None` means the entity
    /// does not have this component.
    sparse: Vec<Option<u32>>,
    /// Dense array of component values (contiguous for iteration).
    dense: Vec<T>,
    /// Entities corresponding to each dense element.
    entities: Vec<Entity>,
}

impl<T: 'static> SparseSet<T> {
    /// Creates a new empty sparse set.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Inserts a component for the given entity.
    /// If the entity already has this component, the value is replaced.
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        let idx = entity.index() as usize;

        // Grow sparse array if needed
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }

        let di = match self.sparse[idx] {
            Some(dense_idx) => {
                let di = dense_idx as usize;
                self.dense[di] = value;
                self.entities[di] = entity;
                di
            }
            None => {
                let di = self.dense.len();
                self.sparse[idx] = Some(di as u32);
                self.dense.push(value);
                self.entities.push(entity);
                di
            }
        };
        &mut self.dense[di]
    }

    /// Removes a component for the given entity index.
    /// Returns the removed value, or `None` if the entity did not have this component.
    pub fn remove(&mut self, entity_index: u32) -> Option<T> {
        let idx = entity_index as usize;
        let dense_idx = (*self.sparse.get(idx)?)? as usize;
        self.sparse[idx] = None;

        let last_dense = self.dense.len() - 1;
        if dense_idx != last_dense {
            // Swap-remove: move last element into the removed slot
            let swapped = self.entities[last_dense];
            self.sparse[swapped.index() as usize] = Some(dense_idx as u32);
        }

        self.entities.swap_remove(dense_idx);
        Some(self.dense.swap_remove(dense_idx))
    }

    /// Returns a reference to the component for the given entity index.
    pub fn get(&self, entity_index: u32) -> Option<&T> {
        let dense_idx = (*self.sparse.get(entity_index as usize)?)? as usize;
        Some(&self.dense[dense_idx])
    }

    /// Returns a mutable reference to the component for the given entity index.
    pub fn get_mut(&mut self, entity_index: u32) -> Option<&mut T> {
        let dense_idx = (*self.sparse.get(entity_index as usize)?)? as usize;
        Some(&mut self.dense[dense_idx])
    }

    /// Returns whether the entity has this component.
    pub fn contains(&self, entity_index: u32) -> bool {
        matches!(self.sparse.get(entity_index as usize), Some(Some(_)))
    }

    /// Returns the number of components stored.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns whether this sparse set is empty.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Iterates over `(entity, &component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterates over `(entity, &mut component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Returns the owning entities in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns a mutable pointer to the component for the given entity index.
    ///
    /// # Safety
    ///
    /// - `this` must be a valid, properly aligned pointer to an initialized
    ///   `SparseSet<T>` that nothing else accesses for the pointer's lifetime.
    /// - The caller must ensure no other reference to the same dense slot
    ///   exists while the returned pointer is used.
    pub(crate) unsafe fn get_ptr_mut(this: *mut Self, entity_index: u32) -> Option<*mut T> {
        // SAFETY: caller guarantees `this` is valid and exclusively accessed.
        unsafe {
            let set = &mut *this;
            let dense_idx = (*set.sparse.get(entity_index as usize)?)? as usize;
            Some(set.dense.as_mut_ptr().add(dense_idx))
        }
    }
}

impl<T: 'static> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Type-erased operation function signatures
type RemoveFn = fn(&mut dyn Any, u32) -> bool;
type ContainsFn = fn(&dyn Any, u32) -> bool;
type EntitiesFn = fn(&dyn Any) -> &[Entity];

/// A type-erased sparse set that stores components of a single type.
///
/// Used internally by [`Registry`](crate::Registry) for operations that only
/// know the component's `TypeId` (entity destruction, temporary sweeps).
pub(crate) struct ComponentStorage {
    inner: Box<dyn Any>,
    /// Human-readable type name for error messages.
    type_name: &'static str,
    remove_fn: RemoveFn,
    contains_fn: ContainsFn,
    entities_fn: EntitiesFn,
}

impl ComponentStorage {
    /// Creates a new component storage for type `T`.
    pub fn new<T: 'static>() -> Self {
        Self {
            inner: Box::new(SparseSet::<T>::new()),
            type_name: std::any::type_name::<T>(),
            remove_fn: |any, entity_index| {
                any.downcast_mut::<SparseSet<T>>()
                    .is_some_and(|set| set.remove(entity_index).is_some())
            },
            contains_fn: |any, entity_index| {
                any.downcast_ref::<SparseSet<T>>()
                    .is_some_and(|set| set.contains(entity_index))
            },
            entities_fn: |any| {
                any.downcast_ref::<SparseSet<T>>()
                    .map(|set| set.entities())
                    .unwrap_or_default()
            },
        }
    }

    /// Downcasts to the typed sparse set.
    pub fn typed<T: 'static>(&self) -> Option<&SparseSet<T>> {
        self.inner.downcast_ref::<SparseSet<T>>()
    }

    /// Downcasts to the typed sparse set (mutable).
    pub fn typed_mut<T: 'static>(&mut self) -> Option<&mut SparseSet<T>> {
        self.inner.downcast_mut::<SparseSet<T>>()
    }

    /// Returns the human-readable type name of the stored component.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Removes a component by entity index (type-erased). Returns true if removed.
    pub fn remove_untyped(&mut self, entity_index: u32) -> bool {
        (self.remove_fn)(self.inner.as_mut(), entity_index)
    }

    /// Checks if the entity has this component (type-erased).
    pub fn contains_untyped(&self, entity_index: u32) -> bool {
        (self.contains_fn)(self.inner.as_ref(), entity_index)
    }

    /// Owning entities in dense order (type-erased).
    pub fn entities(&self) -> &[Entity] {
        (self.entities_fn)(self.inner.as_ref())
    }
}
