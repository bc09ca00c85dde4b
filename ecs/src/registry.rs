//! Entity registry: entity allocation plus one sparse set per component type.

use std::any::{TypeId, type_name};
use std::collections::HashMap;

use crate::entity::{Entity, EntityAllocator};
use crate::error::EcsError;
use crate::sparse_set::{ComponentStorage, SparseSet};

/// Owns every entity and component of a [`Core`](crate::Core).
///
/// Storages are created lazily the first time a component type is inserted
/// and are kept in creation order, which makes every iteration order a pure
/// function of the construction history.
///
/// The registry itself never fires hooks; the core wraps the structural
/// operations that need them.
pub struct Registry {
    entities: EntityAllocator,
    storages: Vec<ComponentStorage>,
    type_ids: Vec<TypeId>,
    storage_index: HashMap<TypeId, usize>,
    temporary: Vec<TypeId>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            storages: Vec::new(),
            type_ids: Vec::new(),
            storage_index: HashMap::new(),
            temporary: Vec::new(),
        }
    }

    // ---- Entities ----

    /// Allocates an entity with no components.
    pub fn create(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Whether `entity` is alive in this registry.
    pub fn valid(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn len(&self) -> usize {
        self.entities.count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.entities.count() == 0
    }

    /// Alive entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    /// Strips every component and frees the slot.
    pub(crate) fn destroy(&mut self, entity: Entity) -> bool {
        if !self.valid(entity) {
            return false;
        }
        for storage in &mut self.storages {
            storage.remove_untyped(entity.index());
        }
        self.entities.deallocate(entity)
    }

    /// Component types attached to `entity`, in storage creation order.
    pub(crate) fn component_types(&self, entity: Entity) -> Vec<TypeId> {
        if !self.valid(entity) {
            return Vec::new();
        }
        self.storages
            .iter()
            .zip(&self.type_ids)
            .filter(|(storage, _)| storage.contains_untyped(entity.index()))
            .map(|(_, id)| *id)
            .collect()
    }

    pub(crate) fn contains_by_type(&self, entity: Entity, type_id: TypeId) -> bool {
        self.valid(entity)
            && self
                .storage_index
                .get(&type_id)
                .is_some_and(|&slot| self.storages[slot].contains_untyped(entity.index()))
    }

    pub(crate) fn remove_by_type(&mut self, entity: Entity, type_id: TypeId) -> bool {
        if !self.valid(entity) {
            return false;
        }
        match self.storage_index.get(&type_id) {
            Some(&slot) => self.storages[slot].remove_untyped(entity.index()),
            None => false,
        }
    }

    /// Entities carrying a component of `type_id`, in dense order.
    pub(crate) fn entities_with(&self, type_id: TypeId) -> Vec<Entity> {
        self.storage_index
            .get(&type_id)
            .map(|&slot| self.storages[slot].entities().to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn type_name_of(&self, type_id: TypeId) -> &'static str {
        self.storage_index
            .get(&type_id)
            .map_or("<unregistered component>", |&slot| {
                self.storages[slot].type_name()
            })
    }

    // ---- Components ----

    /// Attaches `value` to `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::DeadEntity`] for a stale handle, [`EcsError::AlreadyAttached`]
    /// when the entity already has a `C`.
    pub fn insert<C: 'static>(&mut self, entity: Entity, value: C) -> Result<&mut C, EcsError> {
        if !self.valid(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        if self.has::<C>(entity) {
            return Err(EcsError::AlreadyAttached {
                entity,
                component: type_name::<C>(),
            });
        }
        let set = self.storage_or_insert::<C>()?;
        Ok(set.insert(entity, value))
    }

    /// Whether `entity` carries a `C`.
    pub fn has<C: 'static>(&self, entity: Entity) -> bool {
        self.valid(entity)
            && self
                .storage::<C>()
                .is_some_and(|set| set.contains(entity.index()))
    }

    /// Whether `entity` carries every component of the set.
    pub fn all_of<Q: ComponentSet>(&self, entity: Entity) -> bool {
        self.valid(entity) && Q::fetch(self, entity).is_some()
    }

    pub fn try_get<C: 'static>(&self, entity: Entity) -> Option<&C> {
        if !self.valid(entity) {
            return None;
        }
        self.storage::<C>()?.get(entity.index())
    }

    pub fn try_get_mut<C: 'static>(&mut self, entity: Entity) -> Option<&mut C> {
        if !self.valid(entity) {
            return None;
        }
        self.storage_mut::<C>()?.get_mut(entity.index())
    }

    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] when `entity` has no `C`.
    pub fn get<C: 'static>(&self, entity: Entity) -> Result<&C, EcsError> {
        self.try_get::<C>(entity)
            .ok_or_else(|| missing_component::<C>(entity))
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut<C: 'static>(&mut self, entity: Entity) -> Result<&mut C, EcsError> {
        self.try_get_mut::<C>(entity)
            .ok_or_else(|| missing_component::<C>(entity))
    }

    /// Detaches and returns the `C` of `entity`; absent components are ignored.
    pub fn remove<C: 'static>(&mut self, entity: Entity) -> Option<C> {
        if !self.valid(entity) {
            return None;
        }
        self.storage_mut::<C>()?.remove(entity.index())
    }

    /// The storage for `C`, if any component of that type was ever inserted.
    pub fn storage<C: 'static>(&self) -> Option<&SparseSet<C>> {
        let slot = *self.storage_index.get(&TypeId::of::<C>())?;
        self.storages[slot].typed::<C>()
    }

    fn storage_mut<C: 'static>(&mut self) -> Option<&mut SparseSet<C>> {
        let slot = *self.storage_index.get(&TypeId::of::<C>())?;
        self.storages[slot].typed_mut::<C>()
    }

    fn storage_or_insert<C: 'static>(&mut self) -> Result<&mut SparseSet<C>, EcsError> {
        let type_id = TypeId::of::<C>();
        let slot = match self.storage_index.get(&type_id) {
            Some(&slot) => slot,
            None => {
                let slot = self.storages.len();
                self.storages.push(ComponentStorage::new::<C>());
                self.type_ids.push(type_id);
                self.storage_index.insert(type_id, slot);
                slot
            }
        };
        self.storages[slot].typed_mut::<C>().ok_or_else(|| {
            EcsError::Configuration(format!(
                "storage for `{}` holds another type",
                type_name::<C>()
            ))
        })
    }

    // ---- Iteration ----

    /// Every `C` in dense order.
    pub fn iter<C: 'static>(&self) -> impl Iterator<Item = (Entity, &C)> + '_ {
        self.storage::<C>().into_iter().flat_map(|set| set.iter())
    }

    /// Mutable variant of [`iter`](Self::iter).
    pub fn iter_mut<C: 'static>(&mut self) -> impl Iterator<Item = (Entity, &mut C)> + '_ {
        self.storage_mut::<C>()
            .into_iter()
            .flat_map(|set| set.iter_mut())
    }

    /// Entities carrying every component of `Q`, with shared references.
    ///
    /// Iterates the smallest storage of the set in dense order (the first one
    /// on ties), so the sequence only depends on the construction history.
    /// Structural changes are impossible while the view borrows the registry.
    ///
    /// ```
    /// # use squared_ecs::Registry;
    /// let mut registry = Registry::new();
    /// let e = registry.create();
    /// registry.insert(e, 1u32).unwrap();
    /// registry.insert(e, 'x').unwrap();
    /// let seen: Vec<_> = registry.view::<(u32, char)>().map(|(_, (n, c))| (*n, *c)).collect();
    /// assert_eq!(seen, vec![(1, 'x')]);
    /// ```
    pub fn view<Q: ComponentSet>(&self) -> impl Iterator<Item = (Entity, Q::Item<'_>)> + '_ {
        let driver = self.driver(&Q::type_ids());
        driver
            .iter()
            .filter_map(move |&entity| Q::fetch(self, entity).map(|item| (entity, item)))
    }

    /// Visits every entity carrying all of `Q` with mutable references.
    ///
    /// # Errors
    ///
    /// [`EcsError::AliasedComponent`] without visiting anything if `Q` names
    /// the same component type twice.
    pub fn for_each_mut<Q: ComponentSet>(
        &mut self,
        mut f: impl FnMut(Entity, Q::ItemMut<'_>),
    ) -> Result<(), EcsError> {
        let ids = Q::type_ids();
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(EcsError::AliasedComponent(Q::type_names()[i]));
            }
        }

        let driver = self.driver(&ids).to_vec();
        let Some(ptrs) = Q::storage_ptrs(self) else {
            return Ok(());
        };
        for entity in driver {
            // SAFETY: the storages behind `ptrs` are pairwise distinct (checked
            // above) and `self` stays exclusively borrowed for the whole loop,
            // so the references handed to `f` are the only ones to those slots.
            if let Some(item) = unsafe { Q::fetch_mut(ptrs, entity.index()) } {
                f(entity, item);
            }
        }
        Ok(())
    }

    fn driver(&self, ids: &[TypeId]) -> &[Entity] {
        let mut best: Option<&[Entity]> = None;
        for id in ids {
            let Some(&slot) = self.storage_index.get(id) else {
                return &[];
            };
            let entities = self.storages[slot].entities();
            if best.is_none_or(|current| entities.len() < current.len()) {
                best = Some(entities);
            }
        }
        best.unwrap_or_default()
    }

    // ---- Temporary components ----

    pub(crate) fn mark_temporary<C: 'static>(&mut self) {
        let id = TypeId::of::<C>();
        if !self.temporary.contains(&id) {
            self.temporary.push(id);
        }
    }

    pub(crate) fn temporary_types(&self) -> Vec<TypeId> {
        self.temporary.clone()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_component<C>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: type_name::<C>(),
    }
}

/// A tuple of component types a view iterates over together.
///
/// Implemented for tuples of one to eight component types.
pub trait ComponentSet: 'static {
    /// Shared references to each component.
    type Item<'a>;
    /// Mutable references to each component.
    type ItemMut<'a>;
    #[doc(hidden)]
    type Ptrs: Copy;

    fn type_ids() -> Vec<TypeId>;
    fn type_names() -> Vec<&'static str>;
    fn fetch(registry: &Registry, entity: Entity) -> Option<Self::Item<'_>>;

    #[doc(hidden)]
    fn storage_ptrs(registry: &mut Registry) -> Option<Self::Ptrs>;

    /// # Safety
    ///
    /// The pointers must come from [`storage_ptrs`](Self::storage_ptrs) on a
    /// registry that is still exclusively borrowed, and must be distinct.
    #[doc(hidden)]
    unsafe fn fetch_mut<'a>(ptrs: Self::Ptrs, entity_index: u32) -> Option<Self::ItemMut<'a>>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: 'static),+> ComponentSet for ($($name,)+) {
            type Item<'a> = ($(&'a $name,)+);
            type ItemMut<'a> = ($(&'a mut $name,)+);
            type Ptrs = ($(*mut SparseSet<$name>,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(type_name::<$name>()),+]
            }

            fn fetch(registry: &Registry, entity: Entity) -> Option<Self::Item<'_>> {
                Some(($(registry.storage::<$name>()?.get(entity.index())?,)+))
            }

            fn storage_ptrs(registry: &mut Registry) -> Option<Self::Ptrs> {
                Some(($(registry.storage_mut::<$name>()? as *mut SparseSet<$name>,)+))
            }

            #[allow(non_snake_case)]
            unsafe fn fetch_mut<'a>(ptrs: Self::Ptrs, entity_index: u32) -> Option<Self::ItemMut<'a>> {
                let ($($name,)+) = ptrs;
                // SAFETY: forwarded from the caller's contract.
                unsafe {
                    Some(($(&mut *SparseSet::get_ptr_mut($name, entity_index)?,)+))
                }
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    #[derive(Debug, PartialEq)]
    struct Velocity(i32);
    struct Tag;

    #[test]
    fn insert_get_remove() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Position(1)).unwrap();

        assert!(registry.has::<Position>(e));
        assert_eq!(registry.get::<Position>(e).unwrap(), &Position(1));
        registry.get_mut::<Position>(e).unwrap().0 = 5;
        assert_eq!(registry.remove::<Position>(e), Some(Position(5)));
        assert_eq!(registry.remove::<Position>(e), None);
        assert!(matches!(
            registry.get::<Position>(e),
            Err(EcsError::MissingComponent { .. })
        ));
    }

    #[test]
    fn double_insert_is_rejected() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Position(1)).unwrap();
        let err = registry.insert(e, Position(2)).unwrap_err();
        assert!(matches!(err, EcsError::AlreadyAttached { entity, .. } if entity == e));
        assert_eq!(registry.get::<Position>(e).unwrap(), &Position(1));
    }

    #[test]
    fn dead_entity_rejects_components() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Position(1)).unwrap();
        assert!(registry.destroy(e));

        assert!(!registry.valid(e));
        assert!(matches!(
            registry.insert(e, Position(2)),
            Err(EcsError::DeadEntity(_))
        ));
        assert!(registry.try_get::<Position>(e).is_none());

        // The recycled slot does not inherit the old component.
        let reused = registry.create();
        assert_eq!(reused.index(), e.index());
        assert!(!registry.has::<Position>(reused));
    }

    #[test]
    fn null_entity_is_invalid() {
        let mut registry = Registry::new();
        registry.create();
        assert!(!registry.valid(Entity::NULL));
        assert!(registry.insert(Entity::NULL, Tag).is_err());
    }

    #[test]
    fn view_intersects_types() {
        let mut registry = Registry::new();
        let a = registry.create();
        let b = registry.create();
        let c = registry.create();
        registry.insert(a, Position(1)).unwrap();
        registry.insert(a, Velocity(10)).unwrap();
        registry.insert(b, Position(2)).unwrap();
        registry.insert(c, Position(3)).unwrap();
        registry.insert(c, Velocity(30)).unwrap();

        let seen: Vec<_> = registry
            .view::<(Position, Velocity)>()
            .map(|(e, (p, v))| (e, p.0, v.0))
            .collect();
        assert_eq!(seen, vec![(a, 1, 10), (c, 3, 30)]);
    }

    #[test]
    fn view_over_unknown_type_is_empty() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Position(1)).unwrap();
        assert_eq!(registry.view::<(Position, Tag)>().count(), 0);
    }

    #[test]
    fn view_order_is_reproducible() {
        fn build() -> Vec<Entity> {
            let mut registry = Registry::new();
            let entities: Vec<_> = (0..8).map(|_| registry.create()).collect();
            for (i, &e) in entities.iter().enumerate() {
                registry.insert(e, Position(i as i32)).unwrap();
                if i % 2 == 0 {
                    registry.insert(e, Velocity(0)).unwrap();
                }
            }
            registry.remove::<Velocity>(entities[2]);
            registry.destroy(entities[4]);
            let e = registry.create();
            registry.insert(e, Velocity(1)).unwrap();
            registry.insert(e, Position(99)).unwrap();
            registry
                .view::<(Velocity, Position)>()
                .map(|(e, _)| e)
                .collect()
        }
        assert_eq!(build(), build());
    }

    #[test]
    fn for_each_mut_updates() {
        let mut registry = Registry::new();
        for i in 0..3 {
            let e = registry.create();
            registry.insert(e, Position(i)).unwrap();
            registry.insert(e, Velocity(1)).unwrap();
        }
        registry.for_each_mut::<(Position, Velocity)>(|_, (p, v)| {
            p.0 += v.0;
            v.0 = 0;
        })
        .unwrap();
        let positions: Vec<_> = registry.iter::<Position>().map(|(_, p)| p.0).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(registry.iter::<Velocity>().all(|(_, v)| v.0 == 0));
    }

    #[test]
    fn for_each_mut_rejects_aliasing() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Position(0)).unwrap();
        let mut visited = 0;
        let err = registry
            .for_each_mut::<(Position, Position)>(|_, _| visited += 1)
            .unwrap_err();
        assert!(matches!(err, EcsError::AliasedComponent(name) if name.ends_with("Position")));
        assert_eq!(visited, 0);
    }

    #[test]
    fn all_of_checks_every_type() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Position(0)).unwrap();
        assert!(registry.all_of::<(Position,)>(e));
        assert!(!registry.all_of::<(Position, Velocity)>(e));
    }

    #[test]
    fn component_types_follow_storage_order() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.insert(e, Velocity(0)).unwrap();
        registry.insert(e, Position(0)).unwrap();
        assert_eq!(
            registry.component_types(e),
            vec![TypeId::of::<Velocity>(), TypeId::of::<Position>()]
        );
    }
}
