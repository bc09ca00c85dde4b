use std::fmt;

/// A generational entity identifier.
///
/// Layout: `u32 index` + `u32 generation`.
///
/// - **index**: slot in the entity allocator
/// - **generation**: bumped every time the slot is freed, so a recycled index
///   never aliases a stale handle
///
/// [`Entity::NULL`] compares unequal to every entity the allocator hands out.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// The reserved null handle.
    pub const NULL: Entity = Entity {
        index: u32::MAX,
        generation: u32::MAX,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the generation of this entity.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Whether this is [`Entity::NULL`].
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Packs the handle into a single integer (`generation << 32 | index`).
    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    /// Inverse of [`to_bits`](Self::to_bits).
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

/// `{index}v{generation}`, used to derive per-entity resource ids.
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null_entity")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

/// Allocates and recycles entity slots.
///
/// When an entity is destroyed its slot goes on a free list and its
/// generation is bumped. The next allocation reuses the most recently freed
/// slot (LIFO), which keeps construction histories reproducible.
pub(crate) struct EntityAllocator {
    /// Current generation of each slot. Index = entity index.
    generations: Vec<u32>,
    /// Alive flag per slot.
    alive: Vec<bool>,
    /// Free list of recyclable indices (LIFO stack).
    free_list: Vec<u32>,
    /// Total number of currently alive entities.
    count: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            count: 0,
        }
    }

    /// Allocates a new entity, reusing a recycled slot if available.
    pub fn allocate(&mut self) -> Entity {
        self.count += 1;

        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            self.alive[idx] = true;
            Entity::new(index, self.generations[idx])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            Entity::new(index, 0)
        }
    }

    /// Frees an entity. Returns false if it was already dead or stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.index() as usize;
        self.alive[idx] = false;
        // Reserve u32::MAX for the null handle.
        self.generations[idx] = match self.generations[idx].wrapping_add(1) {
            u32::MAX => 0,
            next => next,
        };
        self.free_list.push(entity.index());
        self.count -= 1;
        true
    }

    /// Returns whether the entity is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index() as usize;
        idx < self.alive.len() && self.alive[idx] && self.generations[idx] == entity.generation()
    }

    /// Returns the number of alive entities.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Iterates over all currently alive entities in index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| Entity::new(idx as u32, self.generations[idx]))
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();

        assert_eq!(e0.index(), 0);
        assert_eq!(e1.index(), 1);
        assert_eq!(e2.index(), 2);
        assert_eq!(e0.generation(), 0);
    }

    #[test]
    fn deallocate_makes_dead() {
        let mut alloc = EntityAllocator::new();
        let entity = alloc.allocate();
        assert!(alloc.is_alive(entity));
        assert!(alloc.deallocate(entity));
        assert!(!alloc.is_alive(entity));
        // Deallocating again returns false
        assert!(!alloc.deallocate(entity));
    }

    #[test]
    fn recycled_slot_new_generation() {
        let mut alloc = EntityAllocator::new();
        let old = alloc.allocate();
        alloc.deallocate(old);
        let new = alloc.allocate();

        assert_eq!(new.index(), old.index()); // Same slot
        assert_eq!(new.generation(), 1);
        assert_ne!(old, new);
        assert!(!alloc.is_alive(old));
        assert!(alloc.is_alive(new));
    }

    #[test]
    fn free_list_is_lifo() {
        let mut alloc = EntityAllocator::new();
        let entities: Vec<_> = (0..3).map(|_| alloc.allocate()).collect();
        alloc.deallocate(entities[0]);
        alloc.deallocate(entities[2]);
        assert_eq!(alloc.allocate().index(), 2);
        assert_eq!(alloc.allocate().index(), 0);
    }

    #[test]
    fn count_tracks_alive() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.count(), 0);

        let e0 = alloc.allocate();
        let _e1 = alloc.allocate();
        assert_eq!(alloc.count(), 2);

        alloc.deallocate(e0);
        assert_eq!(alloc.count(), 1);
    }

    #[test]
    fn iter_alive_correctness() {
        let mut alloc = EntityAllocator::new();
        let entities: Vec<_> = (0..5).map(|_| alloc.allocate()).collect();

        alloc.deallocate(entities[1]);
        alloc.deallocate(entities[3]);

        let alive: Vec<_> = alloc.iter_alive().collect();
        assert_eq!(alive, vec![entities[0], entities[2], entities[4]]);
    }

    #[test]
    fn null_is_never_alive() {
        let mut alloc = EntityAllocator::new();
        let _ = alloc.allocate();
        assert!(!alloc.is_alive(Entity::NULL));
        assert!(Entity::default().is_null());
    }

    #[test]
    fn display_format() {
        let entity = Entity::new(42, 3);
        assert_eq!(format!("{:?}", entity), "Entity(42v3)");
        assert_eq!(format!("{}", entity), "42v3");
        assert_eq!(Entity::NULL.to_string(), "null_entity");
    }

    #[test]
    fn bits_roundtrip() {
        let entity = Entity::new(7, 9);
        assert_eq!(Entity::from_bits(entity.to_bits()), entity);
    }
}
