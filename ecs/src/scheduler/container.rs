use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use squared_core::topological_order;

use super::Scheduler;
use crate::error::EcsError;

type AsDynFn = fn(&mut dyn Any) -> Option<&mut dyn Scheduler>;
type AsDynRefFn = fn(&dyn Any) -> Option<&dyn Scheduler>;

/// A registered scheduler, type-erased.
struct SchedulerEntry {
    type_id: TypeId,
    type_name: &'static str,
    scheduler: Box<dyn Any>,
    as_dyn: AsDynFn,
    as_dyn_ref: AsDynRefFn,
}

/// Schedulers keyed by their concrete type, with ordering constraints and
/// a deferred deletion queue.
///
/// Execution order is the topological order of the `(before, after)`
/// constraints over the registered schedulers, ties broken by registration
/// order. Constraints may mention schedulers that are not registered (yet);
/// those are ignored when sorting.
pub(crate) struct SchedulerContainer {
    entries: Vec<SchedulerEntry>,
    index: HashMap<TypeId, usize>,
    constraints: Vec<(TypeId, TypeId)>,
    pending_deletion: Vec<TypeId>,
}

impl SchedulerContainer {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            constraints: Vec::new(),
            pending_deletion: Vec::new(),
        }
    }

    pub fn insert<S: Scheduler>(&mut self, scheduler: S) -> Result<&mut S, EcsError> {
        let type_id = TypeId::of::<S>();
        if self.index.contains_key(&type_id) {
            return Err(EcsError::SchedulerAlreadyRegistered(type_name::<S>()));
        }
        self.index.insert(type_id, self.entries.len());
        self.entries.push(SchedulerEntry {
            type_id,
            type_name: type_name::<S>(),
            scheduler: Box::new(scheduler),
            as_dyn: |any| any.downcast_mut::<S>().map(|s| s as &mut dyn Scheduler),
            as_dyn_ref: |any| any.downcast_ref::<S>().map(|s| s as &dyn Scheduler),
        });
        self.get_mut::<S>()
            .ok_or(EcsError::MissingScheduler(type_name::<S>()))
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.index.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get<S: Scheduler>(&self) -> Option<&S> {
        let slot = *self.index.get(&TypeId::of::<S>())?;
        self.entries[slot].scheduler.downcast_ref::<S>()
    }

    pub fn get_mut<S: Scheduler>(&mut self) -> Option<&mut S> {
        let slot = *self.index.get(&TypeId::of::<S>())?;
        self.entries[slot].scheduler.downcast_mut::<S>()
    }

    pub fn get_dyn(&self, type_id: TypeId) -> Option<&dyn Scheduler> {
        let entry = &self.entries[*self.index.get(&type_id)?];
        (entry.as_dyn_ref)(entry.scheduler.as_ref())
    }

    pub fn get_dyn_mut(&mut self, type_id: TypeId) -> Option<&mut dyn Scheduler> {
        let entry = &mut self.entries[*self.index.get(&type_id)?];
        (entry.as_dyn)(entry.scheduler.as_mut())
    }

    pub fn type_name(&self, type_id: TypeId) -> &'static str {
        self.index
            .get(&type_id)
            .map_or("<unregistered scheduler>", |&slot| self.entries[slot].type_name)
    }

    /// Registered scheduler types in registration order.
    pub fn type_ids(&self) -> Vec<TypeId> {
        self.entries.iter().map(|entry| entry.type_id).collect()
    }

    pub fn remove(&mut self, type_id: TypeId) -> bool {
        let Some(slot) = self.index.remove(&type_id) else {
            return false;
        };
        self.entries.remove(slot);
        for (i, entry) in self.entries.iter().enumerate().skip(slot) {
            self.index.insert(entry.type_id, i);
        }
        true
    }

    // ---- Ordering ----

    /// Requires `before` to run before `after` in every tick.
    pub fn add_constraint(&mut self, before: TypeId, after: TypeId) {
        if !self.constraints.contains(&(before, after)) {
            self.constraints.push((before, after));
        }
    }

    pub fn remove_constraint(&mut self, before: TypeId, after: TypeId) -> bool {
        let len = self.constraints.len();
        self.constraints.retain(|edge| *edge != (before, after));
        self.constraints.len() != len
    }

    pub fn has_constraint(&self, before: TypeId, after: TypeId) -> bool {
        self.constraints.contains(&(before, after))
    }

    /// Registered schedulers in execution order.
    pub fn execution_order(&self) -> Result<Vec<TypeId>, EcsError> {
        topological_order(&self.type_ids(), self.constraints.iter().copied()).map_err(|cycle| {
            let names: Vec<_> = cycle
                .involved
                .iter()
                .map(|id| self.type_name(*id))
                .collect();
            log::error!(
                "Cyclic dependency detected between schedulers: {}",
                names.join(", ")
            );
            EcsError::CyclicSchedulerDependency(names)
        })
    }

    // ---- Deferred deletion ----

    pub fn queue_deletion(&mut self, type_id: TypeId) {
        if !self.pending_deletion.contains(&type_id) {
            self.pending_deletion.push(type_id);
        }
    }

    pub fn is_queued_for_deletion(&self, type_id: TypeId) -> bool {
        self.pending_deletion.contains(&type_id)
    }

    /// Removes every queued scheduler; returns how many were present.
    pub fn process_deletions(&mut self) -> usize {
        let queued = std::mem::take(&mut self.pending_deletion);
        queued.into_iter().filter(|id| self.remove(*id)).count()
    }
}

impl Default for SchedulerContainer {
    fn default() -> Self {
        Self::new()
    }
}
