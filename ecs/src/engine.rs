use std::any::{TypeId, type_name};

use crate::entity::Entity;
use crate::error::{EcsError, IntoSystemResult, SystemError};
use crate::hooks::{HookKind, Hooks};
use crate::plugin::Plugins;
use crate::registry::{ComponentSet, Registry};
use crate::resource::{ResourceRef, ResourceRefMut, Resources};
use crate::scheduler::{
    ErrorPolicy, Group, RenderPresent, RenderSetup, Rendering, Scheduler, SchedulerContainer,
    Shutdown, Startup, Update,
};
use crate::system::{System, SystemGroup, SystemHandle};

type DefaultRegisterFn = fn(&mut Core, Vec<System>) -> Vec<SystemHandle>;

/// What the tick loop does after a scheduler finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    SkipRest,
}

/// The engine core: entities, resources, schedulers and plugins.
///
/// Everything runs on the calling thread. A tick ([`run_systems`](Self::run_systems))
/// runs every scheduler once in dependency order; systems receive `&mut Core`
/// and may mutate anything, including the scheduler set. Structural changes
/// to a scheduler made while it runs are applied once its pass ends.
///
/// # Example
///
/// ```
/// use squared_ecs::{Core, Update};
///
/// struct Counter(u32);
///
/// let mut core = Core::new();
/// core.register_resource(Counter(0)).unwrap();
/// core.register_system::<Update, _>(|core: &mut Core| {
///     core.get_resource::<Counter>().map(|counter| counter.0 += 1)
/// });
///
/// core.run_systems().unwrap();
/// core.run_systems().unwrap();
/// assert_eq!(core.get_resource::<Counter>().unwrap().0, 2);
/// ```
pub struct Core {
    registry: Registry,
    resources: Resources,
    schedulers: SchedulerContainer,
    hooks: Hooks,
    pub(crate) plugins: Plugins,
    default_register: DefaultRegisterFn,
    default_scheduler: &'static str,
    running: bool,
    stop_requested: bool,
    in_tick: bool,
    booted: bool,
    shutdown_done: bool,
}

impl Core {
    /// Creates a core with the `Startup`, `Update` and `Shutdown` schedulers,
    /// the render stage ordering and the temporary component sweep.
    pub fn new() -> Self {
        let mut core = Self {
            registry: Registry::new(),
            resources: Resources::new(),
            schedulers: SchedulerContainer::new(),
            hooks: Hooks::default(),
            plugins: Plugins::default(),
            default_register: |core, systems| core.add_systems::<Update>(systems),
            default_scheduler: type_name::<Update>(),
            running: false,
            stop_requested: false,
            in_tick: false,
            booted: false,
            shutdown_done: false,
        };

        core.ensure_scheduler::<Startup>();
        core.ensure_scheduler::<Update>();
        core.ensure_scheduler::<Shutdown>();

        core.set_scheduler_before::<Startup, Update>();
        core.set_scheduler_before::<Update, RenderSetup>();
        core.set_scheduler_before::<RenderSetup, Rendering>();
        core.set_scheduler_before::<Rendering, RenderPresent>();

        core.register_system::<Update, _>(remove_temporary_components);
        core
    }

    // ---- Registry ----

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct registry access. Structural changes made through it bypass
    /// construct and destroy hooks.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn create_entity(&mut self) -> Entity {
        self.registry.create()
    }

    pub fn is_entity_valid(&self, entity: Entity) -> bool {
        self.registry.valid(entity)
    }

    /// Fires the destroy hooks of every attached component, then frees the
    /// entity.
    ///
    /// Every hook runs even when one fails; the first failure is returned
    /// after the entity is gone.
    pub fn kill_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.registry.valid(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        let mut first_error = None;
        for type_id in self.registry.component_types(entity) {
            if let Err(error) = self.fire_hooks(HookKind::Destroy, type_id, entity) {
                first_error.get_or_insert(error);
            }
        }
        self.registry.destroy(entity);
        first_error.map_or(Ok(()), Err)
    }

    /// Kills every alive entity.
    pub fn clear_entities(&mut self) -> Result<(), EcsError> {
        let entities: Vec<_> = self.registry.entities().collect();
        let mut first_error = None;
        for entity in entities {
            // A destroy hook may already have killed a later entity.
            if !self.registry.valid(entity) {
                continue;
            }
            if let Err(error) = self.kill_entity(entity) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Attaches `value` to `entity` and fires the construct hooks of `C`.
    ///
    /// # Errors
    ///
    /// [`EcsError::DeadEntity`], [`EcsError::AlreadyAttached`], or
    /// [`EcsError::HookFailed`] when a construct hook failed (the component
    /// stays attached).
    pub fn add_component<C: 'static>(&mut self, entity: Entity, value: C) -> Result<&mut C, EcsError> {
        self.registry.insert(entity, value)?;
        self.fire_hooks(HookKind::Construct, TypeId::of::<C>(), entity)?;
        self.registry.get_mut::<C>(entity)
    }

    /// Like [`add_component`](Self::add_component), and the type is swept by
    /// the temporary component system at the start of every `Update` pass.
    pub fn add_temporary_component<C: 'static>(
        &mut self,
        entity: Entity,
        value: C,
    ) -> Result<&mut C, EcsError> {
        self.registry.mark_temporary::<C>();
        self.add_component(entity, value)
    }

    /// Fires the destroy hooks of `C` while the component is still readable,
    /// then detaches it. Absent components are ignored.
    pub fn remove_component<C: 'static>(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.registry.has::<C>(entity) {
            return Ok(());
        }
        let hooks = self.fire_hooks(HookKind::Destroy, TypeId::of::<C>(), entity);
        self.registry.remove::<C>(entity);
        hooks
    }

    /// Registers `hook` to run after a `C` is attached to an entity.
    pub fn on_construct<C: 'static, O: IntoSystemResult>(
        &mut self,
        mut hook: impl FnMut(&mut Core, Entity) -> O + 'static,
    ) {
        self.hooks.add(
            HookKind::Construct,
            TypeId::of::<C>(),
            type_name::<C>(),
            Box::new(move |core, entity| hook(core, entity).into_system_result()),
        );
    }

    /// Registers `hook` to run before a `C` is detached from an entity.
    pub fn on_destroy<C: 'static, O: IntoSystemResult>(
        &mut self,
        mut hook: impl FnMut(&mut Core, Entity) -> O + 'static,
    ) {
        self.hooks.add(
            HookKind::Destroy,
            TypeId::of::<C>(),
            type_name::<C>(),
            Box::new(move |core, entity| hook(core, entity).into_system_result()),
        );
    }

    fn fire_hooks(&mut self, kind: HookKind, type_id: TypeId, entity: Entity) -> Result<(), EcsError> {
        let Some((component, mut hooks)) = self.hooks.take(kind, type_id) else {
            return Ok(());
        };
        let mut first_error: Option<SystemError> = None;
        for hook in &mut hooks {
            if let Err(error) = hook(self, entity) {
                log::error!("{kind} hook on `{component}` failed for entity {entity}: {error}");
                first_error.get_or_insert(error);
            }
        }
        self.hooks.restore(kind, type_id, hooks);
        match first_error {
            Some(error) => Err(EcsError::HookFailed { component, error }),
            None => Ok(()),
        }
    }

    // ---- Resources ----

    /// Stores `value` as the resource of type `T`.
    ///
    /// # Errors
    ///
    /// [`EcsError::AlreadyRegistered`] when a `T` already exists.
    pub fn register_resource<T: 'static>(&mut self, value: T) -> Result<&mut T, EcsError> {
        self.resources.insert(value)
    }

    /// # Errors
    ///
    /// [`EcsError::MissingResource`] when no `T` exists.
    pub fn get_resource<T: 'static>(&mut self) -> Result<&mut T, EcsError> {
        self.resources.get_mut::<T>()
    }

    pub fn has_resource<T: 'static>(&self) -> bool {
        self.resources.contains::<T>()
    }

    /// Removes and returns the resource; absent resources are ignored.
    pub fn delete_resource<T: 'static>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }

    /// Shared guard over a resource, usable alongside other guards.
    pub fn resource<T: 'static>(&self) -> Result<ResourceRef<'_, T>, EcsError> {
        self.resources.borrow::<T>()
    }

    /// Exclusive guard over a resource, usable alongside guards on other
    /// resources.
    pub fn resource_mut<T: 'static>(&self) -> Result<ResourceRefMut<'_, T>, EcsError> {
        self.resources.borrow_mut::<T>()
    }

    // ---- Schedulers ----

    /// # Errors
    ///
    /// [`EcsError::SchedulerAlreadyRegistered`] when an `S` already exists.
    pub fn register_scheduler<S: Scheduler>(&mut self, scheduler: S) -> Result<&mut S, EcsError> {
        self.schedulers.insert(scheduler)
    }

    /// # Errors
    ///
    /// [`EcsError::MissingScheduler`] when no `S` exists.
    pub fn get_scheduler<S: Scheduler>(&mut self) -> Result<&mut S, EcsError> {
        self.schedulers
            .get_mut::<S>()
            .ok_or(EcsError::MissingScheduler(type_name::<S>()))
    }

    pub fn has_scheduler<S: Scheduler>(&self) -> bool {
        self.schedulers.contains(TypeId::of::<S>())
    }

    /// Queues `S` for removal. It keeps running until the current tick ends
    /// and is gone before the next one starts.
    pub fn delete_scheduler<S: Scheduler>(&mut self) {
        let type_id = TypeId::of::<S>();
        if !self.schedulers.contains(type_id) {
            log::warn!("Scheduler {} does not exist", type_name::<S>());
            return;
        }
        self.schedulers.queue_deletion(type_id);
    }

    /// Makes `S` the target of [`register_default_system`](Self::register_default_system).
    pub fn set_default_scheduler<S: Scheduler + Default>(&mut self) {
        if !self.has_scheduler::<S>() {
            log::warn!(
                "Default scheduler {} is not registered yet; it will be created on first use",
                type_name::<S>()
            );
        }
        self.default_register = |core, systems| core.add_systems::<S>(systems);
        self.default_scheduler = type_name::<S>();
    }

    /// Name of the scheduler targeted by [`register_default_system`](Self::register_default_system).
    pub fn default_scheduler_name(&self) -> &'static str {
        self.default_scheduler
    }

    /// `A` runs before `B` in every tick.
    pub fn set_scheduler_before<A: Scheduler, B: Scheduler>(&mut self) {
        self.schedulers
            .add_constraint(TypeId::of::<A>(), TypeId::of::<B>());
    }

    /// `A` runs after `B` in every tick.
    pub fn set_scheduler_after<A: Scheduler, B: Scheduler>(&mut self) {
        self.schedulers
            .add_constraint(TypeId::of::<B>(), TypeId::of::<A>());
    }

    /// Drops a constraint set by `set_scheduler_before::<A, B>()`.
    pub fn remove_dependency_before<A: Scheduler, B: Scheduler>(&mut self) {
        if !self
            .schedulers
            .remove_constraint(TypeId::of::<A>(), TypeId::of::<B>())
        {
            log::warn!(
                "No dependency {} before {} to remove",
                type_name::<A>(),
                type_name::<B>()
            );
        }
    }

    /// Drops a constraint set by `set_scheduler_after::<A, B>()`.
    pub fn remove_dependency_after<A: Scheduler, B: Scheduler>(&mut self) {
        if !self
            .schedulers
            .remove_constraint(TypeId::of::<B>(), TypeId::of::<A>())
        {
            log::warn!(
                "No dependency {} after {} to remove",
                type_name::<A>(),
                type_name::<B>()
            );
        }
    }

    /// Scheduler type names in the order the next tick runs them.
    pub fn scheduler_order(&self) -> Result<Vec<&'static str>, EcsError> {
        Ok(self
            .schedulers
            .execution_order()?
            .into_iter()
            .map(|id| self.schedulers.type_name(id))
            .collect())
    }

    pub fn set_error_policy_for_all_schedulers(&mut self, policy: ErrorPolicy) {
        for type_id in self.schedulers.type_ids() {
            if let Some(scheduler) = self.schedulers.get_dyn_mut(type_id) {
                scheduler.set_error_policy(policy);
            }
        }
    }

    // ---- Systems ----

    /// Appends `group` to `S`, creating `S` with its default value if it is
    /// not registered yet.
    ///
    /// A one-shot scheduler that already had its first tick runs the new
    /// group right away when called outside a tick.
    pub fn register_system<S, M>(&mut self, group: impl SystemGroup<M>) -> Vec<SystemHandle>
    where
        S: Scheduler + Default,
    {
        self.add_systems::<S>(group.into_systems())
    }

    /// Appends `group` to the default scheduler (`Update` unless changed by
    /// [`set_default_scheduler`](Self::set_default_scheduler)).
    pub fn register_default_system<M>(&mut self, group: impl SystemGroup<M>) -> Vec<SystemHandle> {
        let register = self.default_register;
        register(self, group.into_systems())
    }

    fn ensure_scheduler<S: Scheduler + Default>(&mut self) {
        if !self.has_scheduler::<S>() {
            log::debug!("Registering scheduler {}", type_name::<S>());
            if let Err(error) = self.schedulers.insert(S::default()) {
                log::error!("{error}");
            }
        }
    }

    fn add_systems<S: Scheduler + Default>(&mut self, systems: Vec<System>) -> Vec<SystemHandle> {
        self.ensure_scheduler::<S>();
        let Some(scheduler) = self.schedulers.get_mut::<S>() else {
            return Vec::new();
        };
        let one_shot = scheduler.is_one_shot();
        let handles = scheduler.add(systems);

        if one_shot && self.booted && !self.in_tick {
            if let Err(error) = self.run_scheduler::<S>() {
                log::error!("{error}");
            }
        }
        handles
    }

    // ---- Ticking ----

    /// Runs every scheduler once, in dependency order.
    ///
    /// Schedulers queued for deletion are removed before the tick starts and
    /// after it ends.
    ///
    /// # Errors
    ///
    /// [`EcsError::SystemFailed`] when a system failed under
    /// [`ErrorPolicy::Propagate`] (the rest of the tick is skipped),
    /// [`EcsError::CyclicSchedulerDependency`] when the ordering constraints
    /// contain a cycle, [`EcsError::Configuration`] when called from inside
    /// a system.
    pub fn run_systems(&mut self) -> Result<(), EcsError> {
        if self.in_tick {
            return Err(EcsError::Configuration(
                "run_systems called while a tick is already running".to_string(),
            ));
        }
        self.in_tick = true;
        self.stop_requested = false;
        let result = self.tick();
        self.in_tick = false;
        self.booted = true;
        self.schedulers.process_deletions();
        result
    }

    fn tick(&mut self) -> Result<(), EcsError> {
        self.schedulers.process_deletions();
        let order = self.schedulers.execution_order()?;
        for type_id in order {
            if self.run_scheduler_by_id(type_id, None)? == Flow::SkipRest {
                break;
            }
            if self.stop_requested {
                log::debug!("Stop requested, skipping the remaining schedulers");
                break;
            }
        }
        Ok(())
    }

    /// Runs one tick of `S` alone.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingScheduler`], [`EcsError::Configuration`] when `S`
    /// is already running, or a propagated system failure.
    pub fn run_scheduler<S: Scheduler>(&mut self) -> Result<(), EcsError> {
        let outer = self.in_tick;
        self.in_tick = true;
        let result = self.run_scheduler_by_id(TypeId::of::<S>(), None);
        self.in_tick = outer;
        result.map(|_| ())
    }

    fn run_scheduler_by_id(
        &mut self,
        type_id: TypeId,
        forced_passes: Option<u32>,
    ) -> Result<Flow, EcsError> {
        let name = self.schedulers.type_name(type_id);
        let Some(scheduler) = self.schedulers.get_dyn_mut(type_id) else {
            return Err(EcsError::MissingScheduler(name));
        };
        if scheduler.systems().is_running() {
            return Err(EcsError::Configuration(format!(
                "scheduler `{name}` is already running"
            )));
        }
        let passes = match forced_passes {
            Some(passes) => passes,
            None => scheduler.begin_tick(),
        };

        let mut outcome = Ok(Flow::Continue);
        for pass in 0..passes {
            let Some(scheduler) = self.schedulers.get_dyn_mut(type_id) else {
                break;
            };
            scheduler.begin_pass(pass);
            let policy = scheduler.error_policy();
            let consume = scheduler.is_one_shot();
            let mut groups = scheduler.systems_mut().begin_run();

            outcome = self.run_groups(&mut groups, name, policy);

            if let Some(scheduler) = self.schedulers.get_dyn_mut(type_id) {
                scheduler.systems_mut().end_run(groups, consume);
            }
            if !matches!(outcome, Ok(Flow::Continue)) {
                break;
            }
        }

        if let Some(scheduler) = self.schedulers.get_dyn_mut(type_id) {
            scheduler.end_tick();
        }
        outcome
    }

    fn run_groups(
        &mut self,
        groups: &mut [Group],
        scheduler: &'static str,
        policy: ErrorPolicy,
    ) -> Result<Flow, EcsError> {
        let mut flow = Flow::Continue;
        for entry in groups.iter_mut().flatten() {
            if !entry.enabled {
                continue;
            }
            let Err(error) = (entry.system.run)(self) else {
                continue;
            };
            if let Some(handler) = entry.system.handler.as_mut() {
                handler(self);
            }

            let system = entry.system.name;
            match policy {
                ErrorPolicy::Propagate => {
                    log::error!("System {system} failed in {scheduler}: {error}");
                    return Err(EcsError::SystemFailed {
                        scheduler,
                        system,
                        error,
                    });
                }
                ErrorPolicy::Swallow => {
                    log::error!("System {system} failed in {scheduler}: {error}");
                }
                ErrorPolicy::Silent => {
                    log::debug!("System {system} failed in {scheduler}: {error}");
                }
                ErrorPolicy::FinishScheduler => {
                    log::error!(
                        "System {system} failed in {scheduler}: {error}; finishing the scheduler and skipping the rest of the tick"
                    );
                    flow = Flow::SkipRest;
                }
            }
        }
        Ok(flow)
    }

    /// Ticks until [`stop`](Self::stop) is called or a tick fails, then runs
    /// the `Shutdown` systems.
    ///
    /// A tick failure takes precedence over a shutdown failure.
    pub fn run_core(&mut self) -> Result<(), EcsError> {
        self.running = true;
        let mut result = Ok(());
        while self.running {
            if let Err(error) = self.run_systems() {
                log::error!("Tick failed, shutting down: {error}");
                result = Err(error);
                break;
            }
        }
        self.running = false;
        let shutdown = self.shutdown();
        result.and(shutdown)
    }

    /// Ends [`run_core`](Self::run_core) after the scheduler that is
    /// currently running.
    pub fn stop(&mut self) {
        self.running = false;
        self.stop_requested = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Runs the `Shutdown` systems once. Later calls do nothing.
    ///
    /// Called by [`run_core`](Self::run_core) and when the core is dropped.
    pub fn shutdown(&mut self) -> Result<(), EcsError> {
        if self.shutdown_done {
            return Ok(());
        }
        if self.in_tick {
            return Err(EcsError::Configuration(
                "shutdown called while a tick is running".to_string(),
            ));
        }
        self.shutdown_done = true;
        if !self.has_scheduler::<Shutdown>() {
            return Ok(());
        }
        self.in_tick = true;
        let result = self.run_scheduler_by_id(TypeId::of::<Shutdown>(), Some(1));
        self.in_tick = false;
        result.map(|_| ())
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if let Err(error) = self.shutdown() {
            log::error!("Shutdown failed: {error}");
        }
    }
}

/// Removes every component added with
/// [`add_temporary_component`](Core::add_temporary_component), firing their
/// destroy hooks. Registered into `Update` by [`Core::new`].
pub fn remove_temporary_components(core: &mut Core) -> Result<(), EcsError> {
    let mut first_error = None;
    for type_id in core.registry.temporary_types() {
        for entity in core.registry.entities_with(type_id) {
            if let Err(error) = core.fire_hooks(HookKind::Destroy, type_id, entity) {
                first_error.get_or_insert(error);
            }
            core.registry.remove_by_type(entity, type_id);
        }
    }
    first_error.map_or(Ok(()), Err)
}

// ---- Entity helpers ----

impl Entity {
    /// See [`Core::add_component`].
    pub fn add_component<C: 'static>(self, core: &mut Core, value: C) -> Result<&mut C, EcsError> {
        core.add_component(self, value)
    }

    /// Attaches `value` unless a `C` is already there, returning the stored
    /// component either way.
    pub fn add_component_if_not_exists<C: 'static>(
        self,
        core: &mut Core,
        value: C,
    ) -> Result<&mut C, EcsError> {
        if core.registry.has::<C>(self) {
            return core.registry.get_mut::<C>(self);
        }
        core.add_component(self, value)
    }

    pub fn add_temporary_component<C: 'static>(
        self,
        core: &mut Core,
        value: C,
    ) -> Result<&mut C, EcsError> {
        core.add_temporary_component(self, value)
    }

    pub fn remove_component<C: 'static>(self, core: &mut Core) -> Result<(), EcsError> {
        core.remove_component::<C>(self)
    }

    pub fn try_get<C: 'static>(self, core: &Core) -> Option<&C> {
        core.registry.try_get::<C>(self)
    }

    pub fn try_get_mut<C: 'static>(self, core: &mut Core) -> Option<&mut C> {
        core.registry.try_get_mut::<C>(self)
    }

    pub fn get<C: 'static>(self, core: &Core) -> Result<&C, EcsError> {
        core.registry.get::<C>(self)
    }

    pub fn get_mut<C: 'static>(self, core: &mut Core) -> Result<&mut C, EcsError> {
        core.registry.get_mut::<C>(self)
    }

    /// Whether the entity carries every component of the tuple `Q`.
    pub fn has_components<Q: ComponentSet>(self, core: &Core) -> bool {
        core.registry.all_of::<Q>(self)
    }

    pub fn kill(self, core: &mut Core) -> Result<(), EcsError> {
        core.kill_entity(self)
    }

    pub fn is_alive(self, core: &Core) -> bool {
        core.registry.valid(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    #[derive(Debug)]
    struct Flash;

    #[test]
    fn new_core_has_builtin_schedulers() {
        let core = Core::new();
        assert!(core.has_scheduler::<Startup>());
        assert!(core.has_scheduler::<Update>());
        assert!(core.has_scheduler::<Shutdown>());
        assert!(!core.has_scheduler::<Rendering>());
        assert!(core.default_scheduler_name().ends_with("Update"));
    }

    #[test]
    fn entity_helpers() {
        let mut core = Core::new();
        let e = core.create_entity();
        e.add_component(&mut core, Health(3)).unwrap();
        assert!(e.has_components::<(Health,)>(&core));
        assert!(!e.has_components::<(Health, Flash)>(&core));

        e.add_component_if_not_exists(&mut core, Health(9)).unwrap();
        assert_eq!(e.get::<Health>(&core).unwrap(), &Health(3));

        e.get_mut::<Health>(&mut core).unwrap().0 = 4;
        assert_eq!(e.try_get::<Health>(&core), Some(&Health(4)));

        e.remove_component::<Health>(&mut core).unwrap();
        assert!(e.try_get::<Health>(&core).is_none());
        assert!(matches!(
            e.get::<Health>(&core),
            Err(EcsError::MissingComponent { .. })
        ));

        e.kill(&mut core).unwrap();
        assert!(!e.is_alive(&core));
        assert!(matches!(e.kill(&mut core), Err(EcsError::DeadEntity(_))));
    }

    #[test]
    fn temporary_components_are_swept() {
        let mut core = Core::new();
        let e = core.create_entity();
        e.add_component(&mut core, Health(1)).unwrap();
        e.add_temporary_component(&mut core, Flash).unwrap();

        core.run_systems().unwrap();
        assert!(e.try_get::<Flash>(&core).is_none());
        assert!(e.try_get::<Health>(&core).is_some());
    }

    #[test]
    fn hook_failure_is_reported_but_component_stays() {
        let mut core = Core::new();
        core.on_construct::<Health, _>(|_: &mut Core, _: Entity| -> Result<(), std::fmt::Error> {
            Err(std::fmt::Error)
        });
        let e = core.create_entity();
        let result = core.add_component(e, Health(1));
        assert!(matches!(result, Err(EcsError::HookFailed { .. })));
        assert!(core.registry().has::<Health>(e));
    }

    #[test]
    fn reentrant_tick_is_rejected() {
        struct Nested(Option<bool>);

        let mut core = Core::new();
        core.register_resource(Nested(None)).unwrap();
        core.register_system::<Update, _>(|core: &mut Core| {
            let rejected = core.run_systems().is_err();
            if let Ok(nested) = core.get_resource::<Nested>() {
                nested.0 = Some(rejected);
            }
        });
        core.run_systems().unwrap();
        assert_eq!(core.get_resource::<Nested>().unwrap().0, Some(true));
    }

    #[test]
    fn shutdown_runs_once() {
        struct Count(u32);

        let mut core = Core::new();
        core.register_resource(Count(0)).unwrap();
        core.register_system::<Shutdown, _>(|core: &mut Core| {
            core.get_resource::<Count>().map(|count| count.0 += 1)
        });
        core.run_systems().unwrap();
        assert_eq!(core.get_resource::<Count>().unwrap().0, 0);

        core.shutdown().unwrap();
        core.shutdown().unwrap();
        assert_eq!(core.get_resource::<Count>().unwrap().0, 1);
    }
}
