use squared_ecs::{
    Core, EcsError, Entity, ErrorPolicy, FixedTimeUpdate, Plugin, RenderPresent, RenderSetup,
    Rendering, Scheduler, Shutdown, Startup, SystemHandle, Update, declare_scheduler,
    with_error_handler,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct A(u32);
#[derive(Default)]
struct B(u32);
#[derive(Default)]
struct C(u32);
#[derive(Default)]
struct D(bool);

trait Counter: 'static {
    fn bump(&mut self);
}

macro_rules! counter {
    ($($name:ident),+) => {
        $(impl Counter for $name {
            fn bump(&mut self) {
                self.0 += 1;
            }
        })+
    };
}

counter!(A, B, C);

/// `TAG` only makes every instantiation a distinct system.
fn inc<R: Counter, const TAG: u8>(core: &mut Core) -> Result<(), EcsError> {
    core.get_resource::<R>()?.bump();
    Ok(())
}

fn set_d(core: &mut Core) {
    if let Ok(d) = core.get_resource::<D>() {
        d.0 = true;
    }
}

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct Boom;

fn fail(_: &mut Core) -> Result<(), Boom> {
    Err(Boom)
}

/// Names pushed by systems, in execution order.
#[derive(Default)]
struct Trace(Vec<&'static str>);

fn trace(core: &mut Core, label: &'static str) {
    if let Ok(trace) = core.get_resource::<Trace>() {
        trace.0.push(label);
    }
}

fn core_with_counters() -> Core {
    let mut core = Core::new();
    core.register_resource(A::default()).unwrap();
    core.register_resource(B::default()).unwrap();
    core.register_resource(C::default()).unwrap();
    core.register_resource(D::default()).unwrap();
    core.register_resource(Trace::default()).unwrap();
    core
}

fn values(core: &mut Core) -> (u32, u32, u32, bool) {
    (
        core.get_resource::<A>().unwrap().0,
        core.get_resource::<B>().unwrap().0,
        core.get_resource::<C>().unwrap().0,
        core.get_resource::<D>().unwrap().0,
    )
}

// ---------------------------------------------------------------------------
// Groups, handlers, policies
// ---------------------------------------------------------------------------

#[test]
fn three_groups_swallow() {
    let mut core = core_with_counters();
    core.register_system::<Update, _>((inc::<A, 0>, inc::<A, 1>));
    core.register_system::<Update, _>(inc::<A, 2>);
    core.register_system::<Update, _>((inc::<B, 0>, inc::<B, 1>, inc::<B, 2>));
    core.register_system::<Update, _>(with_error_handler(inc::<C, 0>, set_d));

    core.run_systems().unwrap();

    assert_eq!(values(&mut core), (3, 3, 1, false));
}

#[test]
fn handler_then_propagate() {
    let mut core = core_with_counters();
    core.get_scheduler::<Update>()
        .unwrap()
        .set_error_policy(ErrorPolicy::Propagate);
    core.register_system::<Update, _>(inc::<A, 0>);
    core.register_system::<Update, _>(with_error_handler(fail, inc::<B, 0>));

    let err = core.run_systems().unwrap_err();

    match err {
        EcsError::SystemFailed { scheduler, system, error } => {
            assert!(scheduler.ends_with("Update"));
            assert!(system.ends_with("fail"));
            assert!(error.is::<Boom>());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(values(&mut core), (1, 1, 0, false));
}

#[test]
fn dedup_across_wrappings() {
    let mut core = core_with_counters();
    let bare = core.register_system::<Update, _>(inc::<A, 0>);
    let wrapped = core.register_system::<Update, _>(with_error_handler(inc::<A, 0>, set_d));
    assert_eq!(bare, wrapped);

    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 1);
}

#[test]
fn same_fn_in_one_group_runs_once() {
    let mut core = core_with_counters();
    let handles = core.register_system::<Update, _>((inc::<A, 0>, inc::<A, 0>, inc::<B, 0>));
    assert_eq!(handles[0], handles[1]);

    core.run_systems().unwrap();
    assert_eq!(values(&mut core), (1, 1, 0, false));
}

fn alpha(core: &mut Core) {
    trace(core, "alpha");
}

fn beta(core: &mut Core) {
    trace(core, "beta");
}

#[test]
fn function_pointers_register_by_target() {
    let mut core = core_with_counters();
    let systems: [fn(&mut Core); 3] = [alpha, beta, alpha];
    let handles: Vec<SystemHandle> = systems
        .into_iter()
        .flat_map(|system| core.register_system::<Update, _>(system))
        .collect();
    assert_ne!(handles[0], handles[1]);
    assert_eq!(handles[0], handles[2]);

    core.run_systems().unwrap();
    assert_eq!(core.get_resource::<Trace>().unwrap().0, ["alpha", "beta"]);
}

#[test]
fn propagate_aborts_the_tick() {
    let mut core = core_with_counters();
    core.get_scheduler::<Update>()
        .unwrap()
        .set_error_policy(ErrorPolicy::Propagate);
    core.register_system::<Update, _>((fail, inc::<A, 0>));
    core.register_system::<Rendering, _>(inc::<B, 0>);

    assert!(core.run_systems().is_err());
    assert_eq!(values(&mut core), (0, 0, 0, false));
}

#[test]
fn swallow_and_silent_keep_going() {
    for policy in [ErrorPolicy::Swallow, ErrorPolicy::Silent] {
        let mut core = core_with_counters();
        core.set_error_policy_for_all_schedulers(policy);
        core.register_system::<Update, _>((fail, inc::<A, 0>));
        core.register_system::<Rendering, _>(inc::<B, 0>);

        core.run_systems().unwrap();
        assert_eq!(values(&mut core), (1, 1, 0, false), "{policy:?}");
    }
}

#[test]
fn finish_scheduler_skips_later_schedulers() {
    let mut core = core_with_counters();
    core.get_scheduler::<Update>()
        .unwrap()
        .set_error_policy(ErrorPolicy::FinishScheduler);
    core.register_system::<Update, _>((fail, inc::<A, 0>));
    core.register_system::<Rendering, _>(inc::<B, 0>);

    core.run_systems().unwrap();
    // The failing scheduler finishes its pass; Rendering is skipped.
    assert_eq!(values(&mut core), (1, 0, 0, false));

    core.run_systems().unwrap();
    assert_eq!(values(&mut core), (2, 0, 0, false));
}

// ---------------------------------------------------------------------------
// Enable / disable
// ---------------------------------------------------------------------------

#[test]
fn disabled_system_is_skipped_until_enabled() {
    let mut core = core_with_counters();
    let handles = core.register_system::<Update, _>((inc::<A, 0>, inc::<B, 0>));

    core.get_scheduler::<Update>().unwrap().disable(handles[0]);
    core.run_systems().unwrap();
    assert_eq!(values(&mut core), (0, 1, 0, false));

    core.get_scheduler::<Update>().unwrap().enable(handles[0]);
    core.run_systems().unwrap();
    assert_eq!(values(&mut core), (1, 2, 0, false));
}

#[test]
fn disable_during_pass_applies_next_tick() {
    struct Target(SystemHandle);

    let mut core = core_with_counters();
    core.register_system::<Update, _>(|core: &mut Core| -> Result<(), EcsError> {
        let target = core.get_resource::<Target>()?.0;
        core.get_scheduler::<Update>()?.disable(target);
        Ok(())
    });
    let handle = core.register_system::<Update, _>(inc::<A, 0>)[0];
    core.register_resource(Target(handle)).unwrap();

    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 1);

    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 1);
}

#[test]
fn group_added_during_pass_runs_next_tick() {
    let mut core = core_with_counters();
    core.register_system::<Update, _>(|core: &mut Core| {
        core.register_system::<Update, _>(inc::<A, 0>);
    });

    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 0);
    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 1);
}

// ---------------------------------------------------------------------------
// Scheduler lifecycle
// ---------------------------------------------------------------------------

#[test]
fn deleted_scheduler_finishes_its_tick() {
    let mut core = core_with_counters();
    core.register_system::<Rendering, _>((
        |core: &mut Core| core.delete_scheduler::<Rendering>(),
        inc::<A, 0>,
    ));

    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 1);
    assert!(!core.has_scheduler::<Rendering>());

    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 1);
}

#[test]
fn startup_runs_once_and_late_groups_run_immediately() {
    let mut core = core_with_counters();
    core.register_system::<Startup, _>(inc::<A, 0>);

    core.run_systems().unwrap();
    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 1);

    core.register_system::<Startup, _>(inc::<B, 0>);
    assert_eq!(values(&mut core).1, 1);

    core.run_systems().unwrap();
    assert_eq!(values(&mut core), (1, 1, 0, false));
}

#[test]
fn startup_before_update_on_first_tick() {
    let mut core = core_with_counters();
    core.register_system::<Update, _>(|core: &mut Core| trace(core, "update"));
    core.register_system::<Startup, _>(|core: &mut Core| trace(core, "startup"));

    core.run_systems().unwrap();
    core.run_systems().unwrap();
    assert_eq!(
        core.get_resource::<Trace>().unwrap().0,
        vec!["startup", "update", "update"]
    );
}

#[test]
fn run_core_stops_and_shuts_down_once() {
    let mut core = core_with_counters();
    core.register_system::<Update, _>(|core: &mut Core| -> Result<(), EcsError> {
        core.get_resource::<A>()?.0 += 1;
        if core.get_resource::<A>()?.0 == 3 {
            core.stop();
        }
        Ok(())
    });
    core.register_system::<RenderSetup, _>(inc::<B, 0>);
    core.register_system::<Shutdown, _>(inc::<C, 0>);

    core.run_core().unwrap();

    // The stop lands between schedulers: RenderSetup misses the last tick.
    assert_eq!(values(&mut core), (3, 2, 1, false));
    assert!(!core.is_running());

    core.shutdown().unwrap();
    assert_eq!(values(&mut core).2, 1);
}

#[test]
fn run_core_surfaces_failure_after_shutdown() {
    let mut core = core_with_counters();
    core.set_error_policy_for_all_schedulers(ErrorPolicy::Propagate);
    core.register_system::<Update, _>(fail);
    core.register_system::<Shutdown, _>(inc::<C, 0>);

    let err = core.run_core().unwrap_err();
    assert!(matches!(err, EcsError::SystemFailed { .. }));
    assert_eq!(values(&mut core).2, 1);
}

#[test]
fn fixed_time_update_waits_for_a_full_step() {
    let mut core = core_with_counters();
    core.register_scheduler(FixedTimeUpdate::new(3600.0)).unwrap();
    core.register_system::<FixedTimeUpdate, _>(inc::<A, 0>);

    core.run_systems().unwrap();
    assert_eq!(values(&mut core).0, 0);
    assert_eq!(core.get_scheduler::<FixedTimeUpdate>().unwrap().tick_rate(), 3600.0);
}

#[test]
fn duplicate_scheduler_is_rejected() {
    let mut core = Core::new();
    assert!(matches!(
        core.register_scheduler(Update::default()),
        Err(EcsError::SchedulerAlreadyRegistered(_))
    ));
    assert!(matches!(
        core.get_scheduler::<Rendering>(),
        Err(EcsError::MissingScheduler(_))
    ));
}

// ---------------------------------------------------------------------------
// Scheduler ordering
// ---------------------------------------------------------------------------

declare_scheduler! {
    Physics
}

#[test]
fn render_stages_run_in_order_regardless_of_registration() {
    let mut core = core_with_counters();
    core.register_system::<RenderPresent, _>(|core: &mut Core| trace(core, "present"));
    core.register_system::<Rendering, _>(|core: &mut Core| trace(core, "rendering"));
    core.register_system::<RenderSetup, _>(|core: &mut Core| trace(core, "setup"));
    core.register_system::<Update, _>(|core: &mut Core| trace(core, "update"));

    core.run_systems().unwrap();
    assert_eq!(
        core.get_resource::<Trace>().unwrap().0,
        vec!["update", "setup", "rendering", "present"]
    );
}

#[test]
fn custom_scheduler_ordering() {
    let mut core = core_with_counters();
    core.register_system::<Physics, _>(|core: &mut Core| trace(core, "physics"));
    core.register_system::<Update, _>(|core: &mut Core| trace(core, "update"));
    core.set_scheduler_before::<Physics, Update>();

    core.run_systems().unwrap();
    assert_eq!(core.get_resource::<Trace>().unwrap().0, vec!["physics", "update"]);

    core.remove_dependency_before::<Physics, Update>();
    core.set_scheduler_after::<Physics, Update>();
    core.get_resource::<Trace>().unwrap().0.clear();
    core.run_systems().unwrap();
    assert_eq!(core.get_resource::<Trace>().unwrap().0, vec!["update", "physics"]);
}

#[test]
fn scheduler_cycle_is_an_error() {
    let mut core = core_with_counters();
    core.register_system::<Physics, _>(inc::<A, 0>);
    core.set_scheduler_before::<Physics, Update>();
    core.set_scheduler_after::<Physics, Update>();

    let err = core.run_systems().unwrap_err();
    assert!(matches!(err, EcsError::CyclicSchedulerDependency(_)));
    assert!(core.scheduler_order().is_err());
    assert_eq!(values(&mut core).0, 0);
}

// ---------------------------------------------------------------------------
// Entities, hooks, temporary components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct Mesh(u32);

#[derive(Default)]
struct HookLog(Vec<String>);

fn log_hook(core: &mut Core, line: String) {
    if let Ok(log) = core.get_resource::<HookLog>() {
        log.0.push(line);
    }
}

fn core_with_hooks() -> Core {
    let mut core = Core::new();
    core.register_resource(HookLog::default()).unwrap();
    core.on_construct::<Mesh, _>(|core: &mut Core, entity: Entity| {
        let mesh = *core.registry().get::<Mesh>(entity)?;
        log_hook(core, format!("construct {entity} {}", mesh.0));
        Ok::<(), EcsError>(())
    });
    core.on_destroy::<Mesh, _>(|core: &mut Core, entity: Entity| {
        // Still readable while the hook runs.
        let mesh = *core.registry().get::<Mesh>(entity)?;
        log_hook(core, format!("destroy {entity} {}", mesh.0));
        Ok::<(), EcsError>(())
    });
    core
}

#[test]
fn hooks_follow_component_lifecycle() {
    let mut core = core_with_hooks();
    let a = core.create_entity();
    let b = core.create_entity();
    core.add_component(a, Mesh(1)).unwrap();
    core.add_component(b, Mesh(2)).unwrap();

    core.remove_component::<Mesh>(a).unwrap();
    core.kill_entity(b).unwrap();
    // Nothing left to fire for.
    core.remove_component::<Mesh>(a).unwrap();

    assert_eq!(
        core.get_resource::<HookLog>().unwrap().0,
        vec!["construct 0v0 1", "construct 1v0 2", "destroy 0v0 1", "destroy 1v0 2"]
    );
}

#[test]
fn clear_entities_fires_destroy_hooks() {
    let mut core = core_with_hooks();
    for i in 0..3 {
        let e = core.create_entity();
        core.add_component(e, Mesh(i)).unwrap();
    }
    core.clear_entities().unwrap();

    assert!(core.registry().is_empty());
    let log = &core.get_resource::<HookLog>().unwrap().0;
    assert_eq!(log.iter().filter(|line| line.starts_with("destroy")).count(), 3);
}

#[test]
fn temporary_components_fire_destroy_hooks() {
    let mut core = core_with_hooks();
    let e = core.create_entity();
    core.add_temporary_component(e, Mesh(7)).unwrap();

    core.run_systems().unwrap();

    assert!(!core.registry().has::<Mesh>(e));
    assert!(core.is_entity_valid(e));
    assert_eq!(
        core.get_resource::<HookLog>().unwrap().0,
        vec!["construct 0v0 7", "destroy 0v0 7"]
    );
}

#[test]
fn stale_handles_are_rejected() {
    let mut core = Core::new();
    let e = core.create_entity();
    core.kill_entity(e).unwrap();
    let reused = core.create_entity();

    assert_eq!(reused.index(), e.index());
    assert_ne!(reused, e);
    assert!(matches!(
        core.add_component(e, Mesh(0)),
        Err(EcsError::DeadEntity(_))
    ));
    assert!(!core.is_entity_valid(Entity::NULL));
}

#[test]
fn duplicate_component_is_rejected() {
    let mut core = Core::new();
    let e = core.create_entity();
    core.add_component(e, Mesh(1)).unwrap();
    assert!(matches!(
        core.add_component(e, Mesh(2)),
        Err(EcsError::AlreadyAttached { .. })
    ));
    assert_eq!(core.registry().get::<Mesh>(e).unwrap(), &Mesh(1));
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[test]
fn resource_lifecycle() {
    let mut core = Core::new();
    assert!(!core.has_resource::<A>());
    assert!(matches!(
        core.get_resource::<A>(),
        Err(EcsError::MissingResource(_))
    ));

    core.register_resource(A(5)).unwrap();
    assert!(matches!(
        core.register_resource(A(6)),
        Err(EcsError::AlreadyRegistered(_))
    ));
    assert_eq!(core.get_resource::<A>().unwrap().0, 5);

    assert_eq!(core.delete_resource::<A>().map(|a| a.0), Some(5));
    assert!(core.delete_resource::<A>().is_none());
}

#[test]
fn guards_allow_several_resources() {
    let mut core = Core::new();
    core.register_resource(A(1)).unwrap();
    core.register_resource(B(2)).unwrap();

    {
        let a = core.resource::<A>().unwrap();
        let mut b = core.resource_mut::<B>().unwrap();
        b.0 += a.0;
        assert!(matches!(
            core.resource_mut::<B>(),
            Err(EcsError::ResourceBorrowed(_))
        ));
        assert!(core.resource::<A>().is_ok());
    }
    assert_eq!(core.resource::<B>().unwrap().0, 3);
}

// ---------------------------------------------------------------------------
// Plugins
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        core.add_plugins::<(WindowPlugin,)>()?;
        core.get_resource::<Trace>()?.0.push("render");
        core.register_system::<Rendering, _>(inc::<B, 0>);
        Ok(())
    }
}

#[derive(Default)]
struct WindowPlugin;

impl Plugin for WindowPlugin {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        core.get_resource::<Trace>()?.0.push("window");
        core.register_system::<Startup, _>(inc::<A, 0>);
        Ok(())
    }
}

#[test]
fn plugins_install_once_with_dependencies_first() {
    let mut core = core_with_counters();
    core.add_plugins::<(RenderPlugin, WindowPlugin)>().unwrap();
    core.add_plugins::<(RenderPlugin,)>().unwrap();

    assert!(core.has_plugin::<RenderPlugin>());
    assert!(core.has_plugin_id(std::any::TypeId::of::<WindowPlugin>()));
    assert_eq!(core.get_resource::<Trace>().unwrap().0, vec!["window", "render"]);

    core.run_systems().unwrap();
    assert_eq!(values(&mut core), (1, 1, 0, false));
}

#[derive(Default)]
struct Ping;
#[derive(Default)]
struct Pong;

impl Plugin for Ping {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        core.add_plugin::<Pong>()
    }
}

impl Plugin for Pong {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        core.add_plugin::<Ping>()
    }
}

#[test]
fn circular_plugins_are_rejected() {
    let mut core = Core::new();
    let err = core.add_plugins::<(Ping,)>().unwrap_err();
    match err {
        EcsError::CircularPluginDependency(chain) => {
            assert_eq!(chain.matches(" -> ").count(), 2);
            assert!(chain.ends_with("Ping"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!core.has_plugin::<Ping>());
    assert!(!core.has_plugin::<Pong>());
}

// ---------------------------------------------------------------------------
// Custom schedulers
// ---------------------------------------------------------------------------

/// Runs its groups twice per tick.
#[derive(Default)]
struct Twice {
    systems: squared_ecs::SystemSet,
    passes: Vec<u32>,
}

impl Scheduler for Twice {
    fn systems(&self) -> &squared_ecs::SystemSet {
        &self.systems
    }

    fn systems_mut(&mut self) -> &mut squared_ecs::SystemSet {
        &mut self.systems
    }

    fn begin_tick(&mut self) -> u32 {
        2
    }

    fn begin_pass(&mut self, pass: u32) {
        self.passes.push(pass);
    }
}

#[test]
fn custom_scheduler_controls_passes() {
    let mut core = core_with_counters();
    core.register_system::<Twice, _>(inc::<A, 0>);
    core.run_systems().unwrap();

    assert_eq!(values(&mut core).0, 2);
    assert_eq!(core.get_scheduler::<Twice>().unwrap().passes, vec![0, 1]);
}

#[test]
fn default_scheduler_can_be_changed() {
    let mut core = core_with_counters();
    core.register_default_system(inc::<A, 0>);
    core.set_default_scheduler::<Twice>();
    core.register_default_system(inc::<B, 0>);

    core.run_systems().unwrap();
    assert_eq!(values(&mut core), (1, 2, 0, false));
}
