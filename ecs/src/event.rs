//! Typed events dispatched to callbacks.
//!
//! [`EventManager`] keeps callbacks per event type. A callback is either
//! direct (runs inside [`push_event`]) or bound to a scheduler `S`: events
//! for it are queued and delivered when [`process_events::<S>`] runs as a
//! system of that scheduler. An event pushed while no scheduler listens to
//! its type is only seen by direct callbacks.
//!
//! ```
//! use squared_ecs::{Core, EventManager, EventPlugin, Update, push_event};
//!
//! struct Jump(u32);
//!
//! let mut core = Core::new();
//! core.add_plugins::<(EventPlugin,)>().unwrap();
//! core.register_resource(0u32).unwrap();
//! core.get_resource::<EventManager>()
//!     .unwrap()
//!     .register_callback_on::<Jump, Update>(|core: &mut Core, jump: &Jump| {
//!         if let Ok(total) = core.get_resource::<u32>() {
//!             *total += jump.0;
//!         }
//!     });
//!
//! push_event(&mut core, Jump(3)).unwrap();
//! core.run_systems().unwrap();
//! assert_eq!(*core.get_resource::<u32>().unwrap(), 3);
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::engine::Core;
use crate::error::EcsError;
use crate::plugin::Plugin;
use crate::scheduler::{Scheduler, Update};

/// Identifies a registered callback, for [`EventManager::unregister_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventCallbackId(u64);

type BoxedCallback = Box<dyn FnMut(&mut Core, &dyn Any)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Dispatch {
    Direct,
    Scheduler(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CallbackKey {
    dispatch: Dispatch,
    event: TypeId,
}

/// A callback is taken out of its slot while it runs, so callbacks may
/// register or unregister others (including themselves).
struct CallbackSlot {
    id: EventCallbackId,
    callback: Option<BoxedCallback>,
}

type QueuedEvent = (TypeId, Rc<dyn Any>);

/// Resource holding every event callback and the per-scheduler queues.
#[derive(Default)]
pub struct EventManager {
    callbacks: HashMap<CallbackKey, Vec<CallbackSlot>>,
    queues: HashMap<TypeId, VecDeque<QueuedEvent>>,
    next_id: u64,
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("callbacks", &self.callbacks.values().map(Vec::len).sum::<usize>())
            .field("queued", &self.queues.values().map(VecDeque::len).sum::<usize>())
            .finish()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback run synchronously by [`push_event`].
    pub fn register_callback<E: 'static>(
        &mut self,
        callback: impl FnMut(&mut Core, &E) + 'static,
    ) -> EventCallbackId {
        self.insert::<E>(Dispatch::Direct, callback)
    }

    /// Registers a callback run when [`process_events::<S>`] drains the queue.
    pub fn register_callback_on<E: 'static, S: Scheduler>(
        &mut self,
        callback: impl FnMut(&mut Core, &E) + 'static,
    ) -> EventCallbackId {
        self.insert::<E>(Dispatch::Scheduler(TypeId::of::<S>()), callback)
    }

    /// Removes a direct callback. Unknown ids only warn.
    pub fn unregister_callback<E: 'static>(&mut self, id: EventCallbackId) {
        self.remove::<E>(Dispatch::Direct, id);
    }

    /// Removes a callback registered with [`register_callback_on`](Self::register_callback_on).
    pub fn unregister_callback_on<E: 'static, S: Scheduler>(&mut self, id: EventCallbackId) {
        self.remove::<E>(Dispatch::Scheduler(TypeId::of::<S>()), id);
    }

    /// Events waiting for `S`.
    pub fn queued_for<S: Scheduler>(&self) -> usize {
        self.queues.get(&TypeId::of::<S>()).map_or(0, VecDeque::len)
    }

    fn insert<E: 'static>(
        &mut self,
        dispatch: Dispatch,
        mut callback: impl FnMut(&mut Core, &E) + 'static,
    ) -> EventCallbackId {
        let id = EventCallbackId(self.next_id);
        self.next_id += 1;
        let erased: BoxedCallback = Box::new(move |core, event| {
            if let Some(event) = event.downcast_ref::<E>() {
                callback(core, event);
            }
        });
        self.callbacks
            .entry(CallbackKey {
                dispatch,
                event: TypeId::of::<E>(),
            })
            .or_default()
            .push(CallbackSlot {
                id,
                callback: Some(erased),
            });
        id
    }

    fn remove<E: 'static>(&mut self, dispatch: Dispatch, id: EventCallbackId) {
        let key = CallbackKey {
            dispatch,
            event: TypeId::of::<E>(),
        };
        let Some(slots) = self.callbacks.get_mut(&key) else {
            log::warn!("No callbacks registered for event `{}`", type_name::<E>());
            return;
        };
        let before = slots.len();
        slots.retain(|slot| slot.id != id);
        if slots.len() == before {
            log::warn!("Callback {id:?} not found for event `{}`", type_name::<E>());
        }
    }

    /// Schedulers with at least one callback for `event`.
    fn listeners(&self, event: TypeId) -> Vec<TypeId> {
        self.callbacks
            .iter()
            .filter(|(key, slots)| key.event == event && !slots.is_empty())
            .filter_map(|(key, _)| match key.dispatch {
                Dispatch::Scheduler(scheduler) => Some(scheduler),
                Dispatch::Direct => None,
            })
            .collect()
    }

    fn slot_ids(&self, key: CallbackKey) -> Vec<EventCallbackId> {
        self.callbacks
            .get(&key)
            .map(|slots| slots.iter().map(|slot| slot.id).collect())
            .unwrap_or_default()
    }

    fn slot_mut(&mut self, key: CallbackKey, id: EventCallbackId) -> Option<&mut CallbackSlot> {
        self.callbacks
            .get_mut(&key)?
            .iter_mut()
            .find(|slot| slot.id == id)
    }
}

/// Runs every callback under `key` with `event`. A callback unregistered
/// while it runs is dropped afterwards.
fn dispatch(core: &mut Core, key: CallbackKey, event: &dyn Any) -> Result<(), EcsError> {
    for id in core.get_resource::<EventManager>()?.slot_ids(key) {
        let Some(mut callback) = core
            .get_resource::<EventManager>()?
            .slot_mut(key, id)
            .and_then(|slot| slot.callback.take())
        else {
            continue;
        };
        callback(core, event);
        if let Some(slot) = core.get_resource::<EventManager>()?.slot_mut(key, id) {
            slot.callback = Some(callback);
        }
    }
    Ok(())
}

/// Queues `event` for every scheduler listening to `E`, then runs the
/// direct callbacks of `E`.
pub fn push_event<E: 'static>(core: &mut Core, event: E) -> Result<(), EcsError> {
    let event_type = TypeId::of::<E>();
    let event: Rc<dyn Any> = Rc::new(event);
    {
        let manager = core.get_resource::<EventManager>()?;
        for scheduler in manager.listeners(event_type) {
            manager
                .queues
                .entry(scheduler)
                .or_default()
                .push_back((event_type, event.clone()));
        }
    }
    let key = CallbackKey {
        dispatch: Dispatch::Direct,
        event: event_type,
    };
    dispatch(core, key, &*event)
}

/// Delivers the events queued for `S`. Events pushed meanwhile wait for
/// the next call.
pub fn process_events<S: Scheduler>(core: &mut Core) -> Result<(), EcsError> {
    let scheduler = TypeId::of::<S>();
    let queue = core
        .get_resource::<EventManager>()?
        .queues
        .remove(&scheduler)
        .unwrap_or_default();
    for (event_type, event) in queue {
        let key = CallbackKey {
            dispatch: Dispatch::Scheduler(scheduler),
            event: event_type,
        };
        dispatch(core, key, &*event)?;
    }
    Ok(())
}

/// Registers the [`EventManager`] and drains the [`Update`] queue in
/// `Update`. Callbacks bound to another scheduler need
/// `process_events::<S>` registered in it.
#[derive(Debug, Default)]
pub struct EventPlugin;

impl Plugin for EventPlugin {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        if !core.has_resource::<EventManager>() {
            core.register_resource(EventManager::new())?;
        }
        core.register_system::<Update, _>(process_events::<Update>);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::scheduler::Startup;

    #[derive(Debug, Clone, PartialEq)]
    struct Hit(u32);

    #[derive(Debug)]
    struct Miss;

    #[derive(Default)]
    struct Log(Vec<String>);

    fn core() -> Core {
        let mut core = Core::new();
        core.add_plugins::<(EventPlugin,)>().unwrap();
        core.register_resource(Log::default()).unwrap();
        core
    }

    fn record(core: &mut Core, line: String) {
        if let Ok(log) = core.get_resource::<Log>() {
            log.0.push(line);
        }
    }

    fn lines(core: &mut Core) -> Vec<String> {
        core.get_resource::<Log>().unwrap().0.clone()
    }

    fn manager(core: &mut Core) -> &mut EventManager {
        core.get_resource::<EventManager>().unwrap()
    }

    #[test]
    fn direct_callbacks_run_on_push() {
        let mut core = core();
        manager(&mut core).register_callback::<Hit>(|core: &mut Core, hit: &Hit| {
            record(core, format!("direct {}", hit.0));
        });

        push_event(&mut core, Hit(1)).unwrap();
        push_event(&mut core, Miss).unwrap();

        assert_eq!(lines(&mut core), ["direct 1"]);
        assert_eq!(manager(&mut core).queued_for::<Update>(), 0);
    }

    #[test]
    fn scheduled_callbacks_wait_for_their_scheduler() {
        let mut core = core();
        manager(&mut core).register_callback_on::<Hit, Update>(|core: &mut Core, hit: &Hit| {
            record(core, format!("update {}", hit.0));
        });

        push_event(&mut core, Hit(1)).unwrap();
        push_event(&mut core, Hit(2)).unwrap();
        assert!(lines(&mut core).is_empty());
        assert_eq!(manager(&mut core).queued_for::<Update>(), 2);

        core.run_systems().unwrap();
        assert_eq!(lines(&mut core), ["update 1", "update 2"]);
        assert_eq!(manager(&mut core).queued_for::<Update>(), 0);
    }

    #[test]
    fn events_pushed_while_processing_wait_a_tick() {
        let mut core = core();
        manager(&mut core).register_callback_on::<Hit, Update>(|core: &mut Core, hit: &Hit| {
            record(core, format!("update {}", hit.0));
            if hit.0 == 1 {
                let _ = push_event(core, Hit(2));
            }
        });

        push_event(&mut core, Hit(1)).unwrap();
        core.run_systems().unwrap();
        assert_eq!(lines(&mut core), ["update 1"]);
        core.run_systems().unwrap();
        assert_eq!(lines(&mut core), ["update 1", "update 2"]);
    }

    #[test]
    fn unregistered_callbacks_stop_receiving() {
        let mut core = core();
        let id = manager(&mut core).register_callback_on::<Hit, Update>(|core: &mut Core, _: &Hit| {
            record(core, "update".into());
        });
        manager(&mut core).unregister_callback_on::<Hit, Update>(id);
        manager(&mut core).unregister_callback_on::<Hit, Update>(id);
        manager(&mut core).unregister_callback::<Miss>(id);

        push_event(&mut core, Hit(1)).unwrap();
        core.run_systems().unwrap();
        assert!(lines(&mut core).is_empty());
    }

    #[test]
    fn callback_may_unregister_itself() {
        let mut core = core();
        let id = Rc::new(RefCell::new(None));
        let own_id = id.clone();
        let registered = manager(&mut core).register_callback::<Hit>(move |core: &mut Core, _: &Hit| {
            record(core, "once".into());
            if let (Some(id), Ok(manager)) = (*own_id.borrow(), core.get_resource::<EventManager>()) {
                manager.unregister_callback::<Hit>(id);
            }
        });
        *id.borrow_mut() = Some(registered);

        push_event(&mut core, Hit(1)).unwrap();
        push_event(&mut core, Hit(2)).unwrap();
        assert_eq!(lines(&mut core), ["once"]);
    }

    #[test]
    fn each_scheduler_gets_its_own_copy() {
        let mut core = core();
        manager(&mut core).register_callback_on::<Hit, Update>(|core: &mut Core, hit: &Hit| {
            record(core, format!("update {}", hit.0));
        });
        manager(&mut core).register_callback_on::<Hit, Startup>(|core: &mut Core, hit: &Hit| {
            record(core, format!("startup {}", hit.0));
        });
        core.register_system::<Startup, _>(process_events::<Startup>);

        push_event(&mut core, Hit(7)).unwrap();
        assert_eq!(manager(&mut core).queued_for::<Startup>(), 1);
        assert_eq!(manager(&mut core).queued_for::<Update>(), 1);

        core.run_systems().unwrap();
        assert_eq!(lines(&mut core), ["startup 7", "update 7"]);
    }
}
