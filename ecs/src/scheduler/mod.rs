//! Schedulers: typed owners of ordered system groups.
//!
//! A scheduler decides *how often* its groups run in one tick of
//! [`Core::run_systems`](crate::Core::run_systems); the groups themselves
//! live in a [`SystemSet`] that also carries the error policy and the
//! enable/disable state of every system.

mod builtin;
mod container;
mod system_set;
mod time;

pub use builtin::{RenderPresent, RenderSetup, Rendering, Shutdown, Startup, Update};
pub(crate) use container::SchedulerContainer;
pub use system_set::SystemSet;
pub(crate) use system_set::{Group, SystemEntry};
pub use time::{FixedTimeUpdate, RelativeTimeUpdate};

use std::any::Any;

use crate::system::{System, SystemHandle};

/// What happens when a system of a scheduler fails.
///
/// The system's error handler, if any, always runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorPolicy {
    /// Log at error level and abort the whole tick; `run_systems` returns
    /// the failure.
    Propagate,
    /// Log at error level and keep going.
    #[default]
    Swallow,
    /// Log at debug level and keep going.
    Silent,
    /// Log at error level, finish the current pass of this scheduler, then
    /// skip the remaining schedulers of the tick. No error is returned.
    FinishScheduler,
}

/// A typed owner of system groups.
///
/// Implementors only need to expose their [`SystemSet`]; the cadence hooks
/// default to "one pass per tick". The core drives the hooks; while a pass
/// runs, the groups are detached from the set, so calls made from inside a
/// system (adding groups, enabling, disabling) are recorded and applied once
/// the scheduler finishes.
pub trait Scheduler: Any {
    fn systems(&self) -> &SystemSet;

    fn systems_mut(&mut self) -> &mut SystemSet;

    /// Called once per tick before any pass; returns the number of passes.
    fn begin_tick(&mut self) -> u32 {
        1
    }

    /// Called before pass `pass` (zero-based).
    fn begin_pass(&mut self, _pass: u32) {}

    /// Called after the last pass of the tick.
    fn end_tick(&mut self) {}

    /// One-shot schedulers drop their groups after running them.
    fn is_one_shot(&self) -> bool {
        false
    }

    /// Appends a group, returning one handle per system (see [`SystemSet::add`]).
    fn add(&mut self, group: Vec<System>) -> Vec<SystemHandle> {
        self.systems_mut().add(group)
    }

    fn enable(&mut self, handle: SystemHandle) {
        self.systems_mut().enable(handle);
    }

    fn disable(&mut self, handle: SystemHandle) {
        self.systems_mut().disable(handle);
    }

    fn error_policy(&self) -> ErrorPolicy {
        self.systems().error_policy()
    }

    fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.systems_mut().set_error_policy(policy);
    }
}

/// Declares a scheduler type that runs its groups once per tick.
///
/// ```
/// squared_ecs::declare_scheduler! {
///     /// Runs after physics.
///     pub PostPhysics
/// }
/// ```
///
/// Append `, one_shot` to declare a scheduler whose groups run once and are
/// then dropped, like [`Startup`].
#[macro_export]
macro_rules! declare_scheduler {
    ($(#[$meta:meta])* $vis:vis $name:ident, one_shot) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            systems: $crate::SystemSet,
        }

        impl $crate::Scheduler for $name {
            fn systems(&self) -> &$crate::SystemSet {
                &self.systems
            }

            fn systems_mut(&mut self) -> &mut $crate::SystemSet {
                &mut self.systems
            }

            fn is_one_shot(&self) -> bool {
                true
            }
        }
    };
    ($(#[$meta:meta])* $vis:vis $name:ident) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            systems: $crate::SystemSet,
        }

        impl $crate::Scheduler for $name {
            fn systems(&self) -> &$crate::SystemSet {
                &self.systems
            }

            fn systems_mut(&mut self) -> &mut $crate::SystemSet {
                &mut self.systems
            }
        }
    };
}
