//! # Squared ECS
//!
//! Single-threaded entity-component-system core with typed schedulers and
//! plugins.
//!
//! ## Data
//!
//! - [`Entity`]: generational entity identifier
//! - [`Registry`]: entities plus one sparse set per component type, with views
//! - [`ResourceRef`] / [`ResourceRefMut`]: guards over typed singleton resources
//!
//! ## Systems & Scheduling
//!
//! - [`Core`]: owns the registry, resources, schedulers and plugins; runs ticks
//! - [`IntoSystem`] / [`SystemGroup`]: turn closures and `fn` items into ordered groups
//! - [`Scheduler`]: typed owner of system groups with an [`ErrorPolicy`]
//! - Built-in schedulers: [`Startup`], [`Update`], [`FixedTimeUpdate`],
//!   [`RelativeTimeUpdate`], [`RenderSetup`], [`Rendering`], [`RenderPresent`],
//!   [`Shutdown`]
//!
//! ## Plugins
//!
//! - [`Plugin`]: registers resources, schedulers, systems and dependencies
//! - [`PluginSet`]: tuples of plugins for [`Core::add_plugins`]
//!
//! ## Built-in features
//!
//! - [`Relationship`]: parent-child links kept consistent by [`RelationshipPlugin`]
//! - [`EventManager`]: typed events, delivered directly or drained per scheduler
//! - [`SceneManager`]: named scenes swapped by [`update_scene`]

mod engine;
mod entity;
mod error;
mod event;
mod hooks;
mod plugin;
mod registry;
mod relationship;
mod resource;
mod scene;
mod scheduler;
mod sparse_set;
mod system;

pub use engine::{Core, remove_temporary_components};
pub use entity::Entity;
pub use error::{EcsError, IntoSystemResult, SystemError, SystemResult};
pub use event::{EventCallbackId, EventManager, EventPlugin, process_events, push_event};
pub use plugin::{Plugin, PluginSet};
pub use registry::{ComponentSet, Registry};
pub use relationship::{
    Relationship, RelationshipPlugin, get_children, get_parent, is_child_of, remove_parent,
    set_child_of,
};
pub use resource::{ResourceRef, ResourceRefMut};
pub use scene::{Scene, SceneManager, ScenePlugin, update_scene};
pub use scheduler::{
    ErrorPolicy, FixedTimeUpdate, RelativeTimeUpdate, RenderPresent, RenderSetup, Rendering,
    Scheduler, Shutdown, Startup, SystemSet, Update,
};
pub use sparse_set::SparseSet;
pub use system::{
    IntoSystem, System, SystemGroup, SystemHandle, SystemId, WithErrorHandler, with_error_handler,
};
