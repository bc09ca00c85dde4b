//! Error types shared by the registry, the resource store, the schedulers
//! and the plugin loader.

use std::error::Error;
use std::fmt;

use crate::entity::Entity;

/// Errors surfaced by [`Core`](crate::Core) operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A resource of this type already exists.
    #[error("resource `{0}` is already registered")]
    AlreadyRegistered(&'static str),

    /// A scheduler of this type already exists.
    #[error("scheduler `{0}` is already registered")]
    SchedulerAlreadyRegistered(&'static str),

    /// No resource of this type exists.
    #[error("resource `{0}` does not exist")]
    MissingResource(&'static str),

    /// No scheduler of this type exists.
    #[error("scheduler `{0}` does not exist")]
    MissingScheduler(&'static str),

    /// The resource is currently borrowed in a conflicting way.
    #[error("resource `{0}` is already borrowed")]
    ResourceBorrowed(&'static str),

    /// A mutable view names the same component type twice.
    #[error("component `{0}` cannot be borrowed mutably twice in the same view")]
    AliasedComponent(&'static str),

    /// The entity does not carry the requested component.
    #[error("entity {entity} has no component `{component}`")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    /// The entity already carries a component of this type.
    #[error("entity {entity} already has component `{component}`")]
    AlreadyAttached {
        entity: Entity,
        component: &'static str,
    },

    /// The entity handle is stale or null.
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),

    /// The engine was wired up incorrectly.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A plugin requires itself through its own dependencies.
    #[error("circular plugin dependency: {0}")]
    CircularPluginDependency(String),

    /// The scheduler ordering constraints contain a cycle.
    #[error("cyclic dependency detected between schedulers: {}", .0.join(", "))]
    CyclicSchedulerDependency(Vec<&'static str>),

    /// A system failed under the `Propagate` policy.
    #[error("system `{system}` failed in scheduler `{scheduler}`: {error}")]
    SystemFailed {
        scheduler: &'static str,
        system: &'static str,
        #[source]
        error: SystemError,
    },

    /// A construct or destroy hook failed.
    #[error("hook on `{component}` failed: {error}")]
    HookFailed {
        component: &'static str,
        #[source]
        error: SystemError,
    },
}

/// Opaque failure returned by a system, hook or error-prone callback.
///
/// Any `std::error::Error + Send + Sync` converts into it, so systems can
/// return the error type of whichever subsystem they call into.
pub struct SystemError {
    inner: Box<dyn Error + Send + Sync + 'static>,
}

impl SystemError {
    /// Wraps an error (or a message, through `Box<dyn Error>`'s conversions).
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self {
            inner: error.into(),
        }
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Whether the wrapped error is of type `E`.
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.inner.is::<E>()
    }
}

impl fmt::Debug for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for SystemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

/// What systems and hooks return once their output is normalized.
pub type SystemResult = Result<(), SystemError>;

/// Output types a system may return.
///
/// `()` always succeeds; `Result<(), E>` fails with `E`.
pub trait IntoSystemResult {
    fn into_system_result(self) -> SystemResult;
}

impl IntoSystemResult for () {
    fn into_system_result(self) -> SystemResult {
        Ok(())
    }
}

impl<E> IntoSystemResult for Result<(), E>
where
    E: Into<Box<dyn Error + Send + Sync + 'static>>,
{
    fn into_system_result(self) -> SystemResult {
        self.map_err(SystemError::new)
    }
}
