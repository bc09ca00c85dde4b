use std::any::{Any, TypeId, type_name};

use crate::engine::Core;
use crate::error::{IntoSystemResult, SystemResult};

/// Identity of a system: the callable it runs.
///
/// Every closure and every `fn` item has its own type, so those are keyed
/// by type and registering the same function twice yields the same id.
/// Function pointers (`fn(&mut Core)` values) all share one type; they are
/// keyed by the address they point to instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemId {
    Type(TypeId),
    FnPtr(TypeId, usize),
}

impl SystemId {
    pub fn of<F: 'static>() -> Self {
        Self::Type(TypeId::of::<F>())
    }

    /// The id of `callable`, looking through function pointers returning `O`.
    pub fn of_callable<F: 'static, O: 'static>(callable: &F) -> Self {
        match (callable as &dyn Any).downcast_ref::<fn(&mut Core) -> O>() {
            Some(pointer) => Self::FnPtr(TypeId::of::<F>(), *pointer as usize),
            None => Self::of::<F>(),
        }
    }
}

/// Handle to one system inside one scheduler, used to enable or disable it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemHandle(pub(crate) u64);

pub(crate) type BoxedSystemFn = Box<dyn FnMut(&mut Core) -> SystemResult>;
pub(crate) type BoxedHandlerFn = Box<dyn FnMut(&mut Core)>;

/// A type-erased system ready to be stored in a scheduler.
pub struct System {
    pub(crate) id: SystemId,
    pub(crate) name: &'static str,
    pub(crate) run: BoxedSystemFn,
    pub(crate) handler: Option<BoxedHandlerFn>,
}

impl System {
    /// The callable's identity.
    pub fn id(&self) -> SystemId {
        self.id
    }

    /// The callable's type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether an error handler is attached.
    pub fn has_error_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("name", &self.name)
            .field("has_error_handler", &self.handler.is_some())
            .finish()
    }
}

/// Conversion into a [`System`].
///
/// Implemented for every `FnMut(&mut Core) -> O` where `O` is `()` or a
/// `Result<(), E>`, and for [`WithErrorHandler`]. The `Marker` parameter only
/// keeps the blanket implementations apart; callers never name it.
pub trait IntoSystem<Marker>: 'static {
    fn into_system(self) -> System;
}

#[doc(hidden)]
pub struct FunctionSystemMarker;

impl<F, O> IntoSystem<(FunctionSystemMarker, O)> for F
where
    F: FnMut(&mut Core) -> O + 'static,
    O: IntoSystemResult + 'static,
{
    fn into_system(mut self) -> System {
        System {
            id: SystemId::of_callable::<F, O>(&self),
            name: type_name::<F>(),
            run: Box::new(move |core| self(core).into_system_result()),
            handler: None,
        }
    }
}

/// A system paired with the handler that runs when it fails.
///
/// Its identity is the identity of the wrapped system, so a system
/// registered bare and later wrapped is still deduplicated.
pub struct WithErrorHandler<S, H> {
    system: S,
    handler: H,
}

/// Pairs `system` with an error `handler`.
///
/// ```
/// # use squared_ecs::{Core, Update, with_error_handler};
/// fn might_fail(_: &mut Core) -> Result<(), std::fmt::Error> { Err(std::fmt::Error) }
/// fn recover(_: &mut Core) {}
///
/// let mut core = Core::new();
/// core.register_system::<Update, _>(with_error_handler(might_fail, recover));
/// ```
pub fn with_error_handler<S, H>(system: S, handler: H) -> WithErrorHandler<S, H>
where
    H: FnMut(&mut Core) + 'static,
{
    WithErrorHandler { system, handler }
}

#[doc(hidden)]
pub struct HandledSystemMarker;

impl<S, M, H> IntoSystem<(HandledSystemMarker, M)> for WithErrorHandler<S, H>
where
    S: IntoSystem<M>,
    H: FnMut(&mut Core) + 'static,
{
    fn into_system(self) -> System {
        let mut system = self.system.into_system();
        system.handler = Some(Box::new(self.handler));
        system
    }
}

/// An ordered group of systems registered together.
///
/// A single system or a tuple of up to twelve systems.
pub trait SystemGroup<Marker> {
    fn into_systems(self) -> Vec<System>;
}

#[doc(hidden)]
pub struct SingleSystemMarker;
#[doc(hidden)]
pub struct SystemTupleMarker;

impl<S, M> SystemGroup<(SingleSystemMarker, M)> for S
where
    S: IntoSystem<M>,
{
    fn into_systems(self) -> Vec<System> {
        vec![self.into_system()]
    }
}

macro_rules! impl_system_group {
    ($(($system:ident, $marker:ident)),+) => {
        impl<$($system, $marker),+> SystemGroup<(SystemTupleMarker, ($($marker,)+))> for ($($system,)+)
        where
            $($system: IntoSystem<$marker>),+
        {
            #[allow(non_snake_case)]
            fn into_systems(self) -> Vec<System> {
                let ($($system,)+) = self;
                vec![$($system.into_system()),+]
            }
        }
    };
}

impl_system_group!((S0, M0));
impl_system_group!((S0, M0), (S1, M1));
impl_system_group!((S0, M0), (S1, M1), (S2, M2));
impl_system_group!((S0, M0), (S1, M1), (S2, M2), (S3, M3));
impl_system_group!((S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4));
impl_system_group!((S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5));
impl_system_group!((S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5), (S6, M6));
impl_system_group!(
    (S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5), (S6, M6), (S7, M7)
);
impl_system_group!(
    (S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5), (S6, M6), (S7, M7),
    (S8, M8)
);
impl_system_group!(
    (S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5), (S6, M6), (S7, M7),
    (S8, M8), (S9, M9)
);
impl_system_group!(
    (S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5), (S6, M6), (S7, M7),
    (S8, M8), (S9, M9), (S10, M10)
);
impl_system_group!(
    (S0, M0), (S1, M1), (S2, M2), (S3, M3), (S4, M4), (S5, M5), (S6, M6), (S7, M7),
    (S8, M8), (S9, M9), (S10, M10), (S11, M11)
);
