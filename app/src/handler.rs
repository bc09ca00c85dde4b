//! Application handler trait.

use squared_ecs::Core;

use crate::error::AppError;

/// Trait for plugging application logic into the run loop.
///
/// # Lifecycle
///
/// 1. `on_init` - Called once, after the default plugins are installed and
///    before the first tick. Spawn the scene and register systems here.
/// 2. The core ticks until the frame limit is reached or a system calls
///    [`Core::stop`].
/// 3. `on_shutdown` - Called once the `Shutdown` systems ran. The scene is
///    still in the registry, GPU resources are already released.
///
/// # Example
///
/// ```
/// use squared_app::{AppError, AppHandler};
/// use squared_ecs::{Core, Update};
///
/// struct Counter;
///
/// impl AppHandler for Counter {
///     fn on_init(&mut self, core: &mut Core) -> Result<(), AppError> {
///         core.register_resource(0u32)?;
///         core.register_system::<Update, _>(|core: &mut Core| {
///             *core.get_resource::<u32>()? += 1;
///             Ok::<(), squared_ecs::EcsError>(())
///         });
///         Ok(())
///     }
/// }
/// ```
pub trait AppHandler {
    /// Called once before the first tick.
    fn on_init(&mut self, _core: &mut Core) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once after the core shut down.
    fn on_shutdown(&mut self, _core: &mut Core) {}
}
