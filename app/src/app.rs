//! Main application struct and run loop.

use squared_default_pipeline::DefaultPipelinePlugin;
use squared_ecs::{Core, FixedTimeUpdate, RenderPresent, Startup, Update};
use squared_graphics::GraphicSettings;

use crate::args::AppArgs;
use crate::context::AppContext;
use crate::error::AppError;
use crate::handler::AppHandler;

/// Main application struct: builds the core, then ticks it headless.
///
/// The `App` struct is generic over:
/// - `H`: The handler type that implements [`AppHandler`]
/// - `A`: The arguments type that implements [`AppArgs`]
///
/// # Example
///
/// ```
/// use squared_app::{App, AppHandler, DefaultAppArgs};
/// use squared_graphics::BackendSelection;
///
/// struct Empty;
/// impl AppHandler for Empty {}
///
/// let args = DefaultAppArgs::default()
///     .with_backend(BackendSelection::Dummy)
///     .with_max_frames(3);
/// let frames = App::new(Empty, args).run().unwrap();
/// assert_eq!(frames, 3);
/// ```
pub struct App<H, A>
where
    H: AppHandler,
    A: AppArgs,
{
    handler: H,
    args: A,
}

impl<H, A> App<H, A>
where
    H: AppHandler,
    A: AppArgs,
{
    /// Create a new application.
    pub fn new(handler: H, args: A) -> Self {
        Self { handler, args }
    }

    /// Builds the core, hands it to the handler, then ticks until the
    /// frame limit is reached or a system calls [`Core::stop`].
    ///
    /// Returns the number of frames that completed.
    pub fn run(mut self) -> Result<u64, AppError> {
        squared_core::init_logging();
        squared_core::init();
        squared_graphics::init();
        crate::init();

        let mut core = self.build_core()?;
        self.handler.on_init(&mut core)?;

        log::info!(
            "Running headless (frame limit: {})",
            self.args
                .max_frames()
                .map_or_else(|| "none".to_string(), |max| max.to_string())
        );
        let result = core.run_core();
        self.handler.on_shutdown(&mut core);
        result?;

        let frames = core.get_resource::<AppContext>()?.frame_number();
        log::info!("Application finished after {frames} frames");
        Ok(frames)
    }

    /// A core with the default pipeline, the graphic settings and the fixed
    /// time scheduler configured from the arguments.
    pub fn build_core(&self) -> Result<Core, AppError> {
        let mut core = Core::new();
        core.register_resource(GraphicSettings::default().with_backend(self.args.backend()))?;
        core.register_resource(AppContext::new(self.args.max_frames()))?;

        let tick_rate = 1.0 / self.args.fixed_tick_rate();
        core.register_scheduler(FixedTimeUpdate::new(tick_rate))?;
        core.set_scheduler_before::<Startup, FixedTimeUpdate>();
        core.set_scheduler_before::<FixedTimeUpdate, Update>();

        core.add_plugins::<(DefaultPipelinePlugin,)>()?;
        core.register_system::<RenderPresent, _>(finish_frame);
        Ok(core)
    }
}

/// Counts the frame and stops the core once the frame limit is reached.
fn finish_frame(core: &mut Core) -> Result<(), AppError> {
    let limit_reached = core.get_resource::<AppContext>()?.finish_frame();
    if limit_reached {
        log::debug!("Frame limit reached, stopping");
        core.stop();
    }
    Ok(())
}
