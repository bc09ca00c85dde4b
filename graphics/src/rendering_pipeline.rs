//! Frame stage schedulers and their ordering.
//!
//! ```text
//! Init -> Setup -> Startup -> PreUpdate -> Update -> Preparation -> Extraction
//!   -> PipelineCreation -> RenderSetup -> Batching -> PipelineExecution
//!   -> Rendering -> Submission -> Presentation -> RenderPresent
//! ```

use squared_ecs::{
    Core, EcsError, Plugin, RenderPresent, RenderSetup, Rendering, Scheduler, Startup, Update,
    declare_scheduler,
};

declare_scheduler! {
    /// Runs once, before anything else. Creates the window or surface.
    pub Init, one_shot
}

declare_scheduler! {
    /// Runs once after [`Init`]. Creates the graphic context.
    pub Setup, one_shot
}

declare_scheduler! {
    /// Input and events, before the game logic.
    pub PreUpdate
}

declare_scheduler! {
    /// Uploads changed component data into GPU buffers.
    pub Preparation
}

declare_scheduler! {
    /// Copies what the frame needs out of the registry.
    pub Extraction
}

declare_scheduler! {
    /// Compiles shaders and pipelines requested this frame.
    pub PipelineCreation
}

declare_scheduler! {
    /// Groups draws sharing a pipeline.
    pub Batching
}

declare_scheduler! {
    pub PipelineExecution
}

declare_scheduler! {
    /// Submits the frame's command buffers.
    pub Submission
}

declare_scheduler! {
    pub Presentation
}

/// Registers the stage schedulers and chains them around the built-in ones.
#[derive(Debug, Default)]
pub struct RenderingPipelinePlugin;

fn ensure<S: Scheduler + Default>(core: &mut Core) -> Result<(), EcsError> {
    if !core.has_scheduler::<S>() {
        core.register_scheduler(S::default())?;
    }
    Ok(())
}

impl Plugin for RenderingPipelinePlugin {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        ensure::<Init>(core)?;
        ensure::<Setup>(core)?;
        ensure::<PreUpdate>(core)?;
        ensure::<Preparation>(core)?;
        ensure::<Extraction>(core)?;
        ensure::<PipelineCreation>(core)?;
        ensure::<RenderSetup>(core)?;
        ensure::<Batching>(core)?;
        ensure::<PipelineExecution>(core)?;
        ensure::<Rendering>(core)?;
        ensure::<Submission>(core)?;
        ensure::<Presentation>(core)?;
        ensure::<RenderPresent>(core)?;

        core.set_scheduler_before::<Init, Setup>();
        core.set_scheduler_before::<Setup, Startup>();
        core.set_scheduler_before::<Startup, PreUpdate>();
        core.set_scheduler_before::<PreUpdate, Update>();
        core.set_scheduler_before::<Update, Preparation>();
        core.set_scheduler_before::<Preparation, Extraction>();
        core.set_scheduler_before::<Extraction, PipelineCreation>();
        core.set_scheduler_before::<PipelineCreation, RenderSetup>();
        core.set_scheduler_before::<RenderSetup, Batching>();
        core.set_scheduler_before::<Batching, PipelineExecution>();
        core.set_scheduler_before::<PipelineExecution, Rendering>();
        core.set_scheduler_before::<Rendering, Submission>();
        core.set_scheduler_before::<Submission, Presentation>();
        core.set_scheduler_before::<Presentation, RenderPresent>();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(name: &str) -> &str {
        name.rsplit("::").next().unwrap_or(name)
    }

    #[test]
    fn test_stage_order() {
        let mut core = Core::new();
        core.add_plugins::<(RenderingPipelinePlugin,)>().unwrap();
        let order: Vec<_> = core
            .scheduler_order()
            .unwrap()
            .into_iter()
            .map(short)
            .filter(|name| *name != "Shutdown")
            .collect();
        assert_eq!(order, [
            "Init",
            "Setup",
            "Startup",
            "PreUpdate",
            "Update",
            "Preparation",
            "Extraction",
            "PipelineCreation",
            "RenderSetup",
            "Batching",
            "PipelineExecution",
            "Rendering",
            "Submission",
            "Presentation",
            "RenderPresent",
        ]);
    }

    #[test]
    fn test_setup_runs_once() {
        struct Count(u32);

        let mut core = Core::new();
        core.add_plugins::<(RenderingPipelinePlugin,)>().unwrap();
        core.register_resource(Count(0)).unwrap();
        core.register_system::<Setup, _>(|core: &mut Core| {
            core.get_resource::<Count>().map(|count| count.0 += 1)
        });
        core.run_systems().unwrap();
        core.run_systems().unwrap();
        assert_eq!(core.get_resource::<Count>().unwrap().0, 1);
    }
}
