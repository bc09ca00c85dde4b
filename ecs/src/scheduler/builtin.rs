use crate::declare_scheduler;

declare_scheduler! {
    /// Runs its groups on the first tick; groups added after boot run as
    /// soon as they are registered.
    pub Startup, one_shot
}

declare_scheduler! {
    /// Runs every tick. The default target of
    /// [`Core::register_default_system`](crate::Core::register_default_system).
    pub Update
}

declare_scheduler! {
    /// Prepares per-frame GPU state. Ordered after [`Update`].
    pub RenderSetup
}

declare_scheduler! {
    /// Records and submits GPU work. Ordered after [`RenderSetup`].
    pub Rendering
}

declare_scheduler! {
    /// Presents the frame. Ordered after [`Rendering`].
    pub RenderPresent
}

/// Runs once, when the core shuts down; never as part of a regular tick.
#[derive(Default)]
pub struct Shutdown {
    systems: crate::SystemSet,
}

impl crate::Scheduler for Shutdown {
    fn systems(&self) -> &crate::SystemSet {
        &self.systems
    }

    fn systems_mut(&mut self) -> &mut crate::SystemSet {
        &mut self.systems
    }

    fn begin_tick(&mut self) -> u32 {
        0
    }
}
