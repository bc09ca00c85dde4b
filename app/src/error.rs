use squared_ecs::EcsError;
use squared_graphics::GraphicsError;

/// Failures of [`App::run`](crate::App::run).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error(transparent)]
    Graphics(#[from] GraphicsError),

    /// The handler could not set up its scene.
    #[error("initialization failed: {0}")]
    Init(String),
}
