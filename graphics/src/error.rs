//! Graphics error types.

use squared_core::ResourceManagerError;
use squared_ecs::EcsError;

/// Errors that can occur in the graphics system.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// A render pass was executed without any output attachment.
    #[error("render pass `{0}` has no outputs")]
    MissingOutputs(String),

    /// A render pass was executed without a bound shader.
    #[error("render pass `{0}` has no shader bound")]
    MissingShader(String),

    /// The render graph dependencies contain a cycle.
    #[error("cyclic dependency detected between render passes: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),

    /// A named GPU resource is not present in its container.
    #[error("{kind} `{id}` not found")]
    ResourceNotFound { kind: &'static str, id: String },

    /// A handle created by one backend was handed to another.
    #[error("handle from the {found} backend used with the {expected} backend")]
    BackendMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The backend refused to create a command encoder.
    #[error("command encoder creation failed: {0}")]
    CommandEncoderCreation(String),

    /// Failed to initialize the graphics system.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A core lookup (resource, component, entity) failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

impl GraphicsError {
    pub fn not_found(kind: &'static str, error: ResourceManagerError) -> Self {
        let ResourceManagerError::NotFound(id) = error;
        Self::ResourceNotFound { kind, id }
    }
}
