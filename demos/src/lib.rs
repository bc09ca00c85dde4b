//! # Squared Demos
//!
//! Demo scenes showcasing the Squared engine.
//!
//! ## Available Demos
//!
//! - `forward_demo` - A grid of spinning meshes lit by the default forward
//!   pass, with entities periodically recycled

pub mod scene;

pub use scene::{ForwardScene, Spin};

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
