//! # Squared Core
//!
//! Small building blocks shared by every Squared crate.
//!
//! - [`HashedStr`]: compile-time hashed string used as a stable cache key
//! - [`ResourceManager`]: insertion-ordered keyed cache with an optional default
//! - [`topological_order`]: Kahn sort with insertion-order tie breaking
//! - [`init_logging`]: `env_logger` bootstrap for binaries

mod hashed_str;
mod logging;
mod resource_manager;
mod toposort;

pub use hashed_str::{HashedStr, fnv1a_32};
pub use logging::{init_logging, init_test_logging};
pub use resource_manager::{ResourceManager, ResourceManagerError};
pub use toposort::{CycleError, topological_order};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the crate version once the logger is up.
pub fn init() {
    log::info!("Squared Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_logger_installs_once() {
        init_test_logging();
        init_test_logging();
        assert!(!init_logging());
        init();
    }
}
