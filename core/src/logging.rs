//! Logger bootstrap.
//!
//! Library code only talks to the `log` facade. Binaries call
//! [`init_logging`] once; `RUST_LOG` overrides the `info` default.

/// Installs `env_logger` with an `info` default filter.
///
/// Returns `false` when a logger was already installed.
pub fn init_logging() -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .is_ok()
}

/// Installs a test-friendly logger (captured by the test harness).
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}
