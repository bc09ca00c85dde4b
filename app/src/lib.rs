//! # Squared App
//!
//! Runs a Squared engine core headless from the command line.
//!
//! ## Overview
//!
//! - [`AppHandler`] - Trait for setting up the scene and cleaning up
//! - [`AppArgs`] - Trait for parsing command line arguments, with the clap
//!   based [`DefaultAppArgs`]
//! - [`App`] - Builds the core with the default pipeline and ticks it
//! - [`AppContext`] - Frame counter and timing, available as a resource
//!
//! ## Example
//!
//! ```no_run
//! use squared_app::{App, AppArgs, AppHandler, DefaultAppArgs};
//!
//! struct MyApp;
//!
//! impl AppHandler for MyApp {}
//!
//! fn main() {
//!     let args = DefaultAppArgs::parse();
//!     if let Err(e) = App::new(MyApp, args).run() {
//!         eprintln!("{e}");
//!     }
//! }
//! ```

mod app;
mod args;
mod context;
mod error;
mod handler;

pub use app::App;
pub use args::{AppArgs, CliBackend, DefaultAppArgs};
pub use context::AppContext;
pub use error::AppError;
pub use handler::AppHandler;

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the app crate version.
pub fn init() {
    log::info!("Squared App v{} initialized", VERSION);
}
