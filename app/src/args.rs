//! Command line arguments trait and default implementation.
//!
//! Uses clap for CLI parsing with:
//! - Help text (`--help`)
//! - Validation and clear error messages

use clap::Parser;
use squared_graphics::BackendSelection;

/// Trait for parsing command line arguments.
///
/// Implement this trait to customize how your application handles
/// command line arguments. Every method but [`parse`](Self::parse) has a
/// default, so only the options you need have to be overridden.
///
/// # Example
///
/// ```
/// use squared_app::AppArgs;
///
/// struct BenchArgs;
///
/// impl AppArgs for BenchArgs {
///     fn parse() -> Self {
///         BenchArgs
///     }
///
///     fn max_frames(&self) -> Option<u64> {
///         Some(1000)
///     }
/// }
///
/// assert_eq!(BenchArgs::parse().fixed_tick_rate(), 50.0);
/// ```
pub trait AppArgs: Sized {
    /// Parse command line arguments.
    fn parse() -> Self;

    /// Get the graphics backend to use.
    ///
    /// Default: `BackendSelection::Auto` (wgpu when compiled in and an
    /// adapter exists, the dummy backend otherwise)
    fn backend(&self) -> BackendSelection {
        BackendSelection::Auto
    }

    /// Get the maximum number of frames to run before exiting.
    ///
    /// Default: `None` (run until a system stops the core)
    fn max_frames(&self) -> Option<u64> {
        None
    }

    /// Get the `FixedTimeUpdate` frequency, in ticks per second.
    ///
    /// Default: 50
    fn fixed_tick_rate(&self) -> f32 {
        50.0
    }

    /// Get the number of entities a demo scene spawns.
    ///
    /// Default: 16
    fn entities(&self) -> usize {
        16
    }
}

/// Graphics backend selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliBackend {
    /// wgpu when available, the dummy backend otherwise.
    #[default]
    Auto,
    /// Cross-platform backend via wgpu.
    Wgpu,
    /// Recording backend, no GPU involved. For tests and CI.
    Dummy,
}

impl From<CliBackend> for BackendSelection {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Auto => BackendSelection::Auto,
            CliBackend::Wgpu => BackendSelection::Wgpu,
            CliBackend::Dummy => BackendSelection::Dummy,
        }
    }
}

/// Squared engine application arguments.
#[derive(Parser, Debug)]
#[command(
    name = "Squared App",
    about = "Squared engine application",
    long_about = "A headless application powered by the Squared engine.\n\n\
        EXAMPLES:\n\
          # Run ten frames on the recording backend\n\
          ./app --backend dummy --max-frames 10\n\
        \n\
          # Physics at 120 Hz\n\
          ./app --fixed-tick-rate 120",
    version
)]
pub(crate) struct ClapArgs {
    /// Graphics backend to use.
    #[arg(long, default_value = "auto", value_enum)]
    pub backend: CliBackend,

    /// Exit after N frames.
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Fixed update frequency in Hz.
    #[arg(long, default_value = "50", value_parser = parse_tick_rate)]
    pub fixed_tick_rate: f32,

    /// Number of entities spawned by demo scenes.
    #[arg(long, default_value = "16")]
    pub entities: usize,
}

fn parse_tick_rate(value: &str) -> Result<f32, String> {
    let rate: f32 = value
        .parse()
        .map_err(|e| format!("`{value}` is not a number: {e}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("tick rate must be a positive number of Hz, got {value}"))
    }
}

/// Default command line arguments implementation.
///
/// # Examples
///
/// ```bash
/// # Show help
/// ./my_app --help
///
/// # Run 100 frames on the recording backend, then exit
/// ./my_app --backend dummy --max-frames 100
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAppArgs {
    backend: BackendSelection,
    max_frames: Option<u64>,
    fixed_tick_rate: f32,
    entities: usize,
}

impl Default for DefaultAppArgs {
    fn default() -> Self {
        Self {
            backend: BackendSelection::Auto,
            max_frames: None,
            fixed_tick_rate: 50.0,
            entities: 16,
        }
    }
}

impl DefaultAppArgs {
    /// Parses `args` instead of the process arguments.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        ClapArgs::try_parse_from(args).map(Into::into)
    }

    /// Set the graphics backend.
    pub fn with_backend(mut self, backend: BackendSelection) -> Self {
        self.backend = backend;
        self
    }

    /// Set the maximum number of frames.
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn with_fixed_tick_rate(mut self, hz: f32) -> Self {
        self.fixed_tick_rate = hz;
        self
    }

    pub fn with_entities(mut self, entities: usize) -> Self {
        self.entities = entities;
        self
    }
}

impl From<ClapArgs> for DefaultAppArgs {
    fn from(args: ClapArgs) -> Self {
        if args.backend == CliBackend::Wgpu && !squared_graphics::has_gpu_backend() {
            log::warn!(
                "--backend wgpu requested but the wgpu backend is not compiled in. \
                Rebuild with the `wgpu-backend` feature."
            );
        }
        Self {
            backend: args.backend.into(),
            max_frames: args.max_frames,
            fixed_tick_rate: args.fixed_tick_rate,
            entities: args.entities,
        }
    }
}

impl AppArgs for DefaultAppArgs {
    fn parse() -> Self {
        ClapArgs::parse().into()
    }

    fn backend(&self) -> BackendSelection {
        self.backend
    }

    fn max_frames(&self) -> Option<u64> {
        self.max_frames
    }

    fn fixed_tick_rate(&self) -> f32 {
        self.fixed_tick_rate
    }

    fn entities(&self) -> usize {
        self.entities
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_defaults() {
        let args = DefaultAppArgs::try_parse_from(["app"]).unwrap();
        assert_eq!(args, DefaultAppArgs::default());
    }

    #[rstest]
    #[case("auto", BackendSelection::Auto)]
    #[case("wgpu", BackendSelection::Wgpu)]
    #[case("dummy", BackendSelection::Dummy)]
    fn test_backend_flag(#[case] flag: &str, #[case] expected: BackendSelection) {
        let args = DefaultAppArgs::try_parse_from(["app", "--backend", flag]).unwrap();
        assert_eq!(args.backend(), expected);
    }

    #[test]
    fn test_all_flags() {
        let args = DefaultAppArgs::try_parse_from([
            "app",
            "--max-frames",
            "10",
            "--fixed-tick-rate",
            "120",
            "--entities",
            "3",
        ])
        .unwrap();
        assert_eq!(args.max_frames(), Some(10));
        assert_eq!(args.fixed_tick_rate(), 120.0);
        assert_eq!(args.entities(), 3);
    }

    #[rstest]
    #[case(&["app", "--backend", "vulkan"])]
    #[case(&["app", "--fixed-tick-rate", "0"])]
    #[case(&["app", "--fixed-tick-rate", "fast"])]
    #[case(&["app", "--max-frames", "-1"])]
    fn test_rejected(#[case] argv: &[&str]) {
        assert!(DefaultAppArgs::try_parse_from(argv).is_err());
    }
}
