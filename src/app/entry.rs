// appstrap - app/entry.rs
//
// The generic application entry point: parse arguments, load config,
// pick up startup overrides, initialise logging, hand control to the
// application function, and coerce its outcome into a process exit code.
//
// Exit code scheme: the application's own result maps through
// `IntoExitCode` (0 success, 1 refusal); a bootstrap failure is 1; an
// error returned by the application function is -2 so wrappers can tell
// a crash from an ordinary failure.

use crate::app::args::{make_command, CommonArgs};
use crate::app::config::ConfigDoc;
use crate::app::{hooks, logging};
use crate::core::layer::program_start;
use crate::util::constants;
use clap::FromArgMatches;
use std::ffi::OsString;

// =============================================================================
// Application metadata
// =============================================================================

/// Static description of the application being bootstrapped.
#[derive(Debug, Clone, Copy)]
pub struct AppInfo {
    /// Application (and base package) name.
    pub name: &'static str,

    /// Version string, typically `env!("CARGO_PKG_VERSION")`.
    pub version: &'static str,

    /// "dev" for development builds, empty for releases.
    pub stage: &'static str,

    pub author: &'static str,

    pub description: &'static str,

    /// Project URL shown in the command's after-help.
    pub url: &'static str,
}

/// Everything the application function receives: parsed arguments, the
/// raw matches (for subcommand dispatch), and the loaded configuration.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub info: AppInfo,
    pub args: CommonArgs,
    pub matches: clap::ArgMatches,
    pub config: ConfigDoc,
}

// =============================================================================
// Exit code coercion
// =============================================================================

/// Coercion from application results to process exit codes.
pub trait IntoExitCode {
    fn into_exit_code(self) -> i32;
}

impl IntoExitCode for i32 {
    fn into_exit_code(self) -> i32 {
        self
    }
}

impl IntoExitCode for () {
    fn into_exit_code(self) -> i32 {
        0
    }
}

impl IntoExitCode for bool {
    fn into_exit_code(self) -> i32 {
        if self {
            0
        } else {
            1
        }
    }
}

// A non-empty string result is a success; emptiness signals failure.
impl IntoExitCode for String {
    fn into_exit_code(self) -> i32 {
        self.as_str().into_exit_code()
    }
}

impl IntoExitCode for &str {
    fn into_exit_code(self) -> i32 {
        if self.is_empty() {
            1
        } else {
            0
        }
    }
}

// =============================================================================
// run
// =============================================================================

/// Entry point for the application, reading the process arguments.
///
/// `customize` receives the factory-made `clap::Command` and may add
/// arguments and subcommands; `func` is the application itself.
pub fn run<T, E, C, F>(info: AppInfo, customize: C, func: F) -> i32
where
    T: IntoExitCode,
    E: std::error::Error,
    C: FnOnce(clap::Command) -> clap::Command,
    F: FnOnce(&AppContext) -> Result<T, E>,
{
    run_from(std::env::args_os(), info, customize, func)
}

/// `run` over an explicit argument list. This is the seam end-to-end
/// tests drive.
pub fn run_from<I, S, T, E, C, F>(argv: I, info: AppInfo, customize: C, func: F) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    T: IntoExitCode,
    E: std::error::Error,
    C: FnOnce(clap::Command) -> clap::Command,
    F: FnOnce(&AppContext) -> Result<T, E>,
{
    // Pin the relative-created origin as early as possible.
    let _ = program_start();

    let command = customize(make_command(&info));
    let matches = command.get_matches_from(argv);
    let args = match CommonArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    let (config, config_warnings) = ConfigDoc::load_or_default(args.config_file_path());

    // Startup overrides. Only a file that is actually present gets
    // loaded, so absence stays silent; a present-but-broken file is a
    // setup failure.
    let hook_file = hooks::discover(info.name, &args);
    let overrides = match &hook_file {
        Some(path) => match hooks::load(path) {
            Ok(overrides) => Some(overrides),
            Err(e) => {
                eprintln!("ERROR! {e}");
                return constants::EXIT_SETUP_FAILURE;
            }
        },
        None => None,
    };

    if let Err(e) = logging::init(&args, &config, &info, false, overrides.as_ref()) {
        eprintln!("ERROR! {e}");
        return constants::EXIT_SETUP_FAILURE;
    }

    for warning in &config_warnings {
        tracing::warn!("{warning}");
    }
    match config.path() {
        Some(path) => tracing::debug!("config file is at {}", path.display()),
        None => tracing::debug!("no config file loaded"),
    }
    match &hook_file {
        Some(path) => tracing::debug!("hook file is at {}", path.display()),
        None => tracing::debug!("no hook file was loaded"),
    }

    let ctx = AppContext {
        info,
        args,
        matches,
        config,
    };

    match func(&ctx) {
        Ok(result) => result.into_exit_code(),
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                tracing::error!(cause = %cause, "caused by");
                source = cause.source();
            }
            constants::EXIT_FATAL
        }
    }
}
