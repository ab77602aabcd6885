// appstrap - app/args.rs
//
// The shared command-line surface every bootstrapped application gets,
// and the factory producing a `clap::Command` from the application's
// metadata. Applications extend the returned command with their own
// arguments and subcommands.

use crate::app::entry::AppInfo;
use crate::core::record::Severity;
use crate::util::constants;
use crate::util::error::LoggingError;
use clap::Args;
use std::path::Path;

/// Flags common to every bootstrapped application. Embeddable in a
/// derive-style CLI with `#[command(flatten)]`.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Numeric log threshold between 1 and 50 (20 = info).
    #[arg(
        long = "log-level",
        value_name = "N",
        default_value_t = constants::DEFAULT_LOG_LEVEL_NO,
        allow_negative_numbers = true
    )]
    pub log_level: i64,

    /// Log debug detail when the log level is left at its default.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// File to copy log output to; empty or "-" disables file logging.
    #[arg(long = "log-file", value_name = "PATH", default_value = "")]
    pub log_file: String,

    /// Configuration file to load; empty or "-" skips loading.
    #[arg(long = "config-file", value_name = "PATH", default_value = "")]
    pub config_file: String,

    /// Startup overrides file (discovered automatically when omitted).
    #[arg(long = "hook-file", value_name = "PATH")]
    pub hook_file: Option<std::path::PathBuf>,
}

impl CommonArgs {
    /// The log file path, unless disabled by the empty/`-` sentinel.
    pub fn log_file_path(&self) -> Option<&Path> {
        effective_path(&self.log_file)
    }

    /// The config file path, unless disabled by the empty/`-` sentinel.
    pub fn config_file_path(&self) -> Option<&Path> {
        effective_path(&self.config_file)
    }
}

fn effective_path(value: &str) -> Option<&Path> {
    if value.is_empty() || value == constants::DISABLED_SENTINEL {
        None
    } else {
        Some(Path::new(value))
    }
}

/// Builds the application's `clap::Command` from its metadata, with the
/// common flags attached. The caller customises the result (arguments,
/// subcommands) before parsing.
pub fn make_command(info: &AppInfo) -> clap::Command {
    let command = clap::Command::new(info.name)
        .version(info.version)
        .author(info.author)
        .about(info.description)
        .after_help(format!("See {} for more information.", info.url));
    CommonArgs::augment_args(command)
}

/// Resolves the numeric log level from the parsed arguments.
///
/// An explicit `--log-level` must be within bounds or setup fails with a
/// user-facing error. When the flag is left at its default, a level from
/// the config file wins next, then `--verbose` selects debug over info.
pub fn resolve_level(
    args: &CommonArgs,
    config_fallback: Option<Severity>,
) -> Result<u32, LoggingError> {
    if args.log_level != constants::DEFAULT_LOG_LEVEL_NO {
        if !(constants::MIN_LOG_LEVEL_NO..=constants::MAX_LOG_LEVEL_NO).contains(&args.log_level) {
            return Err(LoggingError::InvalidLevel {
                value: args.log_level,
            });
        }
        return Ok(args.log_level as u32);
    }
    if let Some(severity) = config_fallback {
        return Ok(severity.number());
    }
    Ok(if args.verbose {
        Severity::Debug.number()
    } else {
        Severity::Info.number()
    })
}
