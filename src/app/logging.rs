// appstrap - app/logging.rs
//
// Structured logging setup for bootstrapped applications.
//
// Activation and priority:
//   - RUST_LOG env var (overrides all other sources)
//   - explicit --log-level N (validated, 1..=50)
//   - [logging] level in the config file
//   - --verbose / default "info"
//
// Output: stderr always; optionally a log file. A startup overrides
// file can attach a filtering DebugLogger layer pinned at the most
// permissive level so its own rule evaluation is authoritative.

use crate::app::args::{resolve_level, CommonArgs};
use crate::app::config::ConfigDoc;
use crate::app::entry::AppInfo;
use crate::app::hooks::Overrides;
use crate::core::handler::DebugLogger;
use crate::core::layer::DebugLayer;
use crate::core::record::Severity;
use crate::util::error::LoggingError;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Maps the numeric threshold onto a `tracing` directive. The scale is
/// coarser than the numbers, so each named level covers the band up to
/// its own number; anything above "warn" collapses to "error".
fn level_directive(level_no: u32) -> &'static str {
    match level_no {
        0..=5 => "trace",
        6..=10 => "debug",
        11..=20 => "info",
        21..=30 => "warn",
        _ => "error",
    }
}

/// Per-layer event filter honouring the RUST_LOG-first priority chain.
fn make_filter(level_no: u32) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level_directive(level_no))
    }
}

/// Opens the log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<std::fs::File, LoggingError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            std::fs::create_dir_all(parent).map_err(|e| LoggingError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggingError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Initialise the logging subsystem.
///
/// `console_friendly` selects a terse level-and-message console format
/// for interactive terminals; the default format carries target, thread
/// name, file, and line. `overrides`, when present, contributes a
/// filtering handler layer (and with `exclusive` replaces the standard
/// output layers entirely).
///
/// An invalid explicit `--log-level` is a user-facing error and setup
/// fails. An already-registered global subscriber is tolerated so
/// registration itself never fails.
pub fn init(
    args: &CommonArgs,
    config: &ConfigDoc,
    info: &AppInfo,
    console_friendly: bool,
    overrides: Option<&Overrides>,
) -> Result<(), LoggingError> {
    let section = config.logging();

    let mut setup_warnings: Vec<String> = Vec::new();
    let config_fallback = match section.level.as_deref() {
        Some(name) => match Severity::from_name(name) {
            Some(severity) => Some(severity),
            None => {
                setup_warnings.push(format!(
                    "[logging] level = \"{name}\" is not recognised. Valid values: \
                     critical, error, warning, info, debug, trace. Using default."
                ));
                None
            }
        },
        None => None,
    };

    let level_no = resolve_level(args, config_fallback)?;

    // --log-file wins over the config file's [logging] file.
    let log_file: Option<PathBuf> = args
        .log_file_path()
        .map(Path::to_path_buf)
        .or_else(|| section.file.as_ref().map(PathBuf::from));

    let debug_layer = overrides.map(|overrides| {
        let handler = Arc::new(DebugLogger::new(overrides.rules.clone()));
        let mut layer = DebugLayer::new(handler);
        if let Some(scope) = &overrides.scope {
            layer = layer.with_scope(scope.clone());
        }
        layer
    });
    let exclusive = overrides.is_some_and(|o| o.exclusive);

    let register_result = if exclusive {
        tracing_subscriber::registry()
            .with(debug_layer.map(|layer| layer.with_filter(LevelFilter::TRACE)))
            .try_init()
    } else {
        let console: Box<dyn Layer<Registry> + Send + Sync> = if console_friendly {
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .compact()
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        };

        let file_layer = match &log_file {
            Some(path) => {
                let file = open_log_file(path)?;
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Arc::new(file))
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_names(true)
                        .with_file(true)
                        .with_line_number(true)
                        .with_filter(make_filter(level_no)),
                )
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(console.with_filter(make_filter(level_no)))
            .with(file_layer)
            .with(debug_layer.map(|layer| layer.with_filter(LevelFilter::TRACE)))
            .try_init()
    };
    if let Err(e) = register_result {
        tracing::debug!(error = %e, "Global subscriber already registered; keeping it");
    }

    for warning in setup_warnings {
        tracing::warn!("{warning}");
    }
    tracing::debug!("{} v{} {} started", info.name, info.version, info.stage);
    match &log_file {
        Some(path) => tracing::debug!("logging to {}", path.display()),
        None => tracing::debug!("logging to stderr only"),
    }

    Ok(())
}
