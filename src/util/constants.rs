// appstrap - util/constants.rs
//
// Single source of truth for named constants, limits, and defaults.

// =============================================================================
// Log levels
// =============================================================================

/// Lowest accepted numeric log level on the command line.
pub const MIN_LOG_LEVEL_NO: i64 = 1;

/// Highest accepted numeric log level on the command line (critical).
pub const MAX_LOG_LEVEL_NO: i64 = 50;

/// Default numeric log level (info). Leaving `--log-level` at this value
/// lets `--verbose` select debug instead.
pub const DEFAULT_LOG_LEVEL_NO: i64 = 20;

// =============================================================================
// Record formatting
// =============================================================================

/// Column width of the level name in the default record format.
pub const FMT_LEVEL_WIDTH: usize = 7;

/// Column width of the logger name in the default record format.
pub const FMT_NAME_WIDTH: usize = 19;

/// Column width of the thread name in the default record format.
pub const FMT_THREAD_WIDTH: usize = 15;

/// Column width of the function (span) name in the default record format.
pub const FMT_FUNC_WIDTH: usize = 25;

/// Thread name used for records produced by unnamed threads.
pub const UNNAMED_THREAD: &str = "<unnamed>";

/// Process name used when the executable path cannot be determined.
pub const UNKNOWN_PROCESS: &str = "<unknown>";

// =============================================================================
// Configuration and hooks
// =============================================================================

/// Value of `--log-file` / `--config-file` that disables the feature,
/// in addition to the empty string.
pub const DISABLED_SENTINEL: &str = "-";

/// File name probed for startup overrides (the hook file).
pub const HOOK_FILE_NAME: &str = "overrides.toml";

// =============================================================================
// Exit codes
// =============================================================================

/// Exit code for a failure during bootstrap (bad log level, unreadable
/// hook file, log file I/O).
pub const EXIT_SETUP_FAILURE: i32 = 1;

/// Exit code when the application function itself fails. Distinct from
/// ordinary non-zero results so wrappers can tell a crash from a refusal.
pub const EXIT_FATAL: i32 = -2;
