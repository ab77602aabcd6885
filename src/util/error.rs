// appstrap - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation. All errors preserve the causal
// chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all appstrap operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum AppstrapError {
    /// Filter rule construction failed.
    Filter(FilterError),

    /// Configuration loading failed.
    Config(ConfigError),

    /// Logging setup failed.
    Logging(LoggingError),

    /// Hook (overrides file) loading failed.
    Hook(HookError),
}

impl fmt::Display for AppstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Logging(e) => write!(f, "Logging error: {e}"),
            Self::Hook(e) => write!(f, "Hook error: {e}"),
        }
    }
}

impl std::error::Error for AppstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filter(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Logging(e) => Some(e),
            Self::Hook(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter rule construction.
#[derive(Debug)]
pub enum FilterError {
    /// A pattern rule could not be compiled.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid filter regex '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
        }
    }
}

impl From<FilterError> for AppstrapError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading the config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for AppstrapError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Logging errors
// ---------------------------------------------------------------------------

/// Errors related to logging setup.
#[derive(Debug)]
pub enum LoggingError {
    /// `--log-level` was outside the accepted numeric range.
    InvalidLevel { value: i64 },

    /// The log file (or its parent directory) could not be created.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLevel { value } => write!(
                f,
                "--log-level expects an integer between {} and {}, got {value}",
                crate::util::constants::MIN_LOG_LEVEL_NO,
                crate::util::constants::MAX_LOG_LEVEL_NO,
            ),
            Self::Io { path, source } => {
                write!(f, "Cannot open log file '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidLevel { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<LoggingError> for AppstrapError {
    fn from(e: LoggingError) -> Self {
        Self::Logging(e)
    }
}

// ---------------------------------------------------------------------------
// Hook errors
// ---------------------------------------------------------------------------

/// Errors related to loading the startup overrides file.
///
/// A missing hook file is not an error (the feature is best-effort and
/// simply skipped); these cover files that exist but cannot be used.
#[derive(Debug)]
pub enum HookError {
    /// I/O error reading the overrides file.
    Io { path: PathBuf, source: io::Error },

    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A pattern rule in the overrides file could not be compiled.
    InvalidRegex {
        field: &'static str,
        pattern: String,
        source: regex::Error,
    },

    /// A severity name in `level_in` was not recognised.
    UnknownLevel { value: String },
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Cannot read overrides '{}': {source}", path.display())
            }
            Self::TomlParse { path, source } => {
                write!(
                    f,
                    "Overrides parse error '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidRegex {
                field,
                pattern,
                source,
            } => write!(
                f,
                "Overrides: invalid regex for '{field}' ('{pattern}'): {source}"
            ),
            Self::UnknownLevel { value } => write!(
                f,
                "Overrides: unknown severity '{value}' in level_in. \
                 Valid values: critical, error, warning, info, debug, trace."
            ),
        }
    }
}

impl std::error::Error for HookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::TomlParse { source, .. } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            Self::UnknownLevel { .. } => None,
        }
    }
}

impl From<HookError> for AppstrapError {
    fn from(e: HookError) -> Self {
        Self::Hook(e)
    }
}

/// Convenience type alias for appstrap results.
pub type Result<T> = std::result::Result<T, AppstrapError>;
