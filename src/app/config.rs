// appstrap - app/config.rs
//
// Configuration file loading. The document is kept as uninterpreted
// sections of key/values for the application; the bootstrap itself only
// consults the `[logging]` section.

use crate::util::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A loaded configuration document.
///
/// Unknown sections and keys are preserved untouched -- the bootstrap
/// never interprets application settings, it only carries them.
#[derive(Debug, Clone, Default)]
pub struct ConfigDoc {
    table: toml::Table,
    path: Option<PathBuf>,
}

/// `[logging]` config section, the one part of the document the
/// bootstrap reads for itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level name: "critical", "error", "warning", "info", "debug",
    /// "trace". Consulted when `--log-level` is left at its default.
    pub level: Option<String>,

    /// Log file path, used when `--log-file` is not given.
    pub file: Option<String>,
}

impl ConfigDoc {
    /// An empty document (no config file in play).
    pub fn empty() -> ConfigDoc {
        ConfigDoc::default()
    }

    /// Loads and parses `path`. Strict variant: any read or parse
    /// failure is returned.
    pub fn load(path: &Path) -> Result<ConfigDoc, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(ConfigDoc {
            table,
            path: Some(path.to_path_buf()),
        })
    }

    /// Lenient variant used by the bootstrap: a missing file yields an
    /// empty document, an unusable file yields an empty document plus a
    /// warning string for later logging. The application still starts
    /// either way.
    pub fn load_or_default(path: Option<&Path>) -> (ConfigDoc, Vec<String>) {
        let mut warnings = Vec::new();
        let Some(path) = path else {
            return (ConfigDoc::empty(), warnings);
        };
        if !path.exists() {
            return (ConfigDoc::empty(), warnings);
        }
        match ConfigDoc::load(path) {
            Ok(doc) => (doc, warnings),
            Err(e) => {
                warnings.push(format!("{e}. Using defaults."));
                (ConfigDoc::empty(), warnings)
            }
        }
    }

    /// Path the document was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A named section's key/value table.
    pub fn section(&self, name: &str) -> Option<&toml::Table> {
        self.table.get(name).and_then(|v| v.as_table())
    }

    /// A string value by section and key.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)
            .and_then(|t| t.get(key))
            .and_then(|v| v.as_str())
    }

    /// Typed view of the `[logging]` section. Malformed entries fall
    /// back to the empty section.
    pub fn logging(&self) -> LoggingSection {
        self.section("logging")
            .and_then(|t| toml::Value::Table(t.clone()).try_into().ok())
            .unwrap_or_default()
    }
}
