// appstrap - app/hooks.rs
//
// Startup overrides (the "hook file"): a TOML file kept out of source
// control that declares filter rules for a DebugLogger, picked up at
// startup. Discovery probes a handful of conventional locations; loading
// validates the raw document into a RuleSet.
//
// A hook file that simply is not there is skipped (best-effort feature);
// one that exists but cannot be used is a hard setup error.

use crate::app::args::CommonArgs;
use crate::core::matcher::{Interval, Matcher};
use crate::core::record::{FilterField, Severity};
use crate::core::rules::{RuleSet, RuleSetBuilder};
use crate::util::constants;
use crate::util::error::HookError;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Discovery
// =============================================================================

/// Locates the overrides file.
///
/// Probe order: the explicit `--hook-file` (returned even when absent,
/// so a misspelled path surfaces as an error instead of silence);
/// `<base_package>/overrides.toml` under the working directory;
/// `overrides.toml` in the working directory; the platform config
/// directory. Returns `None` when no probe hits.
pub fn discover(base_package: &str, args: &CommonArgs) -> Option<PathBuf> {
    if let Some(found) = discover_in(Path::new("."), base_package, args) {
        return Some(found);
    }
    if let Some(dirs) = ProjectDirs::from("", "", base_package) {
        let candidate = dirs.config_dir().join(constants::HOOK_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Working-directory probes, rooted at `root` so they can be exercised
/// against a temporary directory.
pub fn discover_in(root: &Path, base_package: &str, args: &CommonArgs) -> Option<PathBuf> {
    if let Some(explicit) = &args.hook_file {
        return Some(explicit.clone());
    }
    let in_package = root.join(base_package).join(constants::HOOK_FILE_NAME);
    if in_package.exists() {
        return Some(in_package);
    }
    let in_root = root.join(constants::HOOK_FILE_NAME);
    if in_root.exists() {
        return Some(in_root);
    }
    None
}

// =============================================================================
// Overrides document
// =============================================================================

/// Validated startup overrides.
#[derive(Debug, Clone)]
pub struct Overrides {
    /// Restrict the handler to one target subtree.
    pub scope: Option<String>,

    /// Register the handler's layer alone, without the standard console
    /// output alongside it.
    pub exclusive: bool,

    /// The declared filter rules. Callback slots cannot be expressed in
    /// a file and stay programmatic-only.
    pub rules: RuleSet,
}

/// Raw deserialisable shape of overrides.toml. Unknown keys are ignored
/// for forward compatibility.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OverridesSpec {
    scope: Option<String>,
    exclusive: bool,
    include: RuleSection,
    exclude: RuleSection,
}

/// One rule kind's table: field name to condition.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RuleSection {
    thread: Option<MatcherSpec>,
    name: Option<MatcherSpec>,
    file_name: Option<MatcherSpec>,
    func_name: Option<MatcherSpec>,
    level_name: Option<MatcherSpec>,
    level_no: Option<MatcherSpec>,
    line: Option<MatcherSpec>,
    message: Option<MatcherSpec>,
    module: Option<MatcherSpec>,
    path: Option<MatcherSpec>,
    process: Option<MatcherSpec>,
    created: Option<IntervalSpec>,
    relative_created: Option<IntervalSpec>,
    level_in: Option<Vec<String>>,
}

/// A bare string is a literal; `{ pattern = "..." }` compiles to a regex.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MatcherSpec {
    Literal(String),
    Pattern { pattern: String },
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct IntervalSpec {
    low: f64,
    high: f64,
}

impl MatcherSpec {
    fn compile(self, field: &'static str) -> Result<Matcher, HookError> {
        match self {
            MatcherSpec::Literal(value) => Ok(Matcher::literal(value)),
            MatcherSpec::Pattern { pattern } => {
                Matcher::pattern(&pattern).map_err(|e| match e {
                    crate::util::error::FilterError::InvalidRegex { pattern, source } => {
                        HookError::InvalidRegex {
                            field,
                            pattern,
                            source,
                        }
                    }
                })
            }
        }
    }
}

impl RuleSection {
    fn matcher_specs(self) -> (Vec<(FilterField, MatcherSpec)>, Option<IntervalSpec>, Option<IntervalSpec>, Option<Vec<String>>) {
        let pairs = [
            (FilterField::Thread, self.thread),
            (FilterField::Name, self.name),
            (FilterField::FileName, self.file_name),
            (FilterField::FuncName, self.func_name),
            (FilterField::LevelName, self.level_name),
            (FilterField::LevelNo, self.level_no),
            (FilterField::Line, self.line),
            (FilterField::Message, self.message),
            (FilterField::Module, self.module),
            (FilterField::Path, self.path),
            (FilterField::Process, self.process),
        ]
        .into_iter()
        .filter_map(|(field, spec)| spec.map(|spec| (field, spec)))
        .collect();
        (pairs, self.created, self.relative_created, self.level_in)
    }
}

fn parse_levels(names: Vec<String>) -> Result<Vec<Severity>, HookError> {
    names
        .into_iter()
        .map(|name| {
            Severity::from_name(&name).ok_or(HookError::UnknownLevel { value: name })
        })
        .collect()
}

/// Loads and validates an overrides file.
pub fn load(path: &Path) -> Result<Overrides, HookError> {
    let content = std::fs::read_to_string(path).map_err(|e| HookError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let spec: OverridesSpec = toml::from_str(&content).map_err(|e| HookError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut builder = RuleSet::builder();
    builder = apply_section(builder, spec.include, RuleKind::Include)?;
    builder = apply_section(builder, spec.exclude, RuleKind::Exclude)?;

    Ok(Overrides {
        scope: spec.scope,
        exclusive: spec.exclusive,
        rules: builder.build(),
    })
}

enum RuleKind {
    Include,
    Exclude,
}

fn apply_section(
    mut builder: RuleSetBuilder,
    section: RuleSection,
    kind: RuleKind,
) -> Result<RuleSetBuilder, HookError> {
    let (pairs, created, relative_created, level_in) = section.matcher_specs();
    for (field, spec) in pairs {
        let matcher = spec.compile(field.key())?;
        builder = match kind {
            RuleKind::Include => builder.include(field, matcher),
            RuleKind::Exclude => builder.exclude(field, matcher),
        };
    }
    if let Some(iv) = created {
        let interval = Interval::new(iv.low, iv.high);
        builder = match kind {
            RuleKind::Include => builder.include_created(interval),
            RuleKind::Exclude => builder.exclude_created(interval),
        };
    }
    if let Some(iv) = relative_created {
        let interval = Interval::new(iv.low, iv.high);
        builder = match kind {
            RuleKind::Include => builder.include_relative_created(interval),
            RuleKind::Exclude => builder.exclude_relative_created(interval),
        };
    }
    if let Some(names) = level_in {
        let levels = parse_levels(names)?;
        builder = match kind {
            RuleKind::Include => builder.include_levels(levels),
            RuleKind::Exclude => builder.exclude_levels(levels),
        };
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Args, FromArgMatches};
    use std::fs;

    fn args_from(argv: &[&str]) -> CommonArgs {
        let command = CommonArgs::augment_args(clap::Command::new("demo"));
        let matches = command.try_get_matches_from(argv).unwrap();
        CommonArgs::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn explicit_hook_file_wins_even_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(constants::HOOK_FILE_NAME), "").unwrap();

        let args = args_from(&["demo", "--hook-file", "/nonexistent/overrides.toml"]);
        let found = discover_in(dir.path(), "demo", &args).unwrap();
        assert_eq!(found, PathBuf::from("/nonexistent/overrides.toml"));
    }

    #[test]
    fn package_directory_probe_precedes_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let package_dir = dir.path().join("demo");
        fs::create_dir(&package_dir).unwrap();
        fs::write(package_dir.join(constants::HOOK_FILE_NAME), "").unwrap();
        fs::write(dir.path().join(constants::HOOK_FILE_NAME), "").unwrap();

        let args = args_from(&["demo"]);
        let found = discover_in(dir.path(), "demo", &args).unwrap();
        assert_eq!(found, package_dir.join(constants::HOOK_FILE_NAME));
    }

    #[test]
    fn working_directory_probe_is_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(constants::HOOK_FILE_NAME), "").unwrap();

        let args = args_from(&["demo"]);
        let found = discover_in(dir.path(), "demo", &args).unwrap();
        assert_eq!(found, dir.path().join(constants::HOOK_FILE_NAME));

        let empty = tempfile::tempdir().unwrap();
        assert!(discover_in(empty.path(), "demo", &args).is_none());
    }

    #[test]
    fn loads_literals_patterns_intervals_and_levels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(constants::HOOK_FILE_NAME);
        fs::write(
            &path,
            r#"
scope = "myapp"
exclusive = true

[exclude]
name = "myapp::noisy"
message = { pattern = "^tick" }

[include]
level_in = ["debug", "WARNING"]
relative_created = { low = 0.0, high = 60000.0 }
"#,
        )
        .unwrap();

        let overrides = load(&path).unwrap();
        assert_eq!(overrides.scope.as_deref(), Some("myapp"));
        assert!(overrides.exclusive);

        let rules = &overrides.rules;
        assert!(matches!(
            rules.field(FilterField::Name).exclude,
            Some(Matcher::Literal(_))
        ));
        assert!(matches!(
            rules.field(FilterField::Message).exclude,
            Some(Matcher::Pattern(_))
        ));
        let levels = rules.levels.include.as_ref().unwrap();
        assert!(levels.contains(&Severity::Debug));
        assert!(levels.contains(&Severity::Warning));
        assert_eq!(
            rules.relative_created.include,
            Some(Interval::new(0.0, 60000.0))
        );
    }

    #[test]
    fn empty_overrides_produce_empty_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(constants::HOOK_FILE_NAME);
        fs::write(&path, "").unwrap();

        let overrides = load(&path).unwrap();
        assert!(overrides.rules.is_empty());
        assert!(!overrides.exclusive);
        assert!(overrides.scope.is_none());
    }

    #[test]
    fn bad_regex_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(constants::HOOK_FILE_NAME);
        fs::write(&path, "[exclude]\nmessage = { pattern = \"[oops\" }\n").unwrap();

        assert!(matches!(
            load(&path),
            Err(HookError::InvalidRegex {
                field: "message",
                ..
            })
        ));
    }

    #[test]
    fn unknown_level_name_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(constants::HOOK_FILE_NAME);
        fs::write(&path, "[include]\nlevel_in = [\"loud\"]\n").unwrap();

        assert!(matches!(
            load(&path),
            Err(HookError::UnknownLevel { .. })
        ));
    }

    #[test]
    fn missing_and_malformed_files_are_distinct_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("absent.toml")),
            Err(HookError::Io { .. })
        ));

        let path = dir.path().join(constants::HOOK_FILE_NAME);
        fs::write(&path, "not [valid toml").unwrap();
        assert!(matches!(load(&path), Err(HookError::TomlParse { .. })));
    }
}
