// appstrap - core/handler.rs
//
// The filtering log handler. Given a record, evaluates the configured
// rule slots in a fixed precedence order (exclude, include, callback)
// and forwards accepted records to a sink through a formatting step.
//
// Stage semantics:
//   * exclude: any matching rule drops the record immediately. The
//     interval and level-set excludes are inverted: they drop the record
//     when the value falls OUTSIDE the window / set.
//   * include: every configured rule must match (logical AND).
//   * callback: a matching condition consults its callback; Continue
//     moves to the next slot, Accept/Reject terminate evaluation.

use crate::core::matcher::Interval;
use crate::core::record::{FilterField, Record};
use crate::core::rules::{RuleSet, Verdict};
use crate::util::constants;
use crate::util::error::LoggingError;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

// =============================================================================
// Decision
// =============================================================================

/// Terminal outcome of rule evaluation for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The record passed every stage and is emitted.
    FilteredIn,

    /// Some stage dropped the record.
    FilteredOut,
}

// =============================================================================
// Sinks
// =============================================================================

/// Destination for filtering decisions. `accept` receives records that
/// were filtered in; `reject` receives records that were filtered out
/// and defaults to a no-op. Implement this to override either path.
pub trait Sink: Send + Sync {
    fn accept(&self, msg: &str, record: &Record) -> io::Result<()>;

    fn reject(&self, _msg: &str, _record: &Record) {}
}

/// Default sink: writes formatted records to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn accept(&self, msg: &str, _record: &Record) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{msg}")
    }
}

/// Sink appending formatted records to a file. Writes are serialised
/// through a mutex so the handler stays safe to call from any thread.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Opens `path` for appending, creating parent directories as needed.
    pub fn create(path: &Path) -> Result<FileSink, LoggingError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                std::fs::create_dir_all(parent).map_err(|e| LoggingError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LoggingError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(FileSink {
            file: Mutex::new(file),
        })
    }
}

impl Sink for FileSink {
    fn accept(&self, msg: &str, _record: &Record) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(file, "{msg}")
    }
}

// =============================================================================
// Formatting
// =============================================================================

type FormatFn = Box<dyn Fn(&Record) -> String + Send + Sync>;

/// Default record format:
/// `[MM:SS.mmm] [LEVEL  ] [namespace          ] [thread        ] [func] msg`
fn default_format(record: &Record) -> String {
    format!(
        "[{}] [{:<lw$}] [{:<nw$}] [{:<tw$}] [{:<fw$}] {}",
        record.created.format("%M:%S%.3f"),
        record.severity.label(),
        record.name,
        record.thread,
        record.func_name,
        record.message,
        lw = constants::FMT_LEVEL_WIDTH,
        nw = constants::FMT_NAME_WIDTH,
        tw = constants::FMT_THREAD_WIDTH,
        fw = constants::FMT_FUNC_WIDTH,
    )
}

// =============================================================================
// DebugLogger
// =============================================================================

/// Logging handler that allows extended filtering of the output.
///
/// One place to drive this is an `overrides.toml` kept out of source
/// control and picked up at startup (see `app::hooks`), so debug-time
/// filtering never leaks into committed configuration.
///
/// Rule slots are read-only after construction; the handler performs no
/// locking of its own beyond sink write serialisation and is safe to call
/// from any thread.
pub struct DebugLogger {
    rules: RuleSet,
    formatter: FormatFn,
    sink: Box<dyn Sink>,
}

impl fmt::Debug for DebugLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugLogger")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl DebugLogger {
    /// Handler with the default formatter and the stderr sink.
    pub fn new(rules: RuleSet) -> DebugLogger {
        DebugLogger {
            rules,
            formatter: Box::new(default_format),
            sink: Box::new(ConsoleSink),
        }
    }

    /// Replaces the record formatter.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Record) -> String + Send + Sync + 'static,
    {
        self.formatter = Box::new(formatter);
        self
    }

    /// Replaces the sink.
    pub fn with_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Renders a record through the configured formatter.
    pub fn format(&self, record: &Record) -> String {
        (self.formatter)(record)
    }

    /// Receives records that were filtered in: forwards to the sink's
    /// accept path. Sink failures are reported on stderr — the emission
    /// path has no error channel.
    pub fn filtered_in(&self, msg: &str, record: &Record) {
        if let Err(e) = self.sink.accept(msg, record) {
            eprintln!("appstrap: sink write failed: {e}");
        }
    }

    /// Receives records that were filtered out: forwards to the sink's
    /// reject path (a no-op for the default sinks).
    pub fn filtered_out(&self, msg: &str, record: &Record) {
        self.sink.reject(msg, record);
    }

    /// Formats the record once, evaluates the rules, and dispatches the
    /// decision. Exactly one of `filtered_in` / `filtered_out` runs per
    /// record.
    pub fn emit(&self, record: &Record) {
        let msg = self.format(record);
        match self.evaluate(&msg, record) {
            Decision::FilteredIn => self.filtered_in(&msg, record),
            Decision::FilteredOut => self.filtered_out(&msg, record),
        }
    }

    /// The rule engine. `msg` is the already-formatted record, handed to
    /// callback rules.
    pub fn evaluate(&self, msg: &str, record: &Record) -> Decision {
        if self.rules.is_empty() {
            return Decision::FilteredIn;
        }

        // Exclude stage: first match drops the record.
        for field in FilterField::ALL {
            if let Some(matcher) = &self.rules.field(field).exclude {
                if matcher.matches(&record.field(field)) {
                    return Decision::FilteredOut;
                }
            }
        }
        // Interval and set excludes are inverted: outside the window /
        // set means dropped.
        if excluded_by_interval(self.rules.created.exclude, record.created_epoch())
            || excluded_by_interval(
                self.rules.relative_created.exclude,
                record.relative_created_ms,
            )
        {
            return Decision::FilteredOut;
        }
        if let Some(levels) = &self.rules.levels.exclude {
            if !levels.contains(&record.severity) {
                return Decision::FilteredOut;
            }
        }

        // Include stage: every configured rule must hold.
        for field in FilterField::ALL {
            if let Some(matcher) = &self.rules.field(field).include {
                if !matcher.matches(&record.field(field)) {
                    return Decision::FilteredOut;
                }
            }
        }
        if let Some(interval) = self.rules.created.include {
            if !interval.contains(record.created_epoch()) {
                return Decision::FilteredOut;
            }
        }
        if let Some(interval) = self.rules.relative_created.include {
            if !interval.contains(record.relative_created_ms) {
                return Decision::FilteredOut;
            }
        }
        if let Some(levels) = &self.rules.levels.include {
            if !levels.contains(&record.severity) {
                return Decision::FilteredOut;
            }
        }

        // Callback stage: a matching condition consults its callback.
        for field in FilterField::ALL {
            if let Some(rule) = &self.rules.field(field).callback {
                let value = record.field(field);
                if rule.matcher.matches(&value) {
                    match (rule.callback)(self, msg, &value, record) {
                        Verdict::Accept => return Decision::FilteredIn,
                        Verdict::Reject => return Decision::FilteredOut,
                        Verdict::Continue => {}
                    }
                }
            }
        }
        for (rule, value) in [
            (&self.rules.created.callback, record.created_epoch()),
            (
                &self.rules.relative_created.callback,
                record.relative_created_ms,
            ),
        ] {
            if let Some(rule) = rule {
                if rule.interval.contains(value) {
                    match (rule.callback)(self, msg, &value.to_string(), record) {
                        Verdict::Accept => return Decision::FilteredIn,
                        Verdict::Reject => return Decision::FilteredOut,
                        Verdict::Continue => {}
                    }
                }
            }
        }
        if let Some(rule) = &self.rules.levels.callback {
            if rule.levels.contains(&record.severity) {
                let value = record.severity.number().to_string();
                match (rule.callback)(self, msg, &value, record) {
                    Verdict::Accept => return Decision::FilteredIn,
                    Verdict::Reject => return Decision::FilteredOut,
                    Verdict::Continue => {}
                }
            }
        }

        Decision::FilteredIn
    }
}

/// Inverted exclude-interval check: a configured window excludes values
/// that fall outside it.
fn excluded_by_interval(interval: Option<Interval>, value: f64) -> bool {
    match interval {
        Some(interval) => !interval.contains(value),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matcher::Matcher;
    use crate::core::record::Severity;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Sink that counts decisions instead of writing anywhere.
    #[derive(Debug, Default)]
    struct CountingSink {
        accepted: Arc<AtomicUsize>,
        rejected: Arc<AtomicUsize>,
    }

    impl Sink for CountingSink {
        fn accept(&self, _msg: &str, _record: &Record) -> io::Result<()> {
            self.accepted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn reject(&self, _msg: &str, _record: &Record) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn make_record(name: &str, severity: Severity, message: &str) -> Record {
        Record {
            name: name.to_string(),
            thread: "main".to_string(),
            file_name: "demo.rs".to_string(),
            func_name: "emit_records".to_string(),
            severity,
            line: 7,
            message: message.to_string(),
            module: "demo".to_string(),
            path: "src/demo.rs".to_string(),
            process: "demo".to_string(),
            created: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            relative_created_ms: 100.0,
        }
    }

    fn decide(rules: RuleSet, record: &Record) -> Decision {
        let handler = DebugLogger::new(rules);
        let msg = handler.format(record);
        handler.evaluate(&msg, record)
    }

    #[test]
    fn empty_rules_accept_everything() {
        let record = make_record("DebugLogger", Severity::Debug, "test");
        assert_eq!(decide(RuleSet::default(), &record), Decision::FilteredIn);
    }

    #[test]
    fn emit_dispatches_exactly_one_decision() {
        let accepted = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));
        let handler = DebugLogger::new(RuleSet::default()).with_sink(CountingSink {
            accepted: Arc::clone(&accepted),
            rejected: Arc::clone(&rejected),
        });

        handler.emit(&make_record("DebugLogger", Severity::Debug, "test"));
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert_eq!(rejected.load(Ordering::SeqCst), 0);

        let handler = DebugLogger::new(
            RuleSet::builder()
                .exclude(FilterField::Name, Matcher::literal("DebugLogger"))
                .build(),
        )
        .with_sink(CountingSink {
            accepted: Arc::clone(&accepted),
            rejected: Arc::clone(&rejected),
        });
        handler.emit(&make_record("DebugLogger", Severity::Debug, "test"));
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert_eq!(rejected.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exclude_literal_on_other_name_accepts() {
        let rules = RuleSet::builder()
            .exclude(FilterField::Name, Matcher::literal("Other name"))
            .build();
        let record = make_record("DebugLogger", Severity::Debug, "test");
        assert_eq!(decide(rules, &record), Decision::FilteredIn);
    }

    #[test]
    fn exclude_literal_on_own_name_rejects() {
        let rules = RuleSet::builder()
            .exclude(FilterField::Name, Matcher::literal("DebugLogger"))
            .build();
        let record = make_record("DebugLogger", Severity::Debug, "test");
        assert_eq!(decide(rules, &record), Decision::FilteredOut);
    }

    #[test]
    fn include_pattern_gates_on_name() {
        let record = make_record("DebugLogger", Severity::Debug, "test");

        let miss = RuleSet::builder()
            .include(FilterField::Name, Matcher::pattern("O.+e").unwrap())
            .build();
        assert_eq!(decide(miss, &record), Decision::FilteredOut);

        let hit = RuleSet::builder()
            .include(FilterField::Name, Matcher::pattern("D.+r").unwrap())
            .build();
        assert_eq!(decide(hit, &record), Decision::FilteredIn);
    }

    #[test]
    fn exclude_wins_over_include() {
        let rules = RuleSet::builder()
            .include(FilterField::Name, Matcher::literal("DebugLogger"))
            .exclude(FilterField::Name, Matcher::literal("DebugLogger"))
            .build();
        let record = make_record("DebugLogger", Severity::Debug, "test");
        assert_eq!(decide(rules, &record), Decision::FilteredOut);
    }

    #[test]
    fn include_rules_are_and_combined() {
        let record = make_record("DebugLogger", Severity::Debug, "test");

        let both_hold = RuleSet::builder()
            .include(FilterField::Name, Matcher::literal("DebugLogger"))
            .include(FilterField::Message, Matcher::literal("test"))
            .build();
        assert_eq!(decide(both_hold, &record), Decision::FilteredIn);

        let one_fails = RuleSet::builder()
            .include(FilterField::Name, Matcher::literal("DebugLogger"))
            .include(FilterField::Message, Matcher::literal("other"))
            .build();
        assert_eq!(decide(one_fails, &record), Decision::FilteredOut);
    }

    #[test]
    fn literal_and_exact_pattern_decide_identically() {
        let samples = [
            "app::worker",
            "app::worker2",
            "app",
            "App::worker",
            "",
            "worker",
        ];
        for value in samples {
            let record = make_record(value, Severity::Debug, "test");
            let by_literal = decide(
                RuleSet::builder()
                    .include(FilterField::Name, Matcher::literal("app::worker"))
                    .build(),
                &record,
            );
            let by_pattern = decide(
                RuleSet::builder()
                    .include(
                        FilterField::Name,
                        Matcher::pattern("^app::worker$").unwrap(),
                    )
                    .build(),
                &record,
            );
            assert_eq!(by_literal, by_pattern, "diverged on {value:?}");
        }
    }

    #[test]
    fn include_interval_requires_membership() {
        let record = make_record("DebugLogger", Severity::Debug, "test");

        let within = RuleSet::builder()
            .include_relative_created(Interval::new(50.0, 150.0))
            .build();
        assert_eq!(decide(within, &record), Decision::FilteredIn);

        let outside = RuleSet::builder()
            .include_relative_created(Interval::new(500.0, 600.0))
            .build();
        assert_eq!(decide(outside, &record), Decision::FilteredOut);
    }

    #[test]
    fn exclude_interval_is_inverted() {
        // An exclude window KEEPS records inside it and drops the rest.
        let record = make_record("DebugLogger", Severity::Debug, "test");

        let window_around = RuleSet::builder()
            .exclude_relative_created(Interval::new(50.0, 150.0))
            .build();
        assert_eq!(decide(window_around, &record), Decision::FilteredIn);

        let window_elsewhere = RuleSet::builder()
            .exclude_relative_created(Interval::new(500.0, 600.0))
            .build();
        assert_eq!(decide(window_elsewhere, &record), Decision::FilteredOut);
    }

    #[test]
    fn exclude_interval_boundaries_are_inclusive() {
        let record = make_record("DebugLogger", Severity::Debug, "test");

        // record.relative_created_ms == 100.0 sits exactly on each bound.
        for window in [Interval::new(100.0, 200.0), Interval::new(0.0, 100.0)] {
            let rules = RuleSet::builder()
                .exclude_relative_created(window)
                .build();
            assert_eq!(decide(rules, &record), Decision::FilteredIn);
        }

        let rules = RuleSet::builder()
            .exclude_relative_created(Interval::new(100.1, 200.0))
            .build();
        assert_eq!(decide(rules, &record), Decision::FilteredOut);
    }

    #[test]
    fn exclude_created_window_keeps_only_the_window() {
        let record = make_record("DebugLogger", Severity::Debug, "test");
        let epoch = record.created_epoch();

        let around = RuleSet::builder()
            .exclude_created(Interval::new(epoch - 1.0, epoch + 1.0))
            .build();
        assert_eq!(decide(around, &record), Decision::FilteredIn);

        let past = RuleSet::builder()
            .exclude_created(Interval::new(0.0, epoch - 1.0))
            .build();
        assert_eq!(decide(past, &record), Decision::FilteredOut);
    }

    #[test]
    fn level_membership_rules() {
        let record = make_record("DebugLogger", Severity::Debug, "test");

        let include_hit = RuleSet::builder()
            .include_levels([Severity::Debug, Severity::Info])
            .build();
        assert_eq!(decide(include_hit, &record), Decision::FilteredIn);

        let include_miss = RuleSet::builder()
            .include_levels([Severity::Error])
            .build();
        assert_eq!(decide(include_miss, &record), Decision::FilteredOut);

        // Exclude set is inverted: severities ABSENT from the set drop.
        let exclude_keeps_members = RuleSet::builder()
            .exclude_levels([Severity::Debug])
            .build();
        assert_eq!(decide(exclude_keeps_members, &record), Decision::FilteredIn);

        let exclude_drops_others = RuleSet::builder()
            .exclude_levels([Severity::Error])
            .build();
        assert_eq!(decide(exclude_drops_others, &record), Decision::FilteredOut);
    }

    #[test]
    fn callback_verdicts_terminate_or_chain() {
        let record = make_record("DebugLogger", Severity::Debug, "test");

        let accept = RuleSet::builder()
            .callback(
                FilterField::Name,
                Matcher::literal("DebugLogger"),
                |_, _, _, _| Verdict::Accept,
            )
            .build();
        assert_eq!(decide(accept, &record), Decision::FilteredIn);

        let reject = RuleSet::builder()
            .callback(
                FilterField::Name,
                Matcher::literal("DebugLogger"),
                |_, _, _, _| Verdict::Reject,
            )
            .build();
        assert_eq!(decide(reject, &record), Decision::FilteredOut);

        let chain = RuleSet::builder()
            .callback(
                FilterField::Name,
                Matcher::literal("DebugLogger"),
                |_, _, _, _| Verdict::Continue,
            )
            .build();
        assert_eq!(decide(chain, &record), Decision::FilteredIn);
    }

    #[test]
    fn callback_receives_matched_value_and_message() {
        let seen = Arc::new(Mutex::new(Vec::<(String, String)>::new()));
        let seen_in_cb = Arc::clone(&seen);
        let rules = RuleSet::builder()
            .callback(
                FilterField::LevelNo,
                Matcher::literal("10"),
                move |_, msg, value, _| {
                    seen_in_cb
                        .lock()
                        .unwrap()
                        .push((msg.to_string(), value.to_string()));
                    Verdict::Continue
                },
            )
            .build();
        let record = make_record("DebugLogger", Severity::Debug, "test");
        assert_eq!(decide(rules, &record), Decision::FilteredIn);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, "10");
        assert!(seen[0].0.contains("test"));
    }

    #[test]
    fn non_matching_callback_condition_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = Arc::clone(&calls);
        let rules = RuleSet::builder()
            .callback(
                FilterField::Name,
                Matcher::literal("Other name"),
                move |_, _, _, _| {
                    calls_in_cb.fetch_add(1, Ordering::SeqCst);
                    Verdict::Reject
                },
            )
            .build();
        let record = make_record("DebugLogger", Severity::Debug, "test");
        assert_eq!(decide(rules, &record), Decision::FilteredIn);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn terminating_callback_stops_later_slots() {
        // Thread precedes Name in evaluation order, so its Accept must
        // short-circuit the Name slot entirely.
        let name_calls = Arc::new(AtomicUsize::new(0));
        let name_calls_in_cb = Arc::clone(&name_calls);
        let rules = RuleSet::builder()
            .callback(
                FilterField::Thread,
                Matcher::literal("main"),
                |_, _, _, _| Verdict::Accept,
            )
            .callback(
                FilterField::Name,
                Matcher::literal("DebugLogger"),
                move |_, _, _, _| {
                    name_calls_in_cb.fetch_add(1, Ordering::SeqCst);
                    Verdict::Reject
                },
            )
            .build();
        let record = make_record("DebugLogger", Severity::Debug, "test");
        assert_eq!(decide(rules, &record), Decision::FilteredIn);
        assert_eq!(name_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn level_set_callback_sees_level_number() {
        let seen = Arc::new(Mutex::new(String::new()));
        let seen_in_cb = Arc::clone(&seen);
        let rules = RuleSet::builder()
            .callback_levels([Severity::Warning], move |_, _, value, _| {
                *seen_in_cb.lock().unwrap() = value.to_string();
                Verdict::Continue
            })
            .build();
        let record = make_record("DebugLogger", Severity::Warning, "test");
        assert_eq!(decide(rules, &record), Decision::FilteredIn);
        assert_eq!(*seen.lock().unwrap(), "30");
    }

    #[test]
    fn interval_callback_gates_on_the_window() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = Arc::clone(&calls);
        let rules = RuleSet::builder()
            .callback_relative_created(Interval::new(500.0, 600.0), move |_, _, _, _| {
                calls_in_cb.fetch_add(1, Ordering::SeqCst);
                Verdict::Reject
            })
            .build();
        let record = make_record("DebugLogger", Severity::Debug, "test");
        // relative_created_ms == 100.0 is outside the window: no call.
        assert_eq!(decide(rules, &record), Decision::FilteredIn);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn file_sink_writes_accepted_records_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("debug.log");
        let handler = DebugLogger::new(
            RuleSet::builder()
                .exclude(FilterField::Message, Matcher::literal("drop me"))
                .build(),
        )
        .with_sink(FileSink::create(&path).unwrap());

        handler.emit(&make_record("DebugLogger", Severity::Debug, "keep me"));
        handler.emit(&make_record("DebugLogger", Severity::Debug, "drop me"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("keep me"));
        assert!(!content.contains("drop me"));
    }

    #[test]
    fn default_format_includes_level_and_message() {
        let handler = DebugLogger::new(RuleSet::default());
        let record = make_record("DebugLogger", Severity::Warning, "queue full");
        let msg = handler.format(&record);
        assert!(msg.contains("WARNING"));
        assert!(msg.contains("DebugLogger"));
        assert!(msg.ends_with("queue full"));
    }
}
