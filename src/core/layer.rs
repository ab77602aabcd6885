// appstrap - core/layer.rs
//
// Bridge between the `tracing` ecosystem and the filtering handler: a
// subscriber layer that assembles a `Record` from each event and hands
// it to `DebugLogger::emit`. Also hosts `install`, the convenience that
// registers a handler globally.

use crate::core::handler::DebugLogger;
use crate::core::record::{Record, Severity};
use crate::util::constants;
use chrono::Utc;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

// =============================================================================
// Process-wide stamps
// =============================================================================

static PROGRAM_START: OnceLock<Instant> = OnceLock::new();
static PROCESS_NAME: OnceLock<String> = OnceLock::new();

/// The instant relative-created timestamps are measured from. First use
/// pins it, so `run()` touches it as early as possible.
pub(crate) fn program_start() -> Instant {
    *PROGRAM_START.get_or_init(Instant::now)
}

fn relative_created_ms() -> f64 {
    program_start().elapsed().as_secs_f64() * 1_000.0
}

fn process_name() -> &'static str {
    PROCESS_NAME.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| constants::UNKNOWN_PROCESS.to_string())
    })
}

// =============================================================================
// Field visitor
// =============================================================================

/// Collects the `message` field and renders any remaining fields as
/// `key=value` pairs appended to it, the way the stock fmt layer does.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    extras: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.extras.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.extras
        } else {
            format!("{} {}", self.message, self.extras)
        }
    }

    fn push_extra(&mut self, fragment: std::fmt::Arguments<'_>) {
        if !self.extras.is_empty() {
            self.extras.push(' ');
        }
        let _ = self.extras.write_fmt(fragment);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_extra(format_args!("{}={:?}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_extra(format_args!("{}={:?}", field.name(), value));
        }
    }
}

// =============================================================================
// DebugLayer
// =============================================================================

/// `tracing_subscriber` layer feeding a `DebugLogger`.
///
/// An optional scope restricts the layer to one target subtree (the
/// target itself or `::`-separated children), the analogue of attaching
/// a handler to a named logger.
#[derive(Debug, Clone)]
pub struct DebugLayer {
    handler: Arc<DebugLogger>,
    scope: Option<String>,
}

impl DebugLayer {
    pub fn new(handler: Arc<DebugLogger>) -> DebugLayer {
        DebugLayer {
            handler,
            scope: None,
        }
    }

    /// Restricts the layer to `scope` and its `::`-separated children.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn handler(&self) -> &Arc<DebugLogger> {
        &self.handler
    }

    fn in_scope(&self, target: &str) -> bool {
        match &self.scope {
            None => true,
            Some(scope) => {
                target == scope
                    || target
                        .strip_prefix(scope.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            }
        }
    }
}

impl<S> Layer<S> for DebugLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !self.in_scope(meta.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let path = meta.file().unwrap_or_default();
        let file_name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path);
        let func_name = ctx
            .event_span(event)
            .map(|span| span.name().to_string())
            .unwrap_or_default();
        let thread = std::thread::current()
            .name()
            .unwrap_or(constants::UNNAMED_THREAD)
            .to_string();

        let record = Record {
            name: meta.target().to_string(),
            thread,
            file_name: file_name.to_string(),
            func_name,
            severity: Severity::from_tracing(meta.level()),
            line: meta.line().unwrap_or(0),
            message: visitor.finish(),
            module: meta.module_path().unwrap_or_default().to_string(),
            path: path.to_string(),
            process: process_name().to_string(),
            created: Utc::now(),
            relative_created_ms: relative_created_ms(),
        };

        self.handler.emit(&record);
    }
}

// =============================================================================
// install
// =============================================================================

impl DebugLogger {
    /// Registers this handler as a global subscriber layer.
    ///
    /// The layer is pinned at the most permissive level filter so the
    /// handler's own rule evaluation is authoritative. With `exclusive`
    /// the layer is registered alone; otherwise a standard console fmt
    /// layer is kept alongside it. An already-registered subscriber is
    /// tolerated (handler registration never fails in this design) and
    /// reported at debug level.
    ///
    /// Returns the shared handler so callers can keep evaluating or
    /// emitting against it directly.
    pub fn install(self, scope: Option<&str>, exclusive: bool) -> Arc<DebugLogger> {
        let handler = Arc::new(self);
        let mut layer = DebugLayer::new(Arc::clone(&handler));
        if let Some(scope) = scope {
            layer = layer.with_scope(scope);
        }

        let result = if exclusive {
            tracing_subscriber::registry()
                .with(layer.with_filter(LevelFilter::TRACE))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(layer.with_filter(LevelFilter::TRACE))
                .try_init()
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "Subscriber already registered; handler not attached globally");
        }

        handler
    }
}
