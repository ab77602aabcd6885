// appstrap - core/rules.rs
//
// Rule slot configuration for the filtering handler: one optional
// include/exclude/callback triple per record field, plus interval-valued
// and membership-valued pseudo-fields. Immutable once the handler is
// constructed.

use crate::core::handler::DebugLogger;
use crate::core::matcher::{Interval, Matcher};
use crate::core::record::{FilterField, Record, Severity};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Callbacks
// =============================================================================

/// Outcome of a callback rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Stop evaluating and accept the record.
    Accept,

    /// Stop evaluating and drop the record.
    Reject,

    /// This callback has no opinion; move on to the next callback slot.
    Continue,
}

/// A callback rule's function. Invoked with the owning handler, the
/// formatted message, the matched field value, and the record.
pub type Callback = Arc<dyn Fn(&DebugLogger, &str, &str, &Record) -> Verdict + Send + Sync>;

/// A callback slot: a condition plus the function to consult when it matches.
#[derive(Clone)]
pub struct CallbackRule {
    pub matcher: Matcher,
    pub callback: Callback,
}

impl fmt::Debug for CallbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRule")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// An interval-conditioned callback slot.
#[derive(Clone)]
pub struct IntervalCallbackRule {
    pub interval: Interval,
    pub callback: Callback,
}

impl fmt::Debug for IntervalCallbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalCallbackRule")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// A severity-membership-conditioned callback slot.
#[derive(Clone)]
pub struct LevelCallbackRule {
    pub levels: HashSet<Severity>,
    pub callback: Callback,
}

impl fmt::Debug for LevelCallbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelCallbackRule")
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Slots
// =============================================================================

/// The include/exclude/callback triple for one pattern-matchable field.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    pub include: Option<Matcher>,
    pub exclude: Option<Matcher>,
    pub callback: Option<CallbackRule>,
}

/// The include/exclude/callback triple for an interval pseudo-field.
#[derive(Debug, Clone, Default)]
pub struct IntervalRules {
    pub include: Option<Interval>,
    pub exclude: Option<Interval>,
    pub callback: Option<IntervalCallbackRule>,
}

/// The include/exclude/callback triple for the level-membership pseudo-field.
#[derive(Debug, Clone, Default)]
pub struct LevelRules {
    pub include: Option<HashSet<Severity>>,
    pub exclude: Option<HashSet<Severity>>,
    pub callback: Option<LevelCallbackRule>,
}

// =============================================================================
// RuleSet
// =============================================================================

/// The handler's full rule configuration: one `FieldRules` triple per
/// record field plus the `created`, `relative_created`, and level-set
/// pseudo-fields. All slots default to "no constraint".
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: [FieldRules; FilterField::ALL.len()],
    pub created: IntervalRules,
    pub relative_created: IntervalRules,
    pub levels: LevelRules,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder {
            rules: RuleSet::default(),
        }
    }

    /// The rule triple configured for `field`.
    pub fn field(&self, field: FilterField) -> &FieldRules {
        &self.fields[field.index()]
    }

    /// Returns true if no slot holds a constraint.
    pub fn is_empty(&self) -> bool {
        let triple_empty = |r: &FieldRules| {
            r.include.is_none() && r.exclude.is_none() && r.callback.is_none()
        };
        self.fields.iter().all(triple_empty)
            && self.created.include.is_none()
            && self.created.exclude.is_none()
            && self.created.callback.is_none()
            && self.relative_created.include.is_none()
            && self.relative_created.exclude.is_none()
            && self.relative_created.callback.is_none()
            && self.levels.include.is_none()
            && self.levels.exclude.is_none()
            && self.levels.callback.is_none()
    }
}

/// Builder assembling a `RuleSet` slot by slot.
#[derive(Debug)]
pub struct RuleSetBuilder {
    rules: RuleSet,
}

impl RuleSetBuilder {
    /// Require `field` to satisfy `matcher` (include rule).
    pub fn include(mut self, field: FilterField, matcher: Matcher) -> Self {
        self.rules.fields[field.index()].include = Some(matcher);
        self
    }

    /// Drop records whose `field` satisfies `matcher` (exclude rule).
    pub fn exclude(mut self, field: FilterField, matcher: Matcher) -> Self {
        self.rules.fields[field.index()].exclude = Some(matcher);
        self
    }

    /// Consult `callback` when `field` satisfies `matcher`.
    pub fn callback<F>(mut self, field: FilterField, matcher: Matcher, callback: F) -> Self
    where
        F: Fn(&DebugLogger, &str, &str, &Record) -> Verdict + Send + Sync + 'static,
    {
        self.rules.fields[field.index()].callback = Some(CallbackRule {
            matcher,
            callback: Arc::new(callback),
        });
        self
    }

    /// Require the absolute creation time (epoch seconds) to lie within
    /// `interval`.
    pub fn include_created(mut self, interval: Interval) -> Self {
        self.rules.created.include = Some(interval);
        self
    }

    /// Drop records whose absolute creation time lies OUTSIDE `interval`
    /// ("exclude everything except this window").
    pub fn exclude_created(mut self, interval: Interval) -> Self {
        self.rules.created.exclude = Some(interval);
        self
    }

    /// Consult `callback` when the absolute creation time lies within
    /// `interval`.
    pub fn callback_created<F>(mut self, interval: Interval, callback: F) -> Self
    where
        F: Fn(&DebugLogger, &str, &str, &Record) -> Verdict + Send + Sync + 'static,
    {
        self.rules.created.callback = Some(IntervalCallbackRule {
            interval,
            callback: Arc::new(callback),
        });
        self
    }

    /// Require the relative creation time (ms since start) to lie within
    /// `interval`.
    pub fn include_relative_created(mut self, interval: Interval) -> Self {
        self.rules.relative_created.include = Some(interval);
        self
    }

    /// Drop records whose relative creation time lies OUTSIDE `interval`.
    pub fn exclude_relative_created(mut self, interval: Interval) -> Self {
        self.rules.relative_created.exclude = Some(interval);
        self
    }

    /// Consult `callback` when the relative creation time lies within
    /// `interval`.
    pub fn callback_relative_created<F>(mut self, interval: Interval, callback: F) -> Self
    where
        F: Fn(&DebugLogger, &str, &str, &Record) -> Verdict + Send + Sync + 'static,
    {
        self.rules.relative_created.callback = Some(IntervalCallbackRule {
            interval,
            callback: Arc::new(callback),
        });
        self
    }

    /// Require the record's severity to be a member of `levels`.
    pub fn include_levels(mut self, levels: impl IntoIterator<Item = Severity>) -> Self {
        self.rules.levels.include = Some(levels.into_iter().collect());
        self
    }

    /// Drop records whose severity is ABSENT from `levels`
    /// ("exclude everything except these levels").
    pub fn exclude_levels(mut self, levels: impl IntoIterator<Item = Severity>) -> Self {
        self.rules.levels.exclude = Some(levels.into_iter().collect());
        self
    }

    /// Consult `callback` when the record's severity is a member of
    /// `levels`.
    pub fn callback_levels<F>(
        mut self,
        levels: impl IntoIterator<Item = Severity>,
        callback: F,
    ) -> Self
    where
        F: Fn(&DebugLogger, &str, &str, &Record) -> Verdict + Send + Sync + 'static,
    {
        self.rules.levels.callback = Some(LevelCallbackRule {
            levels: levels.into_iter().collect(),
            callback: Arc::new(callback),
        });
        self
    }

    pub fn build(self) -> RuleSet {
        self.rules
    }
}
