//! Injected diagnostics for the evaluator and hierarchy builder.
//!
//! Nothing in the engine logs through global state. Every component that can
//! degrade gracefully takes a `DiagnosticSink` and reports what it skipped or
//! treated as `false`.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticLevel {
    Debug,
    Warning,
}

/// What kind of graceful degradation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    MalformedCondition,
    LeafFailure,
    RuleFailure,
    TooManyNotOperands,
    OrphanedParent,
    DuplicateId,
    ParentCycle,
    CodeSetResolved,
    CodeSetFailure,
    Cancelled,
    IgnoredNavigation,
    IgnoredEffect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            kind,
            message: message.into(),
        }
    }

    pub fn debug(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Debug,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {:?}: {}", self.level, self.kind, self.message)
    }
}

/// Receives diagnostics. Implementations must be cheap and must not fail.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Warning => {
                tracing::warn!(kind = ?diagnostic.kind, "{}", diagnostic.message)
            }
            DiagnosticLevel::Debug => {
                tracing::debug!(kind = ?diagnostic.kind, "{}", diagnostic.message)
            }
        }
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _diagnostic: Diagnostic) {}
}

/// Buffers diagnostics in memory, e.g. to show them in an editor.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.kind == kind)
            .count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn record(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

pub(crate) fn default_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(TracingSink)
}
