//! Append-only channel for non-fatal issues.

use parking_lot::Mutex;
use spacesync_core::EntityRef;
use std::sync::Arc;
use tracing::{error, warn};

/// Severity of a recorded issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Something was skipped or degraded; the run continues unaffected.
    Warning,
    /// An entity was dropped from the rest of the pipeline.
    Error,
}

/// A non-fatal event recorded during a run.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Severity.
    pub level: IssueLevel,
    /// Human-readable description.
    pub message: String,
    /// The entity the issue is about, when attributable.
    pub entity: Option<EntityRef>,
}

/// A cloneable append-only sink for per-entity warnings and errors.
///
/// Replaces ambient logger/emitter state with an explicit value passed into
/// each component; safe for concurrent append from in-flight operations.
/// Every recorded issue is also emitted through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct IssueSink {
    issues: Arc<Mutex<Vec<Issue>>>,
}

impl IssueSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn warning(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.issues.lock().push(Issue {
            level: IssueLevel::Warning,
            message,
            entity: None,
        });
    }

    /// Records an error not tied to a single entity.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.issues.lock().push(Issue {
            level: IssueLevel::Error,
            message,
            entity: None,
        });
    }

    /// Records an error attributed to an entity.
    pub fn error_for(&self, entity: EntityRef, message: impl Into<String>) {
        let message = message.into();
        error!("{entity}: {message}");
        self.issues.lock().push(Issue {
            level: IssueLevel::Error,
            message,
            entity: Some(entity),
        });
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<Issue> {
        std::mem::take(&mut *self.issues.lock())
    }

    /// Number of recorded issues.
    pub fn len(&self) -> usize {
        self.issues.lock().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.issues.lock().is_empty()
    }

    /// Number of recorded issues at error level.
    pub fn error_count(&self) -> usize {
        self.issues
            .lock()
            .iter()
            .filter(|issue| issue.level == IssueLevel::Error)
            .count()
    }
}
