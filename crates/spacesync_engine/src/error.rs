//! Error types for the migration engine.

use spacesync_core::EntityRef;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// A structured detail entry inside an API error body.
///
/// The destination API enumerates sub-errors as `{name, path}` pairs; the
/// engine recognizes a handful of names (`taken`, `unknown`, `notResolvable`)
/// and treats everything else as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Machine-readable name of the sub-error.
    pub name: String,
    /// Path to the offending part of the payload, e.g. `["fields", "body"]`.
    pub path: Vec<String>,
}

impl ErrorDetail {
    /// Creates a detail entry with no path.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Vec::new(),
        }
    }

    /// Creates a detail entry with a path.
    pub fn at(name: impl Into<String>, path: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            name: name.into(),
            path: path.into_iter().map(str::to_string).collect(),
        }
    }
}

/// A typed error returned by the destination API client.
///
/// The engine matches these by shape (name/status), not by full schema; any
/// error that carries none of the recognized markers goes down the generic
/// error-sink path.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The payload failed validation (duplicate unique fields etc.).
    #[error("validation failed")]
    ValidationFailed {
        /// Structured sub-errors.
        errors: Vec<ErrorDetail>,
    },

    /// The payload's version does not match the destination's current one.
    #[error("version mismatch")]
    VersionMismatch,

    /// The payload carries fields the destination content type no longer has.
    #[error("unknown fields in payload")]
    UnknownField {
        /// Structured sub-errors; field ids sit at `path[1]`.
        errors: Vec<ErrorDetail>,
    },

    /// HTTP 422 — the entity cannot be processed in its current state.
    #[error("unprocessable entity")]
    Unprocessable {
        /// Structured sub-errors.
        errors: Vec<ErrorDetail>,
    },

    /// HTTP 400 — used by the API as an idempotent-unpublish marker.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any other API failure.
    #[error("api error (status {status}): {message}")]
    Other {
        /// HTTP status code.
        status: u16,
        /// Human-readable message.
        message: String,
    },
}

impl ApiError {
    /// Returns true if this is a duplicate-unique-field rejection, e.g. a
    /// locale code that already exists on the destination. Treated as a
    /// successful no-op by the orchestrator.
    pub fn is_taken(&self) -> bool {
        match self {
            ApiError::ValidationFailed { errors } => errors
                .first()
                .map(|detail| detail.name == "taken")
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Returns the field ids the destination no longer knows, if this is an
    /// `UnknownField` error. The API enumerates all unknown fields at once,
    /// so one retry with these stripped recovers the update.
    pub fn unknown_field_ids(&self) -> Vec<String> {
        match self {
            ApiError::UnknownField { errors } => errors
                .iter()
                .filter(|detail| detail.name == "unknown")
                .filter_map(|detail| detail.path.get(1).cloned())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true if a publish was rejected because a link target is not
    /// published yet. Retryable on a later convergence pass.
    pub fn is_unresolvable(&self) -> bool {
        match self {
            ApiError::Unprocessable { errors } => {
                errors.iter().any(|detail| detail.name == "notResolvable")
            }
            _ => false,
        }
    }
}

/// A fatal error that aborts the remainder of the pipeline.
///
/// Per-entity failures never surface here; they are recorded to the issue
/// sink and the entity is dropped from later stages.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The destination rejected an update because the snapshot is stale.
    #[error(
        "version mismatch updating {entity}: the destination already has newer \
         content than the snapshot this push was prepared against"
    )]
    VersionMismatch {
        /// The entity whose update was rejected.
        entity: EntityRef,
    },

    /// Mutually exclusive push options were combined.
    #[error("incompatible push options: {0}")]
    InvalidOptions(String),

    /// The destination space could not be reached or queried.
    #[error("destination space unreachable: {0}")]
    Space(#[from] ApiError),
}
