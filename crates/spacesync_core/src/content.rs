//! Per-kind content collections for one migration run.

use crate::entity::Entity;
use crate::transformed::TransformedEntity;

/// Everything read and transformed from the source space.
#[derive(Debug, Clone, Default)]
pub struct SourceContent {
    /// Entries, each paired with its transformed payload.
    pub entries: Vec<TransformedEntity>,
    /// Assets.
    pub assets: Vec<TransformedEntity>,
    /// Content types.
    pub content_types: Vec<TransformedEntity>,
    /// Locales.
    pub locales: Vec<TransformedEntity>,
    /// Webhooks.
    pub webhooks: Vec<TransformedEntity>,
    /// Editor interfaces from the source, keyed by their content type via
    /// `sys.content_type`.
    pub editor_interfaces: Vec<Entity>,
}

/// The point-in-time snapshot of the destination space a push diffs against.
#[derive(Debug, Clone, Default)]
pub struct DestinationContent {
    /// Existing destination entries (only the ids being migrated).
    pub entries: Vec<Entity>,
    /// Existing destination assets (only the ids being migrated).
    pub assets: Vec<Entity>,
    /// All destination content types.
    pub content_types: Vec<Entity>,
    /// All destination locales.
    pub locales: Vec<Entity>,
    /// Existing destination webhooks.
    pub webhooks: Vec<Entity>,
}
