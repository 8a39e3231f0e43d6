//! Content entities and their sys metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The kind of a content entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A content item instance conforming to a content type.
    Entry,
    /// A binary asset (image, file, ...).
    Asset,
    /// A content type definition.
    ContentType,
    /// A locale definition.
    Locale,
    /// A webhook definition.
    Webhook,
    /// The editor interface attached to a content type.
    EditorInterface,
}

impl EntityKind {
    /// Returns the API-facing name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Entry => "Entry",
            EntityKind::Asset => "Asset",
            EntityKind::ContentType => "ContentType",
            EntityKind::Locale => "Locale",
            EntityKind::Webhook => "Webhook",
            EntityKind::EditorInterface => "EditorInterface",
        }
    }

    /// Returns true if entities of this kind support a publish operation.
    ///
    /// Locales, webhooks and editor interfaces are live as soon as they are
    /// created; only entries, assets and content types go through a
    /// draft/published lifecycle.
    pub fn is_publishable(&self) -> bool {
        matches!(
            self,
            EntityKind::Entry | EntityKind::Asset | EntityKind::ContentType
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System metadata carried by every entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SysInfo {
    /// Entity id, unique within its kind and space.
    pub id: String,
    /// Entity kind.
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Version counter assigned by the destination on each mutation.
    #[serde(default)]
    pub version: u64,
    /// Id of the content type this entry conforms to (entries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Version that was last published, if the entity is published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<u64>,
}

/// A content entity: sys metadata plus an opaque field payload.
///
/// The payload holds everything outside `sys` (`fields`, `name`, `code`,
/// `controls`, ...) as raw JSON, since field shapes vary per kind and per
/// content type and the engine never interprets them beyond link extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// System metadata.
    pub sys: SysInfo,
    /// Everything outside `sys`, keyed by top-level property name.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Entity {
    /// Creates an entity with an empty payload.
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            sys: SysInfo {
                id: id.into(),
                kind,
                version: 0,
                content_type: None,
                published_version: None,
            },
            payload: Map::new(),
        }
    }

    /// Sets the version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.sys.version = version;
        self
    }

    /// Marks the entity as published at the given version.
    pub fn with_published_version(mut self, version: u64) -> Self {
        self.sys.published_version = Some(version);
        self
    }

    /// Sets the content type id (entries only).
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.sys.content_type = Some(content_type.into());
        self
    }

    /// Sets a top-level payload property.
    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Returns the localized field map, if the payload carries one.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.payload.get("fields").and_then(Value::as_object)
    }

    /// Returns the localized field map for mutation.
    pub fn fields_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.payload.get_mut("fields").and_then(Value::as_object_mut)
    }

    /// Returns true if the entity has never been published.
    pub fn is_draft(&self) -> bool {
        !self.is_published()
    }

    /// Returns true if the entity is published.
    pub fn is_published(&self) -> bool {
        self.sys.published_version.is_some()
    }

    /// Returns a human-readable identifier for log and error messages.
    ///
    /// Falls back from a top-level `name`, to the first locale of a `title`
    /// field, to the id, to the literal `"unknown"`.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.payload.get("name").and_then(Value::as_str) {
            return name.to_string();
        }
        if let Some(title) = self.fields().and_then(|f| f.get("title")) {
            if let Some(localized) = title.as_object() {
                if let Some(first) = localized.values().next().and_then(Value::as_str) {
                    return first.to_string();
                }
            }
        }
        if !self.sys.id.is_empty() {
            return self.sys.id.clone();
        }
        "unknown".to_string()
    }

    /// Returns a lightweight reference to this entity.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.sys.kind,
            id: self.sys.id.clone(),
        }
    }
}

/// A lightweight `(kind, id)` reference to an entity, attached to recorded
/// issues so failures stay attributable after the entity itself is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity id.
    pub id: String,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
