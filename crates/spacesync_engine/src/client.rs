//! Destination API client abstraction.
//!
//! The HTTP client itself is an external collaborator. This module defines
//! the trait the engine drives it through, the closed set of per-entity
//! operations, and a scriptable in-memory client for tests.

use crate::error::ApiError;
use async_trait::async_trait;
use parking_lot::Mutex;
use spacesync_core::{Entity, EntityKind};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// The closed set of per-entity operations the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a new entity.
    Create,
    /// Update an existing entity (optimistic concurrency via `sys.version`).
    Update,
    /// Delete an entity.
    Delete,
    /// Publish an entity.
    Publish,
    /// Unpublish an entity.
    Unpublish,
    /// Trigger server-side asset processing.
    Process,
    /// Read destination state (ID queries, editor interfaces).
    Query,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Publish => "publish",
            Operation::Unpublish => "unpublish",
            Operation::Process => "process",
            Operation::Query => "query",
        };
        f.write_str(name)
    }
}

/// A destination space client.
///
/// Every operation targets one entity and returns either the destination's
/// view of it (with its new `sys.version`) or a typed error. Timeouts and
/// transport retries are the implementation's concern, not the engine's.
#[async_trait]
pub trait SpaceClient: Send + Sync {
    /// Creates an entity.
    async fn create(&self, kind: EntityKind, entity: &Entity) -> Result<Entity, ApiError>;

    /// Updates an entity; `entity.sys.version` must match the destination.
    async fn update(&self, kind: EntityKind, entity: &Entity) -> Result<Entity, ApiError>;

    /// Deletes an entity.
    async fn delete(&self, kind: EntityKind, entity: &Entity) -> Result<(), ApiError>;

    /// Publishes an entity.
    async fn publish(&self, kind: EntityKind, entity: &Entity) -> Result<Entity, ApiError>;

    /// Unpublishes an entity.
    async fn unpublish(&self, kind: EntityKind, entity: &Entity) -> Result<Entity, ApiError>;

    /// Triggers processing of an asset's files for all locales.
    async fn process_asset(&self, entity: &Entity) -> Result<Entity, ApiError>;

    /// Fetches the destination entities matching one comma-joined ID batch.
    async fn entities_by_ids(&self, kind: EntityKind, ids: &str) -> Result<Vec<Entity>, ApiError>;

    /// Fetches all destination entities of a kind.
    async fn all_entities(&self, kind: EntityKind) -> Result<Vec<Entity>, ApiError>;

    /// Fetches the editor interface attached to a content type.
    async fn editor_interface(&self, content_type_id: &str) -> Result<Entity, ApiError>;
}

/// One recorded call against the mock client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Which operation ran.
    pub op: Operation,
    /// Entity kind the call targeted.
    pub kind: EntityKind,
    /// Entity id (or query id) the call targeted.
    pub id: String,
}

type ScriptKey = (Operation, String);

/// A scriptable in-memory space client.
///
/// By default every mutation succeeds, echoing the payload back with a
/// bumped version the way the destination would. Tests queue per-`(op, id)`
/// outcomes to inject failures, and read back the ordered call log to assert
/// sequencing.
#[derive(Debug, Default)]
pub struct MockClient {
    calls: Mutex<Vec<CallRecord>>,
    scripted: Mutex<HashMap<ScriptKey, VecDeque<Result<Entity, ApiError>>>>,
    store: Mutex<HashMap<EntityKind, Vec<Entity>>>,
}

impl MockClient {
    /// Creates a mock with no scripted outcomes and an empty destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds destination entities returned by the query operations.
    pub fn seed_destination(&self, kind: EntityKind, entities: Vec<Entity>) {
        self.store.lock().entry(kind).or_default().extend(entities);
    }

    /// Queues one outcome for the next call of `op` against `id`.
    pub fn respond_once(&self, op: Operation, id: &str, result: Result<Entity, ApiError>) {
        self.scripted
            .lock()
            .entry((op, id.to_string()))
            .or_default()
            .push_back(result);
    }

    /// Queues one failure for the next call of `op` against `id`.
    pub fn fail_once(&self, op: Operation, id: &str, error: ApiError) {
        self.respond_once(op, id, Err(error));
    }

    /// Queues `times` consecutive failures for `op` against `id`.
    pub fn fail_times(&self, op: Operation, id: &str, error: ApiError, times: usize) {
        for _ in 0..times {
            self.fail_once(op, id, error.clone());
        }
    }

    /// Returns the ordered call log.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().clone()
    }

    /// Number of calls of `op` against `id`.
    pub fn call_count(&self, op: Operation, id: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.op == op && call.id == id)
            .count()
    }

    /// Ids touched by `op`, in call order.
    pub fn ids_for(&self, op: Operation) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.op == op)
            .map(|call| call.id.clone())
            .collect()
    }

    fn record(&self, op: Operation, kind: EntityKind, id: &str) {
        self.calls.lock().push(CallRecord {
            op,
            kind,
            id: id.to_string(),
        });
    }

    fn scripted_outcome(&self, op: Operation, id: &str) -> Option<Result<Entity, ApiError>> {
        let mut scripted = self.scripted.lock();
        let queue = scripted.get_mut(&(op, id.to_string()))?;
        queue.pop_front()
    }

    fn mutate(
        &self,
        op: Operation,
        kind: EntityKind,
        entity: &Entity,
        default: impl FnOnce(&Entity) -> Entity,
    ) -> Result<Entity, ApiError> {
        self.record(op, kind, &entity.sys.id);
        match self.scripted_outcome(op, &entity.sys.id) {
            Some(outcome) => outcome,
            None => Ok(default(entity)),
        }
    }
}

#[async_trait]
impl SpaceClient for MockClient {
    async fn create(&self, kind: EntityKind, entity: &Entity) -> Result<Entity, ApiError> {
        self.mutate(Operation::Create, kind, entity, |entity| {
            let mut created = entity.clone();
            created.sys.version = 1;
            created
        })
    }

    async fn update(&self, kind: EntityKind, entity: &Entity) -> Result<Entity, ApiError> {
        self.mutate(Operation::Update, kind, entity, |entity| {
            let mut updated = entity.clone();
            updated.sys.version += 1;
            updated
        })
    }

    async fn delete(&self, kind: EntityKind, entity: &Entity) -> Result<(), ApiError> {
        self.record(Operation::Delete, kind, &entity.sys.id);
        match self.scripted_outcome(Operation::Delete, &entity.sys.id) {
            Some(Err(error)) => Err(error),
            _ => Ok(()),
        }
    }

    async fn publish(&self, kind: EntityKind, entity: &Entity) -> Result<Entity, ApiError> {
        self.mutate(Operation::Publish, kind, entity, |entity| {
            let mut published = entity.clone();
            published.sys.version += 1;
            published.sys.published_version = Some(published.sys.version);
            published
        })
    }

    async fn unpublish(&self, kind: EntityKind, entity: &Entity) -> Result<Entity, ApiError> {
        self.mutate(Operation::Unpublish, kind, entity, |entity| {
            let mut unpublished = entity.clone();
            unpublished.sys.version += 1;
            unpublished.sys.published_version = None;
            unpublished
        })
    }

    async fn process_asset(&self, entity: &Entity) -> Result<Entity, ApiError> {
        self.mutate(Operation::Process, EntityKind::Asset, entity, |entity| {
            entity.clone()
        })
    }

    async fn entities_by_ids(&self, kind: EntityKind, ids: &str) -> Result<Vec<Entity>, ApiError> {
        self.record(Operation::Query, kind, ids);
        if let Some(outcome) = self.scripted_outcome(Operation::Query, ids) {
            return outcome.map(|entity| vec![entity]);
        }
        let wanted: Vec<&str> = ids.split(',').collect();
        Ok(self
            .store
            .lock()
            .get(&kind)
            .map(|entities| {
                entities
                    .iter()
                    .filter(|entity| wanted.contains(&entity.sys.id.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn all_entities(&self, kind: EntityKind) -> Result<Vec<Entity>, ApiError> {
        self.record(Operation::Query, kind, kind.as_str());
        if let Some(outcome) = self.scripted_outcome(Operation::Query, kind.as_str()) {
            return outcome.map(|entity| vec![entity]);
        }
        Ok(self.store.lock().get(&kind).cloned().unwrap_or_default())
    }

    async fn editor_interface(&self, content_type_id: &str) -> Result<Entity, ApiError> {
        self.record(Operation::Query, EntityKind::EditorInterface, content_type_id);
        if let Some(outcome) = self.scripted_outcome(Operation::Query, content_type_id) {
            return outcome;
        }
        let stored = self.store.lock().get(&EntityKind::EditorInterface).and_then(
            |entities| {
                entities
                    .iter()
                    .find(|entity| entity.sys.content_type.as_deref() == Some(content_type_id))
                    .cloned()
            },
        );
        Ok(stored.unwrap_or_else(|| {
            Entity::new(EntityKind::EditorInterface, format!("{content_type_id}-editor"))
                .with_content_type(content_type_id)
                .with_version(1)
        }))
    }
}
