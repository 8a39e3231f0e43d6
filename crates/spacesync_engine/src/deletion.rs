//! Deletion of previously unpublished entities.

use crate::client::SpaceClient;
use crate::error::ApiError;
use crate::runner::{run_all, RunPolicy};
use crate::sink::IssueSink;
use spacesync_core::{Entity, EntityKind};
use tracing::info;

/// Deletes a list of entities, which should have been unpublished first.
///
/// A `BadRequest` answer means the destination refuses to delete this
/// particular entity (e.g. the default locale); the entity is kept and the
/// run continues. Other failures are recorded per entity.
pub async fn delete_entities<C: SpaceClient>(
    client: &C,
    kind: EntityKind,
    entities: Vec<Entity>,
    sink: &IssueSink,
) -> Vec<Entity> {
    let policy = RunPolicy::batch_wide(entities.len());
    let results = run_all(entities, policy, |entity| async move {
        let outcome = client.delete(kind, &entity).await;
        (entity, outcome)
    })
    .await;

    let mut deleted = Vec::new();
    for (entity, outcome) in results {
        match outcome {
            Ok(()) => {
                info!("Deleted {} {}", kind, entity.display_name());
                deleted.push(entity);
            }
            Err(ApiError::BadRequest(reason)) => {
                info!(
                    "Skipped deleting {} {}: {}",
                    kind,
                    entity.display_name(),
                    reason
                );
                deleted.push(entity);
            }
            Err(err) => {
                sink.error_for(entity.entity_ref(), format!("failed to delete: {err}"));
            }
        }
    }
    deleted
}
