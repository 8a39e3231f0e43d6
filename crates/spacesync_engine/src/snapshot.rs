//! Destination snapshot fetching.

use crate::batch::id_batches;
use crate::client::SpaceClient;
use crate::config::{BatchLimits, SnapshotOptions};
use crate::error::{ApiError, EngineResult};
use spacesync_core::{DestinationContent, Entity, EntityKind};
use tracing::info;

/// Fetches the destination state the push compares against.
///
/// Content types and locales are small populations and are fetched whole;
/// entries and assets are fetched only for the source ids, in query batches
/// that respect the destination's URL length and page size limits. Webhooks
/// live outside the versioned content space and are not part of the
/// snapshot. Any fetch failure aborts the run: pushing against a partial
/// snapshot would misclassify entities as missing and create duplicates.
pub async fn fetch_destination_content<C: SpaceClient>(
    client: &C,
    entry_ids: &[String],
    asset_ids: &[String],
    options: &SnapshotOptions,
) -> EngineResult<DestinationContent> {
    let mut destination = DestinationContent::default();

    if !options.skip_content_model {
        destination.content_types = client.all_entities(EntityKind::ContentType).await?;
        destination.locales = client.all_entities(EntityKind::Locale).await?;
    }
    if !options.skip_content {
        destination.entries =
            batched_query(client, EntityKind::Entry, entry_ids, &options.batch).await?;
        destination.assets =
            batched_query(client, EntityKind::Asset, asset_ids, &options.batch).await?;
    }

    info!(
        "Fetched destination snapshot: {} content types, {} locales, {} entries, {} assets",
        destination.content_types.len(),
        destination.locales.len(),
        destination.entries.len(),
        destination.assets.len()
    );
    Ok(destination)
}

async fn batched_query<C: SpaceClient>(
    client: &C,
    kind: EntityKind,
    ids: &[String],
    limits: &BatchLimits,
) -> Result<Vec<Entity>, ApiError> {
    let mut found = Vec::new();
    for batch in id_batches(ids, limits) {
        found.extend(client.entities_by_ids(kind, &batch).await?);
    }
    Ok(found)
}
