//! Server-side asset processing.

use crate::client::SpaceClient;
use crate::runner::{run_all, RunPolicy};
use crate::sink::IssueSink;
use spacesync_core::Entity;
use tracing::info;

/// Triggers processing of each asset's files for all locales.
///
/// Processing fans out per locale on the destination side, so the cap stays
/// low. A failed asset is recorded and dropped; its siblings continue.
pub async fn process_assets<C: SpaceClient>(
    client: &C,
    assets: Vec<Entity>,
    concurrency: usize,
    sink: &IssueSink,
) -> Vec<Entity> {
    let results = run_all(assets, RunPolicy::bounded(concurrency), |asset| async move {
        info!("Processing Asset {}", asset.display_name());
        let outcome = client.process_asset(&asset).await;
        (asset, outcome)
    })
    .await;

    results
        .into_iter()
        .filter_map(|(asset, outcome)| match outcome {
            Ok(processed) => Some(processed),
            Err(err) => {
                sink.error_for(asset.entity_ref(), format!("failed to process asset: {err}"));
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockClient, Operation};
    use crate::error::ApiError;
    use spacesync_core::EntityKind;

    #[tokio::test]
    async fn processes_all_assets() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        let assets = vec![
            Entity::new(EntityKind::Asset, "a").with_version(1),
            Entity::new(EntityKind::Asset, "b").with_version(1),
        ];

        let processed = process_assets(&client, assets, 4, &sink).await;

        assert_eq!(processed.len(), 2);
        assert_eq!(client.ids_for(Operation::Process), vec!["a", "b"]);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn failed_asset_is_recorded_and_dropped() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        client.fail_once(
            Operation::Process,
            "bad",
            ApiError::Other {
                status: 500,
                message: "processing failed".into(),
            },
        );

        let processed = process_assets(
            &client,
            vec![
                Entity::new(EntityKind::Asset, "bad"),
                Entity::new(EntityKind::Asset, "good"),
            ],
            4,
            &sink,
        )
        .await;

        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].sys.id, "good");
        assert_eq!(sink.error_count(), 1);
    }
}
