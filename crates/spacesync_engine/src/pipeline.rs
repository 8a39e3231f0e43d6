//! The push pipeline, tying all stages together in dependency order.

use crate::assets::process_assets;
use crate::client::SpaceClient;
use crate::config::PushOptions;
use crate::creation::{create_entities, create_entries};
use crate::error::EngineResult;
use crate::publishing::publish_entities;
use crate::runner::{run_all, RunPolicy};
use crate::sink::{Issue, IssueSink};
use crate::sort::sort_transformed_entries;
use spacesync_core::{
    DestinationContent, DestinationIndex, Entity, EntityKind, EntityRef, SourceContent,
    TransformedEntity,
};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

/// Everything a finished push run produced.
///
/// Each field holds the destination's view of the entities the run touched,
/// in stage order. `issues` holds every per-entity problem the run survived;
/// an `Err` from [`push_to_space`] means the run itself aborted.
#[derive(Debug, Default)]
pub struct PushSummary {
    /// Locales created or updated.
    pub locales: Vec<Entity>,
    /// Content types created or updated.
    pub content_types: Vec<Entity>,
    /// Content types successfully published.
    pub published_content_types: Vec<Entity>,
    /// Webhooks created or updated.
    pub webhooks: Vec<Entity>,
    /// Assets created or updated and processed.
    pub assets: Vec<Entity>,
    /// Assets successfully published.
    pub published_assets: Vec<Entity>,
    /// Entries created or updated.
    pub entries: Vec<Entity>,
    /// Entries successfully published.
    pub published_entries: Vec<Entity>,
    /// Non-fatal problems recorded during the run.
    pub issues: Vec<Issue>,
}

/// Pushes the prepared source content into the destination space.
///
/// Stages run in dependency order: locales, then content types (published
/// before any content referencing them), editor interfaces, webhooks, assets
/// (created, processed, published), and finally entries in link order. An
/// entity that was published at the source comes back published; drafts stay
/// drafts. Per-entity failures are collected into the summary's `issues`;
/// only option conflicts, snapshot problems and version mismatches abort
/// the run.
pub async fn push_to_space<C: SpaceClient>(
    client: &C,
    source: SourceContent,
    destination: DestinationContent,
    options: &PushOptions,
) -> EngineResult<PushSummary> {
    options.validate()?;
    let sink = IssueSink::new();
    let publish_policy = options.publish_policy();
    let mut summary = PushSummary::default();

    if !options.skip_content_model {
        if !options.skip_locales {
            info!("Creating locales");
            let index = DestinationIndex::from_entities(destination.locales);
            summary.locales =
                create_entities(client, EntityKind::Locale, source.locales, &index, &sink).await?;
        }

        info!("Creating content types");
        let index = DestinationIndex::from_entities(destination.content_types);
        summary.content_types = create_entities(
            client,
            EntityKind::ContentType,
            source.content_types,
            &index,
            &sink,
        )
        .await?;
        pause(options.pre_publish_delay).await;
        summary.published_content_types = publish_entities(
            client,
            summary.content_types.clone(),
            &publish_policy,
            &sink,
        )
        .await;

        update_editor_interfaces(
            client,
            &summary.published_content_types,
            &source.editor_interfaces,
            options.editor_interface_concurrency,
            &sink,
        )
        .await;
    }

    if !options.content_model_only {
        info!("Creating webhooks");
        let index = DestinationIndex::from_entities(destination.webhooks);
        summary.webhooks =
            create_entities(client, EntityKind::Webhook, source.webhooks, &index, &sink).await?;

        info!("Creating assets");
        let index = DestinationIndex::from_entities(destination.assets);
        let (published, drafts) = partition_published(source.assets);
        let mut created =
            create_entities(client, EntityKind::Asset, drafts, &index, &sink).await?;
        let created_published =
            create_entities(client, EntityKind::Asset, published, &index, &sink).await?;
        let publish_ids: HashSet<String> = created_published
            .iter()
            .map(|asset| asset.sys.id.clone())
            .collect();
        created.extend(created_published);

        summary.assets =
            process_assets(client, created, options.asset_concurrency, &sink).await;
        if !options.skip_content_publishing {
            let to_publish: Vec<Entity> = summary
                .assets
                .iter()
                .filter(|asset| publish_ids.contains(&asset.sys.id))
                .cloned()
                .collect();
            summary.published_assets =
                publish_entities(client, to_publish, &publish_policy, &sink).await;
        }

        info!("Creating entries");
        let index = DestinationIndex::from_entities(destination.entries);
        let sorted = sort_transformed_entries(source.entries);
        let (published, drafts) = partition_published(sorted);
        summary.entries = create_entries(
            client,
            drafts,
            &index,
            options.skip_content_model,
            &sink,
        )
        .await?;
        let created_published = create_entries(
            client,
            published,
            &index,
            options.skip_content_model,
            &sink,
        )
        .await?;
        summary.entries.extend(created_published.iter().cloned());

        pause(options.pre_publish_delay).await;
        if !options.skip_content_publishing {
            summary.published_entries =
                publish_entities(client, created_published, &publish_policy, &sink).await;
        }
    }

    summary.issues = sink.drain();
    info!(
        "Finished pushing content ({} issues recorded)",
        summary.issues.len()
    );
    Ok(summary)
}

/// Splits by the source's publication state, preserving relative order.
fn partition_published(
    entities: Vec<TransformedEntity>,
) -> (Vec<TransformedEntity>, Vec<TransformedEntity>) {
    entities
        .into_iter()
        .partition(|pair| pair.original.is_published())
}

/// Copies source editor interface controls onto the destination's.
///
/// The destination creates an editor interface per content type on publish,
/// so this is always fetch-then-update. Failures are per content type and
/// never abort the run.
async fn update_editor_interfaces<C: SpaceClient>(
    client: &C,
    content_types: &[Entity],
    editor_interfaces: &[Entity],
    concurrency: usize,
    sink: &IssueSink,
) {
    let jobs: Vec<(String, Entity)> = content_types
        .iter()
        .filter_map(|content_type| {
            editor_interfaces
                .iter()
                .find(|editor| {
                    editor.sys.content_type.as_deref() == Some(content_type.sys.id.as_str())
                })
                .map(|editor| (content_type.sys.id.clone(), editor.clone()))
        })
        .collect();
    if jobs.is_empty() {
        return;
    }
    info!("Updating {} editor interfaces", jobs.len());

    run_all(jobs, RunPolicy::bounded(concurrency), |(content_type_id, source)| async move {
        match client.editor_interface(&content_type_id).await {
            Ok(mut destination) => {
                if let Some(controls) = source.payload.get("controls") {
                    destination
                        .payload
                        .insert("controls".into(), controls.clone());
                }
                match client.update(EntityKind::EditorInterface, &destination).await {
                    Ok(_) => {
                        info!("Updated editor interface for ContentType {content_type_id}");
                    }
                    Err(err) => sink.error_for(
                        destination.entity_ref(),
                        format!("failed to update editor interface: {err}"),
                    ),
                }
            }
            Err(err) => sink.error_for(
                EntityRef {
                    kind: EntityKind::EditorInterface,
                    id: content_type_id.clone(),
                },
                format!("failed to fetch editor interface: {err}"),
            ),
        }
    })
    .await;
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
