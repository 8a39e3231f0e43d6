//! Create-vs-update orchestration against a destination snapshot.

use crate::client::SpaceClient;
use crate::error::{ApiError, EngineError, EngineResult};
use crate::runner::{run_all, RunPolicy};
use crate::sink::IssueSink;
use spacesync_core::{DestinationIndex, Entity, EntityKind, TransformedEntity};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpsertMethod {
    Create,
    Update,
}

impl UpsertMethod {
    fn past_tense(&self) -> &'static str {
        match self {
            UpsertMethod::Create => "Created",
            UpsertMethod::Update => "Updated",
        }
    }
}

/// Creates or updates a list of non-Entry entities.
///
/// Each entity is created when its id is absent from the destination
/// snapshot, updated otherwise (with the destination's current version
/// injected for the optimistic-concurrency check). Calls run batch-wide
/// concurrent; per-entity failures are recorded and drop only that entity,
/// except `VersionMismatch`, which is fatal for the stage.
pub async fn create_entities<C: SpaceClient>(
    client: &C,
    kind: EntityKind,
    entities: Vec<TransformedEntity>,
    index: &DestinationIndex,
    sink: &IssueSink,
) -> EngineResult<Vec<Entity>> {
    let policy = RunPolicy::batch_wide(entities.len());
    let results = run_all(entities, policy, |pair| async move {
        let (method, payload) = prepare_upsert(&pair.transformed, index);
        let result = call(client, method, kind, &payload).await;
        finish_upsert(kind, &pair, payload, method, result, sink)
    })
    .await;
    collect(results)
}

/// Creates or updates a list of entries.
///
/// Same contract as [`create_entities`], plus entry-specific recovery: when
/// the content model was intentionally not synchronized and the destination
/// rejects fields its content type no longer has, the offending fields are
/// stripped and the call retried once. The error enumerates every unknown
/// field at once, so a single bounded retry recovers.
pub async fn create_entries<C: SpaceClient>(
    client: &C,
    entries: Vec<TransformedEntity>,
    index: &DestinationIndex,
    skip_content_model: bool,
    sink: &IssueSink,
) -> EngineResult<Vec<Entity>> {
    let policy = RunPolicy::batch_wide(entries.len());
    let results = run_all(entries, policy, |pair| async move {
        let (method, mut payload) = prepare_upsert(&pair.transformed, index);
        let mut result = call(client, method, EntityKind::Entry, &payload).await;

        if skip_content_model {
            if let Err(err) = &result {
                let unknown = err.unknown_field_ids();
                if !unknown.is_empty() {
                    if let Some(fields) = payload.fields_mut() {
                        fields.retain(|field_id, _| !unknown.contains(field_id));
                    }
                    result = call(client, method, EntityKind::Entry, &payload).await;
                }
            }
        }

        finish_upsert(EntityKind::Entry, &pair, payload, method, result, sink)
    })
    .await;
    collect(results)
}

/// Decides create-vs-update and injects the destination version on update.
fn prepare_upsert(transformed: &Entity, index: &DestinationIndex) -> (UpsertMethod, Entity) {
    let mut payload = transformed.clone();
    match index.version_of(&payload.sys.id) {
        Some(version) => {
            payload.sys.version = version;
            (UpsertMethod::Update, payload)
        }
        None => (UpsertMethod::Create, payload),
    }
}

async fn call<C: SpaceClient>(
    client: &C,
    method: UpsertMethod,
    kind: EntityKind,
    payload: &Entity,
) -> Result<Entity, ApiError> {
    match method {
        UpsertMethod::Create => client.create(kind, payload).await,
        UpsertMethod::Update => client.update(kind, payload).await,
    }
}

fn finish_upsert(
    kind: EntityKind,
    pair: &TransformedEntity,
    payload: Entity,
    method: UpsertMethod,
    result: Result<Entity, ApiError>,
    sink: &IssueSink,
) -> Result<Option<Entity>, EngineError> {
    match result {
        Ok(saved) => {
            info!("{} {} {}", method.past_tense(), kind, saved.display_name());
            Ok(Some(saved))
        }
        Err(err) if err.is_taken() => {
            // Duplicate unique field, e.g. a locale code that already exists.
            // Downstream stages still see the original entity.
            info!(
                "Skipped {} {}: already present on the destination",
                kind,
                payload.display_name()
            );
            Ok(Some(pair.original.clone()))
        }
        Err(ApiError::VersionMismatch) => {
            error!(
                "Content update error for {} {}: version mismatch. This probably means \
                 the destination space already has newer content than the snapshot this \
                 push was prepared against; re-fetch the destination before pushing",
                kind, payload.sys.id
            );
            Err(EngineError::VersionMismatch {
                entity: payload.entity_ref(),
            })
        }
        Err(err) => {
            sink.error_for(
                payload.entity_ref(),
                format!("failed to {} {}: {}", method_verb(method), kind, err),
            );
            Ok(None)
        }
    }
}

fn method_verb(method: UpsertMethod) -> &'static str {
    match method {
        UpsertMethod::Create => "create",
        UpsertMethod::Update => "update",
    }
}

fn collect(results: Vec<Result<Option<Entity>, EngineError>>) -> EngineResult<Vec<Entity>> {
    let mut out = Vec::new();
    for result in results {
        if let Some(entity) = result? {
            out.push(entity);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockClient, Operation};
    use crate::error::ErrorDetail;
    use serde_json::json;

    fn pair(kind: EntityKind, id: &str) -> TransformedEntity {
        TransformedEntity::identity(Entity::new(kind, id))
    }

    #[tokio::test]
    async fn creates_when_absent_updates_when_present() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        let index = DestinationIndex::from_entities(vec![
            Entity::new(EntityKind::Asset, "existing").with_version(7)
        ]);

        let created = create_entities(
            &client,
            EntityKind::Asset,
            vec![pair(EntityKind::Asset, "fresh"), pair(EntityKind::Asset, "existing")],
            &index,
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(client.ids_for(Operation::Create), vec!["fresh"]);
        assert_eq!(client.ids_for(Operation::Update), vec!["existing"]);
        // The injected destination version (7) is what the mock bumps.
        assert_eq!(created[1].sys.version, 8);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn second_run_against_updated_snapshot_turns_into_updates() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        let source = vec![pair(EntityKind::Locale, "de-DE"), pair(EntityKind::Locale, "fr-FR")];

        let first = create_entities(
            &client,
            EntityKind::Locale,
            source.clone(),
            &DestinationIndex::default(),
            &sink,
        )
        .await
        .unwrap();
        assert_eq!(client.ids_for(Operation::Create).len(), 2);

        let snapshot = DestinationIndex::from_entities(first);
        create_entities(&client, EntityKind::Locale, source, &snapshot, &sink)
            .await
            .unwrap();

        assert_eq!(client.ids_for(Operation::Create).len(), 2, "no new creates");
        assert_eq!(client.ids_for(Operation::Update).len(), 2);
    }

    #[tokio::test]
    async fn taken_is_a_successful_no_op_returning_the_original() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        client.fail_once(
            Operation::Create,
            "en-US",
            ApiError::ValidationFailed {
                errors: vec![ErrorDetail::named("taken")],
            },
        );

        let original = Entity::new(EntityKind::Locale, "en-US").with_version(3);
        let created = create_entities(
            &client,
            EntityKind::Locale,
            vec![TransformedEntity::new(
                original.clone(),
                Entity::new(EntityKind::Locale, "en-US"),
            )],
            &DestinationIndex::default(),
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(created, vec![original]);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn version_mismatch_is_fatal_for_the_stage() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        let index =
            DestinationIndex::from_entities(vec![Entity::new(EntityKind::Entry, "e1").with_version(2)]);
        client.fail_once(Operation::Update, "e1", ApiError::VersionMismatch);

        let result = create_entries(
            &client,
            vec![pair(EntityKind::Entry, "e1")],
            &index,
            false,
            &sink,
        )
        .await;

        assert!(matches!(
            result,
            Err(EngineError::VersionMismatch { entity }) if entity.id == "e1"
        ));
    }

    #[tokio::test]
    async fn unknown_fields_are_stripped_and_retried_once() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        let index =
            DestinationIndex::from_entities(vec![Entity::new(EntityKind::Entry, "e1").with_version(4)]);
        client.fail_once(
            Operation::Update,
            "e1",
            ApiError::UnknownField {
                errors: vec![ErrorDetail::at("unknown", ["fields", "gone"])],
            },
        );

        let entry = Entity::new(EntityKind::Entry, "e1").with_payload(
            "fields",
            json!({
                "gone": { "en-US": "dropped from the content type" },
                "kept": { "en-US": "still there" },
            }),
        );
        let created = create_entries(
            &client,
            vec![TransformedEntity::identity(entry)],
            &index,
            true,
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(client.call_count(Operation::Update, "e1"), 2);
        assert_eq!(created.len(), 1);
        let fields = created[0].fields().unwrap();
        assert!(fields.contains_key("kept"));
        assert!(!fields.contains_key("gone"));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn unknown_fields_without_skip_content_model_drop_the_entry() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        let index =
            DestinationIndex::from_entities(vec![Entity::new(EntityKind::Entry, "e1").with_version(4)]);
        client.fail_once(
            Operation::Update,
            "e1",
            ApiError::UnknownField {
                errors: vec![ErrorDetail::at("unknown", ["fields", "gone"])],
            },
        );

        let created = create_entries(
            &client,
            vec![pair(EntityKind::Entry, "e1")],
            &index,
            false,
            &sink,
        )
        .await
        .unwrap();

        assert!(created.is_empty());
        assert_eq!(client.call_count(Operation::Update, "e1"), 1);
        assert_eq!(sink.error_count(), 1);
    }

    #[tokio::test]
    async fn generic_failures_drop_the_entity_but_not_its_siblings() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        client.fail_once(
            Operation::Create,
            "bad",
            ApiError::Other {
                status: 500,
                message: "server error".into(),
            },
        );

        let created = create_entities(
            &client,
            EntityKind::Asset,
            vec![pair(EntityKind::Asset, "bad"), pair(EntityKind::Asset, "good")],
            &DestinationIndex::default(),
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].sys.id, "good");
        let issues = sink.drain();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].entity.as_ref().unwrap().id, "bad");
    }
}
