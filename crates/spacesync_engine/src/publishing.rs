//! Publish convergence queue and its unpublish sibling.

use crate::client::SpaceClient;
use crate::config::PublishPolicy;
use crate::error::ApiError;
use crate::runner::{run_all, RunPolicy};
use crate::sink::IssueSink;
use spacesync_core::Entity;
use tracing::info;

/// Publishes as many of the given entities as possible, returning exactly
/// the successfully published ones.
///
/// Entries may reference entries not published yet, so one top-to-bottom
/// pass is insufficient: failures the API marks as not-resolvable stay in
/// the working set and are retried on the next pass, which converges within
/// (longest reference chain) passes for an acyclic graph. A pass that does
/// not shrink the working set means an unresolvable cycle or a genuinely
/// broken reference; the queue then records one stall error, drops the
/// remainder and returns what it has (partial success, never an endless
/// loop).
///
/// Each pass runs strictly sequential with a post-call delay: the
/// destination enforces per-second rate limits, and publish order matters
/// for link resolution within a pass.
pub async fn publish_entities<C: SpaceClient>(
    client: &C,
    entities: Vec<Entity>,
    policy: &PublishPolicy,
    sink: &IssueSink,
) -> Vec<Entity> {
    if entities.is_empty() {
        info!("Skipping publishing since zero entities passed");
        return Vec::new();
    }
    let kind = entities[0].sys.kind;
    let total = entities.len();

    let mut pending: Vec<Entity> = entities
        .into_iter()
        .filter(|entity| {
            if entity.sys.kind.is_publishable() {
                true
            } else {
                sink.warning(format!(
                    "Unable to publish {} {}",
                    entity.sys.kind,
                    entity.display_name()
                ));
                false
            }
        })
        .collect();
    info!("Publishing {} {}s", pending.len(), kind);

    let run_policy = RunPolicy::serial().with_delay(policy.delay);
    let mut published = Vec::new();

    while !pending.is_empty() {
        let before = pending.len();
        let results = run_all(pending, run_policy, |entity| async move {
            let outcome = client.publish(entity.sys.kind, &entity).await;
            (entity, outcome)
        })
        .await;

        let mut deferred = Vec::new();
        for (entity, outcome) in results {
            match outcome {
                Ok(done) => {
                    info!("Published {} {}", done.sys.kind, done.display_name());
                    published.push(done);
                }
                Err(err) if err.is_unresolvable() => {
                    sink.error_for(
                        entity.entity_ref(),
                        format!("could not publish: {err}; link target not published yet, retrying next pass"),
                    );
                    deferred.push(entity);
                }
                Err(err) => {
                    sink.error_for(entity.entity_ref(), format!("failed to publish: {err}"));
                }
            }
        }

        if !deferred.is_empty() && deferred.len() >= before {
            sink.error(format!(
                "publishing queue unable to make progress: {} {}s left unpublished",
                deferred.len(),
                kind
            ));
            break;
        }
        pending = deferred;
    }

    info!(
        "Successfully published {} of {} {}s",
        published.len(),
        total,
        kind
    );
    published
}

/// Unpublishes the given entities in one pass.
///
/// An already-unpublished entity (the API answers `BadRequest`) counts as
/// success; any other failure is recorded per entity and drops it from the
/// result.
pub async fn unpublish_entities<C: SpaceClient>(
    client: &C,
    entities: Vec<Entity>,
    sink: &IssueSink,
) -> Vec<Entity> {
    let results = run_all(entities, RunPolicy::serial(), |entity| async move {
        let outcome = client.unpublish(entity.sys.kind, &entity).await;
        (entity, outcome)
    })
    .await;

    let mut unpublished = Vec::new();
    for (entity, outcome) in results {
        match outcome {
            Ok(done) => {
                info!("Unpublished {} {}", done.sys.kind, done.display_name());
                unpublished.push(done);
            }
            Err(ApiError::BadRequest(_)) => {
                info!(
                    "{} {} already unpublished",
                    entity.sys.kind,
                    entity.display_name()
                );
                unpublished.push(entity);
            }
            Err(err) => {
                sink.error_for(entity.entity_ref(), format!("failed to unpublish: {err}"));
            }
        }
    }
    unpublished
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockClient, Operation};
    use crate::error::ErrorDetail;
    use crate::sink::IssueLevel;
    use spacesync_core::EntityKind;

    fn not_resolvable() -> ApiError {
        ApiError::Unprocessable {
            errors: vec![ErrorDetail::named("notResolvable")],
        }
    }

    fn entry(id: &str) -> Entity {
        Entity::new(EntityKind::Entry, id).with_version(1)
    }

    #[tokio::test]
    async fn publishes_everything_in_one_pass() {
        let client = MockClient::new();
        let sink = IssueSink::new();

        let published = publish_entities(
            &client,
            vec![entry("a"), entry("b")],
            &PublishPolicy::immediate(),
            &sink,
        )
        .await;

        assert_eq!(published.len(), 2);
        assert!(published.iter().all(Entity::is_published));
        assert_eq!(client.ids_for(Operation::Publish), vec!["a", "b"]);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn empty_input_publishes_nothing() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        let published =
            publish_entities(&client, Vec::new(), &PublishPolicy::immediate(), &sink).await;
        assert!(published.is_empty());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn non_publishable_entities_are_skipped_with_a_warning() {
        let client = MockClient::new();
        let sink = IssueSink::new();

        let published = publish_entities(
            &client,
            vec![entry("a"), Entity::new(EntityKind::Locale, "de-DE")],
            &PublishPolicy::immediate(),
            &sink,
        )
        .await;

        assert_eq!(published.len(), 1);
        let issues = sink.drain();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, IssueLevel::Warning);
        assert_eq!(client.call_count(Operation::Publish, "de-DE"), 0);
    }

    #[tokio::test]
    async fn deferred_entity_is_published_on_the_next_pass() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        client.fail_once(Operation::Publish, "y", not_resolvable());

        let published = publish_entities(
            &client,
            vec![entry("x"), entry("y")],
            &PublishPolicy::immediate(),
            &sink,
        )
        .await;

        let ids: Vec<_> = published.iter().map(|e| e.sys.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert_eq!(client.call_count(Operation::Publish, "x"), 1);
        assert_eq!(client.call_count(Operation::Publish, "y"), 2);
        // The deferral is recorded, but nothing fatal and no stall.
        let issues = sink.drain();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("retrying next pass"));
    }

    #[tokio::test]
    async fn chain_of_forward_references_converges_within_n_passes() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        // Entity i cannot resolve until entity i-1 is published.
        client.fail_times(Operation::Publish, "e1", not_resolvable(), 1);
        client.fail_times(Operation::Publish, "e2", not_resolvable(), 2);

        let published = publish_entities(
            &client,
            vec![entry("e0"), entry("e1"), entry("e2")],
            &PublishPolicy::immediate(),
            &sink,
        )
        .await;

        assert_eq!(published.len(), 3);
        assert_eq!(client.call_count(Operation::Publish, "e0"), 1);
        assert_eq!(client.call_count(Operation::Publish, "e1"), 2);
        assert_eq!(client.call_count(Operation::Publish, "e2"), 3);
    }

    #[tokio::test]
    async fn permanently_unresolvable_set_stalls_and_terminates() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        client.fail_times(Operation::Publish, "a", not_resolvable(), 10);
        client.fail_times(Operation::Publish, "b", not_resolvable(), 10);

        let published = publish_entities(
            &client,
            vec![entry("a"), entry("b")],
            &PublishPolicy::immediate(),
            &sink,
        )
        .await;

        assert!(published.is_empty());
        // One pass attempted: one error per entity, plus the stall error.
        assert_eq!(client.call_count(Operation::Publish, "a"), 1);
        assert_eq!(client.call_count(Operation::Publish, "b"), 1);
        let issues = sink.drain();
        assert_eq!(issues.len(), 3);
        assert!(issues[2].message.contains("unable to make progress"));
    }

    #[tokio::test]
    async fn other_failures_are_dropped_permanently_not_retried() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        client.fail_once(
            Operation::Publish,
            "broken",
            ApiError::Other {
                status: 500,
                message: "boom".into(),
            },
        );

        let published = publish_entities(
            &client,
            vec![entry("broken"), entry("fine")],
            &PublishPolicy::immediate(),
            &sink,
        )
        .await;

        let ids: Vec<_> = published.iter().map(|e| e.sys.id.as_str()).collect();
        assert_eq!(ids, vec!["fine"]);
        assert_eq!(client.call_count(Operation::Publish, "broken"), 1);
        assert_eq!(sink.error_count(), 1);
    }

    #[tokio::test]
    async fn unpublish_treats_bad_request_as_already_done() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        client.fail_once(
            Operation::Unpublish,
            "a",
            ApiError::BadRequest("not published".into()),
        );

        let unpublished = unpublish_entities(&client, vec![entry("a"), entry("b")], &sink).await;

        assert_eq!(unpublished.len(), 2);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn unpublish_surfaces_other_failures() {
        let client = MockClient::new();
        let sink = IssueSink::new();
        client.fail_once(
            Operation::Unpublish,
            "a",
            ApiError::Other {
                status: 500,
                message: "boom".into(),
            },
        );

        let unpublished = unpublish_entities(&client, vec![entry("a"), entry("b")], &sink).await;

        assert_eq!(unpublished.len(), 1);
        assert_eq!(unpublished[0].sys.id, "b");
        assert_eq!(sink.error_count(), 1);
    }
}
