//! Push engine for content-space synchronization.
//!
//! Takes prepared source content plus a snapshot of the destination space
//! and drives the destination API to converge: entities are created or
//! updated depending on the snapshot, assets are processed, and everything
//! published at the source is republished at the destination in an order
//! that resolves inter-entry links.
//!
//! # Key invariants
//!
//! - Stages run in dependency order: locales, content types, editor
//!   interfaces, webhooks, assets, entries.
//! - An entity present in the destination snapshot is updated at the
//!   snapshot's version; an absent one is created. A version mismatch on
//!   update aborts the run rather than silently overwriting newer content.
//! - Per-entity failures drop that entity and are recorded in the issue
//!   sink; the run itself keeps going.
//! - The publish queue retries not-yet-resolvable entities in passes and
//!   terminates as soon as a pass makes no progress.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod assets;
mod batch;
mod client;
mod config;
mod creation;
mod deletion;
mod error;
mod pipeline;
mod publishing;
mod runner;
mod sink;
mod snapshot;
mod sort;

pub use assets::process_assets;
pub use batch::id_batches;
pub use client::{CallRecord, MockClient, Operation, SpaceClient};
pub use config::{BatchLimits, PublishPolicy, PushOptions, SnapshotOptions};
pub use creation::{create_entities, create_entries};
pub use deletion::delete_entities;
pub use error::{ApiError, EngineError, EngineResult, ErrorDetail};
pub use pipeline::{push_to_space, PushSummary};
pub use publishing::{publish_entities, unpublish_entities};
pub use runner::{run_all, RunPolicy};
pub use sink::{Issue, IssueLevel, IssueSink};
pub use snapshot::fetch_destination_content;
pub use sort::{sort_entries, sort_transformed_entries};
