//! # Spacesync Core
//!
//! Content entity model for spacesync.
//!
//! This crate provides:
//! - Entity and sys-metadata types shared by every migration stage
//! - Link extraction from nested localized fields
//! - Original/transformed entity pairs
//! - Destination snapshot index for create-vs-update decisions
//! - Per-kind content collections for a migration run
//!
//! ## Key Invariants
//!
//! - Entity ids are unique within their kind and space
//! - `sys.version` is assigned by the destination on each mutation
//! - A `DestinationIndex` is a point-in-time snapshot and is never mutated
//!   during a run

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod content;
mod entity;
mod index;
mod link;
mod transformed;

pub use content::{DestinationContent, SourceContent};
pub use entity::{Entity, EntityKind, EntityRef, SysInfo};
pub use index::DestinationIndex;
pub use link::{entry_links, links, Link};
pub use transformed::TransformedEntity;
