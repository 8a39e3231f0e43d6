//! Point-in-time index of existing destination entities.

use crate::entity::Entity;
use std::collections::HashMap;

/// Maps entity ids to the corresponding existing destination entity.
///
/// Built once from a destination snapshot and read-only afterwards: changes
/// the run itself makes to the destination are deliberately not reflected
/// back, so create-vs-update decisions stay based on the same point in time.
#[derive(Debug, Clone, Default)]
pub struct DestinationIndex {
    by_id: HashMap<String, Entity>,
}

impl DestinationIndex {
    /// Builds an index from a snapshot of destination entities.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        Self {
            by_id: entities
                .into_iter()
                .map(|entity| (entity.sys.id.clone(), entity))
                .collect(),
        }
    }

    /// Looks up the destination entity with the given id.
    pub fn lookup(&self, id: &str) -> Option<&Entity> {
        self.by_id.get(id)
    }

    /// Returns the destination version of the given id, if present.
    pub fn version_of(&self, id: &str) -> Option<u64> {
        self.by_id.get(id).map(|entity| entity.sys.version)
    }

    /// Returns true if the id exists in the snapshot.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
