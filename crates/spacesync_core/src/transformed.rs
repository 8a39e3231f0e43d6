//! Original/transformed entity pairs.

use crate::entity::Entity;

/// A source entity paired with the payload that will be sent to the
/// destination.
///
/// `original` keeps the untouched source entity so later stages can still
/// read its sys metadata (draft/published state, content type); `transformed`
/// may have fields stripped or rewritten by the caller's transformers.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedEntity {
    /// The untouched source entity.
    pub original: Entity,
    /// The payload to send to the destination.
    pub transformed: Entity,
}

impl TransformedEntity {
    /// Pairs an original entity with its transformed payload.
    pub fn new(original: Entity, transformed: Entity) -> Self {
        Self {
            original,
            transformed,
        }
    }

    /// Pairs an entity with an identical transformed payload.
    pub fn identity(entity: Entity) -> Self {
        Self {
            original: entity.clone(),
            transformed: entity,
        }
    }
}
