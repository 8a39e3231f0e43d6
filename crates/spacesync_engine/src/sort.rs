//! Dependency ordering of entries by their inter-entry links.

use spacesync_core::{entry_links, Entity, TransformedEntity};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Orders entries so that every link target in the set precedes its
/// referrers, wherever an acyclic ordering exists.
///
/// Depth-first post-order traversal from input order: to emit entry B, first
/// emit (in field-encounter order) every unvisited Entry-link target of B
/// that is present in the set, then B itself. An edge back to an entry still
/// on the recursion stack is a cycle and is dropped rather than followed, so
/// the sort always terminates and keeps every entry exactly once; self-links
/// are a cycle of length one. Targets outside the set are ignored. Entries
/// with no links keep their relative input order unless pulled earlier by a
/// dependent.
pub fn sort_entries(entries: Vec<Entity>) -> Vec<Entity> {
    sort_by_links(entries, |entity| entity)
}

/// Orders original/transformed pairs by the links of their transformed
/// payloads (the payloads being created at the destination).
pub fn sort_transformed_entries(entries: Vec<TransformedEntity>) -> Vec<TransformedEntity> {
    sort_by_links(entries, |pair| &pair.transformed)
}

fn sort_by_links<T>(items: Vec<T>, entity_of: impl Fn(&T) -> &Entity) -> Vec<T> {
    let position: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .map(|(index, item)| (entity_of(item).sys.id.clone(), index))
        .collect();

    let mut state = vec![Visit::Unvisited; items.len()];
    let mut order = Vec::with_capacity(items.len());

    fn visit<T>(
        index: usize,
        items: &[T],
        entity_of: &impl Fn(&T) -> &Entity,
        position: &HashMap<String, usize>,
        state: &mut [Visit],
        order: &mut Vec<usize>,
    ) {
        if state[index] != Visit::Unvisited {
            return;
        }
        state[index] = Visit::InProgress;
        for target in entry_links(entity_of(&items[index])) {
            if let Some(&target_index) = position.get(&target) {
                visit(target_index, items, entity_of, position, state, order);
            }
        }
        state[index] = Visit::Done;
        order.push(index);
    }

    for index in 0..items.len() {
        visit(index, &items, &entity_of, &position, &mut state, &mut order);
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .map(|index| slots[index].take().expect("each index emitted once"))
        .collect()
}
