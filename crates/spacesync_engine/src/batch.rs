//! Partitioning of ID lists into query-safe batches.

use crate::config::BatchLimits;

/// Splits an ordered ID list into comma-joined batches.
///
/// A batch is closed when adding the next ID would exceed the character
/// limit, when the item count limit is reached, or when input is exhausted.
/// Concatenating all batches (split on comma) reproduces the input exactly,
/// in order. Empty input yields no batches; no batch is ever empty or ends
/// with a comma.
///
/// Pure and synchronous; each returned batch is the unit of one network
/// request.
pub fn id_batches(ids: &[String], limits: &BatchLimits) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for id in ids {
        let projected = if current.is_empty() {
            id.len()
        } else {
            current.len() + 1 + id.len()
        };
        if !current.is_empty() && (projected > limits.char_limit || count >= limits.item_limit) {
            batches.push(std::mem::take(&mut current));
            count = 0;
        }
        if !current.is_empty() {
            current.push(',');
        }
        current.push_str(id);
        count += 1;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
