//! Typed links between entities and their extraction from field payloads.

use crate::entity::Entity;
use serde_json::Value;
use std::collections::HashSet;

/// A typed reference from one entity's field to another entity's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// Kind of entity the link points to (`"Entry"`, `"Asset"`, ...).
    pub link_type: String,
    /// Id of the target entity.
    pub id: String,
}

/// Collects every link in an entity's fields, in field-encounter order.
///
/// Links may sit arbitrarily deep inside locale-keyed maps and arrays; any
/// object of the shape `{"sys": {"type": "Link", "linkType": ..., "id": ...}}`
/// counts.
pub fn links(entity: &Entity) -> Vec<Link> {
    let mut out = Vec::new();
    if let Some(fields) = entity.payload.get("fields") {
        collect(fields, &mut out);
    }
    out
}

/// Collects the ids of Entry-type link targets, deduplicated in
/// encounter order. Only these participate in dependency ordering.
pub fn entry_links(entity: &Entity) -> Vec<String> {
    let mut seen = HashSet::new();
    links(entity)
        .into_iter()
        .filter(|link| link.link_type == "Entry")
        .filter(|link| seen.insert(link.id.clone()))
        .map(|link| link.id)
        .collect()
}

fn collect(value: &Value, out: &mut Vec<Link>) {
    match value {
        Value::Object(map) => {
            if let Some(link) = as_link(map.get("sys")) {
                out.push(link);
                return;
            }
            for nested in map.values() {
                collect(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, out);
            }
        }
        _ => {}
    }
}

fn as_link(sys: Option<&Value>) -> Option<Link> {
    let sys = sys?.as_object()?;
    if sys.get("type")?.as_str()? != "Link" {
        return None;
    }
    Some(Link {
        link_type: sys.get("linkType")?.as_str()?.to_string(),
        id: sys.get("id")?.as_str()?.to_string(),
    })
}
