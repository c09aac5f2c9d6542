//! Materialized menu tree node

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field under which a menu item carries its children
pub const CHILDREN_FIELD: &str = "items";

/// Return a copy of an item's content with the children field removed.
///
/// Stored blobs hold a node's own content only; the tree shape lives in
/// the link graph.
pub fn strip_children(item: &Value) -> Value {
    match item {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != CHILDREN_FIELD)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A materialized menu item: stored content joined with its link
/// bookkeeping and recursively materialized children.
///
/// Serializes back to the stored wire shape - content fields at top
/// level, bookkeeping under `_linkId`/`_itemId`, children under `items`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MenuNode {
    /// Backend-assigned id of the parent-pointer link
    #[serde(rename = "_linkId")]
    pub link_id: u64,

    /// Content-derived item id (the link's source)
    #[serde(rename = "_itemId")]
    pub item_id: u64,

    /// Parent item id (the link's target); set on flat listings only
    #[serde(rename = "_parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,

    /// The item's own content fields
    #[serde(flatten)]
    pub content: Map<String, Value>,

    /// Materialized children, in backend enumeration order
    #[serde(rename = "items", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    /// Fetch a content field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    /// Fetch a content field as a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.content.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_children_removes_items() {
        let item = json!({"label": "Home", "items": [{"label": "Sub"}]});
        let stripped = strip_children(&item);
        assert_eq!(stripped, json!({"label": "Home"}));
    }

    #[test]
    fn test_strip_children_passes_leaf_through() {
        let item = json!({"label": "Home", "icon": "house"});
        assert_eq!(strip_children(&item), item);
    }

    #[test]
    fn test_node_serializes_to_wire_shape() {
        let node = MenuNode {
            link_id: 7,
            item_id: 42,
            parent_id: None,
            content: match json!({"label": "Home"}) {
                Value::Object(map) => map,
                _ => unreachable!(),
            },
            children: Vec::new(),
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["_linkId"], 7);
        assert_eq!(value["_itemId"], 42);
        assert_eq!(value["label"], "Home");
        assert!(value.get("items").is_none());
    }
}
