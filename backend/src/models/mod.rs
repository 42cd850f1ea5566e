//! Domain models for the listload sync pipeline.
//!
//! - [`Dataset`] - CSV columns mapped to their item texts
//! - [`Collection`] - A remote keyword list, as sent and received on the wire
//! - [`Entity`] - A single typed text item of a collection

use serde::{Deserialize, Serialize};

/// Maximum entities a collection accepts in one write.
pub const CAPACITY: usize = 50;

/// Wire kind of every entity built from a dataset.
pub const ENTITY_KIND: &str = "customKeyword";

/// Wire kind of every collection created by a sync.
pub const COLLECTION_KIND: &str = "customTopic";

// =============================================================================
// Dataset
// =============================================================================

/// One CSV column: its header and the non-empty cells below it, in row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub items: Vec<String>,
}

/// Column name to ordered item texts.
///
/// Every header of the source appears, even when no cell under it had a value.
/// Iteration follows header order. Names are unique and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a header. A repeated header keeps its first position.
    pub fn add_column(&mut self, name: &str) {
        if self.get(name).is_none() {
            self.columns.push(Column {
                name: name.to_string(),
                items: Vec::new(),
            });
        }
    }

    /// Append a value under `name`. Empty values are dropped.
    pub fn push(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        self.add_column(name);
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.items.push(value.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.items.as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Total number of items across all columns.
    pub fn item_count(&self) -> usize {
        self.columns.iter().map(|c| c.items.len()).sum()
    }
}

impl<N, I, S> FromIterator<(N, I)> for Dataset
where
    N: Into<String>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, I)>>(iter: T) -> Self {
        let mut dataset = Dataset::new();
        for (name, items) in iter {
            let name = name.into();
            dataset.add_column(&name);
            for item in items {
                dataset.push(&name, &item.into());
            }
        }
        dataset
    }
}

// =============================================================================
// Remote Collections
// =============================================================================

/// A single item of a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl Entity {
    /// A keyword entity, the only kind a sync ever builds.
    pub fn keyword(text: impl Into<String>) -> Self {
        Self {
            kind: ENTITY_KIND.to_string(),
            text: text.into(),
        }
    }
}

/// A remote list.
///
/// `id` is absent for collections not yet created and is then left out of
/// the JSON body entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Collection {
    /// A new topic collection holding `entities`.
    pub fn topic(label: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            id: None,
            label: label.into(),
            kind: COLLECTION_KIND.to_string(),
            entities,
        }
    }

    /// Whether the collection already holds [`CAPACITY`] entities or more.
    pub fn is_full(&self) -> bool {
        self.entities.len() >= CAPACITY
    }

    /// Free slots left before [`CAPACITY`].
    pub fn room(&self) -> usize {
        CAPACITY.saturating_sub(self.entities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dataset_keeps_header_order_and_empty_columns() {
        let mut dataset = Dataset::new();
        dataset.add_column("b");
        dataset.add_column("a");
        dataset.push("a", "1");
        dataset.push("a", "");

        assert_eq!(dataset.names(), vec!["b", "a"]);
        assert_eq!(dataset.get("a"), Some(&["1".to_string()][..]));
        assert_eq!(dataset.get("b"), Some(&[][..]));
        assert_eq!(dataset.item_count(), 1);
    }

    #[test]
    fn test_dataset_names_are_case_sensitive() {
        let dataset: Dataset = [("Team", vec!["x"]), ("team", vec!["y"])]
            .into_iter()
            .collect();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_new_collection_omits_id() {
        let collection = Collection::topic("Fruits", vec![Entity::keyword("apple")]);
        let value = serde_json::to_value(&collection).unwrap();

        assert_eq!(
            value,
            json!({
                "label": "Fruits",
                "type": "customTopic",
                "entities": [{ "type": "customKeyword", "text": "apple" }]
            })
        );
    }

    #[test]
    fn test_fetched_collection_tolerates_missing_fields() {
        let collection: Collection = serde_json::from_value(json!({
            "id": "abc",
            "label": "Teams",
            "entities": [{ "type": "publication", "id": "feed/1" }]
        }))
        .unwrap();

        assert_eq!(collection.id.as_deref(), Some("abc"));
        assert_eq!(collection.kind, "");
        assert_eq!(collection.entities[0].kind, "publication");
        assert_eq!(collection.entities[0].text, "");
    }

    #[test]
    fn test_room() {
        let mut collection = Collection::topic("x", vec![Entity::keyword("a"); 48]);
        assert_eq!(collection.room(), 2);
        assert!(!collection.is_full());

        collection.entities = vec![Entity::keyword("a"); 60];
        assert_eq!(collection.room(), 0);
        assert!(collection.is_full());
    }
}
