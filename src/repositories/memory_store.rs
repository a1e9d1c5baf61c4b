use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::store::{item_id, AttributeFilter, DocumentStore, Item};
use crate::models::{RepositoryError, RepositoryResult};

/// In-process store with the same conditional semantics as DynamoDB
///
/// Tables are created lazily on first write.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, HashMap<String, Item>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items currently held in `table`
    pub async fn len(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    fn key_of(item: &Item) -> RepositoryResult<String> {
        item_id(item)
            .map(str::to_string)
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing id".to_string(),
            })
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn scan(
        &self,
        table: &str,
        filter: Option<AttributeFilter>,
    ) -> RepositoryResult<Vec<Item>> {
        let tables = self.tables.read().await;
        let items: Vec<Item> = tables
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|item| filter.as_ref().map_or(true, |f| f.matches(item)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(table = %table, count = items.len(), "In-memory scan");
        Ok(items)
    }

    async fn get(&self, table: &str, id: &str) -> RepositoryResult<Option<Item>> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|rows| rows.get(id)).cloned())
    }

    async fn insert(&self, table: &str, item: Item) -> RepositoryResult<()> {
        let key = Self::key_of(&item)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        if rows.contains_key(&key) {
            return Err(RepositoryError::Conflict {
                message: format!("An item with this id already exists in {}", table),
            });
        }

        rows.insert(key, item);
        Ok(())
    }

    async fn replace(&self, table: &str, item: Item) -> RepositoryResult<bool> {
        let key = Self::key_of(&item)?;
        let mut tables = self.tables.write().await;

        match tables.get_mut(table).and_then(|rows| rows.get_mut(&key)) {
            Some(existing) => {
                *existing = item;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, table: &str, id: &str) -> RepositoryResult<Option<Item>> {
        let mut tables = self.tables.write().await;
        Ok(tables.get_mut(table).and_then(|rows| rows.remove(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;

    fn item(id: &str, cleaned: bool) -> Item {
        let mut item = Item::new();
        item.insert("id".to_string(), AttributeValue::S(id.to_string()));
        item.insert("isCleaned".to_string(), AttributeValue::Bool(cleaned));
        item
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = InMemoryStore::new();
        store.insert("rooms", item("r-1", true)).await.unwrap();

        let found = store.get("rooms", "r-1").await.unwrap();
        assert_eq!(found, Some(item("r-1", true)));
        assert_eq!(store.get("guests", "r-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_rejects_existing_key() {
        let store = InMemoryStore::new();
        store.insert("rooms", item("r-1", true)).await.unwrap();

        let result = store.insert("rooms", item("r-1", false)).await;
        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
        assert_eq!(store.len("rooms").await, 1);
    }

    #[tokio::test]
    async fn test_replace_never_creates() {
        let store = InMemoryStore::new();

        assert!(!store.replace("rooms", item("r-1", true)).await.unwrap());
        assert_eq!(store.len("rooms").await, 0);

        store.insert("rooms", item("r-1", true)).await.unwrap();
        assert!(store.replace("rooms", item("r-1", false)).await.unwrap());
        assert_eq!(
            store.get("rooms", "r-1").await.unwrap(),
            Some(item("r-1", false))
        );
    }

    #[tokio::test]
    async fn test_remove_returns_previous_item() {
        let store = InMemoryStore::new();
        store.insert("rooms", item("r-1", true)).await.unwrap();

        assert_eq!(
            store.remove("rooms", "r-1").await.unwrap(),
            Some(item("r-1", true))
        );
        assert_eq!(store.remove("rooms", "r-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_with_filter() {
        let store = InMemoryStore::new();
        store.insert("rooms", item("r-1", true)).await.unwrap();
        store.insert("rooms", item("r-2", false)).await.unwrap();
        store.insert("rooms", item("r-3", true)).await.unwrap();

        assert_eq!(store.scan("rooms", None).await.unwrap().len(), 3);

        let cleaned = store
            .scan("rooms", Some(AttributeFilter::equals("isCleaned", true)))
            .await
            .unwrap();
        assert_eq!(cleaned.len(), 2);
        assert!(store.scan("empty", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_requires_id() {
        let store = InMemoryStore::new();
        let result = store.insert("rooms", Item::new()).await;
        assert!(matches!(result, Err(RepositoryError::InvalidItem { .. })));
    }
}
