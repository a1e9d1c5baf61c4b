use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

use crate::models::RepositoryResult;

/// A stored record as attribute name to attribute value
pub type Item = HashMap<String, AttributeValue>;

/// Name of the partition key attribute on every table
pub const PARTITION_KEY: &str = "id";

/// Equality filter on a single boolean attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub attribute: String,
    pub value: bool,
}

impl AttributeFilter {
    pub fn equals(attribute: impl Into<String>, value: bool) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        matches!(item.get(&self.attribute), Some(AttributeValue::Bool(v)) if *v == self.value)
    }
}

/// Single-table key-value store keyed by the `id` partition key
///
/// Every call performs exactly one logical store operation. Conditional
/// semantics are part of the contract: `insert` never overwrites and
/// `replace` never creates.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return every item in the table, optionally restricted by `filter`
    async fn scan(&self, table: &str, filter: Option<AttributeFilter>)
        -> RepositoryResult<Vec<Item>>;

    /// Look up the item stored under `id`
    async fn get(&self, table: &str, id: &str) -> RepositoryResult<Option<Item>>;

    /// Store a new item; fails with `Conflict` if the key is already taken
    async fn insert(&self, table: &str, item: Item) -> RepositoryResult<()>;

    /// Replace an existing item in full; returns `false` if no item has its key
    async fn replace(&self, table: &str, item: Item) -> RepositoryResult<bool>;

    /// Delete the item under `id`, returning its previous attributes
    async fn remove(&self, table: &str, id: &str) -> RepositoryResult<Option<Item>>;
}

/// Read the partition key of an item
pub fn item_id(item: &Item) -> Option<&str> {
    item.get(PARTITION_KEY)
        .and_then(|v| v.as_s().ok())
        .map(String::as_str)
}
