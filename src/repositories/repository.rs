use aws_sdk_dynamodb::types::AttributeValue;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::store::{AttributeFilter, DocumentStore, Item};
use crate::models::{RepositoryError, RepositoryResult};

/// A record type that can be persisted by [`Repository`]
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable type name, used in not-found messages
    const NAME: &'static str;

    /// Boolean attributes that may be used with `list_filtered`
    const FILTERABLE: &'static [&'static str] = &[];

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Convert the record to DynamoDB attribute values
    fn to_item(&self) -> Item;

    /// Convert a DynamoDB item back to the record
    fn from_item(item: Item) -> RepositoryResult<Self>;
}

/// CRUD access to one table holding one entity type
///
/// Identifier assignment is the repository's job: `create` always generates
/// a fresh id and `update` always keeps the id it was called with.
pub struct Repository<E: Entity> {
    store: Arc<dyn DocumentStore>,
    table_name: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            table_name: self.table_name.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn DocumentStore>, table_name: impl Into<String>) -> Self {
        Self {
            store,
            table_name: table_name.into(),
            _entity: PhantomData,
        }
    }

    fn not_found(id: &str) -> RepositoryError {
        RepositoryError::NotFound {
            entity: E::NAME,
            id: id.to_string(),
        }
    }

    fn decode_all(items: Vec<Item>) -> Vec<E> {
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match E::from_item(item) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Failed to parse {} item: {}", E::NAME, e);
                    continue;
                }
            }
        }
        records
    }

    /// Every record in the table, in no particular order
    #[instrument(skip(self), fields(entity = E::NAME, table = %self.table_name))]
    pub async fn list_all(&self) -> RepositoryResult<Vec<E>> {
        let items = self.store.scan(&self.table_name, None).await?;
        let records = Self::decode_all(items);

        info!("Found {} records", records.len());
        Ok(records)
    }

    /// Records whose boolean `filter.attribute` equals `filter.value`
    #[instrument(skip(self), fields(entity = E::NAME, table = %self.table_name, attribute = %filter.attribute, value = filter.value))]
    pub async fn list_filtered(&self, filter: AttributeFilter) -> RepositoryResult<Vec<E>> {
        if !E::FILTERABLE.contains(&filter.attribute.as_str()) {
            return Err(RepositoryError::InvalidQuery {
                message: format!("{} cannot be filtered by {}", E::NAME, filter.attribute),
            });
        }

        let items = self.store.scan(&self.table_name, Some(filter)).await?;
        let records = Self::decode_all(items);

        info!("Found {} matching records", records.len());
        Ok(records)
    }

    #[instrument(skip(self), fields(entity = E::NAME, table = %self.table_name, id = %id))]
    pub async fn get_by_id(&self, id: &str) -> RepositoryResult<E> {
        match self.store.get(&self.table_name, id).await? {
            Some(item) => E::from_item(item),
            None => {
                info!("Record not found");
                Err(Self::not_found(id))
            }
        }
    }

    /// Persist `input` under a newly generated id, ignoring any id it carries
    #[instrument(skip(self, input), fields(entity = E::NAME, table = %self.table_name))]
    pub async fn create(&self, mut input: E) -> RepositoryResult<E> {
        input.set_id(Uuid::new_v4().to_string());

        self.store.insert(&self.table_name, input.to_item()).await?;

        info!(id = %input.id(), "Record created");
        Ok(input)
    }

    /// Replace every attribute of the record at `id`; never creates a record
    #[instrument(skip(self, input), fields(entity = E::NAME, table = %self.table_name, id = %id))]
    pub async fn update(&self, id: &str, mut input: E) -> RepositoryResult<E> {
        input.set_id(id.to_string());

        if !self.store.replace(&self.table_name, input.to_item()).await? {
            info!("Update target does not exist");
            return Err(Self::not_found(id));
        }

        info!("Record updated");
        Ok(input)
    }

    /// Remove the record at `id` and return its last persisted state
    #[instrument(skip(self), fields(entity = E::NAME, table = %self.table_name, id = %id))]
    pub async fn delete(&self, id: &str) -> RepositoryResult<E> {
        match self.store.remove(&self.table_name, id).await? {
            Some(item) => {
                info!("Record deleted");
                E::from_item(item)
            }
            None => {
                info!("Delete target does not exist");
                Err(Self::not_found(id))
            }
        }
    }
}

// Attribute readers shared by the entity conversions

pub(crate) fn required_s(item: &Item, name: &str) -> RepositoryResult<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Missing {}", name),
        })
}

pub(crate) fn required_n(item: &Item, name: &str) -> RepositoryResult<String> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Invalid {}", name),
        })
}

pub(crate) fn required_bool(item: &Item, name: &str) -> RepositoryResult<bool> {
    item.get(name)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Invalid {}", name),
        })
}

pub(crate) fn s(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}
