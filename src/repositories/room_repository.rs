use aws_sdk_dynamodb::types::AttributeValue;
use std::str::FromStr;
use tracing::instrument;

use super::repository::{required_bool, required_s, s, Entity, Repository};
use super::store::{AttributeFilter, Item};
use crate::models::{RepositoryError, RepositoryResult, Room, RoomType};

/// Repository over the rooms table
pub type RoomRepository = Repository<Room>;

pub const IS_CLEANED: &str = "isCleaned";
pub const IS_FULL: &str = "isFull";

impl Entity for Room {
    const NAME: &'static str = "Room";
    const FILTERABLE: &'static [&'static str] = &[IS_CLEANED, IS_FULL];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn to_item(&self) -> Item {
        let mut item = Item::new();

        item.insert("id".to_string(), s(&self.id));
        item.insert("roomType".to_string(), s(&self.room_type.to_string()));
        item.insert(IS_FULL.to_string(), AttributeValue::Bool(self.is_full));
        item.insert(IS_CLEANED.to_string(), AttributeValue::Bool(self.is_cleaned));
        item.insert("description".to_string(), s(&self.description));

        item
    }

    fn from_item(item: Item) -> RepositoryResult<Self> {
        let room_type = required_s(&item, "roomType").and_then(|value| {
            RoomType::from_str(&value).map_err(|message| RepositoryError::InvalidItem { message })
        })?;

        Ok(Room {
            id: required_s(&item, "id")?,
            room_type,
            is_full: required_bool(&item, IS_FULL)?,
            is_cleaned: required_bool(&item, IS_CLEANED)?,
            description: required_s(&item, "description")?,
        })
    }
}

impl Repository<Room> {
    /// Rooms that have been cleaned
    #[instrument(skip(self))]
    pub async fn list_cleaned(&self) -> RepositoryResult<Vec<Room>> {
        self.list_filtered(AttributeFilter::equals(IS_CLEANED, true))
            .await
    }

    /// Rooms still waiting to be cleaned
    #[instrument(skip(self))]
    pub async fn list_dirty(&self) -> RepositoryResult<Vec<Room>> {
        self.list_filtered(AttributeFilter::equals(IS_CLEANED, false))
            .await
    }
}
