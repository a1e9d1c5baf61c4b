use aws_sdk_dynamodb::types::AttributeValue;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::repository::{required_n, required_s, s, Entity, Repository};
use super::store::Item;
use crate::models::{Guest, RepositoryError, RepositoryResult};

/// Repository over the guests table
pub type GuestRepository = Repository<Guest>;

impl Entity for Guest {
    const NAME: &'static str = "Guest";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn to_item(&self) -> Item {
        let mut item = Item::new();

        item.insert("id".to_string(), s(&self.id));
        item.insert("guestName".to_string(), s(&self.guest_name));
        item.insert("guestEmail".to_string(), s(&self.guest_email));
        item.insert("guestMobile".to_string(), s(&self.guest_mobile));
        item.insert("guestBirthDate".to_string(), s(&self.guest_birth_date));
        item.insert("guestAddress".to_string(), s(&self.guest_address));
        item.insert("code".to_string(), s(&self.code));
        item.insert(
            "price".to_string(),
            AttributeValue::N(self.price.normalize().to_string()),
        );

        item
    }

    fn from_item(item: Item) -> RepositoryResult<Self> {
        let price = required_n(&item, "price").and_then(|n| {
            Decimal::from_str(&n).map_err(|_| RepositoryError::InvalidItem {
                message: "Invalid price".to_string(),
            })
        })?;

        Ok(Guest {
            id: required_s(&item, "id")?,
            guest_name: required_s(&item, "guestName")?,
            guest_email: required_s(&item, "guestEmail")?,
            guest_mobile: required_s(&item, "guestMobile")?,
            guest_birth_date: required_s(&item, "guestBirthDate")?,
            guest_address: required_s(&item, "guestAddress")?,
            code: required_s(&item, "code")?,
            price,
        })
    }
}
