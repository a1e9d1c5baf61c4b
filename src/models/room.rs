use serde::{Deserialize, Serialize};

use super::RoomType;

/// A hotel room record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(default)]
    pub id: String,
    pub room_type: RoomType,
    pub is_full: bool,
    pub is_cleaned: bool,
    pub description: String,
}
