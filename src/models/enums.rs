use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Room categories offered by the hotel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Triple,
    Couple,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [
        RoomType::Single,
        RoomType::Double,
        RoomType::Triple,
        RoomType::Couple,
    ];
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomType::Single => write!(f, "single"),
            RoomType::Double => write!(f, "double"),
            RoomType::Triple => write!(f, "triple"),
            RoomType::Couple => write!(f, "couple"),
        }
    }
}

impl FromStr for RoomType {
    type Err = String;

    // Stored values are written by `Display`, so matching is exact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(RoomType::Single),
            "double" => Ok(RoomType::Double),
            "triple" => Ok(RoomType::Triple),
            "couple" => Ok(RoomType::Couple),
            _ => Err(format!("Invalid room type: {}", s)),
        }
    }
}
