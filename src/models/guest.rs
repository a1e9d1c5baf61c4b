use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A hotel guest record
///
/// `id` is assigned by the repository on creation; any value supplied by a
/// caller is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    #[serde(default)]
    pub id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_mobile: String,
    pub guest_birth_date: String,
    pub guest_address: String,
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}
