//! Trading party snapshots embedded in invoices.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Farmer (seller) as recorded on an invoice at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FarmerRef {
    #[validate(length(min = 1, message = "Farmer id cannot be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "Farmer name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub phone: String,
}

/// Buyer as recorded on an invoice at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BuyerRef {
    #[validate(length(min = 1, message = "Buyer id cannot be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "Buyer name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    pub location: String,
}
