use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Product;

/// Last observed availability for one product id. At most one record per
/// id; an absent record means the product was never checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusRecord {
    pub available: bool,
    pub last_checked: DateTime<Utc>,
}

/// Direction of an availability change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    BecameAvailable,
    BecameUnavailable,
}

/// Emitted when a product's availability differs from the stored record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionEvent {
    pub product: Product,
    /// Stored availability before this check; `None` on a cold start.
    pub previous: Option<bool>,
    pub transition: Transition,
    pub at: DateTime<Utc>,
}
