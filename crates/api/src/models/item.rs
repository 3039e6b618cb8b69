//! Listing domain model and payload shape.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tradepost_core::{Condition, ItemId, ItemStatus, Price, UserId};

/// A marketplace listing.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub seller_id: UserId,
    pub name: String,
    pub price: Price,
    pub description: String,
    /// 1-10 durable image URLs, in upload order.
    pub images: Vec<String>,
    pub category: String,
    pub sub_category: String,
    pub location: Option<String>,
    pub condition: Option<Condition>,
    pub status: ItemStatus,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether the listing counts as approved (derived from status).
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.status.is_approved()
    }
}

/// Fields required to create a listing. Status always starts at `PENDING`.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub seller_id: UserId,
    pub name: String,
    pub price: Price,
    pub description: String,
    pub images: Vec<String>,
    pub category: String,
    pub sub_category: String,
    pub location: Option<String>,
    pub condition: Option<Condition>,
}

/// Wire shape of a listing in JSON responses.
///
/// `isApproved` is derived from `status` at this boundary; it is not a stored
/// field, so the two can never disagree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub id: ItemId,
    pub seller_id: UserId,
    pub item_name: String,
    pub item_price: Price,
    pub item_description: String,
    pub item_images: Vec<String>,
    pub item_category: String,
    pub item_sub_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub is_approved: bool,
    pub status: ItemStatus,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Item> for ItemPayload {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            seller_id: item.seller_id,
            is_approved: item.status.is_approved(),
            item_name: item.name,
            item_price: item.price,
            item_description: item.description,
            item_images: item.images,
            item_category: item.category,
            item_sub_category: item.sub_category,
            location: item.location,
            condition: item.condition,
            status: item.status,
            views: item.views,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}
