use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::{EngagementEvent, ListingId, ListingRow, SellerId};

/// Signed-in seller as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerSession {
    pub seller_id: SellerId,
    pub email: Option<String>,
}

/// Record access for the listings table.
/// Writes are last-write-wins per record; nothing here locks.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert a new row; fails with `Conflict` if the id is taken
    async fn insert(&self, row: &ListingRow) -> Result<ListingRow, StoreError>;

    /// Replace the row with the same id; fails with `NotFound` if there is none
    async fn update(&self, row: &ListingRow) -> Result<ListingRow, StoreError>;

    async fn fetch(&self, id: ListingId) -> Result<Option<ListingRow>, StoreError>;

    /// Every non-deleted listing owned by the seller, most recently updated first
    async fn list_by_seller(&self, seller: &SellerId) -> Result<Vec<ListingRow>, StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Object storage for listing media and documents
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `bytes` at `path`, overwriting whatever was there
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    fn public_url(&self, path: &str) -> String;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_seller(&self) -> Result<Option<SellerSession>, StoreError>;
}

/// Buyer interactions feeding the seller dashboard
#[async_trait]
pub trait EngagementSource: Send + Sync {
    async fn events_for(&self, listings: &[ListingId]) -> Result<Vec<EngagementEvent>, StoreError>;
}
