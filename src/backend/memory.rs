use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use super::mock;
use super::traits::{EngagementSource, ListingStore, MediaStorage, SellerSession, SessionProvider};
use crate::error::StoreError;
use crate::models::{EngagementEvent, ListingId, ListingRow, SellerId};

const MEMORY_BUCKET_URL: &str = "memory://listing-media";

/// Object held by the in-memory storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process stand-in for the hosted backend, used offline and in tests
#[derive(Debug, Default)]
pub struct MemoryBackend {
    listings: RwLock<HashMap<ListingId, ListingRow>>,
    objects: RwLock<HashMap<String, StoredObject>>,
    events: RwLock<Vec<EngagementEvent>>,
    session: RwLock<Option<SellerSession>>,
    fail_writes: AtomicBool,
    failing_paths: RwLock<Vec<String>>,
    inserts: AtomicUsize,
    updates: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with a signed-in seller
    pub fn signed_in(seller: &str) -> Self {
        Self {
            session: RwLock::new(Some(SellerSession {
                seller_id: SellerId(seller.to_string()),
                email: None,
            })),
            ..Self::default()
        }
    }

    /// Offline backend seeded with demo listings, buyer activity and a signed-in
    /// demo seller
    pub fn with_mock_data(now: DateTime<Utc>) -> Self {
        let listings = mock::demo_listings(now);
        let events = mock::demo_events(&listings, now);
        let backend = Self::signed_in(mock::DEMO_SELLER);
        Self {
            listings: RwLock::new(listings.into_iter().map(|row| (row.id, row)).collect()),
            events: RwLock::new(events),
            ..backend
        }
    }

    pub async fn sign_in(&self, session: Option<SellerSession>) {
        *self.session.write().await = session;
    }

    /// Make every listing write fail until switched off again
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make uploads whose storage path contains `fragment` fail
    pub async fn fail_uploads_matching(&self, fragment: &str) {
        self.failing_paths.write().await.push(fragment.to_string());
    }

    pub async fn put_listing(&self, row: ListingRow) {
        self.listings.write().await.insert(row.id, row);
    }

    pub async fn record_events(&self, events: impl IntoIterator<Item = EngagementEvent>) {
        self.events.write().await.extend(events);
    }

    pub async fn listing_count(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects.read().await.get(path).cloned()
    }

    pub async fn object_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// (inserts, updates) issued so far
    pub fn write_counts(&self) -> (usize, usize) {
        (
            self.inserts.load(Ordering::SeqCst),
            self.updates.load(Ordering::SeqCst),
        )
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingStore for MemoryBackend {
    async fn insert(&self, row: &ListingRow) -> Result<ListingRow, StoreError> {
        self.check_writable()?;
        self.inserts.fetch_add(1, Ordering::SeqCst);

        let mut listings = self.listings.write().await;
        if listings.contains_key(&row.id) {
            return Err(StoreError::Conflict(row.id));
        }
        listings.insert(row.id, row.clone());
        debug!("Inserted listing {}", row.id);
        Ok(row.clone())
    }

    async fn update(&self, row: &ListingRow) -> Result<ListingRow, StoreError> {
        self.check_writable()?;
        self.updates.fetch_add(1, Ordering::SeqCst);

        let mut listings = self.listings.write().await;
        match listings.get_mut(&row.id) {
            Some(existing) => {
                *existing = row.clone();
                debug!("Updated listing {}", row.id);
                Ok(row.clone())
            }
            None => Err(StoreError::NotFound(row.id)),
        }
    }

    async fn fetch(&self, id: ListingId) -> Result<Option<ListingRow>, StoreError> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn list_by_seller(&self, seller: &SellerId) -> Result<Vec<ListingRow>, StoreError> {
        let mut rows: Vec<ListingRow> = self
            .listings
            .read()
            .await
            .values()
            .filter(|row| &row.seller_id == seller && !row.deleted)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl MediaStorage for MemoryBackend {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        if self
            .failing_paths
            .read()
            .await
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
        {
            return Err(StoreError::Unavailable(format!("storage rejected {}", path)));
        }

        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", MEMORY_BUCKET_URL, path)
    }
}

#[async_trait]
impl SessionProvider for MemoryBackend {
    async fn current_seller(&self) -> Result<Option<SellerSession>, StoreError> {
        Ok(self.session.read().await.clone())
    }
}

#[async_trait]
impl EngagementSource for MemoryBackend {
    async fn events_for(&self, listings: &[ListingId]) -> Result<Vec<EngagementEvent>, StoreError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|event| listings.contains(&event.listing_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingDraft, ListingStatus};

    fn row(seller: &str) -> ListingRow {
        ListingRow::from_draft(
            &ListingDraft::new(),
            ListingId::generate(),
            SellerId(seller.to_string()),
            ListingStatus::Draft,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_then_update() {
        let backend = MemoryBackend::new();
        let mut listing = row("seller-1");

        backend.insert(&listing).await.unwrap();
        assert!(matches!(backend.insert(&listing).await, Err(StoreError::Conflict(_))));

        listing.address = "12 Elm St".to_string();
        backend.update(&listing).await.unwrap();

        let stored = backend.fetch(listing.id).await.unwrap().unwrap();
        assert_eq!(stored.address, "12 Elm St");
        assert_eq!(backend.listing_count().await, 1);
        assert_eq!(backend.write_counts(), (2, 1));
    }

    #[tokio::test]
    async fn test_update_missing_row_fails() {
        let backend = MemoryBackend::new();
        let listing = row("seller-1");
        assert!(matches!(backend.update(&listing).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_seller_skips_deleted_and_others() {
        let backend = MemoryBackend::new();
        let mine = row("seller-1");
        let mut deleted = row("seller-1");
        deleted.deleted = true;
        let theirs = row("seller-2");
        for r in [mine.clone(), deleted, theirs] {
            backend.put_listing(r).await;
        }

        let rows = backend
            .list_by_seller(&SellerId("seller-1".to_string()))
            .await
            .unwrap();
        assert_eq!(rows, vec![mine]);
    }

    #[tokio::test]
    async fn test_mock_data_is_signed_in() {
        let backend = MemoryBackend::with_mock_data(Utc::now());
        let session = backend.current_seller().await.unwrap().unwrap();
        let rows = backend.list_by_seller(&session.seller_id).await.unwrap();
        assert_eq!(rows.len(), 4);

        let ids: Vec<ListingId> = rows.iter().map(|r| r.id).collect();
        assert!(!backend.events_for(&ids).await.unwrap().is_empty());
        assert!(backend.events_for(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MemoryBackend::signed_in("seller-1");
        backend.set_fail_writes(true);
        assert!(backend.insert(&row("seller-1")).await.is_err());

        backend.fail_uploads_matching("video").await;
        assert!(backend.upload("listings/x/video.mp4", vec![1], "video/mp4").await.is_err());
        backend.upload("listings/x/primary.jpg", vec![1], "image/jpeg").await.unwrap();
        assert_eq!(backend.object_paths().await, vec!["listings/x/primary.jpg".to_string()]);
        assert_eq!(
            backend.public_url("listings/x/primary.jpg"),
            "memory://listing-media/listings/x/primary.jpg"
        );
    }
}
