pub mod autosave;
pub mod uploads;

pub use autosave::{spawn_autosave, AutosaveHandle};
pub use uploads::{MediaSlot, Upload};

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backend::{ListingStore, MediaStorage, SellerSession, SessionProvider};
use crate::error::{SaveError, StoreError};
use crate::models::{ListingDraft, ListingId, ListingRow, ListingStatus, SellerId};
use crate::notice::Notice;
use crate::wizard::{check_completeness, Completeness};

/// What a successful save produced
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub id: ListingId,
    pub status: ListingStatus,
    pub notices: Vec<Notice>,
}

/// Save, publish, load and delete listings against the remote store
pub struct DraftService {
    listings: Arc<dyn ListingStore>,
    media: Arc<dyn MediaStorage>,
    sessions: Arc<dyn SessionProvider>,
}

impl DraftService {
    pub fn new(
        listings: Arc<dyn ListingStore>,
        media: Arc<dyn MediaStorage>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            listings,
            media,
            sessions,
        }
    }

    /// Use one backend for records, media and sessions
    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: ListingStore + MediaStorage + SessionProvider + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend)
    }

    /// Save the draft, uploading any new files first.
    ///
    /// The first save assigns the listing id; later saves reuse it so the same record
    /// is updated. On failure the draft keeps everything applied so far (id, uploaded
    /// media) and can simply be saved again.
    pub async fn save(
        &self,
        draft: &mut ListingDraft,
        uploads: Vec<Upload>,
    ) -> Result<SaveOutcome, SaveError> {
        self.save_with_check(draft, uploads).await.map(|(outcome, _)| outcome)
    }

    /// Turn draft mode off and save. An incomplete listing is still saved, as a draft,
    /// and reported as `Incomplete`.
    pub async fn publish(
        &self,
        draft: &mut ListingDraft,
        uploads: Vec<Upload>,
    ) -> Result<SaveOutcome, SaveError> {
        draft.is_draft = false;
        let (outcome, completeness) = self.save_with_check(draft, uploads).await?;
        if outcome.status == ListingStatus::Draft {
            return Err(SaveError::Incomplete {
                missing: completeness.missing(),
            });
        }
        Ok(outcome)
    }

    async fn save_with_check(
        &self,
        draft: &mut ListingDraft,
        uploads: Vec<Upload>,
    ) -> Result<(SaveOutcome, Completeness), SaveError> {
        let session = self.require_session().await?;
        if let (Some(owner), Some(id)) = (&draft.seller_id, draft.id) {
            if owner != &session.seller_id {
                return Err(SaveError::NotOwner(id));
            }
        }
        // The draft's own seller field can be missing or edited, so the stored row decides
        if let Some(id) = draft.id {
            self.ensure_not_foreign(id, &session.seller_id).await?;
        }

        let id = *draft.id.get_or_insert_with(ListingId::generate);
        info!("Saving listing {} ({} uploads)", id, uploads.len());

        let mut uploads = uploads;
        uploads::normalize_gallery_positions(&mut uploads, draft.gallery.len());
        let outcomes = uploads::upload_all(self.media.as_ref(), id, uploads).await;
        let mut notices = uploads::apply_outcomes(draft, outcomes);
        draft.recompute_derived();

        let now = Utc::now();
        let completeness = check_completeness(draft, now.date_naive());
        let status = if draft.is_draft {
            ListingStatus::Draft
        } else if completeness.is_complete() {
            ListingStatus::Published
        } else {
            draft.is_draft = true;
            notices.push(Notice::warning(format!(
                "Saved as a draft until the following are added: {}",
                completeness.missing().join(", ")
            )));
            ListingStatus::Draft
        };

        let row = ListingRow::from_draft(draft, id, session.seller_id.clone(), status, now);
        let persisted = draft.created_at.is_some();
        let saved = match self.write(&row, &session.seller_id, persisted).await {
            Ok(saved) => saved,
            Err(e) => {
                error!("Failed to save listing {}: {}", id, e);
                return Err(e);
            }
        };

        draft.seller_id = Some(session.seller_id);
        draft.published = status == ListingStatus::Published;
        draft.created_at = Some(saved.created_at);
        draft.updated_at = Some(saved.updated_at);

        notices.push(match status {
            ListingStatus::Draft => Notice::success("Draft saved"),
            ListingStatus::Published => Notice::success("Listing published"),
        });
        info!("Saved listing {} as {:?}", id, status);

        Ok((
            SaveOutcome {
                id,
                status,
                notices,
            },
            completeness,
        ))
    }

    /// Write keyed by id: insert first for never-persisted drafts, update first otherwise.
    /// An update never lands on a row owned by another seller.
    async fn write(
        &self,
        row: &ListingRow,
        seller: &SellerId,
        persisted: bool,
    ) -> Result<ListingRow, SaveError> {
        let result = if persisted {
            self.ensure_not_foreign(row.id, seller).await?;
            match self.listings.update(row).await {
                Err(StoreError::NotFound(_)) => {
                    warn!("Listing {} vanished, inserting it again", row.id);
                    self.listings.insert(row).await
                }
                other => other,
            }
        } else {
            match self.listings.insert(row).await {
                Err(StoreError::Conflict(_)) => {
                    self.ensure_not_foreign(row.id, seller).await?;
                    self.listings.update(row).await
                }
                other => other,
            }
        };
        result.map_err(SaveError::Write)
    }

    /// Fails with `NotOwner` when a stored row with this id belongs to someone else
    async fn ensure_not_foreign(&self, id: ListingId, seller: &SellerId) -> Result<(), SaveError> {
        match self.listings.fetch(id).await.map_err(SaveError::Write)? {
            Some(row) if &row.seller_id != seller => {
                warn!("Refusing to overwrite listing {} owned by {}", id, row.seller_id);
                Err(SaveError::NotOwner(id))
            }
            _ => Ok(()),
        }
    }

    /// Load a listing into the property editor
    pub async fn load(&self, id: ListingId) -> Result<ListingDraft, SaveError> {
        let row = self.owned_row(id).await?;
        if row.deleted {
            return Err(SaveError::Deleted(id));
        }
        Ok(row.into_draft())
    }

    /// Hide a listing. Rows are never removed.
    pub async fn soft_delete(&self, id: ListingId) -> Result<(), SaveError> {
        let mut row = self.owned_row(id).await?;
        if row.deleted {
            return Ok(());
        }
        row.deleted = true;
        row.updated_at = Utc::now();
        self.listings.update(&row).await.map_err(SaveError::Write)?;
        info!("Soft-deleted listing {}", id);
        Ok(())
    }

    async fn owned_row(&self, id: ListingId) -> Result<ListingRow, SaveError> {
        let session = self.require_session().await?;
        let row = self
            .listings
            .fetch(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        if row.seller_id != session.seller_id {
            return Err(SaveError::NotOwner(id));
        }
        Ok(row)
    }

    async fn require_session(&self) -> Result<SellerSession, SaveError> {
        self.sessions
            .current_seller()
            .await?
            .ok_or(SaveError::NotSignedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::{AccessType, Expense, Frequency};
    use chrono::NaiveDate;

    fn service(backend: &Arc<MemoryBackend>) -> DraftService {
        DraftService::with_backend(backend.clone())
    }

    fn jpeg(slot: MediaSlot, name: &str) -> Upload {
        Upload::new(slot, name, "image/jpeg", vec![0xFF, 0xD8])
    }

    fn filled_draft() -> ListingDraft {
        let mut draft = ListingDraft::new();
        draft.address = "2105 E Cesar Chavez St".to_string();
        draft.city = "Austin".to_string();
        draft.state = "TX".to_string();
        draft.zip_code = "78702".to_string();
        draft.property_type = "Single Family".to_string();
        draft.bedrooms = "2".to_string();
        draft.bathrooms = "1".to_string();
        draft.square_footage = "1100".to_string();
        draft.description = "Original 1945 bungalow with character.".to_string();
        draft.purchase_price = "$380,000".to_string();
        draft.listing_price = "$402,500".to_string();
        draft.expenses = vec![Expense::new("Tax", "$1,200", Frequency::Annually)];
        draft.access_type = Some(AccessType::Lockbox);
        draft.closing_date = NaiveDate::from_ymd_opt(2099, 1, 1);
        draft
    }

    fn all_files() -> Vec<Upload> {
        vec![
            jpeg(MediaSlot::PrimaryImage, "front.jpg"),
            jpeg(MediaSlot::Gallery(0), "kitchen.jpg"),
            Upload::new(MediaSlot::PurchaseAgreement, "contract.pdf", "application/pdf", vec![1]),
        ]
    }

    #[tokio::test]
    async fn test_requires_signed_in_seller() {
        let backend = Arc::new(MemoryBackend::new());
        let mut draft = filled_draft();
        let result = service(&backend).save(&mut draft, Vec::new()).await;
        assert!(matches!(result, Err(SaveError::NotSignedIn)));
        assert_eq!(backend.listing_count().await, 0);
    }

    #[tokio::test]
    async fn test_repeated_saves_update_one_record() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = service(&backend);
        let mut draft = filled_draft();

        let first = service.save(&mut draft, Vec::new()).await.unwrap();
        let second = service.save(&mut draft, Vec::new()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(draft.id, Some(first.id));
        assert_eq!(backend.listing_count().await, 1);
        assert_eq!(backend.write_counts(), (1, 1));

        let row = backend.fetch(first.id).await.unwrap().unwrap();
        assert_eq!(row.status, ListingStatus::Draft);
        assert_eq!(row.assignment_fee, Some(22_500.0));
        assert_eq!(row.annual_expenses, 1_200.0);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_state_for_retry() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = service(&backend);
        let mut draft = filled_draft();

        backend.set_fail_writes(true);
        let result = service.save(&mut draft, vec![jpeg(MediaSlot::PrimaryImage, "front.jpg")]).await;
        assert!(matches!(result, Err(SaveError::Write(_))));

        let id = draft.id.expect("id assigned before the write");
        assert!(draft.primary_image.is_some());
        assert_eq!(draft.address, "2105 E Cesar Chavez St");
        assert_eq!(backend.listing_count().await, 0);

        backend.set_fail_writes(false);
        let outcome = service.save(&mut draft, Vec::new()).await.unwrap();
        assert_eq!(outcome.id, id);
        assert_eq!(backend.listing_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_upload_still_saves() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        backend.fail_uploads_matching("gallery").await;
        let mut draft = filled_draft();

        let outcome = service(&backend).save(&mut draft, all_files()).await.unwrap();

        assert_eq!(backend.listing_count().await, 1);
        assert!(draft.gallery.is_empty());
        assert!(draft.primary_image.is_some());
        assert!(outcome.notices.iter().any(|n| n.is_error()));
        assert!(outcome.notices.last().unwrap().message.contains("saved"));
    }

    #[tokio::test]
    async fn test_publish_complete_listing() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let mut draft = filled_draft();

        let outcome = service(&backend).publish(&mut draft, all_files()).await.unwrap();
        assert_eq!(outcome.status, ListingStatus::Published);
        assert!(!draft.is_draft);

        let row = backend.fetch(outcome.id).await.unwrap().unwrap();
        assert!(row.is_published());
        assert_eq!(row.gallery.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_without_gallery_stays_draft() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let mut draft = filled_draft();
        let files = vec![
            jpeg(MediaSlot::PrimaryImage, "front.jpg"),
            Upload::new(MediaSlot::PurchaseAgreement, "contract.pdf", "application/pdf", vec![1]),
        ];

        let result = service(&backend).publish(&mut draft, files).await;
        match result {
            Err(SaveError::Incomplete { missing }) => {
                assert_eq!(missing, vec!["at least one gallery image".to_string()]);
            }
            other => panic!("expected incomplete, got {:?}", other),
        }
        assert!(draft.is_draft);

        let row = backend.fetch(draft.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(row.status, ListingStatus::Draft);
    }

    #[tokio::test]
    async fn test_load_and_soft_delete() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = service(&backend);
        let mut draft = filled_draft();
        let outcome = service.save(&mut draft, Vec::new()).await.unwrap();

        let loaded = service.load(outcome.id).await.unwrap();
        assert_eq!(loaded.address, draft.address);
        assert_eq!(loaded.purchase_price, "380000");
        assert_eq!(loaded.assignment_fee, Some(22_500.0));

        service.soft_delete(outcome.id).await.unwrap();
        assert!(matches!(service.load(outcome.id).await, Err(SaveError::Deleted(_))));

        let row = backend.fetch(outcome.id).await.unwrap().unwrap();
        assert!(row.deleted);
        assert_eq!(backend.listing_count().await, 1);
    }

    #[tokio::test]
    async fn test_other_sellers_cannot_edit() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = service(&backend);
        let mut draft = filled_draft();
        let outcome = service.save(&mut draft, Vec::new()).await.unwrap();

        backend
            .sign_in(Some(SellerSession {
                seller_id: crate::models::SellerId("seller-2".to_string()),
                email: None,
            }))
            .await;

        assert!(matches!(service.load(outcome.id).await, Err(SaveError::NotOwner(_))));
        assert!(matches!(service.soft_delete(outcome.id).await, Err(SaveError::NotOwner(_))));
        assert!(matches!(
            service.save(&mut draft, Vec::new()).await,
            Err(SaveError::NotOwner(_))
        ));
    }

    #[tokio::test]
    async fn test_foreign_id_without_seller_is_rejected() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = service(&backend);
        let mut original = filled_draft();
        let outcome = service.save(&mut original, Vec::new()).await.unwrap();

        backend
            .sign_in(Some(SellerSession {
                seller_id: crate::models::SellerId("seller-2".to_string()),
                email: None,
            }))
            .await;

        let mut copied = ListingDraft::new();
        copied.id = Some(outcome.id);
        copied.address = "overwritten by seller-2".to_string();
        assert!(copied.seller_id.is_none());

        let result = service
            .save(&mut copied, vec![jpeg(MediaSlot::PrimaryImage, "front.jpg")])
            .await;
        assert!(matches!(result, Err(SaveError::NotOwner(id)) if id == outcome.id));

        let row = backend.fetch(outcome.id).await.unwrap().unwrap();
        assert_eq!(row.seller_id.0, "seller-1");
        assert_eq!(row.address, "2105 E Cesar Chavez St");
        assert!(backend.object_paths().await.is_empty());
        assert_eq!(backend.write_counts(), (1, 0));
    }

    #[tokio::test]
    async fn test_published_listing_stays_live_after_closing_date() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let service = service(&backend);
        let mut draft = filled_draft();
        service.publish(&mut draft, all_files()).await.unwrap();
        assert!(draft.published);

        draft.closing_date = NaiveDate::from_ymd_opt(2020, 6, 1);
        draft.description = "Price improvement.".to_string();
        let outcome = service.save(&mut draft, Vec::new()).await.unwrap();

        assert_eq!(outcome.status, ListingStatus::Published);
        assert!(!draft.is_draft);
        assert!(service.load(outcome.id).await.unwrap().published);
    }

    #[tokio::test]
    async fn test_appended_gallery_paths_match_positions() {
        let backend = Arc::new(MemoryBackend::signed_in("seller-1"));
        let mut draft = filled_draft();
        let outcome = service(&backend)
            .save(&mut draft, vec![jpeg(MediaSlot::Gallery(7), "porch.jpg")])
            .await
            .unwrap();

        assert_eq!(draft.gallery.len(), 1);
        assert_eq!(draft.gallery[0].path, format!("listings/{}/gallery/00.jpg", outcome.id));
        let stored = backend.object(&draft.gallery[0].path).await.unwrap();
        assert_eq!(stored.content_type, "image/jpeg");
    }
}
