//! Media upload orchestration for a listing save.
//!
//! Every upload runs concurrently and independently. A failure only affects its own
//! slot: it becomes an error notice and leaves that reference untouched.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::backend::MediaStorage;
use crate::error::UploadError;
use crate::models::{ListingDraft, ListingId, MediaRef};
use crate::notice::Notice;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
const VIDEO_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/webm"];
const DOCUMENT_TYPES: &[&str] = &["application/pdf"];

/// Where an uploaded file lands on the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MediaSlot {
    PrimaryImage,
    /// Position in the ordered gallery
    Gallery(usize),
    Video,
    PurchaseAgreement,
}

impl MediaSlot {
    pub fn accepts(self, content_type: &str) -> bool {
        match self {
            MediaSlot::PrimaryImage | MediaSlot::Gallery(_) => IMAGE_TYPES.contains(&content_type),
            MediaSlot::Video => VIDEO_TYPES.contains(&content_type),
            MediaSlot::PurchaseAgreement => {
                DOCUMENT_TYPES.contains(&content_type) || IMAGE_TYPES.contains(&content_type)
            }
        }
    }

    /// Deterministic object path, so re-saving overwrites the same asset
    pub fn storage_path(self, id: ListingId, extension: &str) -> String {
        match self {
            MediaSlot::PrimaryImage => format!("listings/{}/primary.{}", id, extension),
            MediaSlot::Gallery(pos) => format!("listings/{}/gallery/{:02}.{}", id, pos, extension),
            MediaSlot::Video => format!("listings/{}/video.{}", id, extension),
            MediaSlot::PurchaseAgreement => format!("listings/{}/agreement.{}", id, extension),
        }
    }
}

impl fmt::Display for MediaSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSlot::PrimaryImage => f.write_str("primary image"),
            MediaSlot::Gallery(pos) => write!(f, "gallery image {}", pos + 1),
            MediaSlot::Video => f.write_str("video"),
            MediaSlot::PurchaseAgreement => f.write_str("purchase agreement"),
        }
    }
}

/// File picked by the seller for one slot
#[derive(Debug, Clone)]
pub struct Upload {
    pub slot: MediaSlot,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(
        slot: MediaSlot,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            slot,
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its type from the extension
    pub async fn from_file(slot: MediaSlot, path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = content_type_for(&file_name).unwrap_or("application/octet-stream");
        Ok(Self::new(slot, file_name, content_type, bytes))
    }

    fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| default_extension(&self.content_type).to_string())
    }

    fn check(&self) -> Result<(), UploadError> {
        if !self.slot.accepts(&self.content_type) {
            return Err(UploadError::UnsupportedType {
                file: self.file_name.clone(),
                content_type: self.content_type.clone(),
                slot: self.slot.to_string(),
            });
        }
        if self.bytes.is_empty() {
            return Err(UploadError::Empty(self.file_name.clone()));
        }
        Ok(())
    }
}

pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(content_type)
}

fn default_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// Result of one slot's upload
#[derive(Debug)]
pub struct UploadOutcome {
    pub slot: MediaSlot,
    pub file_name: String,
    pub result: Result<MediaRef, UploadError>,
}

async fn upload_one(storage: &dyn MediaStorage, id: ListingId, upload: Upload) -> UploadOutcome {
    let slot = upload.slot;
    let file_name = upload.file_name.clone();

    let result = match upload.check() {
        Err(e) => Err(e),
        Ok(()) => {
            let path = slot.storage_path(id, &upload.extension());
            debug!("Uploading {} to {}", file_name, path);
            match storage.upload(&path, upload.bytes, &upload.content_type).await {
                Ok(()) => Ok(MediaRef {
                    url: storage.public_url(&path),
                    path,
                }),
                Err(source) => Err(UploadError::Storage {
                    file: file_name.clone(),
                    source,
                }),
            }
        }
    };

    UploadOutcome {
        slot,
        file_name,
        result,
    }
}

/// Renumber gallery uploads past the end of the gallery so they append in order and
/// their storage names match the position they end up at
pub fn normalize_gallery_positions(uploads: &mut [Upload], gallery_len: usize) {
    let mut appended: Vec<&mut Upload> = uploads
        .iter_mut()
        .filter(|u| matches!(u.slot, MediaSlot::Gallery(pos) if pos >= gallery_len))
        .collect();
    appended.sort_by_key(|u| u.slot);
    for (offset, upload) in appended.into_iter().enumerate() {
        upload.slot = MediaSlot::Gallery(gallery_len + offset);
    }
}

/// Issue all uploads at once and wait for every one of them
pub async fn upload_all(
    storage: &dyn MediaStorage,
    id: ListingId,
    uploads: Vec<Upload>,
) -> Vec<UploadOutcome> {
    if uploads.is_empty() {
        return Vec::new();
    }
    info!("Uploading {} files for listing {}", uploads.len(), id);
    join_all(uploads.into_iter().map(|u| upload_one(storage, id, u))).await
}

/// Record successful uploads on the draft and turn failures into notices
pub fn apply_outcomes(draft: &mut ListingDraft, mut outcomes: Vec<UploadOutcome>) -> Vec<Notice> {
    outcomes.sort_by_key(|o| o.slot);
    let mut notices = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(media) => match outcome.slot {
                MediaSlot::PrimaryImage => draft.primary_image = Some(media),
                MediaSlot::Gallery(pos) if pos < draft.gallery.len() => draft.gallery[pos] = media,
                MediaSlot::Gallery(_) => draft.gallery.push(media),
                MediaSlot::Video => draft.video = Some(media),
                MediaSlot::PurchaseAgreement => draft.purchase_agreement = Some(media),
            },
            Err(e) => {
                warn!("Upload of {} failed: {}", outcome.slot, e);
                notices.push(Notice::error(format!("Could not upload {}: {}", outcome.slot, e)));
            }
        }
    }

    notices
}
