//! Back office for a real-estate deal marketplace: listing drafts, the publish wizard,
//! derived investor figures, uploads, auto-save, seller analytics and marketing sheets.

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod drafts;
pub mod error;
pub mod finance;
pub mod models;
pub mod notice;
pub mod sheet;
pub mod wizard;

pub use config::Config;
pub use drafts::{DraftService, SaveOutcome};
pub use error::{ConfigError, SaveError, StoreError, UploadError};
pub use models::{ListingDraft, ListingId, ListingRow, ListingStatus, SellerId};
pub use notice::{Notice, NoticeLevel};
