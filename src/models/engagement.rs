use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ListingId;

/// Kind of buyer interaction recorded against a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementKind {
    View,
    Save,
    Share,
    Inquiry,
    Offer,
}

/// Row of the `listing_events` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub listing_id: ListingId,
    pub buyer_id: String,
    pub kind: EngagementKind,
    pub occurred_at: DateTime<Utc>,
}
