//! Seller dashboard: buyer engagement per listing and across the portfolio.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{EngagementSource, ListingStore};
use crate::error::StoreError;
use crate::models::{EngagementEvent, EngagementKind, ListingId, ListingRow, ListingStatus, SellerId};

/// Longest trailing window of daily views, about ten years
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Engagement figures for one listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEngagement {
    pub listing_id: ListingId,
    pub address: String,
    pub status: ListingStatus,
    pub views: u32,
    pub unique_buyers: u32,
    pub saves: u32,
    pub shares: u32,
    pub inquiries: u32,
    pub offers: u32,
    /// Offers per hundred views
    pub offer_conversion: Option<f64>,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardTotals {
    pub listings: u32,
    pub published: u32,
    pub drafts: u32,
    pub views: u32,
    pub saves: u32,
    pub shares: u32,
    pub inquiries: u32,
    pub offers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyViews {
    pub date: NaiveDate,
    pub views: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerDashboard {
    pub generated_at: DateTime<Utc>,
    pub totals: DashboardTotals,
    /// Most viewed first
    pub listings: Vec<ListingEngagement>,
    /// Oldest day first
    pub daily_views: Vec<DailyViews>,
}

impl SellerDashboard {
    pub fn top(&self, n: usize) -> &[ListingEngagement] {
        &self.listings[..n.min(self.listings.len())]
    }
}

#[derive(Default)]
struct Tally {
    views: u32,
    saves: u32,
    shares: u32,
    inquiries: u32,
    offers: u32,
    buyers: HashSet<String>,
    last_activity: Option<DateTime<Utc>>,
}

impl Tally {
    fn record(&mut self, event: &EngagementEvent) {
        match event.kind {
            EngagementKind::View => self.views += 1,
            EngagementKind::Save => self.saves += 1,
            EngagementKind::Share => self.shares += 1,
            EngagementKind::Inquiry => self.inquiries += 1,
            EngagementKind::Offer => self.offers += 1,
        }
        self.buyers.insert(event.buyer_id.clone());
        self.last_activity = self.last_activity.max(Some(event.occurred_at));
    }
}

/// Aggregate events over the seller's listings. Soft-deleted listings and events for
/// listings not in `listings` are ignored. The daily window is capped at
/// [`MAX_WINDOW_DAYS`].
pub fn build_dashboard(
    listings: &[ListingRow],
    events: &[EngagementEvent],
    now: DateTime<Utc>,
    window_days: u32,
) -> SellerDashboard {
    let live: Vec<&ListingRow> = listings.iter().filter(|l| !l.deleted).collect();
    let mut tallies: HashMap<ListingId, Tally> =
        live.iter().map(|l| (l.id, Tally::default())).collect();

    let today = now.date_naive();
    let mut daily: BTreeMap<NaiveDate, u32> = (0..window_days.min(MAX_WINDOW_DAYS))
        .filter_map(|back| today.checked_sub_signed(Duration::days(i64::from(back))))
        .map(|day| (day, 0))
        .collect();

    for event in events {
        let Some(tally) = tallies.get_mut(&event.listing_id) else {
            continue;
        };
        tally.record(event);
        if event.kind == EngagementKind::View {
            if let Some(count) = daily.get_mut(&event.occurred_at.date_naive()) {
                *count += 1;
            }
        }
    }

    let mut totals = DashboardTotals::default();
    let mut rows: Vec<ListingEngagement> = live
        .iter()
        .map(|listing| {
            let tally = tallies.remove(&listing.id).unwrap_or_default();

            totals.listings += 1;
            match listing.status {
                ListingStatus::Published => totals.published += 1,
                ListingStatus::Draft => totals.drafts += 1,
            }
            totals.views += tally.views;
            totals.saves += tally.saves;
            totals.shares += tally.shares;
            totals.inquiries += tally.inquiries;
            totals.offers += tally.offers;

            ListingEngagement {
                listing_id: listing.id,
                address: listing.address.clone(),
                status: listing.status,
                views: tally.views,
                unique_buyers: tally.buyers.len() as u32,
                saves: tally.saves,
                shares: tally.shares,
                inquiries: tally.inquiries,
                offers: tally.offers,
                offer_conversion: (tally.views > 0)
                    .then(|| f64::from(tally.offers) / f64::from(tally.views) * 100.0),
                last_activity: tally.last_activity,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.views
            .cmp(&a.views)
            .then(b.inquiries.cmp(&a.inquiries))
            .then_with(|| a.address.cmp(&b.address))
    });

    SellerDashboard {
        generated_at: now,
        totals,
        listings: rows,
        daily_views: daily
            .into_iter()
            .map(|(date, views)| DailyViews { date, views })
            .collect(),
    }
}

/// Reads a seller's listings and their buyer activity through the backend
pub struct DashboardService {
    listings: Arc<dyn ListingStore>,
    events: Arc<dyn EngagementSource>,
}

impl DashboardService {
    pub fn new(listings: Arc<dyn ListingStore>, events: Arc<dyn EngagementSource>) -> Self {
        Self { listings, events }
    }

    pub async fn for_seller(
        &self,
        seller: &SellerId,
        window_days: u32,
    ) -> Result<SellerDashboard, StoreError> {
        let listings = self.listings.list_by_seller(seller).await?;
        let ids: Vec<ListingId> = listings.iter().map(|l| l.id).collect();
        debug!("Loading engagement for {} listings", ids.len());

        let events = self.events.events_for(&ids).await?;
        let dashboard = build_dashboard(&listings, &events, Utc::now(), window_days);
        info!(
            "Dashboard for {}: {} listings, {} views",
            seller, dashboard.totals.listings, dashboard.totals.views
        );
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::ListingDraft;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 15, 0, 0).unwrap()
    }

    fn listing(address: &str, status: ListingStatus) -> ListingRow {
        let mut draft = ListingDraft::new();
        draft.address = address.to_string();
        ListingRow::from_draft(
            &draft,
            ListingId::generate(),
            SellerId("seller-1".to_string()),
            status,
            now(),
        )
    }

    fn event(listing: &ListingRow, buyer: &str, kind: EngagementKind, days_ago: i64) -> EngagementEvent {
        EngagementEvent {
            listing_id: listing.id,
            buyer_id: buyer.to_string(),
            kind,
            occurred_at: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_per_listing_figures() {
        let a = listing("12 Elm St", ListingStatus::Published);
        let b = listing("9 Oak Ave", ListingStatus::Published);
        let events = vec![
            event(&a, "buyer-1", EngagementKind::View, 0),
            event(&a, "buyer-1", EngagementKind::View, 1),
            event(&a, "buyer-2", EngagementKind::View, 2),
            event(&a, "buyer-2", EngagementKind::View, 3),
            event(&a, "buyer-2", EngagementKind::Offer, 0),
            event(&b, "buyer-3", EngagementKind::View, 0),
            event(&b, "buyer-3", EngagementKind::Inquiry, 5),
        ];

        let dashboard = build_dashboard(&[b.clone(), a.clone()], &events, now(), 7);
        let top = &dashboard.listings[0];
        assert_eq!(top.listing_id, a.id);
        assert_eq!(top.views, 4);
        assert_eq!(top.unique_buyers, 2);
        assert_eq!(top.offers, 1);
        assert_eq!(top.offer_conversion, Some(25.0));
        assert_eq!(top.last_activity, Some(now()));

        let second = &dashboard.listings[1];
        assert_eq!(second.inquiries, 1);
        assert_eq!(second.last_activity, Some(now()));
    }

    #[test]
    fn test_totals_skip_deleted_and_foreign_events() {
        let published = listing("12 Elm St", ListingStatus::Published);
        let draft = listing("9 Oak Ave", ListingStatus::Draft);
        let mut deleted = listing("1 Gone Rd", ListingStatus::Published);
        deleted.deleted = true;
        let stranger = listing("77 Other St", ListingStatus::Published);

        let events = vec![
            event(&published, "b1", EngagementKind::View, 0),
            event(&published, "b1", EngagementKind::Save, 0),
            event(&deleted, "b1", EngagementKind::View, 0),
            event(&stranger, "b1", EngagementKind::View, 0),
        ];

        let dashboard = build_dashboard(&[published, draft, deleted], &events, now(), 7);
        assert_eq!(
            dashboard.totals,
            DashboardTotals {
                listings: 2,
                published: 1,
                drafts: 1,
                views: 1,
                saves: 1,
                ..DashboardTotals::default()
            }
        );
        assert_eq!(dashboard.listings[1].offer_conversion, None);
    }

    #[test]
    fn test_daily_views_are_zero_filled() {
        let a = listing("12 Elm St", ListingStatus::Published);
        let events = vec![
            event(&a, "b1", EngagementKind::View, 0),
            event(&a, "b2", EngagementKind::View, 0),
            event(&a, "b1", EngagementKind::View, 2),
            event(&a, "b1", EngagementKind::Save, 2),
            event(&a, "b1", EngagementKind::View, 10),
        ];

        let dashboard = build_dashboard(&[a], &events, now(), 3);
        let views: Vec<u32> = dashboard.daily_views.iter().map(|d| d.views).collect();
        assert_eq!(views, vec![1, 0, 2]);
        assert_eq!(
            dashboard.daily_views[0].date,
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
        );
        assert_eq!(dashboard.totals.views, 4);
    }

    #[test]
    fn test_window_bounds() {
        let a = listing("12 Elm St", ListingStatus::Published);
        let events = vec![event(&a, "b1", EngagementKind::View, 0)];

        let empty = build_dashboard(&[a.clone()], &events, now(), 0);
        assert!(empty.daily_views.is_empty());
        assert_eq!(empty.totals.views, 1);

        let huge = build_dashboard(&[a], &events, now(), 200_000_000);
        assert_eq!(huge.daily_views.len(), MAX_WINDOW_DAYS as usize);
        assert_eq!(huge.daily_views.last().unwrap().date, now().date_naive());
        assert_eq!(huge.daily_views.last().unwrap().views, 1);

        let from_nothing = build_dashboard(&[], &[], now(), u32::MAX);
        assert_eq!(from_nothing.daily_views.len(), MAX_WINDOW_DAYS as usize);
    }

    #[test]
    fn test_ties_break_on_inquiries_then_address() {
        let a = listing("B Street", ListingStatus::Published);
        let b = listing("A Street", ListingStatus::Published);
        let c = listing("C Street", ListingStatus::Published);
        let events = vec![event(&c, "b1", EngagementKind::Inquiry, 0)];

        let dashboard = build_dashboard(&[a, b, c], &events, now(), 1);
        let order: Vec<&str> = dashboard.listings.iter().map(|l| l.address.as_str()).collect();
        assert_eq!(order, vec!["C Street", "A Street", "B Street"]);
        assert_eq!(dashboard.top(2).len(), 2);
        assert_eq!(dashboard.top(10).len(), 3);
    }

    #[tokio::test]
    async fn test_service_reads_through_backend() {
        let backend = Arc::new(MemoryBackend::with_mock_data(Utc::now()));
        let service = DashboardService::new(backend.clone(), backend);

        let dashboard = service
            .for_seller(&SellerId("demo-seller".to_string()), 14)
            .await
            .unwrap();
        assert_eq!(dashboard.totals.listings, 4);
        assert_eq!(dashboard.totals.drafts, 1);
        assert!(dashboard.totals.views > 0);
        assert_eq!(dashboard.daily_views.len(), 14);
    }
}
