use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AccessType, EngagementEvent, EngagementKind, Expense, Frequency, ListingDraft, ListingId,
    ListingRow, ListingStatus, MediaRef, RentUnit, Repair, SellerId,
};

pub const DEMO_SELLER: &str = "demo-seller";

/// Days of buyer activity generated for the demo listings
const DEMO_HISTORY_DAYS: i64 = 30;

fn demo_media(id: ListingId, name: &str) -> MediaRef {
    let path = format!("listings/{}/{}", id, name);
    MediaRef {
        url: format!("memory://listing-media/{}", path),
        path,
    }
}

/// Demo listings for offline use: three published deals and one draft
pub fn demo_listings(now: DateTime<Utc>) -> Vec<ListingRow> {
    info!("📋 Generating demo listings for {}", DEMO_SELLER);

    let specs = [
        ("1247 Oak Valley Dr", "78704", "Single Family", "4", "3", "2450", "$520,000", "$545,000", "$685,000", ListingStatus::Published),
        ("900 E 51st St", "78751", "Multi-Family", "4", "2", "1800", "$540,000", "$575,000", "$620,000", ListingStatus::Published),
        ("2105 E Cesar Chavez St", "78702", "Single Family", "2", "1", "1100", "$380,000", "$402,500", "$495,000", ListingStatus::Published),
        ("4510 Balcones Dr", "78731", "Single Family", "3", "2", "2100", "$700,000", "", "", ListingStatus::Draft),
    ];

    specs
        .iter()
        .enumerate()
        .map(
            |(i, (address, zip, kind, beds, baths, sqft, purchase, listing, arv, status))| {
                let id = ListingId(Uuid::from_u128(0x1157_0000 + i as u128 + 1));
                let mut draft = ListingDraft::new();
                draft.address = address.to_string();
                draft.city = "Austin".to_string();
                draft.state = "TX".to_string();
                draft.zip_code = zip.to_string();
                draft.property_type = kind.to_string();
                draft.bedrooms = beds.to_string();
                draft.bathrooms = baths.to_string();
                draft.square_footage = sqft.to_string();
                draft.description = format!("{} in Austin. Priced for investors.", kind);
                draft.purchase_price = purchase.to_string();
                draft.listing_price = listing.to_string();
                draft.arv = arv.to_string();
                draft.expenses = vec![
                    Expense::new("Property Tax", "$9,600", Frequency::Annually),
                    Expense::new("Insurance", "$1,800", Frequency::Annually),
                ];
                draft.repairs = vec![Repair::new("Roof", "$12,000"), Repair::new("Paint", "$4,500")];
                if *kind == "Multi-Family" {
                    draft.rent_roll = vec![RentUnit::new("A", "$2,100"), RentUnit::new("B", "$2,100")];
                }
                if *status == ListingStatus::Published {
                    draft.primary_image = Some(demo_media(id, "primary.jpg"));
                    draft.gallery = vec![demo_media(id, "gallery/01.jpg"), demo_media(id, "gallery/02.jpg")];
                    draft.access_type = Some(AccessType::Lockbox);
                    draft.closing_date = NaiveDate::from_ymd_opt(2030, 1, 15);
                    draft.purchase_agreement = Some(demo_media(id, "agreement.pdf"));
                }
                draft.recompute_derived();

                let created = now - Duration::days(DEMO_HISTORY_DAYS + i as i64);
                draft.created_at = Some(created);
                let mut row = ListingRow::from_draft(
                    &draft,
                    id,
                    SellerId(DEMO_SELLER.to_string()),
                    *status,
                    now - Duration::days(i as i64),
                );
                row.created_at = created;
                row
            },
        )
        .collect()
}

/// Deterministic buyer activity for the published demo listings
pub fn demo_events(listings: &[ListingRow], now: DateTime<Utc>) -> Vec<EngagementEvent> {
    let mut events = Vec::new();

    for (i, listing) in listings.iter().filter(|l| l.is_published()).enumerate() {
        for day in 0..DEMO_HISTORY_DAYS {
            let at = now - Duration::days(day) - Duration::hours(i as i64 + 1);
            let views = (i as i64 * 3 + day * 7) % 6 + 1;

            for v in 0..views {
                events.push(EngagementEvent {
                    listing_id: listing.id,
                    buyer_id: format!("buyer-{}", (day + v) % 12),
                    kind: EngagementKind::View,
                    occurred_at: at,
                });
            }

            let extra = [
                (EngagementKind::Save, 5),
                (EngagementKind::Share, 8),
                (EngagementKind::Inquiry, 9),
                (EngagementKind::Offer, 14 + i as i64),
            ];
            for (kind, every) in extra {
                if day % every == 0 {
                    events.push(EngagementEvent {
                        listing_id: listing.id,
                        buyer_id: format!("buyer-{}", day % 12),
                        kind,
                        occurred_at: at,
                    });
                }
            }
        }
    }

    events
}
