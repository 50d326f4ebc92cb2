use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AccessType, Expense, ListingDraft, ListingId, MediaRef, RentUnit, Repair, SellerId};
use crate::finance::money::parse_amount;

/// Visibility of a listing in the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Published,
}

/// Listing as persisted in the hosted `listings` table (snake_case columns)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRow {
    pub id: ListingId,
    pub seller_id: SellerId,
    pub status: ListingStatus,
    #[serde(default)]
    pub deleted: bool,

    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub property_type: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub square_footage: Option<u32>,
    pub year_built: Option<i32>,
    pub description: String,

    pub primary_image: Option<MediaRef>,
    #[serde(default)]
    pub gallery: Vec<MediaRef>,
    pub video: Option<MediaRef>,

    pub purchase_price: Option<f64>,
    pub listing_price: Option<f64>,
    pub arv: Option<f64>,
    pub assignment_fee: Option<f64>,
    #[serde(default)]
    pub rent_roll: Vec<RentUnit>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub repairs: Vec<Repair>,
    pub monthly_expenses: f64,
    pub annual_expenses: f64,
    pub repair_total: f64,
    pub cap_rate: Option<f64>,

    pub access_type: Option<AccessType>,
    pub access_notes: String,
    pub closing_date: Option<NaiveDate>,
    pub purchase_agreement: Option<MediaRef>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingRow {
    /// Translates the form shape into the persisted shape at the save boundary
    pub fn from_draft(
        draft: &ListingDraft,
        id: ListingId,
        seller_id: SellerId,
        status: ListingStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            seller_id,
            status,
            deleted: draft.deleted,
            address: draft.address.trim().to_string(),
            city: draft.city.trim().to_string(),
            state: draft.state.trim().to_string(),
            zip_code: draft.zip_code.trim().to_string(),
            property_type: draft.property_type.trim().to_string(),
            bedrooms: draft.bedrooms.trim().parse().ok(),
            bathrooms: draft.bathrooms.trim().parse().ok(),
            square_footage: parse_amount(&draft.square_footage).map(|v| v as u32),
            year_built: draft.year_built.trim().parse().ok(),
            description: draft.description.clone(),
            primary_image: draft.primary_image.clone(),
            gallery: draft.gallery.clone(),
            video: draft.video.clone(),
            purchase_price: parse_amount(&draft.purchase_price),
            listing_price: parse_amount(&draft.listing_price),
            arv: parse_amount(&draft.arv),
            assignment_fee: draft.assignment_fee,
            rent_roll: draft.rent_roll.clone(),
            expenses: draft.expenses.clone(),
            repairs: draft.repairs.clone(),
            monthly_expenses: draft.monthly_expenses,
            annual_expenses: draft.annual_expenses,
            repair_total: draft.repair_total,
            cap_rate: draft.cap_rate,
            access_type: draft.access_type,
            access_notes: draft.access_notes.clone(),
            closing_date: draft.closing_date,
            purchase_agreement: draft.purchase_agreement.clone(),
            created_at: draft.created_at.unwrap_or(now),
            updated_at: now,
        }
    }

    /// Loads the persisted shape back into an editable draft
    pub fn into_draft(self) -> ListingDraft {
        ListingDraft {
            id: Some(self.id),
            seller_id: Some(self.seller_id),
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            property_type: self.property_type,
            bedrooms: to_input(self.bedrooms),
            bathrooms: to_input(self.bathrooms),
            square_footage: to_input(self.square_footage),
            year_built: to_input(self.year_built),
            description: self.description,
            primary_image: self.primary_image,
            gallery: self.gallery,
            video: self.video,
            purchase_price: to_input(self.purchase_price),
            listing_price: to_input(self.listing_price),
            arv: to_input(self.arv),
            assignment_fee: self.assignment_fee,
            rent_roll: self.rent_roll,
            expenses: self.expenses,
            repairs: self.repairs,
            monthly_expenses: self.monthly_expenses,
            annual_expenses: self.annual_expenses,
            repair_total: self.repair_total,
            cap_rate: self.cap_rate,
            access_type: self.access_type,
            access_notes: self.access_notes,
            closing_date: self.closing_date,
            purchase_agreement: self.purchase_agreement,
            is_draft: self.status == ListingStatus::Draft,
            published: self.status == ListingStatus::Published,
            deleted: self.deleted,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == ListingStatus::Published && !self.deleted
    }

    /// "City, ST 12345" line used by the dashboard and the marketing sheet
    pub fn locality(&self) -> String {
        let mut line = self.city.clone();
        if !self.state.is_empty() {
            if !line.is_empty() {
                line.push_str(", ");
            }
            line.push_str(&self.state);
        }
        if !self.zip_code.is_empty() {
            line.push(' ');
            line.push_str(&self.zip_code);
        }
        line.trim().to_string()
    }
}

fn to_input<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use chrono::TimeZone;

    fn sample_draft() -> ListingDraft {
        let mut draft = ListingDraft::new();
        draft.address = " 1247 Oak Valley Dr ".to_string();
        draft.city = "Austin".to_string();
        draft.state = "TX".to_string();
        draft.zip_code = "78704".to_string();
        draft.property_type = "Single Family".to_string();
        draft.bedrooms = "4".to_string();
        draft.bathrooms = "2.5".to_string();
        draft.square_footage = "2,450".to_string();
        draft.year_built = "1978".to_string();
        draft.set_purchase_price("$200,000");
        draft.set_listing_price("$225,000");
        draft.add_expense(Expense::new("Insurance", "$600", Frequency::Annually));
        draft
    }

    #[test]
    fn test_row_uses_snake_case_columns() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let row = ListingRow::from_draft(
            &sample_draft(),
            ListingId::generate(),
            SellerId("seller-1".to_string()),
            ListingStatus::Draft,
            now,
        );

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["zip_code"], "78704");
        assert_eq!(json["purchase_price"], 200_000.0);
        assert_eq!(json["assignment_fee"], 25_000.0);
        assert_eq!(json["status"], "draft");
        assert!(json.get("zipCode").is_none());
    }

    #[test]
    fn test_numeric_inputs_are_parsed() {
        let now = Utc::now();
        let row = ListingRow::from_draft(
            &sample_draft(),
            ListingId::generate(),
            SellerId("seller-1".to_string()),
            ListingStatus::Draft,
            now,
        );

        assert_eq!(row.address, "1247 Oak Valley Dr");
        assert_eq!(row.bedrooms, Some(4));
        assert_eq!(row.bathrooms, Some(2.5));
        assert_eq!(row.square_footage, Some(2450));
        assert_eq!(row.year_built, Some(1978));
        assert_eq!(row.annual_expenses, 600.0);
        assert_eq!(row.created_at, now);
    }

    #[test]
    fn test_row_survives_editor_round_trip() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let id = ListingId::generate();
        let seller = SellerId("seller-1".to_string());
        let row = ListingRow::from_draft(&sample_draft(), id, seller.clone(), ListingStatus::Published, now);

        let draft = row.clone().into_draft();
        assert_eq!(draft.id, Some(id));
        assert!(!draft.is_draft);
        assert!(draft.published);
        assert_eq!(draft.purchase_price, "200000");

        let again = ListingRow::from_draft(&draft, id, seller, ListingStatus::Published, now);
        assert_eq!(again, row);
    }

    #[test]
    fn test_locality() {
        let row = ListingRow::from_draft(
            &sample_draft(),
            ListingId::generate(),
            SellerId("s".to_string()),
            ListingStatus::Draft,
            Utc::now(),
        );
        assert_eq!(row.locality(), "Austin, TX 78704");
    }
}
