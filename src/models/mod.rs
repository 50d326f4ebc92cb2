mod engagement;
mod row;

pub use engagement::{EngagementEvent, EngagementKind};
pub use row::{ListingRow, ListingStatus};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier assigned to a listing on its first save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub Uuid);

impl ListingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ListingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Authenticated seller that owns listings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SellerId(pub String);

impl fmt::Display for SellerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to an uploaded asset in object storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub path: String,
    pub url: String,
}

/// How often an expense is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Monthly,
    Quarterly,
    Annually,
}

/// Recurring operating expense, amount kept as typed by the seller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Expense {
    pub name: String,
    pub amount: String,
    pub frequency: Frequency,
}

impl Expense {
    pub fn new(name: impl Into<String>, amount: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
            frequency,
        }
    }
}

/// Line item of the repair estimate
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Repair {
    pub item: String,
    pub cost: String,
}

impl Repair {
    pub fn new(item: impl Into<String>, cost: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            cost: cost.into(),
        }
    }
}

/// One unit of the rent roll with its monthly rent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RentUnit {
    pub unit: String,
    pub rent: String,
}

impl RentUnit {
    pub fn new(unit: impl Into<String>, rent: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            rent: rent.into(),
        }
    }
}

/// How buyers get into the property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Lockbox,
    ScheduledShowing,
    OpenHouse,
    DriveByOnly,
}

impl AccessType {
    pub fn label(self) -> &'static str {
        match self {
            AccessType::Lockbox => "Lockbox",
            AccessType::ScheduledShowing => "Scheduled showing",
            AccessType::OpenHouse => "Open house",
            AccessType::DriveByOnly => "Drive-by only",
        }
    }
}

/// In-progress listing as edited through the wizard and the property editor.
///
/// Serialized in the camelCase form shape. Numeric inputs stay as the raw strings
/// the seller typed; the derived fields (`assignment_fee`, expense and repair totals,
/// `cap_rate`) are read-only and refreshed by [`ListingDraft::recompute_derived`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingDraft {
    pub id: Option<ListingId>,
    pub seller_id: Option<SellerId>,

    // Property
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub property_type: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_footage: String,
    pub year_built: String,
    pub description: String,

    // Media
    pub primary_image: Option<MediaRef>,
    pub gallery: Vec<MediaRef>,
    pub video: Option<MediaRef>,

    // Financials
    pub purchase_price: String,
    pub listing_price: String,
    pub arv: String,
    pub assignment_fee: Option<f64>,
    pub rent_roll: Vec<RentUnit>,
    pub expenses: Vec<Expense>,
    pub repairs: Vec<Repair>,
    pub monthly_expenses: f64,
    pub annual_expenses: f64,
    pub repair_total: f64,
    pub cap_rate: Option<f64>,

    // Logistics
    pub access_type: Option<AccessType>,
    pub access_notes: String,
    pub closing_date: Option<NaiveDate>,
    pub purchase_agreement: Option<MediaRef>,

    pub is_draft: bool,
    /// The stored record is live on the marketplace
    pub published: bool,
    pub deleted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            id: None,
            seller_id: None,
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            property_type: String::new(),
            bedrooms: String::new(),
            bathrooms: String::new(),
            square_footage: String::new(),
            year_built: String::new(),
            description: String::new(),
            primary_image: None,
            gallery: Vec::new(),
            video: None,
            purchase_price: String::new(),
            listing_price: String::new(),
            arv: String::new(),
            assignment_fee: None,
            rent_roll: Vec::new(),
            expenses: Vec::new(),
            repairs: Vec::new(),
            monthly_expenses: 0.0,
            annual_expenses: 0.0,
            repair_total: 0.0,
            cap_rate: None,
            access_type: None,
            access_notes: String::new(),
            closing_date: None,
            purchase_agreement: None,
            is_draft: true,
            published: false,
            deleted: false,
            created_at: None,
            updated_at: None,
        }
    }
}

impl ListingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key used for per-draft local state before and after the first save
    pub fn local_key(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "new".to_string())
    }

    pub fn set_purchase_price(&mut self, value: impl Into<String>) {
        self.purchase_price = value.into();
        self.recompute_derived();
    }

    pub fn set_listing_price(&mut self, value: impl Into<String>) {
        self.listing_price = value.into();
        self.recompute_derived();
    }

    pub fn add_expense(&mut self, expense: Expense) {
        self.expenses.push(expense);
        self.recompute_derived();
    }

    /// Changes the amount and frequency of an expense row. Out-of-range rows are ignored.
    pub fn update_expense(&mut self, index: usize, amount: impl Into<String>, frequency: Frequency) {
        if let Some(expense) = self.expenses.get_mut(index) {
            expense.amount = amount.into();
            expense.frequency = frequency;
            self.recompute_derived();
        }
    }

    pub fn remove_expense(&mut self, index: usize) {
        if index < self.expenses.len() {
            self.expenses.remove(index);
            self.recompute_derived();
        }
    }

    pub fn add_repair(&mut self, repair: Repair) {
        self.repairs.push(repair);
        self.recompute_derived();
    }

    pub fn update_repair_cost(&mut self, index: usize, cost: impl Into<String>) {
        if let Some(repair) = self.repairs.get_mut(index) {
            repair.cost = cost.into();
            self.recompute_derived();
        }
    }

    pub fn remove_repair(&mut self, index: usize) {
        if index < self.repairs.len() {
            self.repairs.remove(index);
            self.recompute_derived();
        }
    }

    pub fn add_rent_unit(&mut self, unit: RentUnit) {
        self.rent_roll.push(unit);
        self.recompute_derived();
    }

    pub fn remove_rent_unit(&mut self, index: usize) {
        if index < self.rent_roll.len() {
            self.rent_roll.remove(index);
            self.recompute_derived();
        }
    }
}
