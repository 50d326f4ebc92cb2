//! Per-step validation schemas and the publish completeness check.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

use super::steps::WizardStep;
use crate::finance::money::parse_amount;
use crate::models::ListingDraft;

const MAX_DESCRIPTION_CHARS: usize = 2000;
const EARLIEST_YEAR_BUILT: i32 = 1800;

/// Validation failure scoped to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Run the schema owned by `step` against the current draft values
pub fn validate_step(draft: &ListingDraft, step: WizardStep, today: NaiveDate) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match step {
        WizardStep::PropertyDetails => property_details(draft, today, &mut errors),
        WizardStep::Media => media(draft, &mut errors),
        WizardStep::Financials => financials(draft, &mut errors),
        WizardStep::Logistics => logistics(draft, today, &mut errors),
        WizardStep::Review => {}
    }
    errors
}

/// A step may be left when it validates, or at any time while saving as draft
pub fn step_navigable(
    draft: &ListingDraft,
    step: WizardStep,
    save_as_draft: bool,
    today: NaiveDate,
) -> bool {
    save_as_draft || validate_step(draft, step, today).is_empty()
}

/// Outcome of the publish-eligibility check
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Completeness {
    pub errors: Vec<FieldError>,
    pub missing_primary_image: bool,
    pub missing_gallery: bool,
    pub missing_agreement: bool,
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
            && !self.missing_primary_image
            && !self.missing_gallery
            && !self.missing_agreement
    }

    /// Short descriptions of everything still blocking publication
    pub fn missing(&self) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        if self.missing_primary_image {
            missing.push("primary image".to_string());
        }
        if self.missing_gallery {
            missing.push("at least one gallery image".to_string());
        }
        if self.missing_agreement {
            missing.push("purchase agreement".to_string());
        }
        for error in &self.errors {
            let label = error.to_string();
            if !missing.contains(&label) && !is_file_field(&error.field) {
                missing.push(label);
            }
        }
        missing
    }
}

fn is_file_field(field: &str) -> bool {
    matches!(field, "primaryImage" | "gallery" | "purchaseAgreement")
}

/// Union of every step schema plus required media and agreement file
pub fn check_completeness(draft: &ListingDraft, today: NaiveDate) -> Completeness {
    Completeness {
        errors: WizardStep::ALL
            .iter()
            .flat_map(|step| validate_step(draft, *step, today))
            .collect(),
        missing_primary_image: draft.primary_image.is_none(),
        missing_gallery: draft.gallery.is_empty(),
        missing_agreement: draft.purchase_agreement.is_none(),
    }
}

fn required(value: &str, field: &str, label: &str, errors: &mut Vec<FieldError>) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{} is required", label)));
        false
    } else {
        true
    }
}

fn property_details(draft: &ListingDraft, today: NaiveDate, errors: &mut Vec<FieldError>) {
    required(&draft.address, "address", "Address", errors);
    required(&draft.city, "city", "City", errors);
    required(&draft.state, "state", "State", errors);
    required(&draft.property_type, "propertyType", "Property type", errors);

    if required(&draft.zip_code, "zipCode", "ZIP code", errors) && !is_zip_code(draft.zip_code.trim()) {
        errors.push(FieldError::new("zipCode", "Enter a 5-digit ZIP code"));
    }

    if required(&draft.bedrooms, "bedrooms", "Bedrooms", errors)
        && draft.bedrooms.trim().parse::<u32>().is_err()
    {
        errors.push(FieldError::new("bedrooms", "Bedrooms must be a whole number"));
    }

    if required(&draft.bathrooms, "bathrooms", "Bathrooms", errors) {
        match draft.bathrooms.trim().parse::<f64>() {
            Ok(b) if b >= 0.0 && (b * 2.0).fract() == 0.0 => {}
            _ => errors.push(FieldError::new(
                "bathrooms",
                "Bathrooms must be a number in half steps",
            )),
        }
    }

    if required(&draft.square_footage, "squareFootage", "Square footage", errors) {
        match parse_amount(&draft.square_footage) {
            Some(sqft) if sqft > 0.0 && sqft.fract() == 0.0 => {}
            _ => errors.push(FieldError::new(
                "squareFootage",
                "Square footage must be a whole number above zero",
            )),
        }
    }

    let year = draft.year_built.trim();
    if !year.is_empty() {
        let latest = today.year() + 1;
        match year.parse::<i32>() {
            Ok(y) if (EARLIEST_YEAR_BUILT..=latest).contains(&y) => {}
            _ => errors.push(FieldError::new(
                "yearBuilt",
                format!("Year built must be between {} and {}", EARLIEST_YEAR_BUILT, latest),
            )),
        }
    }
}

fn media(draft: &ListingDraft, errors: &mut Vec<FieldError>) {
    if draft.primary_image.is_none() {
        errors.push(FieldError::new("primaryImage", "A primary image is required"));
    }
    if draft.gallery.is_empty() {
        errors.push(FieldError::new("gallery", "Add at least one gallery image"));
    }
    if required(&draft.description, "description", "Description", errors)
        && draft.description.chars().count() > MAX_DESCRIPTION_CHARS
    {
        errors.push(FieldError::new(
            "description",
            format!("Description must be at most {} characters", MAX_DESCRIPTION_CHARS),
        ));
    }
}

fn financials(draft: &ListingDraft, errors: &mut Vec<FieldError>) {
    positive_amount(&draft.purchase_price, "purchasePrice", "Purchase price", errors);
    positive_amount(&draft.listing_price, "listingPrice", "Listing price", errors);

    if !draft.arv.trim().is_empty() && parse_amount(&draft.arv).is_none() {
        errors.push(FieldError::new("arv", "ARV must be a dollar amount"));
    }

    for (i, expense) in draft.expenses.iter().enumerate() {
        if expense.name.trim().is_empty() {
            errors.push(FieldError::new(format!("expenses[{}].name", i), "Expense name is required"));
        }
        if parse_amount(&expense.amount).is_none() {
            errors.push(FieldError::new(
                format!("expenses[{}].amount", i),
                "Expense amount is required",
            ));
        }
    }

    for (i, repair) in draft.repairs.iter().enumerate() {
        if repair.item.trim().is_empty() {
            errors.push(FieldError::new(format!("repairs[{}].item", i), "Repair item is required"));
        }
    }

    for (i, unit) in draft.rent_roll.iter().enumerate() {
        if unit.unit.trim().is_empty() {
            errors.push(FieldError::new(format!("rentRoll[{}].unit", i), "Unit label is required"));
        }
        if parse_amount(&unit.rent).is_none() {
            errors.push(FieldError::new(format!("rentRoll[{}].rent", i), "Monthly rent is required"));
        }
    }
}

fn positive_amount(value: &str, field: &str, label: &str, errors: &mut Vec<FieldError>) {
    match parse_amount(value) {
        Some(v) if v > 0.0 => {}
        Some(_) => errors.push(FieldError::new(field, format!("{} must be above zero", label))),
        None => errors.push(FieldError::new(field, format!("{} is required", label))),
    }
}

fn logistics(draft: &ListingDraft, today: NaiveDate, errors: &mut Vec<FieldError>) {
    if draft.access_type.is_none() {
        errors.push(FieldError::new("accessType", "Choose how buyers can access the property"));
    }
    match draft.closing_date {
        None => errors.push(FieldError::new("closingDate", "Closing date is required")),
        // A live listing keeps its agreed date once it has passed
        Some(date) if date < today && !draft.published => {
            errors.push(FieldError::new("closingDate", "Closing date cannot be in the past"))
        }
        Some(_) => {}
    }
    if draft.purchase_agreement.is_none() {
        errors.push(FieldError::new("purchaseAgreement", "Upload the purchase agreement"));
    }
}

fn is_zip_code(value: &str) -> bool {
    let (base, plus_four) = match value.split_once('-') {
        Some((base, ext)) => (base, Some(ext)),
        None => (value, None),
    };
    let digits = |s: &str, len: usize| s.len() == len && s.chars().all(|c| c.is_ascii_digit());
    digits(base, 5) && plus_four.map_or(true, |ext| digits(ext, 4))
}
