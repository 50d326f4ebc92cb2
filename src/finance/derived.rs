use serde::Serialize;

use super::money::{amount_or_zero, format_currency, parse_amount};
use crate::models::{Expense, Frequency, ListingDraft, RentUnit, Repair};

impl Frequency {
    /// Divisor that normalizes one billed amount to a monthly amount
    pub fn monthly_divisor(self) -> f64 {
        match self {
            Frequency::Monthly => 1.0,
            Frequency::Quarterly => 3.0,
            Frequency::Annually => 12.0,
        }
    }

    /// Multiplier that normalizes one billed amount to an annual amount
    pub fn annual_multiplier(self) -> f64 {
        match self {
            Frequency::Monthly => 12.0,
            Frequency::Quarterly => 4.0,
            Frequency::Annually => 1.0,
        }
    }
}

/// Listing price minus purchase price, only when both are set and the spread is positive
pub fn assignment_fee(purchase_price: &str, listing_price: &str) -> Option<f64> {
    let purchase = parse_amount(purchase_price)?;
    let listing = parse_amount(listing_price)?;
    let fee = listing - purchase;
    (fee > 0.0).then_some(fee)
}

/// Read-only display value: formatted fee, or empty when there is none
pub fn assignment_fee_display(purchase_price: &str, listing_price: &str) -> String {
    assignment_fee(purchase_price, listing_price)
        .map(format_currency)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ExpenseTotals {
    pub monthly: f64,
    pub annual: f64,
}

pub fn expense_totals(expenses: &[Expense]) -> ExpenseTotals {
    expenses
        .iter()
        .fold(ExpenseTotals::default(), |totals, expense| {
            let amount = amount_or_zero(&expense.amount);
            ExpenseTotals {
                monthly: totals.monthly + amount / expense.frequency.monthly_divisor(),
                annual: totals.annual + amount * expense.frequency.annual_multiplier(),
            }
        })
}

pub fn repair_total(repairs: &[Repair]) -> f64 {
    repairs.iter().map(|r| amount_or_zero(&r.cost)).sum()
}

pub fn gross_annual_rent(rent_roll: &[RentUnit]) -> f64 {
    rent_roll.iter().map(|u| amount_or_zero(&u.rent)).sum::<f64>() * 12.0
}

pub fn net_operating_income(rent_roll: &[RentUnit], expenses: &[Expense]) -> f64 {
    gross_annual_rent(rent_roll) - expense_totals(expenses).annual
}

/// NOI over price as a percentage. `None` without a price or without any rent.
pub fn cap_rate(price: Option<f64>, rent_roll: &[RentUnit], expenses: &[Expense]) -> Option<f64> {
    let price = price.filter(|p| *p > 0.0)?;
    if gross_annual_rent(rent_roll) <= 0.0 {
        return None;
    }
    Some(net_operating_income(rent_roll, expenses) / price * 100.0)
}

/// Every computed monetary field of a listing
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedFinancials {
    pub assignment_fee: Option<f64>,
    pub monthly_expenses: f64,
    pub annual_expenses: f64,
    pub repair_total: f64,
    pub gross_annual_rent: f64,
    pub net_operating_income: f64,
    pub cap_rate: Option<f64>,
}

impl DerivedFinancials {
    pub fn compute(draft: &ListingDraft) -> Self {
        let totals = expense_totals(&draft.expenses);
        let gross = gross_annual_rent(&draft.rent_roll);
        Self {
            assignment_fee: assignment_fee(&draft.purchase_price, &draft.listing_price),
            monthly_expenses: totals.monthly,
            annual_expenses: totals.annual,
            repair_total: repair_total(&draft.repairs),
            gross_annual_rent: gross,
            net_operating_income: gross - totals.annual,
            cap_rate: cap_rate(
                parse_amount(&draft.listing_price),
                &draft.rent_roll,
                &draft.expenses,
            ),
        }
    }
}

impl ListingDraft {
    /// Refresh the read-only computed fields from their inputs
    pub fn recompute_derived(&mut self) -> DerivedFinancials {
        let derived = DerivedFinancials::compute(self);
        self.assignment_fee = derived.assignment_fee;
        self.monthly_expenses = derived.monthly_expenses;
        self.annual_expenses = derived.annual_expenses;
        self.repair_total = derived.repair_total;
        self.cap_rate = derived.cap_rate;
        derived
    }
}
