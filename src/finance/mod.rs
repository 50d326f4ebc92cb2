pub mod calculators;
pub mod derived;
pub mod money;

pub use calculators::{
    FlipCalculator, FlipInputs, FlipResult, RentalCalculator, RentalInputs, RentalResult,
};
pub use derived::{
    assignment_fee, assignment_fee_display, cap_rate, expense_totals, gross_annual_rent,
    net_operating_income, repair_total, DerivedFinancials, ExpenseTotals,
};
pub use money::{amount_or_zero, format_currency, format_percent, parse_amount};
