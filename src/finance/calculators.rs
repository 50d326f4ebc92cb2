//! Investor calculators shown next to a listing.
//!
//! Both calculators hold their inputs and recompute every output on each `set_*` call,
//! so the result is always consistent with the latest input.

use serde::Serialize;

use super::money::round_cents;

/// Share of ARV the 70% rule allows for purchase plus repairs
const MAX_OFFER_RATIO: f64 = 0.70;
const DEFAULT_CLOSING_COST_PERCENT: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlipInputs {
    pub purchase_price: f64,
    pub repair_costs: f64,
    pub arv: f64,
    pub holding_months: f64,
    pub monthly_holding_cost: f64,
    /// Selling costs as a percentage of ARV
    pub closing_cost_percent: f64,
    pub assignment_fee: f64,
}

impl Default for FlipInputs {
    fn default() -> Self {
        Self {
            purchase_price: 0.0,
            repair_costs: 0.0,
            arv: 0.0,
            holding_months: 0.0,
            monthly_holding_cost: 0.0,
            closing_cost_percent: DEFAULT_CLOSING_COST_PERCENT,
            assignment_fee: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FlipResult {
    pub holding_costs: f64,
    pub closing_costs: f64,
    pub total_investment: f64,
    pub profit: f64,
    pub roi_percent: Option<f64>,
    pub max_allowable_offer: f64,
}

impl FlipResult {
    pub fn compute(inputs: &FlipInputs) -> Self {
        let holding_costs = inputs.holding_months * inputs.monthly_holding_cost;
        let closing_costs = inputs.arv * inputs.closing_cost_percent / 100.0;
        let total_investment =
            inputs.purchase_price + inputs.repair_costs + holding_costs + inputs.assignment_fee;
        let profit = inputs.arv - closing_costs - total_investment;
        let roi_percent = (total_investment > 0.0).then(|| profit / total_investment * 100.0);

        Self {
            holding_costs: round_cents(holding_costs),
            closing_costs: round_cents(closing_costs),
            total_investment: round_cents(total_investment),
            profit: round_cents(profit),
            roi_percent,
            max_allowable_offer: round_cents(inputs.arv * MAX_OFFER_RATIO - inputs.repair_costs),
        }
    }
}

/// Fix-and-flip calculator
#[derive(Debug, Clone, Default)]
pub struct FlipCalculator {
    inputs: FlipInputs,
    result: FlipResult,
}

impl FlipCalculator {
    pub fn new(inputs: FlipInputs) -> Self {
        let result = FlipResult::compute(&inputs);
        Self { inputs, result }
    }

    pub fn inputs(&self) -> &FlipInputs {
        &self.inputs
    }

    pub fn result(&self) -> &FlipResult {
        &self.result
    }

    pub fn set_purchase_price(&mut self, value: f64) -> &FlipResult {
        self.inputs.purchase_price = value;
        self.recompute()
    }

    pub fn set_repair_costs(&mut self, value: f64) -> &FlipResult {
        self.inputs.repair_costs = value;
        self.recompute()
    }

    pub fn set_arv(&mut self, value: f64) -> &FlipResult {
        self.inputs.arv = value;
        self.recompute()
    }

    pub fn set_holding(&mut self, months: f64, monthly_cost: f64) -> &FlipResult {
        self.inputs.holding_months = months;
        self.inputs.monthly_holding_cost = monthly_cost;
        self.recompute()
    }

    pub fn set_closing_cost_percent(&mut self, value: f64) -> &FlipResult {
        self.inputs.closing_cost_percent = value;
        self.recompute()
    }

    pub fn set_assignment_fee(&mut self, value: f64) -> &FlipResult {
        self.inputs.assignment_fee = value;
        self.recompute()
    }

    fn recompute(&mut self) -> &FlipResult {
        self.result = FlipResult::compute(&self.inputs);
        &self.result
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RentalInputs {
    pub purchase_price: f64,
    pub down_payment_percent: f64,
    pub down_payment: f64,
    /// Annual interest rate in percent
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub monthly_rent: f64,
    pub monthly_expenses: f64,
    pub vacancy_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RentalResult {
    pub loan_amount: f64,
    pub monthly_mortgage: f64,
    pub effective_monthly_income: f64,
    pub monthly_cash_flow: f64,
    pub annual_cash_flow: f64,
    pub cash_on_cash_percent: Option<f64>,
    pub cap_rate_percent: Option<f64>,
}

impl RentalResult {
    pub fn compute(inputs: &RentalInputs) -> Self {
        let loan_amount = (inputs.purchase_price - inputs.down_payment).max(0.0);
        let monthly_mortgage =
            monthly_payment(loan_amount, inputs.interest_rate, inputs.loan_term_years);
        let effective_monthly_income =
            inputs.monthly_rent * (1.0 - inputs.vacancy_percent / 100.0);
        let monthly_cash_flow = effective_monthly_income - inputs.monthly_expenses - monthly_mortgage;
        let annual_cash_flow = monthly_cash_flow * 12.0;
        let annual_noi = (effective_monthly_income - inputs.monthly_expenses) * 12.0;

        Self {
            loan_amount: round_cents(loan_amount),
            monthly_mortgage: round_cents(monthly_mortgage),
            effective_monthly_income: round_cents(effective_monthly_income),
            monthly_cash_flow: round_cents(monthly_cash_flow),
            annual_cash_flow: round_cents(annual_cash_flow),
            cash_on_cash_percent: (inputs.down_payment > 0.0)
                .then(|| annual_cash_flow / inputs.down_payment * 100.0),
            cap_rate_percent: (inputs.purchase_price > 0.0)
                .then(|| annual_noi / inputs.purchase_price * 100.0),
        }
    }
}

/// Standard amortized payment; zero-rate loans split the principal evenly
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    let months = f64::from(term_years) * 12.0;
    if principal <= 0.0 || months <= 0.0 {
        return 0.0;
    }

    let rate = annual_rate_percent / 100.0 / 12.0;
    if rate == 0.0 {
        return principal / months;
    }

    let growth = (1.0 + rate).powf(months);
    principal * rate * growth / (growth - 1.0)
}

/// Buy-and-hold rental calculator.
///
/// The down payment is linked both ways: setting the percent recomputes the amount,
/// setting the amount recomputes the percent, and a new purchase price keeps the percent.
#[derive(Debug, Clone, Default)]
pub struct RentalCalculator {
    inputs: RentalInputs,
    result: RentalResult,
}

impl RentalCalculator {
    pub fn new(inputs: RentalInputs) -> Self {
        let mut calculator = Self {
            inputs,
            result: RentalResult::default(),
        };
        let percent = calculator.inputs.down_payment_percent;
        calculator.set_down_payment_percent(percent);
        calculator
    }

    pub fn inputs(&self) -> &RentalInputs {
        &self.inputs
    }

    pub fn result(&self) -> &RentalResult {
        &self.result
    }

    pub fn set_purchase_price(&mut self, value: f64) -> &RentalResult {
        self.inputs.purchase_price = value;
        self.inputs.down_payment = value * self.inputs.down_payment_percent / 100.0;
        self.recompute()
    }

    pub fn set_down_payment_percent(&mut self, percent: f64) -> &RentalResult {
        self.inputs.down_payment_percent = percent;
        self.inputs.down_payment = self.inputs.purchase_price * percent / 100.0;
        self.recompute()
    }

    pub fn set_down_payment(&mut self, amount: f64) -> &RentalResult {
        self.inputs.down_payment = amount;
        self.inputs.down_payment_percent = if self.inputs.purchase_price > 0.0 {
            amount / self.inputs.purchase_price * 100.0
        } else {
            0.0
        };
        self.recompute()
    }

    pub fn set_interest_rate(&mut self, percent: f64) -> &RentalResult {
        self.inputs.interest_rate = percent;
        self.recompute()
    }

    pub fn set_loan_term_years(&mut self, years: u32) -> &RentalResult {
        self.inputs.loan_term_years = years;
        self.recompute()
    }

    pub fn set_monthly_rent(&mut self, value: f64) -> &RentalResult {
        self.inputs.monthly_rent = value;
        self.recompute()
    }

    pub fn set_monthly_expenses(&mut self, value: f64) -> &RentalResult {
        self.inputs.monthly_expenses = value;
        self.recompute()
    }

    pub fn set_vacancy_percent(&mut self, percent: f64) -> &RentalResult {
        self.inputs.vacancy_percent = percent;
        self.recompute()
    }

    fn recompute(&mut self) -> &RentalResult {
        self.result = RentalResult::compute(&self.inputs);
        &self.result
    }
}
