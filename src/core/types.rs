use serde::Serialize;
use thiserror::Error;

/// Final verdict comparing the three wealth paths at the end of the horizon.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    BuyStronger,
    RentInvestStronger,
    TooClose,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("degenerate amortization: {0}")]
    Domain(String),
}

/// Scenario parameters in engine units: every rate is an annual fraction
/// (6.75% arrives here as 0.0675), converted from percent at the boundary.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub home_price: f64,
    pub down_payment: f64,
    pub initial_mortgage_rate: f64,
    pub refinance_rate: f64,
    pub years_projection: u32,
    pub home_appreciation_rate: f64,
    pub monthly_rent: f64,
    pub rent_control: bool,
    pub investment_return_rate: f64,
    pub monthly_saving: f64,
}

impl Inputs {
    /// Annual rent escalation: rent control caps the increase at 3%,
    /// otherwise 5% applies.
    pub fn rent_escalation_rate(&self) -> f64 {
        if self.rent_control { 0.03 } else { 0.05 }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearResult {
    pub year: u32,
    pub home_value: f64,
    pub loan_balance: f64,
    pub home_equity: f64,
    pub cumulative_rent_paid: f64,
    pub investment_wealth: f64,
}

/// Full projection: one row per year in year order, plus the verdict
/// classified from the final year's figures.
#[derive(Debug, Clone)]
pub struct Projection {
    pub years: Vec<YearResult>,
    pub recommendation: Recommendation,
}

impl Projection {
    pub fn final_year(&self) -> &YearResult {
        self.years.last().expect("projection always has >= 1 year")
    }
}
