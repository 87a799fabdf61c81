use super::types::{Inputs, Projection, ProjectionError, Recommendation, YearResult};

const TERM_MONTHS: i32 = 360;
const REFINANCE_YEAR: u32 = 3;
const REFINANCE_CLOSING_COST_RATE: f64 = 0.02;
// The model never splits payments into a real interest/principal schedule;
// a fixed 20% of every payment counts as principal. Intentional
// simplification inherited from the original model, not a bug.
const PRINCIPAL_SHARE_OF_PAYMENT: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
struct LoanState {
    balance: f64,
    monthly_payment: f64,
}

/// Runs the year-by-year buy vs rent vs invest projection. Pure and
/// deterministic: identical inputs produce bit-identical output.
pub fn project(inputs: &Inputs) -> Result<Projection, ProjectionError> {
    validate(inputs)?;

    let loan_amount = inputs.home_price * (1.0 - inputs.down_payment);
    let mut loan = LoanState {
        balance: loan_amount,
        monthly_payment: level_monthly_payment(loan_amount, inputs.initial_mortgage_rate)?,
    };

    let rent_escalation = inputs.rent_escalation_rate();
    let mut monthly_rent = inputs.monthly_rent;
    let mut cumulative_rent_paid = 0.0;
    let mut investment_wealth = 0.0;

    let mut years = Vec::with_capacity(inputs.years_projection as usize);
    for year in 1..=inputs.years_projection {
        // Re-exponentiated from the purchase price every year rather than
        // compounded off the prior row, matching the original model.
        let home_value =
            inputs.home_price * (1.0 + inputs.home_appreciation_rate).powi(year as i32);

        if year == REFINANCE_YEAR {
            loan = refinance(loan, inputs.refinance_rate)?;
        }

        let principal_paid = PRINCIPAL_SHARE_OF_PAYMENT * loan.monthly_payment * 12.0;
        loan.balance -= principal_paid;

        // May go negative when the balance exceeds the value; valid outcome.
        let home_equity = home_value - loan.balance;

        // Contributions land first, then the whole pot grows for the year.
        investment_wealth = (investment_wealth + inputs.monthly_saving * 12.0)
            * (1.0 + inputs.investment_return_rate);

        // Charge this year at the current rent, then escalate for next year.
        cumulative_rent_paid += monthly_rent * 12.0;
        monthly_rent *= 1.0 + rent_escalation;

        years.push(YearResult {
            year,
            home_value,
            loan_balance: loan.balance,
            home_equity,
            cumulative_rent_paid,
            investment_wealth,
        });
    }

    let recommendation = classify(years.last().expect("years_projection >= 1"));
    Ok(Projection {
        years,
        recommendation,
    })
}

fn validate(inputs: &Inputs) -> Result<(), ProjectionError> {
    if inputs.years_projection < 1 {
        return Err(ProjectionError::Validation(
            "years_projection must be >= 1".to_string(),
        ));
    }
    if !inputs.home_price.is_finite() || inputs.home_price <= 0.0 {
        return Err(ProjectionError::Validation(
            "home_price must be > 0".to_string(),
        ));
    }
    if !inputs.monthly_rent.is_finite() || inputs.monthly_rent <= 0.0 {
        return Err(ProjectionError::Validation(
            "monthly_rent must be > 0".to_string(),
        ));
    }
    if !inputs.monthly_saving.is_finite() || inputs.monthly_saving < 0.0 {
        return Err(ProjectionError::Validation(
            "monthly_saving must be >= 0".to_string(),
        ));
    }
    for (name, rate) in [
        ("down_payment", inputs.down_payment),
        ("initial_mortgage_rate", inputs.initial_mortgage_rate),
        ("refinance_rate", inputs.refinance_rate),
        ("home_appreciation_rate", inputs.home_appreciation_rate),
        ("investment_return_rate", inputs.investment_return_rate),
    ] {
        if !rate.is_finite() {
            return Err(ProjectionError::Validation(format!(
                "{name} must be finite"
            )));
        }
    }
    Ok(())
}

/// Standard level-payment amortization over a fixed 360-month term, with the
/// zero-rate limit substituted when the monthly rate is exactly zero.
fn level_monthly_payment(principal: f64, annual_rate: f64) -> Result<f64, ProjectionError> {
    let monthly_rate = annual_rate / 12.0;
    if monthly_rate <= -1.0 {
        return Err(ProjectionError::Domain(format!(
            "monthly rate {monthly_rate} is at or below -100%"
        )));
    }
    if monthly_rate == 0.0 {
        return Ok(principal / f64::from(TERM_MONTHS));
    }
    let compounded = (1.0 + monthly_rate).powi(TERM_MONTHS);
    let denominator = compounded - 1.0;
    if denominator <= 0.0 {
        return Err(ProjectionError::Domain(format!(
            "amortization does not converge at annual rate {annual_rate}"
        )));
    }
    Ok(principal * monthly_rate * compounded / denominator)
}

/// The closing cost is capitalized: the new principal is the outstanding
/// balance plus 2% of it, re-amortized over a fresh 360-month term.
fn refinance(loan: LoanState, refinance_rate: f64) -> Result<LoanState, ProjectionError> {
    let new_principal = loan.balance * (1.0 + REFINANCE_CLOSING_COST_RATE);
    Ok(LoanState {
        balance: new_principal,
        monthly_payment: level_monthly_payment(new_principal, refinance_rate)?,
    })
}

/// Evaluated strictly in this order: a scenario where equity beats the rent
/// total but trails the invested pot must classify as rent+invest.
fn classify(final_year: &YearResult) -> Recommendation {
    if final_year.home_equity > final_year.investment_wealth
        && final_year.home_equity > final_year.cumulative_rent_paid
    {
        Recommendation::BuyStronger
    } else if final_year.investment_wealth > final_year.home_equity {
        Recommendation::RentInvestStronger
    } else {
        Recommendation::TooClose
    }
}
