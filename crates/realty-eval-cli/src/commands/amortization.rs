use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use realty_eval_core::amortization::{
    amortization_schedule, compute_amortized_payment, monthly_rate_from_annual_percent,
    remaining_balance,
};

/// Loan terms shared by `payment` and `schedule`
#[derive(Args, Serialize)]
pub struct LoanArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate as a percentage (e.g. 6.5)
    #[arg(long)]
    pub annual_rate: Decimal,

    /// Loan term in years
    #[arg(long, conflicts_with = "term_months")]
    pub term_years: Option<u32>,

    /// Loan term in months
    #[arg(long)]
    pub term_months: Option<u32>,
}

impl LoanArgs {
    fn months(&self) -> Result<u32, Box<dyn std::error::Error>> {
        match (self.term_years, self.term_months) {
            (_, Some(m)) => Ok(m),
            (Some(y), None) => y
                .checked_mul(12)
                .ok_or_else(|| "--term-years is too large".into()),
            (None, None) => Err("--term-years or --term-months is required".into()),
        }
    }
}

/// Arguments for a single payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Also report the balance after this many payments
    #[arg(long)]
    pub after_payments: Option<u32>,
}

/// Arguments for a full amortisation schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let months = args.loan.months()?;
    let rate = monthly_rate_from_annual_percent(args.loan.annual_rate);
    let payment = compute_amortized_payment(months, rate, args.loan.principal)?;

    let balance = match args.after_payments {
        Some(n) => Some(remaining_balance(args.loan.principal, rate, months, n)?),
        None => None,
    };

    Ok(json!({
        "result": {
            "payment": payment.round_dp(2),
            "monthly_rate": rate,
            "term_months": months,
            "total_paid": (payment * Decimal::from(months)).round_dp(2),
            "remaining_balance": balance.map(|b| b.round_dp(2)),
        },
        "methodology": "Fixed-rate amortised payment",
        "assumptions": &args.loan,
        "warnings": [],
    }))
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let months = args.loan.months()?;
    let rate = monthly_rate_from_annual_percent(args.loan.annual_rate);
    let schedule = amortization_schedule(args.loan.principal, rate, months)?;

    Ok(json!({
        "result": schedule,
        "methodology": "Fixed-rate amortisation schedule (cent-rounded rows)",
        "assumptions": &args.loan,
        "warnings": [],
    }))
}
