use clap::Args;
use serde_json::Value;

use realty_eval_core::comps::{self, CompSearchInput};

use crate::input;

/// Arguments for comparable-sale search
#[derive(Args)]
pub struct CompsArgs {
    /// Path to JSON or YAML input file (subject, candidates, criteria, as_of)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the search radius in miles
    #[arg(long)]
    pub radius: Option<rust_decimal::Decimal>,

    /// Override the maximum number of comparables returned
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run_comps(args: CompsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document = input::read_document(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for comparable search")?;
    let mut search: CompSearchInput = serde_json::from_value(document)?;

    if let Some(radius) = args.radius {
        search.criteria.max_distance_miles = radius;
    }
    if let Some(limit) = args.limit {
        search.criteria.max_results = limit;
    }

    let result = comps::search_comparables(&search)?;
    Ok(serde_json::to_value(result)?)
}
