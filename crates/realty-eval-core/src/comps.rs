use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::EvalError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::EvalResult;

const EARTH_RADIUS_MILES: f64 = 3958.8;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The property being evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectProperty {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bedrooms: u32,
    pub bathrooms: Decimal,
    pub square_feet: Decimal,
}

/// A closed sale near the subject, as returned by a listings search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparableSale {
    pub listing_id: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bedrooms: u32,
    pub bathrooms: Decimal,
    pub square_feet: Decimal,
    pub sale_price: Money,
    pub sale_date: NaiveDate,
}

/// Filters applied to candidate sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompCriteria {
    pub max_distance_miles: Decimal,
    /// Allowed difference in bedroom count, either direction
    pub bedrooms_tolerance: u32,
    pub bathrooms_tolerance: Decimal,
    /// Allowed square-footage difference as a percentage of the subject (20 = ±20%)
    pub sqft_tolerance_percent: Decimal,
    /// Only sales closed within this many days of `as_of`; `None` disables the filter
    pub sold_within_days: Option<u32>,
    pub max_results: usize,
}

impl Default for CompCriteria {
    fn default() -> Self {
        CompCriteria {
            max_distance_miles: dec!(1),
            bedrooms_tolerance: 1,
            bathrooms_tolerance: dec!(1),
            sqft_tolerance_percent: dec!(20),
            sold_within_days: Some(180),
            max_results: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompSearchInput {
    pub subject: SubjectProperty,
    pub candidates: Vec<ComparableSale>,
    #[serde(default)]
    pub criteria: CompCriteria,
    /// Reference date for the recency filter
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedComparable {
    pub listing_id: String,
    pub address: String,
    pub sale_price: Money,
    pub sale_date: NaiveDate,
    pub distance_miles: Decimal,
    pub price_per_sqft: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePerSqftStatistics {
    pub mean: Decimal,
    pub median: Decimal,
    pub low: Decimal,
    pub high: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompSearchOutput {
    /// Matches nearest first
    pub comparables: Vec<MatchedComparable>,
    pub candidates_considered: usize,
    pub candidates_excluded: usize,
    pub price_per_sqft: PricePerSqftStatistics,
    /// Median price per square foot applied to the subject
    pub indicated_arv: Money,
    /// (low, high) price per square foot applied to the subject
    pub arv_range: (Money, Money),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Filter candidate sales against the subject and derive an after-repair
/// value from the matches' price per square foot.
pub fn search_comparables(
    input: &CompSearchInput,
) -> EvalResult<ComputationOutput<CompSearchOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_search(input)?;

    let mut matches: Vec<MatchedComparable> = input
        .candidates
        .iter()
        .filter_map(|c| match_candidate(input, c, &mut warnings))
        .collect();

    matches.sort_by(|a, b| a.distance_miles.cmp(&b.distance_miles));
    matches.truncate(input.criteria.max_results);

    if matches.is_empty() {
        return Err(EvalError::InsufficientData(
            "No candidate sales matched the comparable criteria".into(),
        ));
    }
    if matches.len() < 3 {
        warnings.push(format!(
            "Only {} comparables matched; consider widening the search criteria",
            matches.len()
        ));
    }

    let stats = compute_statistics(&matches);
    let sqft = input.subject.square_feet;

    let output = CompSearchOutput {
        candidates_considered: input.candidates.len(),
        candidates_excluded: input.candidates.len() - matches.len(),
        indicated_arv: stats.median * sqft,
        arv_range: (stats.low * sqft, stats.high * sqft),
        price_per_sqft: stats,
        comparables: matches,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Comparable Sales (price per square foot)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Great-circle distance in miles.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_search(input: &CompSearchInput) -> EvalResult<()> {
    if input.subject.square_feet <= Decimal::ZERO {
        return Err(EvalError::invalid(
            "subject.square_feet",
            "Subject square footage must be positive",
        ));
    }
    if input.criteria.max_distance_miles <= Decimal::ZERO {
        return Err(EvalError::invalid(
            "criteria.max_distance_miles",
            "Search radius must be positive",
        ));
    }
    if input.criteria.sqft_tolerance_percent < Decimal::ZERO {
        return Err(EvalError::invalid(
            "criteria.sqft_tolerance_percent",
            "Tolerance cannot be negative",
        ));
    }
    if input.criteria.max_results == 0 {
        return Err(EvalError::invalid(
            "criteria.max_results",
            "At least one result must be requested",
        ));
    }
    if input.candidates.is_empty() {
        return Err(EvalError::InsufficientData(
            "No candidate sales supplied".into(),
        ));
    }
    Ok(())
}

fn match_candidate(
    input: &CompSearchInput,
    candidate: &ComparableSale,
    warnings: &mut Vec<String>,
) -> Option<MatchedComparable> {
    let subject = &input.subject;
    let criteria = &input.criteria;

    if candidate.square_feet <= Decimal::ZERO || candidate.sale_price <= Decimal::ZERO {
        warnings.push(format!(
            "Skipped {}: missing square footage or sale price",
            candidate.listing_id
        ));
        return None;
    }

    let distance = haversine_miles(
        subject.latitude,
        subject.longitude,
        candidate.latitude,
        candidate.longitude,
    );
    let distance_miles = Decimal::from_f64(distance)?.round_dp(2);
    if distance_miles > criteria.max_distance_miles {
        return None;
    }

    if subject.bedrooms.abs_diff(candidate.bedrooms) > criteria.bedrooms_tolerance {
        return None;
    }
    if (subject.bathrooms - candidate.bathrooms).abs() > criteria.bathrooms_tolerance {
        return None;
    }

    let sqft_band = subject.square_feet * criteria.sqft_tolerance_percent / dec!(100);
    if (subject.square_feet - candidate.square_feet).abs() > sqft_band {
        return None;
    }

    if let Some(days) = criteria.sold_within_days {
        let age = (input.as_of - candidate.sale_date).num_days();
        if age < 0 || age > i64::from(days) {
            return None;
        }
    }

    Some(MatchedComparable {
        listing_id: candidate.listing_id.clone(),
        address: candidate.address.clone(),
        sale_price: candidate.sale_price,
        sale_date: candidate.sale_date,
        distance_miles,
        price_per_sqft: candidate.sale_price / candidate.square_feet,
    })
}

fn compute_statistics(matches: &[MatchedComparable]) -> PricePerSqftStatistics {
    let count = matches.len();
    let mut sorted: Vec<Decimal> = matches.iter().map(|m| m.price_per_sqft).collect();
    sorted.sort();

    let sum: Decimal = sorted.iter().copied().sum();
    let mean = sum / Decimal::from(count as i64);

    let median = if count % 2 == 0 {
        let mid = count / 2;
        (sorted[mid - 1] + sorted[mid]) / dec!(2)
    } else {
        sorted[count / 2]
    };

    PricePerSqftStatistics {
        mean,
        median,
        low: sorted[0],
        high: sorted[count - 1],
        count,
    }
}
