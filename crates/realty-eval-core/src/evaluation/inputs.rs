use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::types::{Money, Percent};
use crate::EvalResult;

const MAX_LOAN_TERM_YEARS: u32 = 50;
/// Upper bound on any money field: one trillion.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Financial inputs of a fix-and-refinance deal.
///
/// Money in currency units; `*_percent` fields are percentages (75 = 75%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInputs {
    /// After-repair value (ARV), the expected resale / appraised value
    pub estimated_sale_price: Money,
    pub purchase_price: Money,
    pub repairs: Money,
    pub insurance_annual: Money,
    pub property_tax_annual: Money,
    pub hoa_annual: Money,
    pub miscellaneous_monthly: Money,
    pub rent_monthly: Money,
    pub survey: Money,
    pub inspection: Money,
    pub appraisal: Money,
    /// Hard-money loan amount as a percentage of ARV
    pub hard_loan_to_value_percent: Percent,
    pub hard_lender_fees: Money,
    pub hard_first_phase_costs: Money,
    /// Refinance loan amount as a percentage of ARV
    pub refi_loan_to_value_percent: Percent,
    pub refi_interest_rate_percent_annual: Percent,
    pub refi_loan_term_years: u32,
    pub refi_lender_fees: Money,
    pub refi_mortgage_insurance_annual: Money,
}

/// Names every input field; used for single-field updates and for parsing
/// the stored string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationField {
    EstimatedSalePrice,
    PurchasePrice,
    Repairs,
    InsuranceAnnual,
    PropertyTaxAnnual,
    HoaAnnual,
    MiscellaneousMonthly,
    RentMonthly,
    Survey,
    Inspection,
    Appraisal,
    HardLoanToValuePercent,
    HardLenderFees,
    HardFirstPhaseCosts,
    RefiLoanToValuePercent,
    RefiInterestRatePercentAnnual,
    RefiLoanTermYears,
    RefiLenderFees,
    RefiMortgageInsuranceAnnual,
}

/// Stored form of the inputs: decimal strings keyed by field name
/// (snake_case or camelCase).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvaluationInputs {
    pub fields: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// EvaluationField
// ---------------------------------------------------------------------------

impl EvaluationField {
    pub const ALL: [EvaluationField; 19] = [
        EvaluationField::EstimatedSalePrice,
        EvaluationField::PurchasePrice,
        EvaluationField::Repairs,
        EvaluationField::InsuranceAnnual,
        EvaluationField::PropertyTaxAnnual,
        EvaluationField::HoaAnnual,
        EvaluationField::MiscellaneousMonthly,
        EvaluationField::RentMonthly,
        EvaluationField::Survey,
        EvaluationField::Inspection,
        EvaluationField::Appraisal,
        EvaluationField::HardLoanToValuePercent,
        EvaluationField::HardLenderFees,
        EvaluationField::HardFirstPhaseCosts,
        EvaluationField::RefiLoanToValuePercent,
        EvaluationField::RefiInterestRatePercentAnnual,
        EvaluationField::RefiLoanTermYears,
        EvaluationField::RefiLenderFees,
        EvaluationField::RefiMortgageInsuranceAnnual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationField::EstimatedSalePrice => "estimated_sale_price",
            EvaluationField::PurchasePrice => "purchase_price",
            EvaluationField::Repairs => "repairs",
            EvaluationField::InsuranceAnnual => "insurance_annual",
            EvaluationField::PropertyTaxAnnual => "property_tax_annual",
            EvaluationField::HoaAnnual => "hoa_annual",
            EvaluationField::MiscellaneousMonthly => "miscellaneous_monthly",
            EvaluationField::RentMonthly => "rent_monthly",
            EvaluationField::Survey => "survey",
            EvaluationField::Inspection => "inspection",
            EvaluationField::Appraisal => "appraisal",
            EvaluationField::HardLoanToValuePercent => "hard_loan_to_value_percent",
            EvaluationField::HardLenderFees => "hard_lender_fees",
            EvaluationField::HardFirstPhaseCosts => "hard_first_phase_costs",
            EvaluationField::RefiLoanToValuePercent => "refi_loan_to_value_percent",
            EvaluationField::RefiInterestRatePercentAnnual => "refi_interest_rate_percent_annual",
            EvaluationField::RefiLoanTermYears => "refi_loan_term_years",
            EvaluationField::RefiLenderFees => "refi_lender_fees",
            EvaluationField::RefiMortgageInsuranceAnnual => "refi_mortgage_insurance_annual",
        }
    }

    /// camelCase name used by the web client.
    pub fn camel_case(&self) -> String {
        let mut out = String::new();
        let mut upper_next = false;
        for c in self.as_str().chars() {
            if c == '_' {
                upper_next = true;
            } else if upper_next {
                out.push(c.to_ascii_uppercase());
                upper_next = false;
            } else {
                out.push(c);
            }
        }
        out
    }

    pub(crate) fn is_percent(&self) -> bool {
        matches!(
            self,
            EvaluationField::HardLoanToValuePercent
                | EvaluationField::RefiLoanToValuePercent
                | EvaluationField::RefiInterestRatePercentAnnual
        )
    }
}

impl fmt::Display for EvaluationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationField {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        EvaluationField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == name || f.camel_case() == name)
            .ok_or_else(|| EvalError::invalid("field", format!("Unknown evaluation field '{name}'")))
    }
}

// ---------------------------------------------------------------------------
// EvaluationInputs
// ---------------------------------------------------------------------------

impl EvaluationInputs {
    pub fn get(&self, field: EvaluationField) -> Decimal {
        match field {
            EvaluationField::EstimatedSalePrice => self.estimated_sale_price,
            EvaluationField::PurchasePrice => self.purchase_price,
            EvaluationField::Repairs => self.repairs,
            EvaluationField::InsuranceAnnual => self.insurance_annual,
            EvaluationField::PropertyTaxAnnual => self.property_tax_annual,
            EvaluationField::HoaAnnual => self.hoa_annual,
            EvaluationField::MiscellaneousMonthly => self.miscellaneous_monthly,
            EvaluationField::RentMonthly => self.rent_monthly,
            EvaluationField::Survey => self.survey,
            EvaluationField::Inspection => self.inspection,
            EvaluationField::Appraisal => self.appraisal,
            EvaluationField::HardLoanToValuePercent => self.hard_loan_to_value_percent,
            EvaluationField::HardLenderFees => self.hard_lender_fees,
            EvaluationField::HardFirstPhaseCosts => self.hard_first_phase_costs,
            EvaluationField::RefiLoanToValuePercent => self.refi_loan_to_value_percent,
            EvaluationField::RefiInterestRatePercentAnnual => {
                self.refi_interest_rate_percent_annual
            }
            EvaluationField::RefiLoanTermYears => Decimal::from(self.refi_loan_term_years),
            EvaluationField::RefiLenderFees => self.refi_lender_fees,
            EvaluationField::RefiMortgageInsuranceAnnual => self.refi_mortgage_insurance_annual,
        }
    }

    /// Overwrite one field. The loan term must be a whole, non-negative number of years.
    pub fn set(&mut self, field: EvaluationField, value: Decimal) -> EvalResult<()> {
        let slot = match field {
            EvaluationField::RefiLoanTermYears => {
                self.refi_loan_term_years = whole_years(value)?;
                return Ok(());
            }
            EvaluationField::EstimatedSalePrice => &mut self.estimated_sale_price,
            EvaluationField::PurchasePrice => &mut self.purchase_price,
            EvaluationField::Repairs => &mut self.repairs,
            EvaluationField::InsuranceAnnual => &mut self.insurance_annual,
            EvaluationField::PropertyTaxAnnual => &mut self.property_tax_annual,
            EvaluationField::HoaAnnual => &mut self.hoa_annual,
            EvaluationField::MiscellaneousMonthly => &mut self.miscellaneous_monthly,
            EvaluationField::RentMonthly => &mut self.rent_monthly,
            EvaluationField::Survey => &mut self.survey,
            EvaluationField::Inspection => &mut self.inspection,
            EvaluationField::Appraisal => &mut self.appraisal,
            EvaluationField::HardLoanToValuePercent => &mut self.hard_loan_to_value_percent,
            EvaluationField::HardLenderFees => &mut self.hard_lender_fees,
            EvaluationField::HardFirstPhaseCosts => &mut self.hard_first_phase_costs,
            EvaluationField::RefiLoanToValuePercent => &mut self.refi_loan_to_value_percent,
            EvaluationField::RefiInterestRatePercentAnnual => {
                &mut self.refi_interest_rate_percent_annual
            }
            EvaluationField::RefiLenderFees => &mut self.refi_lender_fees,
            EvaluationField::RefiMortgageInsuranceAnnual => {
                &mut self.refi_mortgage_insurance_annual
            }
        };
        *slot = value;
        Ok(())
    }

    /// Decimal-string form, keyed by snake_case field name.
    pub fn to_raw(&self) -> RawEvaluationInputs {
        let fields = EvaluationField::ALL
            .iter()
            .map(|f| (f.as_str().to_string(), self.get(*f).to_string()))
            .collect();
        RawEvaluationInputs { fields }
    }
}

/// Reject inputs outside the domain of the model before any arithmetic runs.
pub fn validate_inputs(inputs: &EvaluationInputs) -> EvalResult<()> {
    for field in EvaluationField::ALL {
        if field == EvaluationField::RefiLoanTermYears {
            continue;
        }
        let value = inputs.get(field);
        if value < Decimal::ZERO {
            return Err(EvalError::invalid(field.as_str(), "Cannot be negative"));
        }
        if field.is_percent() && value > dec!(100) {
            return Err(EvalError::invalid(
                field.as_str(),
                "Percentage cannot exceed 100",
            ));
        }
        if !field.is_percent() && value > MAX_AMOUNT {
            return Err(EvalError::invalid(
                field.as_str(),
                format!("Cannot exceed {MAX_AMOUNT}"),
            ));
        }
    }

    if inputs.refi_loan_term_years == 0 {
        return Err(EvalError::invalid(
            EvaluationField::RefiLoanTermYears.as_str(),
            "Loan term must be at least 1 year",
        ));
    }
    if inputs.refi_loan_term_years > MAX_LOAN_TERM_YEARS {
        return Err(EvalError::invalid(
            EvaluationField::RefiLoanTermYears.as_str(),
            format!("Loan term cannot exceed {MAX_LOAN_TERM_YEARS} years"),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// JSON documents
// ---------------------------------------------------------------------------

impl EvaluationInputs {
    /// Read a JSON document holding either typed inputs (snake_case keys,
    /// numeric values) or the stored string form (snake_case or camelCase
    /// keys, decimal strings). Numbers in a string-form document are accepted.
    ///
    /// When the document fits neither form the error carries both reasons.
    pub fn from_json_value(document: serde_json::Value) -> EvalResult<Self> {
        let typed_err = match serde_json::from_value::<EvaluationInputs>(document.clone()) {
            Ok(inputs) => return Ok(inputs),
            Err(e) => e,
        };
        let raw = match serde_json::from_value::<RawEvaluationInputs>(stringify_numbers(document))
        {
            Ok(raw) => raw,
            Err(raw_err) => {
                return Err(EvalError::SerializationError(format!(
                    "not typed evaluation inputs ({typed_err}); not string-form inputs ({raw_err})"
                )))
            }
        };
        raw.parse()
    }
}

fn stringify_numbers(document: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match document {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| match v {
                    Value::Number(n) => (k, Value::String(n.to_string())),
                    other => (k, other),
                })
                .collect(),
        ),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// RawEvaluationInputs
// ---------------------------------------------------------------------------

impl RawEvaluationInputs {
    /// Parse every field. Missing or blank fields and non-numeric strings fail
    /// with `InvalidInput` naming the field.
    pub fn parse(&self) -> EvalResult<EvaluationInputs> {
        let mut inputs = EvaluationInputs::default();

        for field in EvaluationField::ALL {
            let raw = self
                .lookup(field)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| EvalError::invalid(field.as_str(), "Required"))?;

            let value = Decimal::from_str(&raw.replace(',', ""))
                .map_err(|_| EvalError::invalid(field.as_str(), format!("'{raw}' is not a number")))?;

            inputs.set(field, value).map_err(|e| match e {
                EvalError::InvalidInput { reason, .. } => EvalError::invalid(field.as_str(), reason),
                other => other,
            })?;
        }

        Ok(inputs)
    }

    fn lookup(&self, field: EvaluationField) -> Option<&str> {
        self.fields
            .get(field.as_str())
            .or_else(|| self.fields.get(&field.camel_case()))
            .map(String::as_str)
    }
}

fn whole_years(value: Decimal) -> EvalResult<u32> {
    let field = EvaluationField::RefiLoanTermYears.as_str();
    if !value.fract().is_zero() {
        return Err(EvalError::invalid(field, "Must be a whole number of years"));
    }
    value
        .to_u32()
        .ok_or_else(|| EvalError::invalid(field, "Must be a non-negative whole number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn complete_inputs() -> EvaluationInputs {
        EvaluationInputs {
            estimated_sale_price: dec!(300000),
            rent_monthly: dec!(2200.50),
            refi_loan_to_value_percent: dec!(75),
            refi_loan_term_years: 30,
            ..Default::default()
        }
    }

    fn complete_raw() -> RawEvaluationInputs {
        let mut raw = EvaluationInputs {
            refi_loan_term_years: 30,
            ..Default::default()
        }
        .to_raw();
        raw.fields
            .insert("estimated_sale_price".into(), "300000.00".into());
        raw
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in EvaluationField::ALL {
            assert_eq!(field.as_str().parse::<EvaluationField>().unwrap(), field);
            assert_eq!(field.camel_case().parse::<EvaluationField>().unwrap(), field);
        }
    }

    #[test]
    fn test_camel_case_name() {
        assert_eq!(
            EvaluationField::RefiInterestRatePercentAnnual.camel_case(),
            "refiInterestRatePercentAnnual"
        );
    }

    #[test]
    fn test_unknown_field() {
        assert!("arv".parse::<EvaluationField>().is_err());
    }

    #[test]
    fn test_parse_complete() {
        let inputs = complete_raw().parse().unwrap();
        assert_eq!(inputs.estimated_sale_price, dec!(300000));
        assert_eq!(inputs.refi_loan_term_years, 30);
    }

    #[test]
    fn test_parse_accepts_camel_case_and_thousands_separators() {
        let mut raw = complete_raw();
        raw.fields.remove("purchase_price");
        raw.fields.insert("purchasePrice".into(), "180,000".into());
        let inputs = raw.parse().unwrap();
        assert_eq!(inputs.purchase_price, dec!(180000));
    }

    #[test]
    fn test_parse_missing_field() {
        let mut raw = complete_raw();
        raw.fields.remove("repairs");
        let err = raw.parse().unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput { ref field, .. } if field == "repairs"));
    }

    #[test]
    fn test_parse_blank_field() {
        let mut raw = complete_raw();
        raw.fields.insert("survey".into(), "  ".into());
        assert!(raw.parse().is_err());
    }

    #[test]
    fn test_parse_non_numeric() {
        let mut raw = complete_raw();
        raw.fields.insert("rent_monthly".into(), "NaN".into());
        let err = raw.parse().unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput { ref field, .. } if field == "rent_monthly"));
    }

    #[test]
    fn test_parse_fractional_term() {
        let mut raw = complete_raw();
        raw.fields.insert("refi_loan_term_years".into(), "29.5".into());
        let err = raw.parse().unwrap_err();
        assert!(
            matches!(err, EvalError::InvalidInput { ref field, .. } if field == "refi_loan_term_years")
        );
    }

    #[test]
    fn test_set_and_get() {
        let mut inputs = EvaluationInputs::default();
        inputs.set(EvaluationField::HoaAnnual, dec!(1200)).unwrap();
        inputs.set(EvaluationField::RefiLoanTermYears, dec!(15)).unwrap();
        assert_eq!(inputs.get(EvaluationField::HoaAnnual), dec!(1200));
        assert_eq!(inputs.refi_loan_term_years, 15);
    }

    #[test]
    fn test_validate_rejects_zero_term() {
        let inputs = EvaluationInputs::default();
        assert!(validate_inputs(&inputs).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_money() {
        let inputs = EvaluationInputs {
            repairs: dec!(-1),
            refi_loan_term_years: 30,
            ..Default::default()
        };
        let err = validate_inputs(&inputs).unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput { ref field, .. } if field == "repairs"));
    }

    #[test]
    fn test_validate_rejects_ltv_over_100() {
        let inputs = EvaluationInputs {
            refi_loan_to_value_percent: dec!(101),
            refi_loan_term_years: 30,
            ..Default::default()
        };
        assert!(validate_inputs(&inputs).is_err());
    }

    #[test]
    fn test_validate_rejects_long_term() {
        let inputs = EvaluationInputs {
            refi_loan_term_years: 51,
            ..Default::default()
        };
        assert!(validate_inputs(&inputs).is_err());
    }

    #[test]
    fn test_validate_rejects_amount_over_one_trillion() {
        let inputs = EvaluationInputs {
            rent_monthly: dec!(10000000000000000000000000000),
            refi_loan_term_years: 30,
            ..Default::default()
        };
        let err = validate_inputs(&inputs).unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput { ref field, .. } if field == "rent_monthly"));

        let at_bound = EvaluationInputs {
            estimated_sale_price: MAX_AMOUNT,
            refi_loan_term_years: 30,
            ..Default::default()
        };
        assert!(validate_inputs(&at_bound).is_ok());
    }

    #[test]
    fn test_from_json_value_typed_form() {
        let typed = serde_json::to_value(complete_inputs()).unwrap();
        let inputs = EvaluationInputs::from_json_value(typed).unwrap();
        assert_eq!(inputs, complete_inputs());
    }

    #[test]
    fn test_from_json_value_mixed_string_form() {
        let mut map = serde_json::Map::new();
        for field in EvaluationField::ALL {
            map.insert(field.camel_case(), serde_json::json!(0));
        }
        map.insert("refiLoanTermYears".into(), serde_json::json!(30));
        map.insert("estimatedSalePrice".into(), serde_json::json!("250,000"));

        let inputs = EvaluationInputs::from_json_value(serde_json::Value::Object(map)).unwrap();
        assert_eq!(inputs.refi_loan_term_years, 30);
        assert_eq!(inputs.estimated_sale_price, dec!(250000));
    }

    #[test]
    fn test_from_json_value_reports_both_forms() {
        let mut typed = serde_json::to_value(complete_inputs()).unwrap();
        typed["refi_loan_term_years"] = serde_json::json!([30]);

        let err = EvaluationInputs::from_json_value(typed).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, EvalError::SerializationError(_)));
        assert!(message.contains("not typed evaluation inputs"), "{message}");
        assert!(message.contains("not string-form inputs"), "{message}");
    }

    #[test]
    fn test_from_json_value_string_form_names_field() {
        let raw = serde_json::json!({ "rentMonthly": "2200" });
        let err = EvaluationInputs::from_json_value(raw).unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput { ref reason, .. } if reason == "Required"));
    }
}
