use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use realty_eval_core::evaluation::{self, EvaluationField, EvaluationInputs};

use crate::input;

/// Arguments for a deal evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON or YAML input file (numbers, or decimal strings keyed
    /// by snake_case or camelCase field names)
    #[arg(long)]
    pub input: Option<String>,

    /// Override a field, e.g. --set rent_monthly=2300 (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub overrides: Vec<String>,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document = input::read_document(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for evaluation")?;

    let mut inputs = parse_inputs(document)?;
    for spec in &args.overrides {
        let (field, value) = parse_override(spec)?;
        tracing::debug!(%field, %value, "applying override");
        inputs.set(field, value)?;
    }

    let result = evaluation::evaluate(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

/// Accept either typed inputs or the stored decimal-string form.
fn parse_inputs(document: Value) -> Result<EvaluationInputs, Box<dyn std::error::Error>> {
    Ok(EvaluationInputs::from_json_value(document)?)
}

fn parse_override(spec: &str) -> Result<(EvaluationField, Decimal), Box<dyn std::error::Error>> {
    let (name, value) = spec
        .split_once('=')
        .ok_or_else(|| format!("--set expects FIELD=VALUE, got '{spec}'"))?;
    let field = EvaluationField::from_str(name)?;
    let value = Decimal::from_str(value.trim())
        .map_err(|_| format!("--set {name}: '{value}' is not a number"))?;
    Ok((field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_override() {
        let (field, value) = parse_override("rentMonthly=2300.50").unwrap();
        assert_eq!(field, EvaluationField::RentMonthly);
        assert_eq!(value, dec!(2300.50));
    }

    #[test]
    fn test_parse_override_rejects_garbage() {
        assert!(parse_override("rent_monthly").is_err());
        assert!(parse_override("rent_monthly=lots").is_err());
        assert!(parse_override("nope=1").is_err());
    }

    #[test]
    fn test_mixed_number_and_string_document() {
        let mut map = serde_json::Map::new();
        for field in EvaluationField::ALL {
            map.insert(field.camel_case(), json!(0));
        }
        map.insert("refiLoanTermYears".into(), json!(30));
        map.insert("estimatedSalePrice".into(), json!("250000"));
        let inputs = parse_inputs(Value::Object(map)).unwrap();
        assert_eq!(inputs.refi_loan_term_years, 30);
        assert_eq!(inputs.estimated_sale_price, dec!(250000));
    }

    #[test]
    fn test_unreadable_document_reports_both_forms() {
        let err = parse_inputs(json!({ "rent_monthly": { "amount": 2200 } })).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("not typed evaluation inputs"), "{message}");
        assert!(message.contains("not string-form inputs"), "{message}");
    }
}
