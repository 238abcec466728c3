use serde_json::Value;

/// Headline figure per command, in priority order.
const PRIORITY_KEYS: [&str; 5] = [
    "cash_on_cash_return",
    "indicated_arv",
    "payment",
    "scheduled_payment",
    "annual_cash_flow",
];

/// Print just the key answer value from the output.
///
/// Looks through the result and its `outputs` section for the first
/// non-null priority field, then falls back to the first scalar field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let sections = [Some(result_obj), result_obj.get("outputs")];

    for key in PRIORITY_KEYS {
        for section in sections.iter().flatten() {
            if let Some(val) = section.get(key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_object() && !v.is_array()) {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
