pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Split an object into scalar fields (nested objects flattened to dotted
/// keys) and arrays of objects, which render better as their own tables.
pub(crate) fn split_fields(
    map: &Map<String, Value>,
) -> (Vec<(String, Value)>, Vec<(String, Vec<Value>)>) {
    let mut scalars = Vec::new();
    let mut collections = Vec::new();
    flatten_into("", map, &mut scalars, &mut collections);
    (scalars, collections)
}

fn flatten_into(
    prefix: &str,
    map: &Map<String, Value>,
    scalars: &mut Vec<(String, Value)>,
    collections: &mut Vec<(String, Vec<Value>)>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&name, inner, scalars, collections),
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                collections.push((name, items.clone()))
            }
            other => scalars.push((name, other.clone())),
        }
    }
}
