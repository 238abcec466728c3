pub mod file;
pub mod stdin;

use serde_json::Value;

/// Input document from `--input <file>` if given, else piped stdin.
pub fn read_document(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Some(file::read_input_value(p)?)),
        None => stdin::read_stdin(),
    }
}
