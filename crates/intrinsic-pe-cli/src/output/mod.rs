pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Flatten a `{"status": ...}` outcome object to display text.
///
/// Returns `None` for any other object.
pub(crate) fn status_text(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    match map.get("status")?.as_str()? {
        "ok" | "available" => map.get("value").map(plain),
        "unavailable" => Some(format!(
            "n/a ({})",
            map.get("reason").map(plain).unwrap_or_default()
        )),
        "missing" => Some(format!(
            "n/a ({})",
            map.get("sentinel").map(plain).unwrap_or_default()
        )),
        _ => None,
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_text() {
        assert_eq!(
            status_text(&json!({ "status": "ok", "value": "22.87" })),
            Some("22.87".to_string())
        );
        assert_eq!(
            status_text(&json!({ "status": "unavailable", "kind": "missing", "reason": "net_profit not found" })),
            Some("n/a (net_profit not found)".to_string())
        );
        assert_eq!(status_text(&json!({ "a": 1 })), None);
    }
}
