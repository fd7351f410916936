use serde_json::Value;

use super::status_text;

/// Print just the key answer value from the output.
///
/// Looks for the headline fields in priority order, skipping unavailable
/// outcomes, then falls back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "overvaluation_pct",
        "intrinsic_pe",
        "fy_pe",
        "base_case_value",
        "amount",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() && !is_unavailable(val) {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn is_unavailable(value: &Value) -> bool {
    value.get("status").and_then(Value::as_str) == Some("unavailable")
}

fn format_minimal(value: &Value) -> String {
    if let Some(text) = status_text(value) {
        return text;
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
