use serde_json::Value;
use std::io;

use super::status_text;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) if result.contains_key("matrix") => {
                write_matrix_csv(&mut wtr, result);
            }
            Some(Value::Object(result)) if result.contains_key("projections") => {
                if let Some(Value::Array(rows)) = result.get("projections") {
                    write_array_csv(&mut wtr, rows);
                }
            }
            Some(Value::Object(result)) => {
                // Two-column CSV: field, value
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
            _ => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        },
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Sensitivity grid: header row of column values, one line per row value.
fn write_matrix_csv(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    result: &serde_json::Map<String, Value>,
) {
    let label = format!(
        "{} \\ {}",
        result.get("row_parameter").map(format_csv_value).unwrap_or_default(),
        result.get("column_parameter").map(format_csv_value).unwrap_or_default()
    );
    let columns = as_slice(result.get("column_values"));
    let mut header = vec![label];
    header.extend(columns.iter().map(format_csv_value));
    let _ = wtr.write_record(&header);

    let rows = as_slice(result.get("row_values"));
    let matrix = as_slice(result.get("matrix"));
    for (row_value, cells) in rows.iter().zip(matrix) {
        let mut record = vec![format_csv_value(row_value)];
        record.extend(as_slice(Some(cells)).iter().map(format_csv_value));
        let _ = wtr.write_record(&record);
    }
}

fn as_slice(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(arr)) => arr,
        _ => &[],
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    if let Some(text) = status_text(value) {
        return text;
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
