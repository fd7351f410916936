use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::status_text;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        if res_map.contains_key("matrix") {
            print_matrix(res_map);
        } else {
            print_flat_object(res_map);
        }

        // Row arrays (growth table, projection schedule) get their own table
        for (key, val) in res_map {
            if let Value::Array(rows) = val {
                if rows.first().is_some_and(Value::is_object) {
                    println!("\n{}:", key);
                    print_array_table(rows);
                }
            }
        }
    } else {
        print_flat_object(envelope);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Field/value table of the scalar entries; row arrays are skipped.
fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if is_row_array(val) {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_matrix(result: &Map<String, Value>) {
    let row_param = result.get("row_parameter").map(format_value).unwrap_or_default();
    let col_param = result
        .get("column_parameter")
        .map(format_value)
        .unwrap_or_default();
    let columns = as_slice(result.get("column_values"));
    let rows = as_slice(result.get("row_values"));
    let matrix = as_slice(result.get("matrix"));

    let mut builder = Builder::default();
    let mut header = vec![format!("{} \\ {}", row_param, col_param)];
    header.extend(columns.iter().map(format_value));
    builder.push_record(header);
    for (row_value, cells) in rows.iter().zip(matrix) {
        let mut record = vec![format_value(row_value)];
        record.extend(as_slice(Some(cells)).iter().map(|c| match c {
            Value::Null => "-".to_string(),
            other => format_value(other),
        }));
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));

    if let Some(base) = result.get("base_case_value") {
        println!("\nBase case intrinsic P/E: {}", format_value(base));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn is_row_array(value: &Value) -> bool {
    matches!(value, Value::Array(rows) if rows.first().is_some_and(Value::is_object))
}

fn as_slice(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(arr)) => arr,
        _ => &[],
    }
}

fn format_value(value: &Value) -> String {
    if let Some(text) = status_text(value) {
        return text;
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
