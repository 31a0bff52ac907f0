use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::format_cell;

/// Format output as tables using the tabled crate.
///
/// Scalars of an object go into one Field/Value table; nested objects and
/// arrays of rows get their own titled table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_section(None, result);
                print_envelope_notes(map);
            } else if let Some(Value::Array(rows)) = map.get("results") {
                print_rows(rows);
                print_scalars(map);
            } else {
                print_section(None, value);
            }
        }
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", format_cell(value)),
    }
}

fn print_section(title: Option<&str>, value: &Value) {
    if let Some(title) = title {
        println!("\n{}:", title);
    }
    match value {
        Value::Object(map) => {
            print_scalars(map);
            for (key, nested) in map {
                match nested {
                    Value::Object(_) => print_section(Some(key), nested),
                    Value::Array(rows) if rows.iter().any(Value::is_object) => {
                        println!("\n{}:", key);
                        print_rows(rows);
                    }
                    _ => {}
                }
            }
        }
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", format_cell(value)),
    }
}

fn print_scalars(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut any = false;
    for (key, val) in map {
        let nested = val.is_object() || val.as_array().is_some_and(|a| a.iter().any(Value::is_object));
        if !nested {
            builder.push_record([key.as_str(), &format_cell(val)]);
            any = true;
        }
    }
    if any {
        println!("{}", Table::from(builder));
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            println!("{}", format_cell(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
