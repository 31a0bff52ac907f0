use serde_json::Value;
use std::io;

use super::format_cell;

/// Write output as CSV to stdout.
///
/// Row lists (`results`, or the `years` of a report) become one record per
/// row; a plain result object becomes `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let rows = value
        .get("results")
        .or_else(|| result.get("years"))
        .and_then(Value::as_array)
        .filter(|rows| rows.iter().all(Value::is_object));

    match (rows, result) {
        (Some(rows), _) => write_rows(&mut wtr, rows),
        (None, Value::Object(map)) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &format_cell(val)]);
            }
        }
        (None, Value::Array(rows)) => write_rows(&mut wtr, rows),
        (None, other) => {
            let _ = wtr.write_record([&format_cell(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([&format_cell(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_cell).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&record);
        }
    }
}
