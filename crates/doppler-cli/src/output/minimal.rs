use serde_json::Value;

use super::format_cell;

/// Fields that answer each command, in priority order.
const ANSWER_KEYS: [&str; 6] = [
    "intrinsic_value",
    "lowball",
    "gap_db",
    "passing",
    "category",
    "entries",
];

/// Print just the key answer value from the output.
///
/// Looks inside the `result` envelope (and a report's `summary` block) for
/// the first answer field present, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    let scope = result.get("summary").unwrap_or(result);

    if let Value::Object(map) = scope {
        if let Some(answer) = ANSWER_KEYS.iter().find_map(|key| map.get(*key)) {
            println!("{}", format_cell(answer));
            return;
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_cell(val));
            return;
        }
    }

    println!("{}", format_cell(scope));
}
