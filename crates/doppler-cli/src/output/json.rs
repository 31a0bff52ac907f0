use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print JSON to stdout. Undefined cells stay `null`.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = serde_json::to_writer_pretty(&mut out, value).and_then(|()| {
        writeln!(out).map_err(serde_json::Error::io)
    }) {
        eprintln!("JSON serialization error: {}", e);
    }
}
