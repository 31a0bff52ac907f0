use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Deserialize piped JSON from stdin.
///
/// `None` when stdin is a terminal or the pipe carried nothing.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let piped = buffer.trim();
    if piped.is_empty() {
        return Ok(None);
    }

    let parsed = serde_json::from_str(piped).map_err(|e| format!("Failed to parse stdin: {e}"))?;
    Ok(Some(parsed))
}
