use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use doppler_core::config::DopplerConfig;

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read every record of a headerless CSV file as raw string cells.
///
/// Rows may differ in length; statement and code tables are ragged by nature.
pub fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    if let Some(first) = rows.first_mut().and_then(|r| r.first_mut()) {
        *first = first.trim_start_matches('\u{feff}').to_string();
    }
    Ok(rows)
}

/// Load a run configuration: JSON when the extension is `.json`, YAML otherwise.
pub fn read_config(path: &str) -> Result<DopplerConfig, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let is_json = canonical
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config: DopplerConfig = if is_json {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    config.validate()?;
    Ok(config)
}

/// Statement files of a directory as `(SYMBOL, path)`, sorted by symbol.
///
/// Every `*.csv` except the code table `codes.csv` is one stock.
pub fn statement_files(dir: &str) -> Result<Vec<(String, PathBuf)>, Box<dyn std::error::Error>> {
    let root = Path::new(dir);
    if !root.is_dir() {
        return Err(format!("Not a directory: {}", root.display()).into());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv || !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.eq_ignore_ascii_case("codes") {
            continue;
        }
        files.push((stem.to_uppercase(), path));
    }
    files.sort();
    Ok(files)
}

/// Resolve and validate the path.
pub fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
