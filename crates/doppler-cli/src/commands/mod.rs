pub mod analyze;
pub mod codes;
pub mod lowball;
pub mod reconcile;
pub mod screen;

use clap::ValueEnum;
use std::path::Path;

use doppler_core::codes::CodeTable;
use doppler_core::config::{DopplerConfig, ValuationConfig};
use doppler_core::series::WindowPolicy;

use crate::input;

/// Window policy as spelled on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WindowPolicyArg {
    Strict,
    SkipMissing,
}

impl From<WindowPolicyArg> for WindowPolicy {
    fn from(arg: WindowPolicyArg) -> Self {
        match arg {
            WindowPolicyArg::Strict => WindowPolicy::Strict,
            WindowPolicyArg::SkipMissing => WindowPolicy::SkipMissing,
        }
    }
}

/// Configuration file if given, defaults otherwise.
pub(crate) fn load_config(path: Option<&str>) -> Result<DopplerConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => input::file::read_config(path),
        None => Ok(DopplerConfig::default()),
    }
}

/// Per-run flags take precedence over the configuration file.
pub(crate) fn apply_overrides(
    config: &mut ValuationConfig,
    smoothing_window: Option<usize>,
    window_policy: Option<WindowPolicyArg>,
) {
    if let Some(window) = smoothing_window {
        config.smoothing_window = window;
    }
    if let Some(policy) = window_policy {
        config.window_policy = policy.into();
    }
}

pub(crate) fn load_codes(path: &str) -> Result<CodeTable, Box<dyn std::error::Error>> {
    let canonical = input::file::resolve_path(path)?;
    let rows = input::file::read_csv_rows(&canonical)?;
    let table = CodeTable::from_rows(&rows)?;
    if table.is_empty() {
        return Err(format!("Code table '{}' has no entries", canonical.display()).into());
    }
    tracing::info!(file = %canonical.display(), entries = table.len(), "loaded code table");
    Ok(table)
}

/// Upper-cased file stem, the symbol a statement file stands for.
pub(crate) fn symbol_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_uppercase)
}
