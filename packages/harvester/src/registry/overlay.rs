//! Overlay configuration files.
//!
//! One YAML file per jurisdiction, e.g. `sources/us-ca.yaml`. A missing
//! directory yields no overlays; a file that cannot be read, parsed or
//! validated is logged and skipped without affecting the others.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HarvesterError, Result};
use crate::types::SourceConfig;

/// Load every overlay configuration in `dir`, in file-name order.
#[must_use]
pub fn load_overlays(dir: &Path) -> Vec<SourceConfig> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "No overlay directory");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot read overlay directory");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    paths.sort();

    let mut configs = Vec::with_capacity(paths.len());
    for path in paths {
        match load_overlay_file(&path) {
            Ok(Some(config)) => {
                tracing::debug!(
                    file = %path.display(),
                    jurisdiction = %config.jurisdiction,
                    "Loaded overlay configuration"
                );
                configs.push(config);
            }
            Ok(None) => {
                tracing::debug!(file = %path.display(), "Skipping empty overlay file");
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping invalid overlay file");
            }
        }
    }
    configs
}

/// Load and validate one overlay file.
///
/// Returns `Ok(None)` for an empty file. A missing `jurisdiction` field
/// defaults to the file stem; the id is lowercased either way.
pub fn load_overlay_file(path: &Path) -> Result<Option<SourceConfig>> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let mut config: SourceConfig = serde_yaml_ng::from_str(&content)?;

    if config.jurisdiction.trim().is_empty() {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| HarvesterError::InvalidConfig {
                jurisdiction: path.display().to_string(),
                message: "file name is not valid UTF-8".to_string(),
            })?;
        config.jurisdiction = stem.to_string();
    }
    config.jurisdiction = config.jurisdiction.trim().to_lowercase();
    if config.name.is_empty() {
        config.name.clone_from(&config.jurisdiction);
    }

    config.validate()?;
    Ok(Some(config))
}
