use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::types::RawGeometry;

/// Read one drawing export: a JSON array of raw geometry records, as
/// produced by the CAD-side extraction script.
pub fn load_drawing(path: &Path) -> Result<Vec<RawGeometry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read drawing '{}'", path.display()))?;
    let geometry: Vec<RawGeometry> = serde_json::from_str(&content)
        .with_context(|| format!("'{}' is not a valid drawing export", path.display()))?;
    Ok(geometry)
}

/// Find drawing exports under a directory, sorted for stable output.
pub fn discover_drawings(dir: &Path) -> Vec<PathBuf> {
    let mut drawings: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let path = entry.path();
            path.is_file() && path.extension().is_some_and(|ext| ext == "json")
        })
        .map(|entry| entry.into_path())
        .collect();
    drawings.sort();
    drawings
}
