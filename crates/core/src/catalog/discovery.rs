use std::path::Path;
use walkdir::WalkDir;

use super::types::{CatalogError, DocumentInfo};

/// File suffixes that mark a metadata document.
pub const METADATA_SUFFIXES: &[&str] = &[".meta.yml", ".meta.yaml"];

/// Discover all metadata documents below `root`, sorted by logical name.
pub fn discover_documents(root: &Path) -> Result<Vec<DocumentInfo>, CatalogError> {
    let root = root
        .canonicalize()
        .map_err(|_| CatalogError::MissingDir(root.display().to_string()))?;

    let mut out = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry.map_err(|e| CatalogError::WalkError(root.display().to_string(), e))?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let rel = path.strip_prefix(&root).unwrap_or(path);
        let Some(logical) = logical_name_from_relative(rel) else {
            continue;
        };

        out.push(DocumentInfo { logical_name: logical, path: path.to_path_buf() });
    }

    out.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));
    Ok(out)
}

pub fn is_metadata_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    METADATA_SUFFIXES.iter().any(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

/// `covid/deaths.meta.yml` -> `covid/deaths`. Path separators are always `/`.
fn logical_name_from_relative(rel: &Path) -> Option<String> {
    if !is_metadata_file(rel) {
        return None;
    }
    let s = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    METADATA_SUFFIXES
        .iter()
        .find_map(|suffix| s.strip_suffix(suffix))
        .map(str::to_string)
}
