//! Reading metadata documents from YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use thiserror::Error;

use super::types::MetadataDocument;

/// Errors that can occur while loading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read metadata file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    InvalidYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path}: top level of a metadata document must be a mapping")]
    NotAMapping { path: PathBuf },
}

/// Parse document text. `path` is only used to label errors and records.
///
/// Native YAML aliases (`*name`) are expanded by the YAML parser into deep
/// copies; an alias to an anchor that was never declared is reported as
/// invalid YAML. Merge keys (`<<`) are left in place for the merge pass.
pub fn parse(path: &Path, content: &str) -> Result<MetadataDocument, DocumentError> {
    if content.trim().is_empty() {
        return Err(DocumentError::NotAMapping { path: path.to_path_buf() });
    }

    let root: Value = serde_yaml::from_str(content)
        .map_err(|e| DocumentError::InvalidYaml { path: path.to_path_buf(), source: e })?;

    if !root.is_mapping() {
        return Err(DocumentError::NotAMapping { path: path.to_path_buf() });
    }

    Ok(MetadataDocument::new(path, root))
}

/// Read and parse a document from disk.
pub fn load(path: &Path) -> Result<MetadataDocument, DocumentError> {
    let content = fs::read_to_string(path)
        .map_err(|e| DocumentError::Io { path: path.to_path_buf(), source: e })?;
    parse(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_document() {
        let content = "dataset:\n  title: COVID-19\ntables:\n  cases:\n    variables: {}\n";
        let doc = parse(Path::new("covid.meta.yml"), content).unwrap();
        assert_eq!(
            doc.get("dataset").and_then(|d| d.get("title")).and_then(Value::as_str),
            Some("COVID-19")
        );
        assert_eq!(doc.path, PathBuf::from("covid.meta.yml"));
    }

    #[test]
    fn native_aliases_are_copied_and_merge_keys_kept() {
        let content = "\
definitions:
  display: &display
    numDecimalPlaces: 1
tables:
  t:
    variables:
      v:
        <<: *display
        title: V
";
        let doc = parse(Path::new("a.meta.yml"), content).unwrap();
        let v = &doc.root["tables"]["t"]["variables"]["v"];
        assert_eq!(v["<<"]["numDecimalPlaces"], Value::from(1));
    }

    #[test]
    fn scalar_document_is_rejected() {
        let err = parse(Path::new("bad.meta.yml"), "just a string").unwrap_err();
        assert!(matches!(err, DocumentError::NotAMapping { .. }));
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = parse(Path::new("empty.meta.yml"), "  \n").unwrap_err();
        assert!(matches!(err, DocumentError::NotAMapping { .. }));
    }

    #[test]
    fn unknown_native_alias_is_invalid_yaml() {
        let err = parse(Path::new("a.meta.yml"), "a: *missing\n").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidYaml { .. }));
    }
}
