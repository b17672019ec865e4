//! Raw document types.

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Well-known keys of the document schema.
pub mod keys {
    pub const DEFINITIONS: &str = "definitions";
    pub const COMMON: &str = "common";
    pub const DATASET: &str = "dataset";
    pub const TABLES: &str = "tables";
    pub const VARIABLES: &str = "variables";
    pub const PARAMETERS: &str = "parameters";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const UNIT: &str = "unit";
    pub const MERGE: &str = "<<";
}

/// A metadata document as read from disk, before any resolution pass.
///
/// The tree is owned; every pass produces a new document rather than
/// mutating one that another record may still be reading from.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    pub path: PathBuf,
    pub root: Value,
}

impl MetadataDocument {
    pub fn new(path: impl Into<PathBuf>, root: Value) -> Self {
        Self { path: path.into(), root }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Top-level mapping, if the document is one.
    pub fn mapping(&self) -> Option<&Mapping> {
        self.root.as_mapping()
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.mapping().and_then(|m| m.get(key))
    }

    pub fn definitions(&self) -> Option<&Mapping> {
        self.get(keys::DEFINITIONS).and_then(Value::as_mapping)
    }
}

/// Join a dotted field location.
pub(crate) fn child_field(parent: &str, key: &str) -> String {
    match (parent.is_empty(), key.is_empty()) {
        (true, _) => key.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}.{key}"),
    }
}

/// Render a mapping key for use in a field location.
pub(crate) fn key_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "~".to_string(),
        other => format!("{other:?}"),
    }
}
