//! Error and diagnostic types for document resolution.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::DocumentError;
use crate::templates::{RenderWarning, TemplateError};

/// Errors that abort the resolution of a document.
///
/// Every variant names the document and the dotted field location it was
/// found at.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A merge references a fragment that `definitions` does not contain.
    #[error("{}: unknown alias '{alias}' referenced at {field}", .path.display())]
    UnknownAlias { path: PathBuf, field: String, alias: String },

    /// Named fragments reference each other in a loop.
    #[error("{}: cyclic alias {} referenced at {field}", .path.display(), .chain.join(" -> "))]
    CyclicAlias { path: PathBuf, field: String, chain: Vec<String> },

    /// A template needs a parameter that is neither bound nor defaulted.
    #[error("{}: unbound parameter '{parameter}' in {field}", .path.display())]
    UnboundParameter { path: PathBuf, field: String, parameter: String },

    /// Two expansions produced the same short name in one table.
    #[error("{}: duplicate variable '{name}' in table '{table}' (from {field})", .path.display())]
    DuplicateVariableName { path: PathBuf, field: String, table: String, name: String },

    /// A required field is missing or empty after resolution.
    #[error("{}: missing required field {field}", .path.display())]
    MissingField { path: PathBuf, field: String },

    /// A `<<` merge value that is not a mapping, name or list of those.
    #[error("{}: invalid merge at {field}: {message}", .path.display())]
    InvalidMerge { path: PathBuf, field: String, message: String },

    #[error("{}: template error in {field}: {source}", .path.display())]
    Template {
        path: PathBuf,
        field: String,
        #[source]
        source: TemplateError,
    },

    /// The document does not have the expected shape.
    #[error("{}: {field}: {message}", .path.display())]
    Schema { path: PathBuf, field: String, message: String },

    /// A resolved field has the wrong type for the record.
    #[error("{}: invalid value in {field}: {source}", .path.display())]
    InvalidRecord {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl ResolveError {
    /// Lift a template error to a located resolve error.
    pub(crate) fn template(path: &Path, field: String, source: TemplateError) -> Self {
        match source {
            TemplateError::UnboundParameter(parameter) => {
                ResolveError::UnboundParameter { path: path.to_path_buf(), field, parameter }
            }
            source => ResolveError::Template { path: path.to_path_buf(), field, source },
        }
    }

    pub(crate) fn schema(path: &Path, field: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::Schema {
            path: path.to_path_buf(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// The dotted field location, when the error has one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ResolveError::UnknownAlias { field, .. }
            | ResolveError::CyclicAlias { field, .. }
            | ResolveError::UnboundParameter { field, .. }
            | ResolveError::DuplicateVariableName { field, .. }
            | ResolveError::MissingField { field, .. }
            | ResolveError::InvalidMerge { field, .. }
            | ResolveError::Template { field, .. }
            | ResolveError::Schema { field, .. }
            | ResolveError::InvalidRecord { field, .. } => Some(field),
            ResolveError::Document(_) => None,
        }
    }
}

/// A non-fatal finding recorded while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub field: String,
    pub warning: RenderWarning,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.path.display(), self.field, self.warning)
    }
}
