use std::path::PathBuf;
use thiserror::Error;

use crate::document::{DocumentError, MetadataDocument};

/// A metadata document found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Path relative to the catalog root, without the metadata suffix.
    pub logical_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub logical_name: String,
    pub document: MetadataDocument,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("metadata directory does not exist: {0}")]
    MissingDir(String),

    #[error("failed to read metadata directory {0}: {1}")]
    WalkError(String, #[source] walkdir::Error),

    #[error("metadata document not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}
