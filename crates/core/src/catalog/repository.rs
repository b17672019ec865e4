use std::path::{Path, PathBuf};

use super::discovery::{discover_documents, is_metadata_file};
use super::types::{CatalogError, DocumentInfo, LoadedDocument};
use crate::document;

/// The metadata documents under one directory.
pub struct Catalog {
    pub root: PathBuf,
    pub documents: Vec<DocumentInfo>,
}

impl Catalog {
    /// Scan `root` for metadata documents.
    pub fn new(root: &Path) -> Result<Self, CatalogError> {
        let documents = discover_documents(root)?;
        Ok(Self { root: root.to_path_buf(), documents })
    }

    pub fn list_all(&self) -> &[DocumentInfo] {
        &self.documents
    }

    pub fn find(&self, name: &str) -> Option<&DocumentInfo> {
        self.documents.iter().find(|d| d.logical_name == name)
    }

    /// Load a document by its logical name.
    pub fn get_by_name(&self, name: &str) -> Result<LoadedDocument, CatalogError> {
        let info = self.find(name).ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        let document = document::load(&info.path)?;
        Ok(LoadedDocument { logical_name: info.logical_name.clone(), document })
    }
}

/// Turn a command-line document argument into a file path.
///
/// An existing file is used as is; anything else is looked up by logical
/// name under `root`.
pub fn locate(target: &str, root: &Path) -> Result<PathBuf, CatalogError> {
    let as_path = Path::new(target);
    if as_path.is_file() {
        return Ok(as_path.to_path_buf());
    }
    let candidate = root.join(target);
    if candidate.is_file() && is_metadata_file(&candidate) {
        return Ok(candidate);
    }
    let catalog = Catalog::new(root)?;
    catalog
        .find(target)
        .map(|info| info.path.clone())
        .ok_or_else(|| CatalogError::NotFound(target.to_string()))
}
