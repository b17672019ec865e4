//! Discovery of metadata documents under a directory.

pub mod discovery;
pub mod repository;
pub mod types;

pub use discovery::{METADATA_SUFFIXES, discover_documents};
pub use repository::{Catalog, locate};
pub use types::{CatalogError, DocumentInfo, LoadedDocument};
