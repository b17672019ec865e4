//! Resolution of shorthand YAML metadata into concrete variable records.

pub mod catalog;
pub mod config;
pub mod document;
pub mod params;
pub mod resolve;
pub mod templates;

pub use catalog::{Catalog, CatalogError, DocumentInfo, discover_documents};
pub use config::{ConfigError, ConfigLoader, ResolvedConfig};
pub use document::{MetadataDocument, ResolvedDataset, VariableRecord};
pub use resolve::{
    Diagnostic, Resolution, ResolveError, ResolveOptions, Resolver, instantiate_variable,
    resolve_document, resolve_merges,
};
pub use templates::{Bindings, Strictness, Template, TemplateError, expand_template};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
