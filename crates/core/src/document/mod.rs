//! Metadata documents: loading raw YAML and the resolved record types.
//!
//! This module provides functionality to:
//! - Parse a `*.meta.yml` document into a raw YAML tree
//! - Describe the fully resolved dataset/table/variable records
//! - Serialize resolved output back to YAML or JSON

pub mod parser;
pub mod record;
pub mod serializer;
pub mod types;

pub use parser::{DocumentError, load, parse};
pub use record::{
    DatasetMeta, DisplaySettings, Presentation, ResolvedDataset, ResolvedTable, Source,
    VariableRecord,
};
pub use serializer::{OutputFormat, SerializeError, serialize};
pub use types::{MetadataDocument, keys};
