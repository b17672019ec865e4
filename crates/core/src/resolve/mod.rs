//! Turning a metadata document into concrete variable records.
//!
//! Resolution runs in fixed order for each document:
//! 1. [`resolve_merges`] copies shared fragments into every `<<` that uses them
//! 2. each variable is instantiated once per binding of the enumerated
//!    parameters it mentions, directly or through the `common` text it
//!    inherits ([`instantiate_variable`])
//! 3. dataset and table `common` blocks fill in what a variable leaves unset
//! 4. every record is checked for a title, a unit and a unique short name

pub mod context;
pub mod errors;
pub mod expand;
pub mod graph;
pub mod inherit;
pub mod merge;
pub mod pipeline;
pub mod validate;

pub use context::ResolveContext;
pub use errors::{Diagnostic, ResolveError};
pub use expand::{VariableInstance, VariableTemplate, instantiate_variable};
pub use graph::AliasGraph;
pub use inherit::{DefaultLayer, apply_defaults, deep_merge, inherited_parameters};
pub use merge::resolve_merges;
pub use pipeline::{Resolution, ResolveOptions, Resolver, resolve_document};
pub use validate::{NameRegistry, check_required};
