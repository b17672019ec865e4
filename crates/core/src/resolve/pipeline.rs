//! The full resolution of one document.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::{debug, info};

use super::context::ResolveContext;
use super::errors::{Diagnostic, ResolveError};
use super::expand::{VariableInstance, VariableTemplate, instantiate_variable};
use super::inherit::{DefaultLayer, apply_defaults, inherited_parameters};
use super::merge::resolve_merges;
use super::validate::{NameRegistry, check_required};
use crate::config::ResolvedConfig;
use crate::document::keys::{
    COMMON, DATASET, DEFINITIONS, DESCRIPTION, PARAMETERS, TABLES, TITLE, VARIABLES,
};
use crate::document::types::{child_field, key_label};
use crate::document::{
    self, DatasetMeta, MetadataDocument, ResolvedDataset, ResolvedTable, VariableRecord,
};
use crate::params::ParamsMap;
use crate::templates::Strictness;

/// Settings that apply to every document resolved with them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub strictness: Strictness,
    /// Known enumerations supplied from outside the document. Any level
    /// inside the document overrides these.
    pub parameters: ParamsMap,
}

impl ResolveOptions {
    pub fn from_config(cfg: &ResolvedConfig) -> Self {
        Self {
            strictness: if cfg.strict { Strictness::Strict } else { Strictness::Lenient },
            parameters: ParamsMap::from(cfg.parameters.clone()),
        }
    }
}

/// A resolved document with the warnings recorded on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub dataset: ResolvedDataset,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    /// Load a document from disk and resolve it.
    pub fn resolve_path(&self, path: &Path) -> Result<Resolution, ResolveError> {
        let doc = document::load(path)?;
        self.resolve(&doc)
    }

    /// Run merges, template expansion, defaulting and validation, in that
    /// order.
    pub fn resolve(&self, doc: &MetadataDocument) -> Result<Resolution, ResolveError> {
        let path = doc.path();
        debug!(path = %path.display(), "resolving merges");
        let merged = resolve_merges(doc)?;
        let root = merged
            .mapping()
            .ok_or_else(|| ResolveError::schema(path, "", "document must be a mapping"))?;

        let dataset = match root.get(DATASET) {
            Some(value) => {
                let value = string_keys(value, DATASET, path)?;
                Some(typed::<DatasetMeta>(&value, DATASET, path)?)
            }
            None => None,
        };

        let mut parameters = self.options.parameters.clone();
        let mut dataset_layer = None;
        if let Some(definitions) = merged.definitions() {
            if let Some(own) = definitions.get(PARAMETERS) {
                let field = child_field(DEFINITIONS, PARAMETERS);
                parameters = parameters.overlay(&params_at(own, &field, path)?);
            }
            if let Some(common) = definitions.get(COMMON) {
                let field = child_field(DEFINITIONS, COMMON);
                dataset_layer = Some(DefaultLayer::compile(common, field, path)?);
            }
        }

        let tables = root
            .get(TABLES)
            .ok_or_else(|| ResolveError::schema(path, TABLES, "document has no tables"))?
            .as_mapping()
            .ok_or_else(|| {
                ResolveError::schema(path, TABLES, "expected a mapping of table name to table")
            })?;

        let mut ctx = ResolveContext::new(path, self.options.strictness);
        let mut resolved = Vec::with_capacity(tables.len());
        for (key, table) in tables {
            let Some(name) = key.as_str() else {
                return Err(ResolveError::schema(
                    path,
                    child_field(TABLES, &key_label(key)),
                    "table name must be a string",
                ));
            };
            resolved.push(resolve_table(name, table, &parameters, dataset_layer.as_ref(), &mut ctx)?);
        }

        let dataset = ResolvedDataset { path: path.to_path_buf(), dataset, tables: resolved };
        let diagnostics = ctx.into_diagnostics();
        info!(
            path = %path.display(),
            tables = dataset.tables.len(),
            records = dataset.record_count(),
            warnings = diagnostics.len(),
            "resolved document"
        );
        Ok(Resolution { dataset, diagnostics })
    }
}

/// Resolve one document with `options`.
pub fn resolve_document(
    doc: &MetadataDocument,
    options: &ResolveOptions,
) -> Result<Resolution, ResolveError> {
    Resolver::new(options.clone()).resolve(doc)
}

fn resolve_table(
    name: &str,
    table: &Value,
    inherited: &ParamsMap,
    dataset_layer: Option<&DefaultLayer>,
    ctx: &mut ResolveContext<'_>,
) -> Result<ResolvedTable, ResolveError> {
    let path = ctx.path;
    let field = child_field(TABLES, name);
    let table = table
        .as_mapping()
        .ok_or_else(|| ResolveError::schema(path, &field, "table must be a mapping"))?;

    let parameters = match table.get(PARAMETERS) {
        Some(own) => inherited.overlay(&params_at(own, &child_field(&field, PARAMETERS), path)?),
        None => inherited.clone(),
    };
    let table_layer = table
        .get(COMMON)
        .map(|common| DefaultLayer::compile(common, child_field(&field, COMMON), path))
        .transpose()?;
    let layers: Vec<&DefaultLayer> = dataset_layer.into_iter().chain(table_layer.as_ref()).collect();

    let variables_field = child_field(&field, VARIABLES);
    let variables = table
        .get(VARIABLES)
        .ok_or_else(|| ResolveError::schema(path, &field, "table has no variables"))?
        .as_mapping()
        .ok_or_else(|| {
            ResolveError::schema(
                path,
                &variables_field,
                "expected a mapping of variable name to definition",
            )
        })?;

    debug!(table = name, variables = variables.len(), "expanding table");
    let mut names = NameRegistry::new(name);
    let mut records = Vec::new();
    for (key, definition) in variables {
        let Some(key) = key.as_str() else {
            return Err(ResolveError::schema(
                path,
                child_field(&variables_field, &key_label(key)),
                "variable name must be a string",
            ));
        };
        let template = VariableTemplate::compile(
            key,
            definition,
            &parameters,
            child_field(&variables_field, key),
            path,
        )?;
        let inherits = inherited_parameters(&layers, &template.source);
        for bindings in template.bindings(&inherits) {
            let instance = instantiate_variable(&template, &bindings, ctx)?;
            let body = apply_defaults(&instance.body, &layers, &instance.bindings, ctx)?;
            check_required(&body, &instance.field, path)?;
            names.claim(&instance.short_name, &instance.field, path)?;
            records.push(into_record(name, instance, body, path)?);
        }
    }

    Ok(ResolvedTable {
        name: name.to_string(),
        title: table.get(TITLE).and_then(Value::as_str).map(str::to_string),
        description: table.get(DESCRIPTION).and_then(Value::as_str).map(str::to_string),
        variables: records,
    })
}

fn into_record(
    table: &str,
    instance: VariableInstance,
    mut body: Value,
    path: &Path,
) -> Result<VariableRecord, ResolveError> {
    if let Value::Mapping(map) = &mut body {
        strip_reserved(map);
    }
    let body = string_keys(&body, &instance.field, path)?;
    let mut record: VariableRecord = typed(&body, &instance.field, path)?;
    record.short_name = instance.short_name;
    record.table = table.to_string();
    record.bindings = instance.bindings;
    Ok(record)
}

/// Keys the resolver sets itself; authored values for them are dropped.
fn strip_reserved(map: &mut Mapping) {
    for key in ["short_name", "table", "bindings"] {
        map.remove(key);
    }
}

/// Copy of `value` with every scalar mapping key written as a string, so
/// the output reads back the same from YAML and JSON.
fn string_keys(value: &Value, field: &str, path: &Path) -> Result<Value, ResolveError> {
    match value {
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (k, v) in map {
                let label = key_label(k);
                let child = child_field(field, &label);
                let key = match k {
                    Value::String(_) => k.clone(),
                    Value::Bool(_) | Value::Number(_) => Value::String(label),
                    Value::Null => Value::String("null".into()),
                    _ => {
                        return Err(ResolveError::schema(path, child, "mapping keys must be scalars"));
                    }
                };
                out.insert(key, string_keys(v, &child, path)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| string_keys(v, &format!("{field}[{i}]"), path))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        other => Ok(other.clone()),
    }
}

fn typed<T: DeserializeOwned>(value: &Value, field: &str, path: &Path) -> Result<T, ResolveError> {
    serde_yaml::from_value(value.clone()).map_err(|source| ResolveError::InvalidRecord {
        path: path.to_path_buf(),
        field: field.to_string(),
        source,
    })
}

fn params_at(value: &Value, field: &str, path: &Path) -> Result<ParamsMap, ResolveError> {
    ParamsMap::from_yaml(value).map_err(|source| ResolveError::InvalidRecord {
        path: path.to_path_buf(),
        field: field.to_string(),
        source,
    })
}
