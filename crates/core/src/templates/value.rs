//! YAML trees whose string leaves are templates.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use thiserror::Error;

use super::engine::{Bindings, RenderWarning, Strictness, Template, TemplateError};
use super::parser::has_tags;
use crate::document::types::{child_field, key_label};

/// A template error located at a field inside a value tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {source}")]
pub struct FieldError {
    /// Dotted location relative to the compiled root.
    pub field: String,
    #[source]
    pub source: TemplateError,
}

/// A YAML value with every templated string leaf parsed up front, so it can
/// be rendered once per binding without re-parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatedValue {
    /// Subtree without any template tags.
    Static(Value),
    Text(Template),
    Mapping(Vec<(Value, TemplatedValue)>),
    Sequence(Vec<TemplatedValue>),
}

impl TemplatedValue {
    pub fn compile(value: &Value) -> Result<Self, FieldError> {
        Self::compile_at(value, "")
    }

    fn compile_at(value: &Value, field: &str) -> Result<Self, FieldError> {
        match value {
            Value::String(s) if has_tags(s) => Template::parse(s)
                .map(TemplatedValue::Text)
                .map_err(|source| FieldError { field: field.to_string(), source }),
            Value::Mapping(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (k, v) in map {
                    let child = child_field(field, &key_label(k));
                    entries.push((k.clone(), Self::compile_at(v, &child)?));
                }
                if entries.iter().all(|(_, v)| matches!(v, TemplatedValue::Static(_))) {
                    Ok(TemplatedValue::Static(value.clone()))
                } else {
                    Ok(TemplatedValue::Mapping(entries))
                }
            }
            Value::Sequence(seq) => {
                let items = seq
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Self::compile_at(v, &format!("{field}[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?;
                if items.iter().all(|v| matches!(v, TemplatedValue::Static(_))) {
                    Ok(TemplatedValue::Static(value.clone()))
                } else {
                    Ok(TemplatedValue::Sequence(items))
                }
            }
            // Numbers, bools, null and plain strings pass through unchanged
            _ => Ok(TemplatedValue::Static(value.clone())),
        }
    }

    /// Parameter names referenced anywhere in the tree.
    pub fn parameters(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_parameters(&mut out);
        out
    }

    fn collect_parameters(&self, out: &mut BTreeSet<String>) {
        match self {
            TemplatedValue::Static(_) => {}
            TemplatedValue::Text(t) => out.extend(t.parameters()),
            TemplatedValue::Mapping(entries) => {
                for (_, v) in entries {
                    v.collect_parameters(out);
                }
            }
            TemplatedValue::Sequence(items) => {
                for v in items {
                    v.collect_parameters(out);
                }
            }
        }
    }

    /// Parameters referenced by leaves that survive once each of `masks` has
    /// been deep-merged on top of this tree. A mask replaces any subtree it
    /// sets to something other than a mapping.
    pub fn exposed_parameters(&self, masks: &[&Value]) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_exposed(masks, &mut out);
        out
    }

    fn collect_exposed(&self, masks: &[&Value], out: &mut BTreeSet<String>) {
        if masks.is_empty() {
            self.collect_parameters(out);
            return;
        }
        if !masks.iter().all(|m| m.is_mapping()) {
            return;
        }
        if let TemplatedValue::Mapping(entries) = self {
            for (key, value) in entries {
                let children: Vec<&Value> = masks
                    .iter()
                    .filter_map(|m| m.as_mapping().and_then(|map| map.get(key)))
                    .collect();
                value.collect_exposed(&children, out);
            }
        }
    }

    /// Render every template leaf. Warnings are appended with their field.
    pub fn render(
        &self,
        bindings: &Bindings,
        strictness: Strictness,
        warnings: &mut Vec<(String, RenderWarning)>,
    ) -> Result<Value, FieldError> {
        self.render_at("", bindings, strictness, warnings)
    }

    fn render_at(
        &self,
        field: &str,
        bindings: &Bindings,
        strictness: Strictness,
        warnings: &mut Vec<(String, RenderWarning)>,
    ) -> Result<Value, FieldError> {
        match self {
            TemplatedValue::Static(v) => Ok(v.clone()),
            TemplatedValue::Text(t) => {
                let rendered = t
                    .render(bindings, strictness)
                    .map_err(|source| FieldError { field: field.to_string(), source })?;
                warnings.extend(rendered.warnings.into_iter().map(|w| (field.to_string(), w)));
                Ok(Value::String(rendered.text))
            }
            TemplatedValue::Mapping(entries) => {
                let mut out = Mapping::with_capacity(entries.len());
                for (k, v) in entries {
                    let child = child_field(field, &key_label(k));
                    out.insert(k.clone(), v.render_at(&child, bindings, strictness, warnings)?);
                }
                Ok(Value::Mapping(out))
            }
            TemplatedValue::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, v) in items.iter().enumerate() {
                    let child = format!("{field}[{i}]");
                    out.push(v.render_at(&child, bindings, strictness, warnings)?);
                }
                Ok(Value::Sequence(out))
            }
        }
    }
}
