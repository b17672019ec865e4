//! Dataset and table defaults applied under each variable.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::path::Path;

use super::context::ResolveContext;
use super::errors::ResolveError;
use crate::document::types::child_field;
use crate::templates::{Bindings, TemplatedValue};

/// A `common` block compiled for rendering against each instance.
#[derive(Debug, Clone)]
pub struct DefaultLayer {
    pub field: String,
    /// The block as written, used to tell which leaves a later layer hides.
    pub source: Value,
    pub value: TemplatedValue,
}

impl DefaultLayer {
    pub fn compile(value: &Value, field: String, path: &Path) -> Result<Self, ResolveError> {
        if !matches!(value, Value::Mapping(_) | Value::Null) {
            return Err(ResolveError::schema(path, field, "common defaults must be a mapping"));
        }
        let compiled = TemplatedValue::compile(value)
            .map_err(|e| ResolveError::template(path, child_field(&field, &e.field), e.source))?;
        Ok(Self { field, source: value.clone(), value: compiled })
    }
}

/// Parameters that `layers` would still render once `body` and every more
/// specific layer are merged over them.
pub fn inherited_parameters(layers: &[&DefaultLayer], body: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for (i, layer) in layers.iter().enumerate() {
        let masks: Vec<&Value> = std::iter::once(body)
            .chain(layers[i + 1..].iter().map(|l| &l.source).filter(|v| !v.is_null()))
            .collect();
        out.extend(layer.value.exposed_parameters(&masks));
    }
    out
}

/// Layer `overlay` on top of `base`.
///
/// Mappings merge key by key, recursively; anything else in `overlay`
/// replaces what `base` had, sequences included.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            let mut out = Mapping::with_capacity(base.len().max(overlay.len()));
            for (k, v) in base {
                let merged = match overlay.get(k) {
                    Some(o) => deep_merge(v, o),
                    None => v.clone(),
                };
                out.insert(k.clone(), merged);
            }
            for (k, v) in overlay {
                if !base.contains_key(k) {
                    out.insert(k.clone(), v.clone());
                }
            }
            Value::Mapping(out)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Fill in what `body` leaves unset from `layers`, least specific first.
///
/// Each layer is rendered with the instance's bindings, so shared text can
/// mention the parameters of the variable it ends up in.
pub fn apply_defaults(
    body: &Value,
    layers: &[&DefaultLayer],
    bindings: &Bindings,
    ctx: &mut ResolveContext<'_>,
) -> Result<Value, ResolveError> {
    let mut merged = Value::Mapping(Mapping::new());
    for layer in layers {
        let rendered = ctx.render(&layer.value, bindings, &layer.field)?;
        if !rendered.is_null() {
            merged = deep_merge(&merged, &rendered);
        }
    }
    Ok(deep_merge(&merged, body))
}
