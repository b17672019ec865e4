//! Parameter specification types.

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::templates::Bindings;

/// Specification for a single parameter.
///
/// Parameters can be specified in two forms in YAML:
///
/// Simple form (just the values):
/// ```yaml
/// parameters:
///   age_group: ["0-17", "18-64", "65+"]
/// ```
///
/// Full form (with metadata):
/// ```yaml
/// parameters:
///   variant:
///     values: [Alpha, Delta, Omicron]
///     description: SARS-CoV-2 variant of concern
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamSpec {
    /// Simple form: just the values
    Simple(Vec<ParamValue>),
    /// Full form: detailed metadata
    Full(ParamMetadata),
}

/// Full metadata for a parameter specification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParamMetadata {
    #[serde(default)]
    pub values: Vec<ParamValue>,

    /// Longer description for help text.
    pub description: Option<String>,
}

/// A scalar parameter value. Numbers and booleans are accepted so that
/// `year: [2020, 2021]` does not need quoting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_string(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Bool(b) => b.to_string(),
        }
    }
}

impl ParamSpec {
    /// The enumerated values, as strings, in declaration order.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        let raw = match self {
            ParamSpec::Simple(v) => v,
            ParamSpec::Full(m) => &m.values,
        };
        raw.iter().map(ParamValue::as_string).collect()
    }
}

/// Parameter name to its enumerated values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamsMap(BTreeMap<String, Vec<String>>);

impl ParamsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `parameters:` block.
    pub fn from_yaml(value: &Value) -> Result<Self, serde_yaml::Error> {
        let specs: BTreeMap<String, ParamSpec> = serde_yaml::from_value(value.clone())?;
        Ok(Self(specs.into_iter().map(|(k, spec)| (k, spec.values())).collect()))
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.0.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// A copy of `self` with every parameter in `more_specific` replacing
    /// the one of the same name.
    #[must_use]
    pub fn overlay(&self, more_specific: &ParamsMap) -> ParamsMap {
        let mut merged = self.0.clone();
        for (k, v) in &more_specific.0 {
            merged.insert(k.clone(), v.clone());
        }
        ParamsMap(merged)
    }
}

impl From<BTreeMap<String, Vec<String>>> for ParamsMap {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Vec<String>)> for ParamsMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Every combination of the given parameters' values.
///
/// Parameters are taken in name order, the first one varying slowest; value
/// order within a parameter is preserved. No parameters yields a single empty
/// binding; a parameter with no values yields no bindings at all.
pub fn cartesian_product(names: &[&str], params: &ParamsMap) -> Vec<Bindings> {
    let mut combos = vec![Bindings::new()];
    for name in names {
        let values = params.get(name).unwrap_or_default();
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in values {
                let mut b = combo.clone();
                b.insert((*name).to_string(), value.clone());
                next.push(b);
            }
        }
        combos = next;
    }
    combos
}
