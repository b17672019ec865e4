//! Fully resolved dataset, table and variable records.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Dataset-level metadata: title, description, cadence and citations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Expected number of days between updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_period_days: Option<u32>,
    #[serde(default, alias = "origins", skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A source citation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_by: Option<String>,
    #[serde(default, alias = "url_main", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_accessed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Chart and table display hints. Keys keep the camelCase used by the
/// visualisation side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_decimal_places: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_is_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_projection: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_in_table: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Presentation hints for the published indicator page and charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_public: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution_short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_tags: Vec<String>,
    /// Chart title/subtitle, map color scale and similar grapher settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grapher_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faqs: Vec<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The fully resolved description of one published indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub table: String,
    pub title: String,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_short: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_processing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplaySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
    /// Parameter values this record was instantiated with.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variables: Vec<VariableRecord>,
}

impl ResolvedTable {
    pub fn get(&self, short_name: &str) -> Option<&VariableRecord> {
        self.variables.iter().find(|v| v.short_name == short_name)
    }
}

/// Output of resolving one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDataset {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<DatasetMeta>,
    #[serde(default)]
    pub tables: Vec<ResolvedTable>,
}

impl ResolvedDataset {
    pub fn table(&self, name: &str) -> Option<&ResolvedTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// All variable records, table by table.
    pub fn records(&self) -> impl Iterator<Item = &VariableRecord> {
        self.tables.iter().flat_map(|t| t.variables.iter())
    }

    pub fn record_count(&self) -> usize {
        self.tables.iter().map(|t| t.variables.len()).sum()
    }
}
