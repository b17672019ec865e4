//! Serialization of resolved output.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Serialize any resolved value in the requested format.
pub fn serialize<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
) -> Result<String, SerializeError> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(value)?;
            s.push('\n');
            Ok(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::record::VariableRecord;

    #[test]
    fn yaml_omits_empty_fields() {
        let rec = VariableRecord {
            short_name: "cases".into(),
            table: "covid".into(),
            title: "Cases".into(),
            unit: "cases".into(),
            ..Default::default()
        };
        let out = serialize(&rec, OutputFormat::Yaml).unwrap();
        assert!(out.contains("short_name: cases"));
        assert!(!out.contains("bindings"));
        assert!(!out.contains("display"));
    }

    #[test]
    fn json_is_pretty_printed() {
        let rec = VariableRecord {
            title: "Cases".into(),
            unit: "cases".into(),
            ..Default::default()
        };
        let out = serialize(&rec, OutputFormat::Json).unwrap();
        assert!(out.contains("\n  \"title\": \"Cases\""));
        assert!(out.ends_with('\n'));
    }
}
