//! Invariants every resolved record must satisfy.

use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;

use super::errors::ResolveError;
use crate::document::keys::{TITLE, UNIT};
use crate::document::types::child_field;

/// Fields that must be present and non-empty on every record.
pub const REQUIRED_FIELDS: &[&str] = &[TITLE, UNIT];

/// Check that the resolved `body` has a non-empty string in every
/// required field.
pub fn check_required(body: &Value, field: &str, path: &Path) -> Result<(), ResolveError> {
    for key in REQUIRED_FIELDS {
        let present = body
            .get(*key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !present {
            return Err(ResolveError::MissingField {
                path: path.to_path_buf(),
                field: child_field(field, key),
            });
        }
    }
    Ok(())
}

/// Short names already taken in one table.
#[derive(Debug)]
pub struct NameRegistry {
    table: String,
    seen: HashMap<String, String>,
}

impl NameRegistry {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), seen: HashMap::new() }
    }

    /// Claim `name` for the definition at `field`.
    pub fn claim(&mut self, name: &str, field: &str, path: &Path) -> Result<(), ResolveError> {
        if let Some(first) = self.seen.get(name) {
            return Err(ResolveError::DuplicateVariableName {
                path: path.to_path_buf(),
                field: format!("{field} (first defined at {first})"),
                table: self.table.clone(),
                name: name.to_string(),
            });
        }
        self.seen.insert(name.to_string(), field.to_string());
        Ok(())
    }
}
