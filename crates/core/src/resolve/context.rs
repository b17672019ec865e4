use std::path::Path;

use serde_yaml::Value;
use tracing::warn;

use super::errors::{Diagnostic, ResolveError};
use crate::document::types::child_field;
use crate::templates::{Bindings, RenderWarning, Strictness, Template, TemplatedValue};

/// Per-document state shared by the expansion and defaulting passes.
#[derive(Debug)]
pub struct ResolveContext<'a> {
    pub path: &'a Path,
    pub strictness: Strictness,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(path: &'a Path, strictness: Strictness) -> Self {
        Self { path, strictness, diagnostics: Vec::new() }
    }

    /// Render a compiled tree located at `field`.
    pub fn render(
        &mut self,
        value: &TemplatedValue,
        bindings: &Bindings,
        field: &str,
    ) -> Result<Value, ResolveError> {
        let mut warnings = Vec::new();
        let rendered = value.render(bindings, self.strictness, &mut warnings).map_err(|e| {
            ResolveError::template(self.path, child_field(field, &e.field), e.source)
        })?;
        for (relative, warning) in warnings {
            self.record(child_field(field, &relative), warning);
        }
        Ok(rendered)
    }

    /// Render a variable key into a short name.
    pub fn render_name(
        &mut self,
        template: &Template,
        bindings: &Bindings,
        field: &str,
    ) -> Result<String, ResolveError> {
        let rendered = template
            .render_name(bindings, self.strictness)
            .map_err(|e| ResolveError::template(self.path, field.to_string(), e))?;
        for warning in rendered.warnings {
            self.record(field.to_string(), warning);
        }
        Ok(rendered.text)
    }

    fn record(&mut self, field: String, warning: RenderWarning) {
        warn!(path = %self.path.display(), field = %field, "{warning}");
        self.diagnostics.push(Diagnostic { path: self.path.to_path_buf(), field, warning });
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
