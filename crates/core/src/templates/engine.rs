use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;
use tracing::warn;

use super::ast::{Condition, Filter, Node};
use super::parser;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("unbound template parameter '{0}'")]
    UnboundParameter(String),
}

impl TemplateError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax { offset, message: message.into() }
    }
}

/// Parameter values a template is rendered with.
pub type Bindings = BTreeMap<String, String>;

/// What to do when a template needs a parameter that is not bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Fail with [`TemplateError::UnboundParameter`].
    #[default]
    Strict,
    /// Substitute an empty string and record a [`RenderWarning`].
    Lenient,
}

/// Non-fatal findings while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderWarning {
    /// A conditional without `else` matched none of its branches, so it
    /// contributed nothing to the output.
    UnmatchedConditional { condition: String },
    /// Lenient mode substituted an empty string for an unbound parameter.
    UnboundParameter { name: String },
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::UnmatchedConditional { condition } => write!(
                f,
                "no branch matched `{condition}` and there is no `else`; rendered as empty text"
            ),
            RenderWarning::UnboundParameter { name } => {
                write!(f, "parameter '{name}' is unbound; rendered as empty text")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered {
    pub text: String,
    pub warnings: Vec<RenderWarning>,
}

/// A parsed template, ready to render against any number of bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self { source: source.to_string(), nodes: parser::parse(source)? })
    }

    /// True when rendering can never differ from the source text.
    pub fn is_static(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Text(_)))
    }

    /// Every parameter name the template mentions, in substitutions or
    /// conditions.
    pub fn parameters(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        Node::collect_parameters(&self.nodes, &mut out);
        out
    }

    pub fn render(
        &self,
        bindings: &Bindings,
        strictness: Strictness,
    ) -> Result<Rendered, TemplateError> {
        self.render_with(bindings, strictness, false)
    }

    /// Render as an identifier: conditions see the bound values as given,
    /// while every substituted value is written in short-name form.
    pub fn render_name(
        &self,
        bindings: &Bindings,
        strictness: Strictness,
    ) -> Result<Rendered, TemplateError> {
        self.render_with(bindings, strictness, true)
    }

    fn render_with(
        &self,
        bindings: &Bindings,
        strictness: Strictness,
        name_form: bool,
    ) -> Result<Rendered, TemplateError> {
        let mut state = RenderState { bindings, strictness, name_form, warnings: Vec::new() };
        let mut text = String::with_capacity(self.source.len());
        state.render_nodes(&self.nodes, &mut text)?;
        Ok(Rendered { text, warnings: state.warnings })
    }
}

/// Expand a template string against `parameters`.
///
/// Unbound parameters without a `default(...)` filter are an error.
/// Conditionals that match no branch and have no `else` expand to nothing;
/// that case is logged as a warning.
pub fn expand_template(
    template: &str,
    parameters: &Bindings,
) -> Result<String, TemplateError> {
    let rendered = Template::parse(template)?.render(parameters, Strictness::Strict)?;
    for warning in &rendered.warnings {
        warn!(template, "{warning}");
    }
    Ok(rendered.text)
}

struct RenderState<'a> {
    bindings: &'a Bindings,
    strictness: Strictness,
    name_form: bool,
    warnings: Vec<RenderWarning>,
}

impl<'a> RenderState<'a> {
    fn render_nodes(&mut self, nodes: &[Node], out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Param { name, filters } => {
                    let mut value = self.bindings.get(name).cloned();
                    for filter in filters {
                        value = match (filter, value) {
                            (Filter::Default(fallback), None) => Some(fallback.clone()),
                            (_, None) => None,
                            (f, Some(v)) => Some(apply_filter(&v, f)),
                        };
                    }
                    match value {
                        Some(v) if self.name_form => out.push_str(&underscore(&v)),
                        Some(v) => out.push_str(&v),
                        None => self.unbound(name)?,
                    }
                }
                Node::Conditional { branches, otherwise } => {
                    let mut matched = false;
                    for branch in branches {
                        if self.eval(&branch.condition)? {
                            self.render_nodes(&branch.body, out)?;
                            matched = true;
                            break;
                        }
                    }
                    if !matched {
                        match otherwise {
                            Some(body) => self.render_nodes(body, out)?,
                            None => {
                                let condition = branches
                                    .iter()
                                    .map(|b| b.condition.to_string())
                                    .collect::<Vec<_>>()
                                    .join(" / ");
                                self.warnings
                                    .push(RenderWarning::UnmatchedConditional { condition });
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn unbound(&mut self, name: &str) -> Result<(), TemplateError> {
        match self.strictness {
            Strictness::Strict => Err(TemplateError::UnboundParameter(name.to_string())),
            Strictness::Lenient => {
                let warning = RenderWarning::UnboundParameter { name: name.to_string() };
                if !self.warnings.contains(&warning) {
                    self.warnings.push(warning);
                }
                Ok(())
            }
        }
    }

    /// Value for a comparison; `None` when unbound (after reporting it).
    fn lookup(&mut self, name: &str) -> Result<Option<&'a str>, TemplateError> {
        let bindings = self.bindings;
        match bindings.get(name) {
            Some(v) => Ok(Some(v.as_str())),
            None => {
                self.unbound(name)?;
                Ok(None)
            }
        }
    }

    fn eval(&mut self, cond: &Condition) -> Result<bool, TemplateError> {
        Ok(match cond {
            Condition::Defined(n) => self.bindings.contains_key(n),
            Condition::Truthy(n) => self.bindings.get(n).is_some_and(|v| !v.is_empty()),
            Condition::Eq(n, lit) => self.lookup(n)? == Some(lit.as_str()),
            Condition::Ne(n, lit) => self.lookup(n)? != Some(lit.as_str()),
            Condition::In(n, lits) => {
                self.lookup(n)?.is_some_and(|v| lits.iter().any(|l| l == v))
            }
            Condition::Not(c) => !self.eval(c)?,
            Condition::And(a, b) => self.eval(a)? && self.eval(b)?,
            Condition::Or(a, b) => self.eval(a)? || self.eval(b)?,
        })
    }
}

/// Apply a filter to a value.
fn apply_filter(value: &str, filter: &Filter) -> String {
    match filter {
        Filter::Default(_) => value.to_string(),
        Filter::Lower => value.to_lowercase(),
        Filter::Upper => value.to_uppercase(),
        Filter::Trim => value.trim().to_string(),
        Filter::Title => title_case(value),
        Filter::Underscore => underscore(value),
    }
}

fn title_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }
    result
}

/// Convert a string to short-name form.
///
/// - Converts to lowercase
/// - Replaces `%` with `pct` and `+` with `plus`
/// - Replaces every other run of non-alphanumeric characters with `_`
/// - Trims leading/trailing underscores
pub fn underscore(s: &str) -> String {
    fn push_word(result: &mut String, word: &str) {
        if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
        result.push_str(word);
        result.push('_');
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
        } else if c == '%' {
            push_word(&mut result, "pct");
        } else if c == '+' {
            push_word(&mut result, "plus");
        } else if !result.ends_with('_') {
            result.push('_');
        }
    }

    result.trim_matches('_').to_string()
}
