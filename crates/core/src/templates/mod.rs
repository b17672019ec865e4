//! Parameterised template strings.
//!
//! Templates use `<< name >>` for substitution and `<% if %>` / `<% elif %>` /
//! `<% else %>` / `<% endif %>` for conditional text. A template is parsed
//! once into [`ast::Node`]s and can then be rendered against any number of
//! parameter bindings.

pub mod ast;
pub mod engine;
pub mod parser;
pub mod value;

pub use ast::{Branch, Condition, Filter, Node};
pub use engine::{
    Bindings, RenderWarning, Rendered, Strictness, Template, TemplateError, expand_template,
    underscore,
};
pub use value::{FieldError, TemplatedValue};
