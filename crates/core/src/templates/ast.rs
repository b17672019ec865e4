//! Template syntax tree.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text copied to the output.
    Text(String),
    /// `<< name | filter >>`
    Param { name: String, filters: Vec<Filter> },
    /// `<% if %>` chain. At most one branch is rendered.
    Conditional { branches: Vec<Branch>, otherwise: Option<Vec<Node>> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub condition: Condition,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Used when the parameter is unbound.
    Default(String),
    Lower,
    Upper,
    Title,
    Trim,
    Underscore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `name is defined`
    Defined(String),
    /// Bare `name`: bound and non-empty.
    Truthy(String),
    Eq(String, String),
    Ne(String, String),
    In(String, Vec<String>),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Node {
    pub(crate) fn collect_parameters(nodes: &[Node], out: &mut BTreeSet<String>) {
        for node in nodes {
            match node {
                Node::Text(_) => {}
                Node::Param { name, .. } => {
                    out.insert(name.clone());
                }
                Node::Conditional { branches, otherwise } => {
                    for branch in branches {
                        branch.condition.collect_parameters(out);
                        Node::collect_parameters(&branch.body, out);
                    }
                    if let Some(body) = otherwise {
                        Node::collect_parameters(body, out);
                    }
                }
            }
        }
    }
}

impl Condition {
    pub(crate) fn collect_parameters(&self, out: &mut BTreeSet<String>) {
        match self {
            Condition::Defined(n)
            | Condition::Truthy(n)
            | Condition::Eq(n, _)
            | Condition::Ne(n, _)
            | Condition::In(n, _) => {
                out.insert(n.clone());
            }
            Condition::Not(c) => c.collect_parameters(out),
            Condition::And(a, b) | Condition::Or(a, b) => {
                a.collect_parameters(out);
                b.collect_parameters(out);
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Defined(n) => write!(f, "{n} is defined"),
            Condition::Truthy(n) => write!(f, "{n}"),
            Condition::Eq(n, v) => write!(f, "{n} == {v:?}"),
            Condition::Ne(n, v) => write!(f, "{n} != {v:?}"),
            Condition::In(n, vs) => write!(f, "{n} in {vs:?}"),
            Condition::Not(c) => write!(f, "not ({c})"),
            Condition::And(a, b) => write!(f, "({a}) and ({b})"),
            Condition::Or(a, b) => write!(f, "({a}) or ({b})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_display() {
        let c = Condition::Or(
            Box::new(Condition::Eq("q".into(), "a".into())),
            Box::new(Condition::Not(Box::new(Condition::Defined("x".into())))),
        );
        assert_eq!(c.to_string(), "(q == \"a\") or (not (x is defined))");
    }
}
