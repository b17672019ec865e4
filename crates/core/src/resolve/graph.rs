//! Reference graph over the named fragments in `definitions`.

use petgraph::algo::{astar, kosaraju_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;

use super::errors::ResolveError;
use crate::document::keys::{DEFINITIONS, MERGE};
use crate::document::types::{child_field, key_label};

/// A named merge reference (`<<: name`) and where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub field: String,
}

/// Edges from each referenced fragment to the fragments it merges in turn.
#[derive(Debug, Default)]
pub struct AliasGraph {
    edges: BTreeMap<String, Vec<String>>,
    first_use: HashMap<String, String>,
}

impl AliasGraph {
    /// Collect every fragment reachable from a named reference anywhere in
    /// `root`. Fails on references to fragments that do not exist.
    pub fn build(path: &Path, root: &Value) -> Result<Self, ResolveError> {
        let definitions = root.get(DEFINITIONS).and_then(Value::as_mapping);

        let mut queue: VecDeque<Reference> = collect_references(root, "", path)?.into();

        let mut graph = AliasGraph::default();
        while let Some(reference) = queue.pop_front() {
            if graph.edges.contains_key(&reference.name) {
                continue;
            }
            let fragment = definitions.and_then(|d| lookup(d, &reference.name)).ok_or_else(
                || ResolveError::UnknownAlias {
                    path: path.to_path_buf(),
                    field: reference.field.clone(),
                    alias: reference.name.clone(),
                },
            )?;

            let field = child_field(DEFINITIONS, &reference.name);
            let inner = collect_references(fragment, &field, path)?;
            graph
                .edges
                .insert(reference.name.clone(), inner.iter().map(|r| r.name.clone()).collect());
            graph.first_use.insert(reference.name, reference.field);
            queue.extend(inner);
        }
        Ok(graph)
    }

    fn digraph(&self) -> DiGraphMap<&str, ()> {
        let mut g = DiGraphMap::new();
        for (node, deps) in &self.edges {
            g.add_node(node.as_str());
            for dep in deps {
                g.add_edge(node.as_str(), dep.as_str(), ());
            }
        }
        g
    }

    /// Fragment names, each after every fragment it depends on.
    pub fn resolution_order(&self, path: &Path) -> Result<Vec<String>, ResolveError> {
        let g = self.digraph();
        match toposort(&g, None) {
            Ok(order) => Ok(order.into_iter().rev().map(str::to_string).collect()),
            Err(cycle) => {
                let chain = cycle_chain(&g, cycle.node_id());
                let field = chain
                    .first()
                    .and_then(|n| self.first_use.get(n))
                    .cloned()
                    .unwrap_or_default();
                Err(ResolveError::CyclicAlias { path: path.to_path_buf(), field, chain })
            }
        }
    }
}

/// `[A, B, A]` for the cycle through `node`, starting at the smallest name in
/// its strongly connected component.
fn cycle_chain<'a>(g: &DiGraphMap<&'a str, ()>, node: &'a str) -> Vec<String> {
    let start = kosaraju_scc(g)
        .into_iter()
        .find(|component| component.contains(&node))
        .and_then(|component| component.into_iter().min())
        .unwrap_or(node);

    let back = g
        .neighbors(start)
        .filter_map(|next| astar(g, next, |n| n == start, |_| 1usize, |_| 0))
        .min_by_key(|(cost, _)| *cost)
        .map(|(_, path)| path)
        .unwrap_or_else(|| vec![start]);

    std::iter::once(start).chain(back).map(str::to_string).collect()
}

/// Find a fragment inside `definitions`: an exact key first, then a dotted
/// path through nested mappings.
pub fn lookup<'a>(definitions: &'a Mapping, name: &str) -> Option<&'a Value> {
    if let Some(exact) = definitions.get(name) {
        return Some(exact);
    }
    let mut parts = name.split('.');
    let mut current = definitions.get(parts.next()?)?;
    for part in parts {
        current = current.as_mapping()?.get(part)?;
    }
    Some(current)
}

/// Every named reference inside `value`, in document order.
fn collect_references(value: &Value, field: &str, path: &Path) -> Result<Vec<Reference>, ResolveError> {
    let mut out = Vec::new();
    walk(value, field, &mut out, path)?;
    Ok(out)
}

fn walk(value: &Value, field: &str, out: &mut Vec<Reference>, path: &Path) -> Result<(), ResolveError> {
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let child = child_field(field, &key_label(k));
                if k.as_str() == Some(MERGE) {
                    walk_merge_value(v, &child, out, path, true)?;
                } else {
                    walk(v, &child, out, path)?;
                }
            }
            Ok(())
        }
        Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                walk(v, &format!("{field}[{i}]"), out, path)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn walk_merge_value(
    value: &Value,
    field: &str,
    out: &mut Vec<Reference>,
    path: &Path,
    allow_list: bool,
) -> Result<(), ResolveError> {
    match value {
        Value::String(name) => {
            out.push(Reference { name: name.clone(), field: field.to_string() });
            Ok(())
        }
        Value::Mapping(_) => walk(value, field, out, path),
        Value::Sequence(items) if allow_list => {
            for (i, item) in items.iter().enumerate() {
                walk_merge_value(item, &format!("{field}[{i}]"), out, path, false)?;
            }
            Ok(())
        }
        _ => Err(invalid_merge_shape(path, field)),
    }
}

pub(crate) fn invalid_merge_shape(path: &Path, field: &str) -> ResolveError {
    ResolveError::InvalidMerge {
        path: path.to_path_buf(),
        field: field.to_string(),
        message: "merge value must be a mapping, a fragment name, or a list of those".into(),
    }
}
