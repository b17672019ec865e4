//! Merge-key resolution.

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::errors::ResolveError;
use super::graph::{AliasGraph, invalid_merge_shape, lookup};
use crate::document::MetadataDocument;
use crate::document::keys::{DEFINITIONS, MERGE};
use crate::document::types::{child_field, key_label};

/// Replace every `<<` merge in the document with a copy of what it refers
/// to.
///
/// Named fragments are resolved once, dependencies first, then copied into
/// each place that merges them. Keys written next to the `<<` win over
/// merged keys, and earlier entries of a merge list win over later ones.
/// The result contains no `<<` keys, so resolving it again is a no-op.
pub fn resolve_merges(document: &MetadataDocument) -> Result<MetadataDocument, ResolveError> {
    let path = document.path();
    let graph = AliasGraph::build(path, &document.root)?;
    let order = graph.resolution_order(path)?;

    let mut fragments: HashMap<String, Value> = HashMap::with_capacity(order.len());
    if let Some(definitions) = document.definitions() {
        for name in order {
            let field = child_field(DEFINITIONS, &name);
            let Some(fragment) = lookup(definitions, &name) else {
                return Err(ResolveError::UnknownAlias { path: path.to_path_buf(), field, alias: name });
            };
            let resolved = expand_value(fragment, &field, &fragments, path)?;
            fragments.insert(name, resolved);
        }
    }
    debug!(path = %path.display(), fragments = fragments.len(), "resolved merge fragments");

    let root = expand_value(&document.root, "", &fragments, path)?;
    Ok(MetadataDocument::new(path, root))
}

fn expand_value(
    value: &Value,
    field: &str,
    fragments: &HashMap<String, Value>,
    path: &Path,
) -> Result<Value, ResolveError> {
    match value {
        Value::Mapping(map) => expand_mapping(map, field, fragments, path).map(Value::Mapping),
        Value::Sequence(seq) => seq
            .iter()
            .enumerate()
            .map(|(i, v)| expand_value(v, &format!("{field}[{i}]"), fragments, path))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        other => Ok(other.clone()),
    }
}

fn expand_mapping(
    map: &Mapping,
    field: &str,
    fragments: &HashMap<String, Value>,
    path: &Path,
) -> Result<Mapping, ResolveError> {
    let mut out = Mapping::with_capacity(map.len());
    for (k, v) in map {
        if k.as_str() == Some(MERGE) {
            continue;
        }
        let child = child_field(field, &key_label(k));
        out.insert(k.clone(), expand_value(v, &child, fragments, path)?);
    }

    if let Some(merge) = map.get(MERGE) {
        let merge_field = child_field(field, MERGE);
        for source in merge_sources(merge, &merge_field, fragments, path)? {
            for (k, v) in source {
                if !out.contains_key(&k) {
                    out.insert(k, v);
                }
            }
        }
    }
    Ok(out)
}

/// The mappings a `<<` value stands for, highest priority first.
fn merge_sources(
    merge: &Value,
    field: &str,
    fragments: &HashMap<String, Value>,
    path: &Path,
) -> Result<Vec<Mapping>, ResolveError> {
    match merge {
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| merge_source(item, &format!("{field}[{i}]"), fragments, path))
            .collect(),
        single => merge_source(single, field, fragments, path).map(|m| vec![m]),
    }
}

fn merge_source(
    item: &Value,
    field: &str,
    fragments: &HashMap<String, Value>,
    path: &Path,
) -> Result<Mapping, ResolveError> {
    match item {
        Value::String(name) => match fragments.get(name) {
            Some(Value::Mapping(fragment)) => Ok(fragment.clone()),
            Some(_) => Err(ResolveError::InvalidMerge {
                path: path.to_path_buf(),
                field: field.to_string(),
                message: format!("fragment '{name}' is not a mapping"),
            }),
            None => Err(ResolveError::UnknownAlias {
                path: path.to_path_buf(),
                field: field.to_string(),
                alias: name.clone(),
            }),
        },
        Value::Mapping(inline) => expand_mapping(inline, field, fragments, path),
        _ => Err(invalid_merge_shape(path, field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn doc(s: &str) -> MetadataDocument {
        MetadataDocument::new("test.meta.yml", serde_yaml::from_str(s).unwrap())
    }

    fn variable<'a>(d: &'a MetadataDocument, name: &str) -> &'a Value {
        &d.root["tables"]["t"]["variables"][name]
    }

    #[test]
    fn named_fragment_is_copied_into_each_user() {
        let d = doc(r#"
definitions:
  display:
    numDecimalPlaces: 1
    tolerance: 5
tables:
  t:
    variables:
      a:
        title: A
        display:
          <<: display
      b:
        title: B
        display:
          <<: display
          tolerance: 0
"#);
        let out = resolve_merges(&d).unwrap();
        assert_eq!(variable(&out, "a")["display"]["tolerance"], Value::from(5));
        assert_eq!(variable(&out, "b")["display"]["tolerance"], Value::from(0));
        assert_eq!(variable(&out, "b")["display"]["numDecimalPlaces"], Value::from(1));
    }

    #[test]
    fn dotted_and_chained_fragments() {
        let d = doc(r#"
definitions:
  others:
    processing: minor
    display:
      <<: others.base
      numDecimalPlaces: 2
    base:
      zeroDay: "2020-01-21"
tables:
  t:
    variables:
      v:
        display:
          <<: others.display
"#);
        let out = resolve_merges(&d).unwrap();
        let display = &variable(&out, "v")["display"];
        assert_eq!(display["numDecimalPlaces"], Value::from(2));
        assert_eq!(display["zeroDay"], Value::from("2020-01-21"));
    }

    #[test]
    fn earlier_list_entries_win() {
        let d = doc(r#"
definitions:
  first:
    unit: people
  second:
    unit: cases
    short_unit: ""
tables:
  t:
    variables:
      v:
        <<: [first, second]
"#);
        let out = resolve_merges(&d).unwrap();
        assert_eq!(variable(&out, "v")["unit"], Value::from("people"));
        assert_eq!(variable(&out, "v")["short_unit"], Value::from(""));
    }

    #[test]
    fn native_yaml_aliases_are_already_expanded() {
        let d = doc(r#"
definitions:
  common: &common
    unit: deaths
tables:
  t:
    variables:
      v:
        <<: *common
        title: Deaths
"#);
        let out = resolve_merges(&d).unwrap();
        assert_eq!(variable(&out, "v")["unit"], Value::from("deaths"));
        assert_eq!(variable(&out, "v")["title"], Value::from("Deaths"));
    }

    #[test]
    fn resolving_twice_changes_nothing() {
        let d = doc(r#"
definitions:
  base:
    unit: people
  common:
    <<: base
    processing_level: minor
tables:
  t:
    variables:
      v:
        <<: common
        title: V
"#);
        let once = resolve_merges(&d).unwrap();
        let twice = resolve_merges(&once).unwrap();
        assert_eq!(once, twice);
        assert!(!serde_yaml::to_string(&once.root).unwrap().contains("<<"));
    }

    #[test]
    fn cycle_is_reported_with_its_chain() {
        let d = doc(r#"
definitions:
  A:
    <<: B
  B:
    <<: A
tables:
  t:
    variables:
      v:
        <<: A
"#);
        let err = resolve_merges(&d).unwrap_err();
        assert!(matches!(err, ResolveError::CyclicAlias { .. }));
        assert!(err.to_string().contains("A -> B -> A"), "{err}");
    }

    #[rstest]
    #[case("<<: nowhere", "nowhere")]
    #[case("<<: [display, nowhere]", "nowhere")]
    #[case("<<: display.nowhere", "display.nowhere")]
    fn unknown_fragment(#[case] merge: &str, #[case] expected: &str) {
        let d = doc(&format!(
            "definitions:\n  display:\n    tolerance: 1\ntables:\n  t:\n    variables:\n      v:\n        {merge}\n"
        ));
        match resolve_merges(&d).unwrap_err() {
            ResolveError::UnknownAlias { alias, .. } => assert_eq!(alias, expected),
            other => panic!("expected UnknownAlias, got {other:?}"),
        }
    }

    #[test]
    fn merging_a_scalar_fragment_fails() {
        let d = doc("definitions:\n  label: text\ntables:\n  t:\n    variables:\n      v:\n        <<: label\n");
        assert!(matches!(resolve_merges(&d), Err(ResolveError::InvalidMerge { .. })));
    }
}
