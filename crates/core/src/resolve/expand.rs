//! Parameterised variables and their instances.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::path::Path;

use super::context::ResolveContext;
use super::errors::ResolveError;
use crate::document::keys::PARAMETERS;
use crate::document::types::child_field;
use crate::params::{ParamsMap, cartesian_product};
use crate::templates::{Bindings, Template, TemplatedValue, underscore};

/// A variable definition compiled once and instantiated per binding.
#[derive(Debug, Clone)]
pub struct VariableTemplate {
    /// Field location of the definition, `tables.<t>.variables.<key>`.
    pub field: String,
    pub name: Template,
    /// The definition as written, its own `parameters` removed.
    pub source: Value,
    pub body: TemplatedValue,
    /// Enumerations visible to this variable, its own `parameters` included.
    pub parameters: ParamsMap,
}

/// One concrete expansion of a [`VariableTemplate`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInstance {
    pub short_name: String,
    pub field: String,
    pub bindings: Bindings,
    pub body: Value,
}

impl VariableTemplate {
    pub fn compile(
        key: &str,
        definition: &Value,
        inherited: &ParamsMap,
        field: String,
        path: &Path,
    ) -> Result<Self, ResolveError> {
        let mut body = match definition {
            Value::Mapping(map) => map.clone(),
            Value::Null => Mapping::new(),
            _ => {
                return Err(ResolveError::schema(path, field, "variable definition must be a mapping"));
            }
        };

        let parameters = match body.remove(PARAMETERS) {
            Some(own) => {
                let own = ParamsMap::from_yaml(&own).map_err(|source| ResolveError::InvalidRecord {
                    path: path.to_path_buf(),
                    field: child_field(&field, PARAMETERS),
                    source,
                })?;
                inherited.overlay(&own)
            }
            None => inherited.clone(),
        };

        let name = Template::parse(key)
            .map_err(|e| ResolveError::template(path, field.clone(), e))?;
        let source = Value::Mapping(body);
        let body = TemplatedValue::compile(&source)
            .map_err(|e| ResolveError::template(path, child_field(&field, &e.field), e.source))?;

        Ok(Self { field, name, source, body, parameters })
    }

    /// Parameters this variable is instantiated over: referenced by its key,
    /// its body or the defaults it `inherits`, and enumerated somewhere in
    /// scope. Sorted by name.
    pub fn instantiated_parameters(&self, inherits: &BTreeSet<String>) -> Vec<String> {
        let mut referenced: BTreeSet<String> = self.name.parameters();
        referenced.extend(self.body.parameters());
        referenced.extend(inherits.iter().cloned());
        referenced.into_iter().filter(|p| self.parameters.contains(p)).collect()
    }

    /// One binding per record this variable expands to.
    pub fn bindings(&self, inherits: &BTreeSet<String>) -> Vec<Bindings> {
        let names = self.instantiated_parameters(inherits);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        cartesian_product(&names, &self.parameters)
    }

    /// Short name for the instance bound to `bindings`.
    ///
    /// Placeholders in the key are filled with the short-name form of each
    /// value, while key conditions compare the values as given. Bound
    /// parameters the key does not mention are appended as `_<value>` in
    /// name order.
    fn short_name(
        &self,
        bindings: &Bindings,
        field: &str,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<String, ResolveError> {
        let mut name = ctx.render_name(&self.name, bindings, field)?;

        let in_key = self.name.parameters();
        for (param, value) in bindings {
            if !in_key.contains(param) {
                name.push('_');
                name.push_str(&underscore(value));
            }
        }

        if name.trim().is_empty() {
            return Err(ResolveError::schema(ctx.path, field, "variable short name is empty"));
        }
        Ok(name)
    }
}

/// Render one concrete instance of `template` for `bindings`.
pub fn instantiate_variable(
    template: &VariableTemplate,
    bindings: &Bindings,
    ctx: &mut ResolveContext<'_>,
) -> Result<VariableInstance, ResolveError> {
    let field = instance_field(&template.field, bindings);
    let short_name = template.short_name(bindings, &field, ctx)?;
    let body = ctx.render(&template.body, bindings, &field)?;
    Ok(VariableInstance { short_name, field, bindings: bindings.clone(), body })
}

/// `tables.t.variables.v[age_group=65+]` for a bound instance.
fn instance_field(base: &str, bindings: &Bindings) -> String {
    if bindings.is_empty() {
        return base.to_string();
    }
    let pairs: Vec<String> = bindings.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{base}[{}]", pairs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::Strictness;

    fn compile(key: &str, body: &str, params: &ParamsMap) -> VariableTemplate {
        let body: Value = serde_yaml::from_str(body).unwrap();
        VariableTemplate::compile(
            key,
            &body,
            params,
            format!("tables.t.variables.{key}"),
            Path::new("test.meta.yml"),
        )
        .unwrap()
    }

    fn expand_all(template: &VariableTemplate) -> Vec<VariableInstance> {
        let path = Path::new("test.meta.yml");
        let mut ctx = ResolveContext::new(path, Strictness::Strict);
        template
            .bindings(&BTreeSet::new())
            .iter()
            .map(|b| instantiate_variable(template, b, &mut ctx).unwrap())
            .collect()
    }

    fn age_groups() -> ParamsMap {
        ParamsMap::from_iter([("age_group".to_string(), vec!["0-17".to_string(), "65+".to_string()])])
    }

    #[test]
    fn one_record_per_value() {
        let t = compile("death_rate", "title: Death rate - << age_group >>\nunit: deaths per 100,000\n", &age_groups());
        let instances = expand_all(&t);

        let titles: Vec<&str> = instances.iter().map(|i| i.body["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Death rate - 0-17", "Death rate - 65+"]);
        let names: Vec<&str> = instances.iter().map(|i| i.short_name.as_str()).collect();
        assert_eq!(names, vec!["death_rate_0_17", "death_rate_65_plus"]);
        assert_eq!(instances[1].bindings["age_group"], "65+");
        assert_eq!(instances[1].field, "tables.t.variables.death_rate[age_group=65+]");
    }

    #[test]
    fn key_placeholder_sets_the_name() {
        let t = compile("<< age_group >>_deaths", "title: Deaths << age_group >>\n", &age_groups());
        let names: Vec<String> = expand_all(&t).into_iter().map(|i| i.short_name).collect();
        assert_eq!(names, vec!["0_17_deaths", "65_plus_deaths"]);
    }

    #[test]
    fn unreferenced_parameters_do_not_multiply() {
        let t = compile("population", "title: Population\nunit: people\n", &age_groups());
        let instances = expand_all(&t);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].short_name, "population");
        assert!(instances[0].bindings.is_empty());
    }

    #[test]
    fn own_parameters_override_inherited() {
        let t = compile(
            "rate",
            "title: Rate << age_group >>\nparameters:\n  age_group: [all]\n",
            &age_groups(),
        );
        let instances = expand_all(&t);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].short_name, "rate_all");
        assert!(instances[0].body.get("parameters").is_none());
    }

    #[test]
    fn several_parameters_expand_to_the_product() {
        let mut params = age_groups();
        params.insert("sex", vec!["female".to_string(), "male".to_string()]);
        let t = compile("deaths", "title: Deaths, << sex >>, << age_group >>\n", &params);
        let names: Vec<String> = expand_all(&t).into_iter().map(|i| i.short_name).collect();
        assert_eq!(
            names,
            vec![
                "deaths_0_17_female",
                "deaths_0_17_male",
                "deaths_65_plus_female",
                "deaths_65_plus_male"
            ]
        );
    }

    #[test]
    fn empty_enumeration_yields_nothing() {
        let params = ParamsMap::from_iter([("age_group".to_string(), Vec::new())]);
        let t = compile("deaths", "title: Deaths << age_group >>\n", &params);
        assert!(t.bindings(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn inherited_references_multiply_too() {
        let t = compile("deaths", "title: Deaths\nunit: deaths\n", &age_groups());
        let inherits = BTreeSet::from(["age_group".to_string(), "unknown".to_string()]);
        assert_eq!(t.instantiated_parameters(&inherits), vec!["age_group"]);
        assert_eq!(t.bindings(&inherits).len(), 2);
    }

    #[test]
    fn key_conditions_see_raw_values() {
        let t = compile(
            "deaths<% if age_group == '65+' %>_elderly<% else %>_<< age_group >><% endif %>",
            "title: Deaths << age_group >>\n",
            &age_groups(),
        );
        let names: Vec<String> = expand_all(&t).into_iter().map(|i| i.short_name).collect();
        assert_eq!(names, vec!["deaths_0_17", "deaths_elderly"]);
    }

    #[test]
    fn unbound_key_placeholder_is_an_error_in_strict_mode() {
        let t = compile("deaths_<< sex >>", "title: Deaths\n", &ParamsMap::new());
        let mut ctx = ResolveContext::new(Path::new("test.meta.yml"), Strictness::Strict);
        let err = instantiate_variable(&t, &Bindings::new(), &mut ctx).unwrap_err();
        assert!(matches!(err, ResolveError::UnboundParameter { ref parameter, .. } if parameter == "sex"));
    }
}
