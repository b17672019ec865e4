use insta::assert_snapshot;
use metagen_core::templates::{
    Bindings, RenderWarning, Strictness, Template, TemplateError, expand_template,
};
use rstest::rstest;

fn bind(pairs: &[(&str, &str)]) -> Bindings {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

const SUBTITLE: &str = "<%- if estimate == 'central' -%>
Central estimate of excess deaths.
<%- elif estimate in ['lower', 'upper'] -%>
The << estimate >> bound of the 95% uncertainty interval.
<%- else -%>
Excess deaths, all estimates.
<%- endif -%>";

#[rstest]
#[case("central", "Central estimate of excess deaths.")]
#[case("upper", "The upper bound of the 95% uncertainty interval.")]
#[case("reported", "Excess deaths, all estimates.")]
fn exactly_one_branch_is_selected(#[case] estimate: &str, #[case] expected: &str) {
    let out = expand_template(SUBTITLE, &bind(&[("estimate", estimate)])).expect("render ok");
    assert_eq!(out, expected);
}

#[test]
fn substitution_with_filters() {
    let out = expand_template(
        "<< question | title >>: << age_group | default('all ages') >> (<< unit | upper >>)",
        &bind(&[("question", "vaccinated people"), ("unit", "pct")]),
    )
    .expect("render ok");
    assert_snapshot!(out, @"Vaccinated People: all ages (PCT)");
}

#[test]
fn unbound_parameter_fails_without_default() {
    let err = expand_template("Deaths << age_group >>", &Bindings::new()).unwrap_err();
    assert_eq!(err, TemplateError::UnboundParameter("age_group".into()));
}

#[test]
fn missing_else_renders_empty_with_a_warning() {
    let tpl = Template::parse("A<% if variant == 'Delta' %> (Delta)<% endif %>").unwrap();
    let rendered = tpl.render(&bind(&[("variant", "Alpha")]), Strictness::Strict).unwrap();
    assert_eq!(rendered.text, "A");
    assert!(matches!(
        rendered.warnings.as_slice(),
        [RenderWarning::UnmatchedConditional { .. }]
    ));
}

#[test]
fn parameters_are_collected_from_every_node() {
    let tpl = Template::parse(
        "<% if question is defined and not (age_group in ['all']) %><< variant >><% endif %>",
    )
    .unwrap();
    let params: Vec<String> = tpl.parameters().into_iter().collect();
    assert_eq!(params, vec!["age_group", "question", "variant"]);
}

#[rstest]
#[case("<< >>")]
#[case("<< name | bogus >>")]
#[case("<% if x %>unterminated")]
#[case("<% endif %>")]
#[case("<% if x == %>a<% endif %>")]
fn syntax_errors(#[case] source: &str) {
    assert!(matches!(Template::parse(source), Err(TemplateError::Syntax { .. })), "{source}");
}
