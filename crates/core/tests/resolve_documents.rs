use metagen_core::document::{OutputFormat, ResolvedDataset, parse, serialize};
use metagen_core::params::ParamsMap;
use metagen_core::resolve::{ResolveError, ResolveOptions, Resolver, resolve_merges};
use metagen_core::templates::Strictness;
use std::path::Path;

const EXCESS_MORTALITY: &str = r#"
definitions:
  parameters:
    estimate: [central, lower, upper]
  common:
    processing_level: major
    presentation:
      topic_tags: [Excess Mortality]
      attribution_short: Economist
    display:
      numDecimalPlaces: 0
  display_ci: &display_ci
    numDecimalPlaces: 2
    tolerance: 7
dataset:
  title: Excess mortality estimates
  update_period_days: 7
  origins:
    - producer: The Economist
      title: Excess deaths model
      url_main: https://example.org/excess

tables:
  excess_mortality:
    title: Excess mortality
    common:
      unit: deaths
      presentation:
        topic_tags: [COVID-19, Excess Mortality]
    variables:
      estimated_daily_excess_deaths:
        title: Estimated daily excess deaths (<< estimate >>)
        description_short: Daily excess deaths per country.
        display:
          <<: *display_ci
      cumulative_estimated_daily_excess_deaths_per_100k:
        title: Cumulative excess deaths per 100,000 people (<< estimate >>)
        unit: deaths per 100,000 people
        short_unit: ""
        display:
          <<: display_ci
          numDecimalPlaces: 1
        presentation:
          grapher_config:
            map:
              colorScale:
                customCategoryLabels: {1: Low, 2: High}
"#;

fn resolve(options: ResolveOptions) -> Result<ResolvedDataset, ResolveError> {
    let doc = parse(Path::new("excess_mortality.meta.yml"), EXCESS_MORTALITY).unwrap();
    Resolver::new(options).resolve(&doc).map(|r| r.dataset)
}

#[test]
fn every_estimate_gets_a_record() {
    let dataset = resolve(ResolveOptions::default()).unwrap();
    let table = dataset.table("excess_mortality").unwrap();

    let names: Vec<&str> = table.variables.iter().map(|v| v.short_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "estimated_daily_excess_deaths_central",
            "estimated_daily_excess_deaths_lower",
            "estimated_daily_excess_deaths_upper",
            "cumulative_estimated_daily_excess_deaths_per_100k_central",
            "cumulative_estimated_daily_excess_deaths_per_100k_lower",
            "cumulative_estimated_daily_excess_deaths_per_100k_upper",
        ]
    );

    let upper = table.get("estimated_daily_excess_deaths_upper").unwrap();
    assert_eq!(upper.title, "Estimated daily excess deaths (upper)");
    assert_eq!(upper.unit, "deaths");
    assert_eq!(upper.processing_level.as_deref(), Some("major"));
    let presentation = upper.presentation.as_ref().unwrap();
    assert_eq!(presentation.topic_tags, vec!["COVID-19", "Excess Mortality"]);
    assert_eq!(presentation.attribution_short.as_deref(), Some("Economist"));
    assert_eq!(upper.display.as_ref().unwrap().num_decimal_places, Some(2));

    let cumulative = table.get("cumulative_estimated_daily_excess_deaths_per_100k_lower").unwrap();
    assert_eq!(cumulative.unit, "deaths per 100,000 people");
    let display = cumulative.display.as_ref().unwrap();
    assert_eq!(display.num_decimal_places, Some(1));
    assert_eq!(display.tolerance, Some(7));

    let meta = dataset.dataset.as_ref().unwrap();
    assert_eq!(meta.sources.len(), 1);
    assert_eq!(meta.sources[0].url.as_deref(), Some("https://example.org/excess"));
}

#[test]
fn resolved_output_round_trips() {
    let dataset = resolve(ResolveOptions::default()).unwrap();
    for format in [OutputFormat::Yaml, OutputFormat::Json] {
        let text = serialize(&dataset, format).unwrap();
        let back: ResolvedDataset = match format {
            OutputFormat::Yaml => serde_yaml::from_str(&text).unwrap(),
            OutputFormat::Json => serde_json::from_str(&text).unwrap(),
        };
        assert_eq!(back, dataset, "{format:?}");
    }

    let cumulative = dataset
        .table("excess_mortality")
        .and_then(|t| t.get("cumulative_estimated_daily_excess_deaths_per_100k_upper"))
        .unwrap();
    let config = cumulative.presentation.as_ref().unwrap().grapher_config.as_ref().unwrap();
    assert_eq!(config["map"]["colorScale"]["customCategoryLabels"]["2"], "High");
}

#[test]
fn merges_are_idempotent_on_a_full_document() {
    let doc = parse(Path::new("excess_mortality.meta.yml"), EXCESS_MORTALITY).unwrap();
    let once = resolve_merges(&doc).unwrap();
    assert_eq!(resolve_merges(&once).unwrap(), once);
}

#[test]
fn externally_known_values_apply_where_the_document_is_silent() {
    let src = r#"
tables:
  cases:
    variables:
      share_of_sequences:
        title: Share of sequences, << variant >>
        unit: "%"
"#;
    let doc = parse(Path::new("variants.meta.yml"), src).unwrap();
    let options = ResolveOptions {
        strictness: Strictness::Strict,
        parameters: ParamsMap::from_iter([(
            "variant".to_string(),
            vec!["B.1.1.7 (Alpha)".to_string(), "Omicron".to_string()],
        )]),
    };
    let resolution = Resolver::new(options).resolve(&doc).unwrap();
    let names: Vec<&str> = resolution.dataset.records().map(|r| r.short_name.as_str()).collect();
    assert_eq!(names, vec!["share_of_sequences_b_1_1_7_alpha", "share_of_sequences_omicron"]);
}
