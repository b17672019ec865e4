use metagen_core::catalog::locate;
use metagen_core::document::VariableRecord;
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

use super::{fail, load_config, resolver_for};
use crate::VariablesArgs;

#[derive(Tabled)]
struct VariableRow {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Short name")]
    short_name: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Bindings")]
    bindings: String,
}

impl From<&VariableRecord> for VariableRow {
    fn from(r: &VariableRecord) -> Self {
        Self {
            table: r.table.clone(),
            short_name: r.short_name.clone(),
            title: r.title.clone(),
            unit: r.unit.clone(),
            bindings: r
                .bindings
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

pub fn run(config: Option<&Path>, profile: Option<&str>, args: &VariablesArgs) {
    let rc = load_config("variables", config, profile);

    let path = locate(&args.document, &rc.metadata_dir).unwrap_or_else(|e| fail("variables", e));
    let resolution = resolver_for(&rc, &args.params)
        .resolve_path(&path)
        .unwrap_or_else(|e| fail("variables", e));

    let rows: Vec<VariableRow> = resolution.dataset.records().map(VariableRow::from).collect();
    if rows.is_empty() {
        println!("(no variables)");
        return;
    }
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("-- {} variables --", rows.len());
}
