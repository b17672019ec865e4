use metagen_core::catalog::locate;
use metagen_core::document::{VariableRecord, serialize};
use std::fs;
use std::path::Path;

use super::{fail, load_config, resolver_for};
use crate::ResolveArgs;

pub fn run(config: Option<&Path>, profile: Option<&str>, args: &ResolveArgs) {
    let rc = load_config("resolve", config, profile);

    let path = locate(&args.document, &rc.metadata_dir).unwrap_or_else(|e| fail("resolve", e));
    let resolution = resolver_for(&rc, &args.params)
        .resolve_path(&path)
        .unwrap_or_else(|e| fail("resolve", e));

    let format = args.format.into();
    let rendered = if args.flat {
        let records: Vec<&VariableRecord> = resolution.dataset.records().collect();
        serialize(&records, format)
    } else {
        serialize(&resolution.dataset, format)
    }
    .unwrap_or_else(|e| fail("resolve", e));

    let Some(output) = &args.output else {
        print!("{rendered}");
        return;
    };

    let target = match &rc.output_dir {
        Some(dir) if output.is_relative() => dir.join(output),
        _ => output.clone(),
    };
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).unwrap_or_else(|e| fail("resolve", e));
    }
    fs::write(&target, rendered).unwrap_or_else(|e| fail("resolve", e));

    println!("OK   metagen resolve");
    println!("records: {}", resolution.dataset.record_count());
    println!("output: {}", target.display());
}
