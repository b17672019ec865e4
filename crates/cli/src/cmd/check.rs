use metagen_core::catalog::{discover_documents, locate};
use std::path::{Path, PathBuf};

use super::{fail, load_config, resolver_for};
use crate::CheckArgs;

pub fn run(config: Option<&Path>, profile: Option<&str>, args: &CheckArgs) {
    let rc = load_config("check", config, profile);

    let targets: Vec<(String, Result<PathBuf, String>)> = if args.documents.is_empty() {
        discover_documents(&rc.metadata_dir)
            .unwrap_or_else(|e| fail("check", e))
            .into_iter()
            .map(|d| (d.logical_name, Ok(d.path)))
            .collect()
    } else {
        args.documents
            .iter()
            .map(|d| (d.clone(), locate(d, &rc.metadata_dir).map_err(|e| e.to_string())))
            .collect()
    };

    if targets.is_empty() {
        println!("(no metadata documents found)");
        return;
    }

    let resolver = resolver_for(&rc, &args.params);
    let mut failed = 0;
    let mut warnings = 0;
    for (name, path) in &targets {
        let result = path
            .as_ref()
            .map_err(String::clone)
            .and_then(|p| resolver.resolve_path(p).map_err(|e| e.to_string()));
        match result {
            Ok(resolution) => {
                println!("OK   {name} ({} records)", resolution.dataset.record_count());
                for d in &resolution.diagnostics {
                    println!("WARN {d}");
                }
                warnings += resolution.diagnostics.len();
            }
            Err(e) => {
                failed += 1;
                println!("FAIL {name}");
                println!("     {e}");
            }
        }
    }

    println!("-- {} documents, {failed} failed, {warnings} warnings --", targets.len());
    if failed > 0 {
        std::process::exit(1);
    }
}
