use metagen_core::catalog::Catalog;
use std::path::Path;

use super::{fail, load_config};

pub fn run(config: Option<&Path>, profile: Option<&str>) {
    let rc = load_config("list", config, profile);

    match Catalog::new(&rc.metadata_dir) {
        Ok(catalog) => {
            let list = catalog.list_all();
            if list.is_empty() {
                println!("(no metadata documents found)");
                return;
            }
            for d in list {
                println!("{}", d.logical_name);
            }
            println!("-- {} documents --", list.len());
        }
        Err(e) => fail("list", e),
    }
}
