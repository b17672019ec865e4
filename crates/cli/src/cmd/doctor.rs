use metagen_core::config::{ConfigLoader, default_config_path};
use std::path::Path;

pub fn run(config: Option<&Path>, profile: Option<&str>) {
    match ConfigLoader::load(config, profile) {
        Ok(rc) => {
            println!("OK   metagen doctor");
            println!(
                "path: {}",
                config.map_or_else(
                    || default_config_path().display().to_string(),
                    |p| p.display().to_string()
                )
            );
            println!("profile: {}", rc.active_profile);
            println!("metadata_dir: {}", rc.metadata_dir.display());
            match &rc.output_dir {
                Some(dir) => println!("output_dir: {}", dir.display()),
                None => println!("output_dir: (stdout)"),
            }
            println!("strict: {}", rc.strict);
            for (name, values) in &rc.parameters {
                println!("parameter {name}: {}", values.join(", "));
            }
            println!("logging.level: {}", rc.logging.level);
            if let Some(file) = &rc.logging.file {
                println!("logging.file: {}", file.display());
            }
        }
        Err(e) => {
            println!("FAIL metagen doctor");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    }
}
