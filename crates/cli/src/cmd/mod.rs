pub mod check;
pub mod doctor;
pub mod list;
pub mod resolve;
pub mod variables;

use metagen_core::config::{ConfigLoader, ResolvedConfig, default_config_path};
use metagen_core::params::ParamsMap;
use metagen_core::resolve::{ResolveOptions, Resolver};
use metagen_core::templates::Strictness;
use std::fmt::Display;
use std::path::Path;
use tracing::debug;

use crate::ParamArgs;

/// Print the failure banner for `command` and exit with status 1.
pub fn fail(command: &str, err: impl Display) -> ! {
    println!("FAIL metagen {command}");
    println!("{err}");
    std::process::exit(1);
}

/// Load settings for a command that can run without a config file, and
/// install logging from them.
pub fn load_config(command: &str, config: Option<&Path>, profile: Option<&str>) -> ResolvedConfig {
    match ConfigLoader::load_or_builtin(config, profile) {
        Ok(rc) => {
            crate::logging::init(&rc);
            rc
        }
        Err(e) => {
            println!("FAIL metagen {command}");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    }
}

/// Configured options with the command-line flags applied on top.
pub fn resolver_for(rc: &ResolvedConfig, args: &ParamArgs) -> Resolver {
    let mut options = ResolveOptions::from_config(rc);
    if args.lenient {
        options.strictness = Strictness::Lenient;
    }
    let from_flags: ParamsMap = args.params.iter().cloned().collect();
    options.parameters = options.parameters.overlay(&from_flags);
    debug!(
        strictness = ?options.strictness,
        parameters = options.parameters.names().count(),
        "resolve options"
    );
    Resolver::new(options)
}
