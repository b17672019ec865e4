use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    pub profile: Option<String>,
    pub profiles: HashMap<String, Profile>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    /// Root directory scanned for `*.meta.yml` documents.
    pub metadata_dir: String,
    /// Where `resolve --output` writes by default (supports `{{metadata_dir}}`).
    pub output_dir: Option<String>,
    /// Fail on unbound template parameters instead of warning.
    #[serde(default = "default_strict")]
    pub strict: bool,
    /// Known enumerations for template parameters, e.g. all variant names.
    /// Documents may narrow or override these per dataset, table or variable.
    #[serde(default)]
    pub parameters: BTreeMap<String, Vec<String>>,
}

fn default_strict() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub active_profile: String,
    pub metadata_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub strict: bool,
    pub parameters: BTreeMap<String, Vec<String>>,
    pub logging: LoggingConfig,
}

impl ResolvedConfig {
    /// Settings used when no config file exists and a command was pointed
    /// at a document directly.
    pub fn builtin() -> Self {
        Self {
            active_profile: "builtin".to_string(),
            metadata_dir: PathBuf::from("."),
            output_dir: None,
            strict: default_strict(),
            parameters: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}
