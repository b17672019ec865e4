mod cmd;
mod logging;

use clap::{Args, Parser, Subcommand, ValueEnum};
use metagen_core::document::OutputFormat;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "metagen",
    version,
    about = "Resolve templated dataset metadata into concrete variable records"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration and print resolved settings
    Doctor,

    /// List metadata documents discovered under metadata_dir
    List,

    /// Resolve a document into concrete variable records
    Resolve(ResolveArgs),

    /// Resolve documents and report errors and warnings
    Check(CheckArgs),

    /// Show the variables a document resolves to
    Variables(VariablesArgs),
}

#[derive(Debug, Args)]
pub struct ParamArgs {
    /// Known values for a template parameter (repeatable)
    #[arg(long = "param", value_name = "NAME=V1,V2", value_parser = parse_param)]
    pub params: Vec<(String, Vec<String>)>,

    /// Render unbound parameters as empty text instead of failing
    #[arg(long)]
    pub lenient: bool,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Logical document name (e.g. "covid/deaths") or path to a file
    pub document: String,

    #[command(flatten)]
    pub params: ParamArgs,

    #[arg(long, value_enum, default_value_t = Format::Yaml)]
    pub format: Format,

    /// Emit the list of variable records only
    #[arg(long)]
    pub flat: bool,

    /// Write to this file instead of stdout (relative to output_dir if set)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Documents to check; all discovered documents when empty
    pub documents: Vec<String>,

    #[command(flatten)]
    pub params: ParamArgs,
}

#[derive(Debug, Args)]
pub struct VariablesArgs {
    /// Logical document name or path to a file
    pub document: String,

    #[command(flatten)]
    pub params: ParamArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Yaml,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Yaml => OutputFormat::Yaml,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// `variant=Alpha,Delta` -> `("variant", ["Alpha", "Delta"])`.
fn parse_param(s: &str) -> Result<(String, Vec<String>), String> {
    let (name, values) =
        s.split_once('=').ok_or_else(|| format!("expected NAME=V1,V2, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((name.to_string(), values))
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Doctor => cmd::doctor::run(config, profile),
        Commands::List => cmd::list::run(config, profile),
        Commands::Resolve(args) => cmd::resolve::run(config, profile, &args),
        Commands::Check(args) => cmd::check::run(config, profile, &args),
        Commands::Variables(args) => cmd::variables::run(config, profile, &args),
    }
}
