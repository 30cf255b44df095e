use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dwl",
    about = "DICOMweb loader: fetch study metadata into a local cache",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Retrieve one study and print what was cached
    Fetch(FetchArgs),
    /// Show or check a data source configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    /// Data source configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// StudyInstanceUID to load
    #[arg(short, long)]
    pub study: String,
    /// Commit series one by one as they arrive
    #[arg(long, conflicts_with = "eager")]
    pub lazy: bool,
    /// Fetch everything before committing anything
    #[arg(long)]
    pub eager: bool,
    /// Bearer token sent with every request
    #[arg(long, env = "DWL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    #[arg(long)]
    pub made_locally: bool,
    /// Only load series with this modality
    #[arg(long)]
    pub modality: Option<String>,
    /// Cap on series fetched at once
    #[arg(long)]
    pub max_concurrent_series: Option<usize>,
    /// Print one line per instance
    #[arg(long)]
    pub instances: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the default configuration
    #[arg(long, conflicts_with = "check")]
    pub print_default: bool,
    /// Validate a configuration file
    #[arg(long)]
    pub check: Option<PathBuf>,
}
