use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sfconfig",
    about = "Inspect, patch and diff SEO spider configuration files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Debug-level logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Schema profile (TOML) replacing the built-in crawler profile
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Version of the installed spider, compared against config versions
    #[arg(long, global = true, env = "SFCONFIG_APP_VERSION")]
    pub app_version: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every logical field of a config
    Inspect(InspectArgs),
    /// Apply a patch document to a template config
    Build(BuildArgs),
    /// Compare two configs field by field
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    #[arg(long)]
    pub config: String,
    /// Only report paths starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[arg(long)]
    pub template: String,
    #[arg(long)]
    pub output: String,
    /// Patch document as inline JSON
    #[arg(long)]
    pub patches: Option<String>,
    /// Patch document read from a file; wins over --patches
    #[arg(long)]
    pub patches_file: Option<String>,
    /// Apply and report, but do not write the output
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    #[arg(long)]
    pub config_a: String,
    #[arg(long)]
    pub config_b: String,
    #[arg(long)]
    pub prefix: Option<String>,
}
