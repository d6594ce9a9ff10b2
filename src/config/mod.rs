pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "fins-builder")]
#[command(about = "Generates FINS driver boot commands and link metadata for an EPICS IOC")]
pub struct CliConfig {
    /// Path to the TOML build file
    #[arg(short, long, default_value = "fins-build.toml")]
    pub config: String,

    /// Directory the artifacts are written to
    #[arg(short, long, default_value = "./iocBoot")]
    pub output: String,

    /// Override the build file's simulation switch
    #[arg(long)]
    pub simulation: Option<bool>,

    /// Print the boot commands without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
