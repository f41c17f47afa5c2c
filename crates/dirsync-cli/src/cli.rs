use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "dirsync",
    about = "Reconcile local groups and users with an authoritative directory",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Synchronize groups and users from the directory
    Run(RunArgs),
    /// Validate a configuration file and resolve its callbacks
    Check(CheckArgs),
    /// List principals in the local store
    Show(ShowArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Configuration file
    #[arg(short, long)]
    pub config: PathBuf,
    /// Store file, overriding [store].path
    #[arg(short, long)]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Configuration file
    #[arg(short, long)]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Store file
    #[arg(short, long)]
    pub store: PathBuf,
    /// Only list users
    #[arg(long, conflicts_with = "groups")]
    pub users: bool,
    /// Only list groups
    #[arg(long)]
    pub groups: bool,
}
