//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Stevedore - vendoring package manager for configuration-language module
/// trees
#[derive(Parser)]
#[command(name = "stevedore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug/info)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory to vendor dependencies into
    #[arg(long, global = true, default_value = "vendor")]
    pub vendor_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty manifest in the current directory
    Init(InitArgs),

    /// Fetch dependencies into the vendor tree and update the lock file
    Install(InstallArgs),

    /// Re-resolve every dependency, discarding the lock file
    Update(UpdateArgs),
}

#[derive(Args)]
pub struct InitArgs {}

#[derive(Args)]
pub struct InstallArgs {
    /// Packages to add, as `host/user/repo[/subdir][@version]` or a local
    /// directory path
    pub packages: Vec<String>,

    /// Add packages without recursing into their own dependencies
    #[arg(long)]
    pub single: bool,
}

#[derive(Args)]
pub struct UpdateArgs {}
