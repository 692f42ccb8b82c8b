//! Clap derive structures for the `fpp` CLI.

use clap::{Args, Parser, Subcommand};

/// fpp -- inspect Falcon Player devices from the command line
#[derive(Debug, Parser)]
#[command(
    name = "fpp",
    version,
    about = "Inspect Falcon Player (FPP) devices",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the information about the FPP device
    Info(InfoArgs),

    /// Scan for FPP devices on the network
    Scan,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// FPP device IP address or hostname (asked for when not given)
    #[arg(long, env = "FPP_HOST")]
    pub host: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "FPP_TIMEOUT", default_value_t = 8.0)]
    pub timeout: f64,

    /// Print the device snapshot as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
