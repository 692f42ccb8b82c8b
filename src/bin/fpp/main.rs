mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use fpp_client::{ErrorKind, FppError};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

const CONNECTION_HELP: &str = "\
Could not connect to the specified FPP device. Please make sure that
the device is powered on, connected to the network and that you have
specified the correct IP address or hostname.

If you are not sure what the IP address or hostname of your FPP device
is, you can use the scan command to find it:

fpp scan";

const UNSUPPORTED_VERSION_HELP: &str = "\
The specified FPP device is running an unsupported version.

Currently only 0.14.0 and higher is supported";

#[tokio::main]
async fn main() -> Result<ExitCode, FppError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Info(args) => commands::info(args).await,
        Command::Scan => commands::scan().await,
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) if e.is(ErrorKind::Connection) => {
            tracing::debug!("{:?}", e);
            output::print_panel("Connection error", CONNECTION_HELP);
            Ok(ExitCode::FAILURE)
        }
        Err(e) if e.is(ErrorKind::UnsupportedVersion) => {
            tracing::debug!("{:?}", e);
            output::print_panel("Unsupported version", UNSUPPORTED_VERSION_HELP);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
