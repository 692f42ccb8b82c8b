use std::time::Duration;

use fpp_client::{Device, Discovery, FppClient, FppError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::cli::InfoArgs;
use crate::output;

pub async fn info(args: InfoArgs) -> Result<()> {
    let timeout = Duration::try_from_secs_f64(args.timeout).map_err(|e| FppError::Generic {
        message: format!("Invalid timeout {}: {}", args.timeout, e),
    })?;

    let host = match args.host {
        Some(host) => host,
        None => {
            eprint!("Host address: ");
            read_host(&mut BufReader::new(tokio::io::stdin())).await?
        }
    };

    let mut fpp = FppClient::builder(host)
        .request_timeout(timeout)
        .build();

    eprintln!("Fetching FPP device information...");
    let result = fpp.update().await;
    fpp.close();
    let device = result?.snapshot();

    if args.json {
        println!("{}", encode_device(&device)?);
    } else {
        println!("\nFPP device information");
        println!("{}", output::render_device(&device));
    }
    Ok(())
}

/// Read one host address line from an interactive prompt
async fn read_host<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .await
        .map_err(|e| FppError::Generic {
            message: format!("Failed to read host address: {}", e),
        })?;

    let host = line.trim();
    if host.is_empty() {
        return Err(FppError::Generic {
            message: "No host address given".into(),
        });
    }
    Ok(host.to_string())
}

fn encode_device(device: &Device) -> Result<String> {
    serde_json::to_string_pretty(device).map_err(|e| FppError::Generic {
        message: format!("Failed to encode device information as JSON: {}", e),
    })
}

pub async fn scan() -> Result<()> {
    let mut discovery = Discovery::new();
    let mut found = discovery.subscribe_updates();
    discovery.start().await?;

    println!("Scanning for FPP devices...");
    println!("Press Ctrl-C to exit\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = found.recv() => match update {
                Ok(name) => {
                    let addresses = discovery
                        .devices()
                        .into_iter()
                        .find(|d| d.name == name)
                        .map(|d| {
                            d.addresses
                                .iter()
                                .map(ToString::to_string)
                                .collect::<Vec<_>>()
                                .join(", ")
                        })
                        .unwrap_or_default();
                    println!("Found service {name}: is a FPP device ({addresses})");
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }

    println!("\nControl-C pressed, stopping scan");
    discovery.stop().await;

    let devices = discovery.devices();
    if !devices.is_empty() {
        println!("\nFound FPP devices");
        println!("{}", output::render_devices(&devices));
    }
    Ok(())
}
