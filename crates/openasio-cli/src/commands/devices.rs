//! Device listing command.

use clap::Args;
use openasio_io::AudioBackend;

use super::common::{backend, device_json};

#[derive(Args)]
pub struct DevicesArgs {
    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend = backend(true);
    let devices = backend.list_devices()?;

    if args.json {
        let list: Vec<_> = devices.iter().map(device_json).collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    println!("Available Devices ({} backend)", backend.name());
    println!("==============================\n");
    for device in &devices {
        println!(
            "  [{}] {}  ({} in / {} out, {} Hz default)",
            device.id,
            device.name,
            device.max_input_channels,
            device.max_output_channels,
            device.default_sample_rate
        );
        println!("      caps: {}", device.capabilities());
    }
    println!();
    println!("Tip: select a device by partial name with --device:");
    println!("  openasio run --device duplex --in-channels 2");
    Ok(())
}
