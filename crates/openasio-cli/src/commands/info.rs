//! Device introspection command.

use clap::Args;
use openasio_io::Session;

use super::common::backend;
use crate::tone::ToneHost;

#[derive(Args)]
pub struct InfoArgs {
    /// Device name (partial match); default device when omitted
    #[arg(short, long)]
    device: Option<String>,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let mut session = Session::new(
        Box::new(backend(true)),
        Box::new(ToneHost::new(0.0, 0.0, Some(1))),
    );
    let id = session.open(args.device.as_deref())?;
    let caps = session.get_caps()?;
    let config = session.get_default_config()?;
    let latency = session.get_latency()?;
    let name = session
        .device()
        .map(|d| d.name.clone())
        .unwrap_or_default();
    session.close()?;

    if args.json {
        let info = serde_json::json!({
            "id": id,
            "name": name,
            "capabilities": caps.flag_names().collect::<Vec<_>>(),
            "default_config": config,
            "latency": {
                "input_frames": latency.input_frames,
                "output_frames": latency.output_frames,
            },
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Device [{id}] {name}");
    println!("  Capabilities:   {caps}");
    println!("  Sample rate:    {} Hz", config.sample_rate);
    println!("  Buffer frames:  {}", config.buffer_frames);
    println!(
        "  Channels:       {} in / {} out",
        config.in_channels, config.out_channels
    );
    println!("  Format:         {} ({})", config.format, config.layout);
    println!(
        "  Latency:        {} in / {} out frames",
        latency.input_frames, latency.output_frames
    );
    Ok(())
}
