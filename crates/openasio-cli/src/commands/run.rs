//! Test-tone streaming command.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Args;
use openasio_config::resolve_profile;
use openasio_core::{Error, SessionState};
use openasio_io::Session;

use super::common::{StreamArgs, backend};
use crate::tone::ToneHost;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Args)]
pub struct RunArgs {
    /// Device name (partial match); overrides the profile's device
    #[arg(short, long)]
    device: Option<String>,

    /// Session profile name or path (factory or user)
    #[arg(short, long)]
    profile: Option<String>,

    #[command(flatten)]
    stream: StreamArgs,

    /// Stop after this many periods (runs until Ctrl+C when omitted)
    #[arg(short = 'n', long)]
    periods: Option<u64>,

    /// Tone frequency in Hz
    #[arg(long, default_value = "440")]
    frequency: f32,

    /// Tone amplitude (0.0 - 1.0)
    #[arg(long, default_value = "0.25")]
    amplitude: f32,

    /// Process periods as fast as possible instead of in real time
    #[arg(long)]
    freewheel: bool,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    if args.periods == Some(0) {
        anyhow::bail!("--periods must be at least 1");
    }

    let profile = args.profile.as_deref().map(resolve_profile).transpose()?;
    let device = args
        .device
        .clone()
        .or_else(|| profile.as_ref().and_then(|p| p.device.clone()));

    let backend = backend(args.freewheel);
    let stats = backend.stats();
    let host = ToneHost::new(args.frequency, args.amplitude, args.periods);
    let mut session = Session::new(Box::new(backend), Box::new(host));

    session.open(device.as_deref())?;
    let base = match &profile {
        Some(p) => p.stream,
        None => session.get_default_config()?,
    };
    let requested = args.stream.apply(base);
    session.start(&requested)?;
    let config = session.get_config()?;

    let device_name = session
        .device()
        .map(|d| d.name.clone())
        .unwrap_or_default();
    println!("Streaming {} Hz tone", args.frequency);
    println!("  Device:        {device_name}");
    println!("  Sample rate:   {} Hz", config.sample_rate);
    println!("  Buffer frames: {}", config.buffer_frames);
    println!(
        "  Channels:      {} in / {} out",
        config.in_channels, config.out_channels
    );
    println!("  Format:        {} ({})", config.format, config.layout);
    if args.periods.is_none() {
        println!("\nPress Ctrl+C to stop...\n");
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;

    loop {
        if interrupted.load(Ordering::SeqCst) {
            println!("\nStopping...");
            stop_if_running(&mut session)?;
            break;
        }
        if session.state() != SessionState::Running {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    let periods = session.periods_processed();
    let totals = session.xrun_totals();
    println!("Periods:       {periods}");
    println!("Frames played: {}", stats.frames_written());
    println!(
        "Xruns:         {} underrun(s), {} overrun(s)",
        totals.underruns, totals.overruns
    );

    // A run that ended on its own may have ended on a device fault; close
    // reports it.
    session.close()?;
    Ok(())
}

/// Stops the run unless it already ended on its own.
fn stop_if_running(session: &mut Session) -> openasio_io::Result<()> {
    match session.stop() {
        Ok(()) | Err(Error::State { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}
