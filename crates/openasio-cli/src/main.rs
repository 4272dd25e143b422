//! OpenASIO CLI - command-line host for OpenASIO drivers.

mod commands;
mod tone;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openasio")]
#[command(author, version, about = "OpenASIO driver host", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List devices the driver can open
    Devices(commands::devices::DevicesArgs),

    /// Show capabilities, default configuration and latency of a device
    Info(commands::info::InfoArgs),

    /// Stream a test tone through a device
    Run(commands::run::RunArgs),

    /// List, show and save session profiles
    Profiles(commands::profiles::ProfilesArgs),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Profiles(args) => commands::profiles::run(args),
    }
}
