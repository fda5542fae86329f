//! Tonelink CLI - transfer bytes over audible sound.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tonelink")]
#[command(author, version, about = "Acoustic modem CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Loopback self-test: send a payload through the full stack and back
    Ping(commands::ping::PingArgs),

    /// Connect to a listening peer and send a file
    Send(commands::send::SendArgs),

    /// Listen for a peer and receive bytes into a file
    Recv(commands::recv::RecvArgs),

    /// List audio devices and their selection indices
    Devices(commands::devices::DevicesArgs),

    /// Write a modulated frame to a WAV file for offline inspection
    Encode(commands::encode::EncodeArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ping(args) => commands::ping::run(args),
        Commands::Send(args) => commands::send::run(args),
        Commands::Recv(args) => commands::recv::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Encode(args) => commands::encode::run(args),
    }
}
