//! Loopback self-test command.

use super::common::ModemOpts;
use clap::Args;
use std::time::{Duration, Instant};
use tonelink_link::Modem;

#[derive(Args)]
pub struct PingArgs {
    #[command(flatten)]
    modem: ModemOpts,

    /// Payload to send through the stack
    #[arg(long, default_value = "tonelink loopback ping")]
    message: String,

    /// Receive timeout in seconds
    #[arg(long, default_value = "5")]
    timeout: u64,
}

pub fn run(args: PingArgs) -> anyhow::Result<()> {
    let mut config = args.modem.resolve()?;
    // Ping is always a self-test: the modem hears its own transmission.
    config.loopback = true;

    let mut modem = Modem::from_config(&config)?;
    let payload = args.message.as_bytes();

    println!("sending {} bytes through the loopback...", payload.len());
    let start = Instant::now();
    modem.transmit(payload)?;
    let received = modem.receive(Duration::from_secs(args.timeout))?;
    let elapsed = start.elapsed();

    if received == payload {
        println!(
            "ok: {} bytes round-tripped in {:.2} s",
            received.len(),
            elapsed.as_secs_f64()
        );
        Ok(())
    } else {
        anyhow::bail!(
            "payload mismatch: sent {} bytes, received {}",
            payload.len(),
            received.len()
        )
    }
}
