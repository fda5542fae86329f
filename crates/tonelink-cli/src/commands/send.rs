//! File transfer: sending side.

use super::common::ModemOpts;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tonelink_link::Modem;

#[derive(Args)]
pub struct SendArgs {
    /// File whose bytes to transfer
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[command(flatten)]
    modem: ModemOpts,
}

pub fn run(args: SendArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file)?;
    let config = args.modem.resolve()?;

    println!(
        "connecting... ({} bytes to send, ~{:.0} s of wire time)",
        bytes.len(),
        bytes.len() as f64 * 8.0 / f64::from(config.afsk.baud)
    );

    let modem = Modem::from_config(&config)?;
    let mut connection = modem.connect()?;

    let bar = ProgressBar::new(bytes.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let result = connection.send_with_progress(&bytes, |sent, _| {
        bar.set_position(sent as u64);
    });
    bar.finish();
    result?;

    connection.close()?;
    println!("done: {} bytes acknowledged", bytes.len());
    Ok(())
}
