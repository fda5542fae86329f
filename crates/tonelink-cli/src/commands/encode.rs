//! Offline frame inspection: write a modulated frame to a WAV file.

use super::common::ModemOpts;
use clap::Args;
use std::path::PathBuf;
use tonelink_afsk::{AfskParams, Modulator};
use tonelink_io::write_wav;
use tonelink_proto::Frame;

#[derive(Args)]
pub struct EncodeArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Payload text to put in the frame
    #[arg(long, default_value = "tonelink test frame")]
    text: String,

    #[command(flatten)]
    modem: ModemOpts,
}

pub fn run(args: EncodeArgs) -> anyhow::Result<()> {
    let config = args.modem.resolve()?;
    let params = AfskParams {
        sample_rate: config.afsk.sample_rate,
        baud: config.afsk.baud,
        mark_hz: config.afsk.mark_hz,
        space_hz: config.afsk.space_hz,
        filter_bandwidth_hz: config.afsk.filter_bandwidth_hz,
        tx_volume: config.tx_volume,
    };

    let frame = Frame::data(0, args.text.clone().into_bytes())?;
    let wire = frame.to_wire_bytes()?;
    let samples = Modulator::new(params).modulate(&wire);

    write_wav(&args.output, &samples, params.sample_rate)?;
    println!(
        "wrote {} samples ({:.2} s at {} Hz) to {}",
        samples.len(),
        samples.len() as f64 / f64::from(params.sample_rate),
        params.sample_rate,
        args.output.display()
    );
    Ok(())
}
