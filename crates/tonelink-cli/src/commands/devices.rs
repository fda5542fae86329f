//! Audio device listing command.

use clap::Args;
use tonelink_io::list_devices;

#[derive(Args)]
pub struct DevicesArgs {
    /// Emit the device list as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_devices()?;

    if args.json {
        let entries: Vec<_> = devices
            .iter()
            .map(|d| {
                serde_json::json!({
                    "name": d.name,
                    "input_index": d.input_index,
                    "output_index": d.output_index,
                    "default_sample_rate": d.default_sample_rate,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("no audio devices found");
        return Ok(());
    }

    println!("{:<40} {:>6} {:>7} {:>10}", "name", "input", "output", "rate");
    for device in devices {
        let fmt_index = |idx: Option<usize>| {
            idx.map(|i| i.to_string()).unwrap_or_else(|| "-".into())
        };
        println!(
            "{:<40} {:>6} {:>7} {:>10}",
            device.name,
            fmt_index(device.input_index),
            fmt_index(device.output_index),
            device.default_sample_rate,
        );
    }
    Ok(())
}
