//! File transfer: receiving side.

use super::common::ModemOpts;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tonelink_link::{LinkError, Modem};

#[derive(Args)]
pub struct RecvArgs {
    /// File to write the received bytes into
    #[arg(value_name = "FILE")]
    output: PathBuf,

    /// How long to listen for a connecting peer, in seconds
    #[arg(long, default_value = "600")]
    wait: u64,

    #[command(flatten)]
    modem: ModemOpts,
}

pub fn run(args: RecvArgs) -> anyhow::Result<()> {
    let config = args.modem.resolve()?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })?;

    println!("listening for a peer (ctrl-c to stop)...");
    let modem = Modem::from_config(&config)?;
    let mut connection = modem.accept(Duration::from_secs(args.wait))?;
    println!("peer connected, receiving...");

    let mut file = std::fs::File::create(&args.output)?;
    let mut total = 0usize;

    loop {
        if interrupted.load(Ordering::SeqCst) {
            println!("interrupted, aborting session");
            connection.abort()?;
            break;
        }
        match connection.recv(Duration::from_secs(30)) {
            Ok(segment) => {
                file.write_all(&segment)?;
                total += segment.len();
            }
            Err(LinkError::Timeout) => continue,
            Err(LinkError::Closed) => {
                println!("peer closed the session");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    file.flush()?;
    println!("received {total} bytes into {}", args.output.display());
    Ok(())
}
