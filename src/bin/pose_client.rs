//! Report a pose to a running monitor and wait for the acknowledgement.
//!
//! Usage: `pose-client <addr> <x> <y> <theta>`

use drishti_monitor::error::{Error, Result};
use drishti_monitor::wire::{self, PoseAck, PoseRequest};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ACK_TIMEOUT: Duration = Duration::from_secs(5);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(-1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        return Err(Error::Config(
            "usage: pose-client <addr> <x> <y> <theta>".to_string(),
        ));
    }

    let addr: SocketAddr = args[1]
        .parse()
        .map_err(|e| Error::Config(format!("invalid address: {}", e)))?;
    let x = parse_value(&args[2], "x")?;
    let y = parse_value(&args[3], "y")?;
    let theta = parse_value(&args[4], "theta")?;

    let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    stream.set_read_timeout(Some(ACK_TIMEOUT))?;

    wire::write_frame(&mut stream, &PoseRequest { x, y, theta })?;
    log::info!("reported pose ({:.2}, {:.2}, {:.2}) to {}", x, y, theta, addr);

    match wire::read_frame::<_, PoseAck>(&mut stream)? {
        Some(ack) => log::info!("acknowledged: ok={}", ack.ok),
        None => log::warn!("no acknowledgement before timeout"),
    }

    Ok(())
}

fn parse_value(raw: &str, name: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| Error::Config(format!("invalid {} value: {}", name, raw)))
}
