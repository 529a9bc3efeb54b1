//! loralink: command-line tool for the E22-400T22U LoRa link.
//!
//! Usage:
//!   loralink list
//!   loralink send [OPTIONS] <MESSAGE>...
//!   loralink listen [OPTIONS]
//!
//! Options:
//!   --port PORT       Serial port (default: first USB port found)
//!   --baud RATE       Baud rate (default: 9600)

use anyhow::{bail, Context, Result};
use std::time::Duration;

use loralink_core::protocol::list_ports;
use loralink_core::worker::{LoraWorker, WorkerConfig, WorkerEvent};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("list") => cmd_list(),
        Some("send") => cmd_send(&args[2..]),
        Some("listen") => cmd_listen(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  loralink list");
    eprintln!("  loralink send [--port PORT] [--baud RATE] <MESSAGE>...");
    eprintln!("  loralink listen [--port PORT] [--baud RATE]");
}

/// Parse --port/--baud out of `args`; everything else is returned as the
/// message words.
fn parse_options(args: &[String]) -> Result<(WorkerConfig, Vec<String>)> {
    let mut config = WorkerConfig::default();
    let mut rest = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                config.port_name = args
                    .get(i)
                    .context("--port requires a value")?
                    .clone();
            }
            "--baud" | "-b" => {
                i += 1;
                config.baud_rate = args
                    .get(i)
                    .context("--baud requires a value")?
                    .parse()
                    .context("--baud requires a number")?;
            }
            other => rest.push(other.to_string()),
        }
        i += 1;
    }

    if config.port_name.is_empty() {
        let ports = list_ports();
        let first = ports
            .first()
            .context("no serial ports found; specify one with --port")?;
        config.port_name = first.name.clone();
    }

    Ok((config, rest))
}

fn open_worker(config: WorkerConfig) -> Result<LoraWorker> {
    let port_name = config.port_name.clone();
    let baud = config.baud_rate;
    let mut worker = LoraWorker::new(config);
    worker.open_port();

    for event in worker.take_events() {
        match event {
            WorkerEvent::PortOpened { ok: true, .. } => {
                eprintln!("opened {} at {} baud", port_name, baud);
            }
            WorkerEvent::PortOpened { ok: false, error } => {
                bail!("could not open {}: {}", port_name, error);
            }
            WorkerEvent::Error(msg) => bail!("{}", msg),
            _ => {}
        }
    }

    Ok(worker)
}

fn cmd_list() -> Result<()> {
    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{}  [{:04x}:{:04x}] {}",
                port.name,
                vid,
                pid,
                port.product.as_deref().unwrap_or("")
            ),
            _ => println!("{}", port.name),
        }
    }
    Ok(())
}

fn cmd_send(args: &[String]) -> Result<()> {
    let (config, words) = parse_options(args)?;
    if words.is_empty() {
        bail!("nothing to send; give a message after the options");
    }
    let message = words.join(" ");

    let mut worker = open_worker(config)?;
    worker.send_packet(message.as_bytes());

    loop {
        worker.poll();
        for event in worker.take_events() {
            match event {
                WorkerEvent::SendProgress { sent, total } => {
                    eprintln!("sent {}/{} bytes", sent, total);
                }
                WorkerEvent::PacketSent(true) => {
                    println!("packet delivered ({} bytes)", message.len());
                    return Ok(());
                }
                WorkerEvent::PacketSent(false) => bail!("send failed"),
                WorkerEvent::Error(msg) => eprintln!("[WARN] {}", msg),
                _ => {}
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn cmd_listen(args: &[String]) -> Result<()> {
    let (config, _) = parse_options(args)?;
    let mut worker = open_worker(config)?;

    eprintln!("listening; Ctrl-C to stop");
    loop {
        worker.poll();
        for event in worker.take_events() {
            match event {
                WorkerEvent::ReceiveProgress { received, total } => {
                    eprintln!("receiving {}/{} bytes", received, total);
                }
                WorkerEvent::PacketReceived(data) => {
                    println!("{}", String::from_utf8_lossy(&data));
                }
                WorkerEvent::Error(msg) => eprintln!("[WARN] {}", msg),
                _ => {}
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
