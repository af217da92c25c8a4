use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use netcalc::{CalcServer, config};

#[derive(Parser)]
#[command(author, version)]
struct Args {
    /// Port to listen on (1-65535)
    port: Option<String>,
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1")]
    addr: IpAddr,
    /// Connections served at the same time, 1 serves them one by one
    #[arg(short, long)]
    workers: Option<u32>,
    /// Read/write timeout per connection in seconds, 0 disables it
    #[arg(short, long)]
    timeout: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("netcalc-server {}", env!("CARGO_PKG_VERSION"));

    let port = config::resolve_port(args.port.as_deref());
    if let Some(warning) = &port.warning {
        eprintln!("Warning: {warning}");
    }
    let addr = SocketAddr::new(args.addr, port.value);
    let workers = args.workers.unwrap_or_else(|| num_cpus::get() as u32);

    let server = CalcServer::bind(addr, workers)
        .with_context(|| format!("failed to listen on {addr}"))?
        .with_timeout(config::timeout_from_secs(args.timeout));
    server.run()?;
    Ok(())
}
