use std::{
    io::{self, BufReader, BufWriter},
    net::{SocketAddr, TcpStream},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use netcalc::{ClientSession, SessionEnd, config};

#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    /// Server IP address
    host: Option<String>,
    /// Server port (1-65535)
    port: Option<String>,
    /// Read/write timeout in seconds, 0 waits forever
    #[arg(short, long)]
    timeout: Option<u64>,
}

fn connect(cli: &Cli) -> Result<TcpStream> {
    let host = config::resolve_host(cli.host.as_deref());
    let port = config::resolve_port(cli.port.as_deref());
    for warning in [&host.warning, &port.warning].into_iter().flatten() {
        eprintln!("Warning: {warning}");
    }
    let addr = SocketAddr::new(host.value, port.value);

    let stream = TcpStream::connect(addr).with_context(|| {
        format!("connection to {addr} failed, check if the server is online and available")
    })?;
    let timeout = config::timeout_from_secs(cli.timeout);
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;
    Ok(stream)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let stream = match connect(&cli) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut session = ClientSession::new(stream);
    let stdin = io::stdin();
    let stdout = io::stdout();
    match session.run(BufReader::new(stdin.lock()), BufWriter::new(stdout.lock())) {
        Ok(SessionEnd::Closed) => ExitCode::SUCCESS,
        Ok(SessionEnd::Aborted) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
