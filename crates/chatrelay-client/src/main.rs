//! Interactive chat relay client: connects to the server and relays lines
//! typed at the terminal, out of core (§1) but built as the other half of
//! the wire protocol.

mod commands;
mod render;
mod session;

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Interactive terminal client for the chat relay.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Server address to connect to.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// Server port to connect to.
    #[arg(long, default_value_t = 4000)]
    port: u16,

    /// Raise log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let addr = SocketAddr::new(args.host, args.port);
    let stream = match TcpStream::connect(addr) {
        Ok(stream) => stream,
        Err(err) => {
            eprintln!("could not connect to {addr}: {err}");
            return std::process::ExitCode::FAILURE;
        }
    };
    if let Err(err) = stream.set_nodelay(true) {
        tracing::warn!(%err, "failed to set TCP_NODELAY");
    }

    println!("{}", render::reply_line(&format!("connected to {addr}")));
    match session::run(stream) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = if verbose == 0 { "chatrelay_client=warn" } else { "chatrelay_client=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}
