//! Chat relay server binary: parses CLI args, wires up logging, binds the
//! listener and hands control to [`chatrelay_core::Dispatcher`]'s event loop.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chatrelay_core::Dispatcher;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Multi-client chat relay server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to bind the listener on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Port to listen on.
    #[arg(long, default_value_t = 4000)]
    port: u16,

    /// Number of statically provisioned rooms.
    #[arg(long, default_value_t = 5)]
    rooms: u8,

    /// Member cap per room.
    #[arg(long, default_value_t = 25)]
    room_capacity: usize,

    /// Raise log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let addr = SocketAddr::new(args.bind, args.port);
    match run(&args, addr) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "server exited with a fatal error");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, addr: SocketAddr) -> std::io::Result<()> {
    let mut dispatcher = Dispatcher::bind_with(addr, args.rooms, args.room_capacity)?;
    tracing::info!(%addr, rooms = args.rooms, room_capacity = args.room_capacity, "chat relay listening");
    dispatcher.run()
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "chatrelay_server=info,chatrelay_core=info,chatrelay_net=info",
        1 => "chatrelay_server=debug,chatrelay_core=debug,chatrelay_net=info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}
