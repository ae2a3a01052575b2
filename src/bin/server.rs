//! respio Server Binary
//!
//! Starts a TCP server with a minimal built-in responder, for exercising the
//! protocol layer with stock RESP clients.

use std::sync::Arc;

use clap::Parser;
use respio::{Command, Config, Server, WireValue};
use tracing_subscriber::{fmt, EnvFilter};

/// respio Server
#[derive(Parser, Debug)]
#[command(name = "respio-server")]
#[command(about = "RESP protocol server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Idle read timeout in milliseconds (0 disables)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 disables)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,

    /// Size of each pooled read buffer in KB
    #[arg(long, default_value = "16")]
    buffer_kb: usize,
}

/// Answers PING, ECHO and COMMAND; everything else is unknown
fn respond(command: &Command) -> WireValue {
    match command.name_upper().as_str() {
        "PING" => match command.args.as_slice() {
            [] => WireValue::simple("PONG"),
            [message] => WireValue::bulk(message.clone()),
            _ => wrong_arity("ping"),
        },
        "ECHO" => match command.args.as_slice() {
            [message] => WireValue::bulk(message.clone()),
            _ => wrong_arity("echo"),
        },
        "COMMAND" => WireValue::array(vec![]),
        _ => WireValue::error(format!("ERR unknown command '{}'", command.name)),
    }
}

fn wrong_arity(name: &str) -> WireValue {
    WireValue::error(format!("ERR wrong number of arguments for '{}' command", name))
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,respio=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("respio Server v{}", respio::VERSION);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .io_buffer_size(args.buffer_kb * 1024)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    let mut server = Server::new(config, Arc::new(respond));
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
