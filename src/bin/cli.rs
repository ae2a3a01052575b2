//! respio CLI Client
//!
//! Sends one command and prints the decoded reply.

use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

use clap::Parser;
use respio::protocol::{encode, Decoder};
use respio::Value;

/// respio CLI
#[derive(Parser, Debug)]
#[command(name = "respio-cli")]
#[command(about = "Send a RESP command and print the reply")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7379")]
    server: String,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Command name followed by its arguments
    #[arg(required = true, num_args = 1..)]
    command: Vec<String>,
}

fn run(args: &Args) -> respio::Result<Value> {
    let mut stream = TcpStream::connect(&args.server)?;
    stream.set_read_timeout(Some(Duration::from_millis(args.timeout_ms)))?;

    // Commands go out as an array of bulk strings
    stream.write_all(&encode(&args.command, false))?;
    stream.flush()?;

    Decoder::new(stream).decode_one()
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("(error) {}", e);
            std::process::exit(1);
        }
    }
}
