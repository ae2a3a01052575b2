//! Connection Tests
//!
//! Tests verify the per-connection loop over a scripted transport:
//! - Pipelined commands run as soon as they are complete, whatever the read
//!   boundaries
//! - Only the unfinished tail counts against the request size limit
//! - Framing errors are answered after the commands in front of them

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use respio::network::{BufferPool, CommandHandler, Connection, IoHandler, Transport};
use respio::{Command, Config, WireValue};

// =============================================================================
// Scripted Transport
// =============================================================================

#[derive(Default)]
struct ScriptState {
    input: Vec<u8>,
    pos: usize,
    output: Vec<u8>,
}

/// Yields its input at most `step` bytes per read, then EOF
#[derive(Clone)]
struct ScriptedConn {
    state: Arc<Mutex<ScriptState>>,
    step: usize,
}

impl ScriptedConn {
    fn new(input: &[u8], step: usize) -> Self {
        let state = ScriptState {
            input: input.to_vec(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            step,
        }
    }

    fn output(&self) -> Vec<u8> {
        self.state.lock().output.clone()
    }
}

impl Read for ScriptedConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        let rest = &state.input[state.pos..];
        let n = rest.len().min(buf.len()).min(self.step);
        buf[..n].copy_from_slice(&rest[..n]);
        state.pos += n;
        Ok(n)
    }
}

impl Write for ScriptedConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.lock().output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedConn {
    fn try_clone(&self) -> io::Result<Self> {
        Ok(self.clone())
    }

    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn set_write_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn ping_handler(command: &Command) -> WireValue {
    match command.name_upper().as_str() {
        "PING" => WireValue::simple("PONG"),
        "ECHO" => WireValue::bulk(command.args.concat()),
        _ => WireValue::error(format!("ERR unknown command '{}'", command.name)),
    }
}

/// Run a whole session over `input` and return what the server wrote
fn run_session(
    input: &[u8],
    step: usize,
    buffer_size: usize,
    max_request_size: usize,
    handler: Arc<dyn CommandHandler>,
) -> Vec<u8> {
    let conn = ScriptedConn::new(input, step);
    let pool = BufferPool::new(buffer_size, 2);
    let io = IoHandler::new(conn.clone(), &pool).unwrap();
    let config = Config::builder().max_request_size(max_request_size).build();

    let mut connection = Connection::new(io, handler, &config);
    connection.handle().unwrap();
    connection.close().unwrap();
    conn.output()
}

fn repeat(bytes: &[u8], times: usize) -> Vec<u8> {
    bytes.repeat(times)
}

const PING: &[u8] = b"*1\r\n$4\r\nPING\r\n";
const PONG: &[u8] = b"+PONG\r\n";

// =============================================================================
// Pipelining Tests
// =============================================================================

#[test]
fn test_pipeline_through_small_buffer() {
    // 14-byte commands through a 16-byte read buffer never align
    let output = run_session(&repeat(PING, 8), usize::MAX, 16, 64, Arc::new(ping_handler));
    assert_eq!(output, repeat(PONG, 8));
}

#[test]
fn test_long_pipeline_with_odd_read_sizes() {
    for step in [1, 3, 5, 13, 15] {
        let output = run_session(&repeat(PING, 500), step, 16, 64, Arc::new(ping_handler));
        assert_eq!(output, repeat(PONG, 500), "read step {}", step);
    }
}

#[test]
fn test_commands_run_once_and_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = {
        let seen = Arc::clone(&seen);
        move |command: &Command| {
            seen.lock().push(command.arg_str(0).unwrap_or_default().to_string());
            WireValue::ok()
        }
    };

    let mut input = Vec::new();
    for i in 0..50 {
        let arg = i.to_string();
        input.extend_from_slice(format!("*2\r\n$4\r\nECHO\r\n${}\r\n{}\r\n", arg.len(), arg).as_bytes());
    }

    let output = run_session(&input, 7, 16, 64, Arc::new(recorder));
    assert_eq!(output, repeat(b"+OK\r\n", 50));

    let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
    assert_eq!(*seen.lock(), expected);
}

#[test]
fn test_binary_argument_reaches_handler_intact() {
    let input = b"*2\r\n$4\r\nECHO\r\n$3\r\n\xff\x00\xfe\r\n";
    let output = run_session(input, 4, 16, 64, Arc::new(ping_handler));
    assert_eq!(output, b"$3\r\n\xff\x00\xfe\r\n");
}

// =============================================================================
// Limit and Error Tests
// =============================================================================

#[test]
fn test_single_oversized_request_rejected() {
    let mut input = b"*2\r\n$4\r\nECHO\r\n$1000\r\n".to_vec();
    input.extend_from_slice(&[b'a'; 100]);

    let output = run_session(&input, usize::MAX, 16, 64, Arc::new(ping_handler));
    assert_eq!(output, b"-ERR request too large\r\n");
}

#[test]
fn test_commands_before_malformed_one_still_run() {
    let mut input = repeat(PING, 2);
    input.extend_from_slice(b"*0\r\n");

    let output = run_session(&input, usize::MAX, 16, 64, Arc::new(ping_handler));

    let mut expected = repeat(PONG, 2);
    expected.extend_from_slice(b"-ERR Protocol error: empty command\r\n");
    assert_eq!(output, expected);
}

#[test]
fn test_connection_recovers_after_malformed_request() {
    let mut input = b"+PING\r\n".to_vec();
    input.extend_from_slice(PING);

    let output = run_session(&input, 7, 16, 64, Arc::new(ping_handler));

    let mut expected = b"-ERR Protocol error: expected array, got '+'\r\n".to_vec();
    expected.extend_from_slice(PONG);
    assert_eq!(output, expected);
}
