//! Connection Handler
//!
//! Drives one client connection: read, reassemble, parse, execute, reply.
//!
//! Complete commands at the front of the pending bytes run as soon as they
//! arrive; only an unfinished trailing command is carried to the next read.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};

use crate::config::Config;
use crate::error::{RespError, Result};
use crate::protocol::{encode_into, Command, Parser, WireValue};
use super::context::IoContext;
use super::io_handler::{IoHandler, Transport};

/// The execution layer, external to this crate
///
/// Receives each parsed command in order and returns the reply to send.
pub trait CommandHandler: Send + Sync {
    fn execute(&self, command: &Command) -> WireValue;
}

impl<F> CommandHandler for F
where
    F: Fn(&Command) -> WireValue + Send + Sync,
{
    fn execute(&self, command: &Command) -> WireValue {
        self(command)
    }
}

/// Handles a single client connection
pub struct Connection<T: Transport> {
    /// Buffered, pooled I/O
    io: IoHandler<T>,

    /// Execution layer
    handler: Arc<dyn CommandHandler>,

    /// Bytes of a request that has not fully arrived yet
    pending: BytesMut,

    /// Encoded replies for the current batch
    out: BytesMut,

    /// Peer address for logging
    peer_addr: String,

    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    max_request_size: usize,
    max_depth: usize,
}

impl<T: Transport> Connection<T> {
    /// Create a connection handler over an established I/O handler
    pub fn new(io: IoHandler<T>, handler: Arc<dyn CommandHandler>, config: &Config) -> Self {
        Self {
            peer_addr: io.peer_addr().to_string(),
            io,
            handler,
            pending: BytesMut::new(),
            out: BytesMut::new(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            max_request_size: config.max_request_size,
            max_depth: config.max_nesting_depth,
        }
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns Ok when the client disconnects or times out, Err on an
    /// unexpected transport failure.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let ctx = IoContext::from_timeout(self.read_timeout);
            let chunk = match self.io.read(&ctx) {
                Ok(chunk) => chunk,
                Err(e) if is_disconnect(&e) => {
                    tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };
            self.pending.extend_from_slice(chunk);

            let (commands, consumed, failure) = self.take_complete();
            self.execute_batch(&commands);

            if let Some(e) = failure {
                tracing::debug!("Malformed request from {}: {}", self.peer_addr, e);
                self.pending.clear();
                self.queue_reply(&WireValue::error(format!("ERR {}", e)));
            } else {
                self.pending.advance(consumed);
                if self.pending.len() > self.max_request_size {
                    tracing::warn!(
                        "Request from {} exceeds {} bytes, closing",
                        self.peer_addr,
                        self.max_request_size
                    );
                    self.queue_reply(&WireValue::error("ERR request too large"));
                    let _ = self.flush_replies();
                    return Ok(());
                }
                if !self.pending.is_empty() {
                    tracing::trace!(
                        "Waiting for more data from {} ({} bytes pending)",
                        self.peer_addr,
                        self.pending.len()
                    );
                }
            }

            if let Err(e) = self.flush_replies() {
                if is_disconnect(&e) {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Parse every complete command at the front of `pending`
    ///
    /// Returns the commands, the bytes they occupy and the framing error
    /// that stopped parsing, if any. An unfinished trailing command is not
    /// an error; its bytes are simply not counted as consumed.
    fn take_complete(&self) -> (Vec<Command>, usize, Option<RespError>) {
        let mut parser = Parser::with_max_depth(&self.pending, self.max_depth);
        let mut commands = Vec::new();
        let mut consumed = 0;

        loop {
            match parser.next_command() {
                Ok(Some(command)) => {
                    commands.push(command);
                    consumed = parser.position();
                }
                Ok(None) => return (commands, consumed, None),
                Err(e) if e.is_incomplete() => return (commands, consumed, None),
                Err(e) => return (commands, consumed, Some(e)),
            }
        }
    }

    /// Run every command of a pipelined batch, in order
    fn execute_batch(&mut self, commands: &[Command]) {
        for command in commands {
            tracing::trace!("Received command from {}: {}", self.peer_addr, command);
            let reply = self.handler.execute(command);
            self.queue_reply(&reply);
        }
    }

    fn queue_reply(&mut self, reply: &WireValue) {
        encode_into(reply, false, &mut self.out);
    }

    /// Send all queued replies in one write
    fn flush_replies(&mut self) -> Result<()> {
        if self.out.is_empty() {
            return Ok(());
        }
        let ctx = IoContext::from_timeout(self.write_timeout);
        let result = self.io.write(&ctx, &self.out);
        self.out.clear();
        result
    }

    /// Flush and close the underlying connection
    pub fn close(self) -> Result<()> {
        self.io.close()
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// True for errors meaning the peer went away or went quiet
fn is_disconnect(err: &RespError) -> bool {
    if matches!(err, RespError::ConnectionClosed) {
        return true;
    }
    err.io_cause().is_some_and(|e| {
        matches!(
            e.kind(),
            ErrorKind::UnexpectedEof
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::NotConnected
                // Read timeout (Windows uses TimedOut instead of WouldBlock)
                | ErrorKind::WouldBlock
                | ErrorKind::TimedOut
        )
    })
}
