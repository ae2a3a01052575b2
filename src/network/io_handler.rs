//! Connection I/O Handler
//!
//! Buffered, pooled, deadline-aware reads and writes for one live
//! connection.

use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{RespError, Result};
use super::context::IoContext;
use super::pool::{BufferPool, PooledBuffer};

/// Default capacity of the buffered reader and writer
pub const DEFAULT_STREAM_BUFFER: usize = 8 * 1024;

/// A byte stream the I/O handler can drive
///
/// The handler keeps one handle for reading and a clone for writing;
/// both must refer to the same underlying connection.
pub trait Transport: Read + Write + Sized {
    /// A second handle to the same connection
    fn try_clone(&self) -> io::Result<Self>;

    /// Arm (Some) or disarm (None) the read timeout
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Arm (Some) or disarm (None) the write timeout
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Close both directions
    fn shutdown(&self) -> io::Result<()>;

    /// Remote address for logging
    fn peer_addr(&self) -> String {
        "unknown".to_string()
    }
}

impl Transport for TcpStream {
    fn try_clone(&self) -> io::Result<Self> {
        TcpStream::try_clone(self)
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }

    fn peer_addr(&self) -> String {
        TcpStream::peer_addr(self)
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

/// Reads requests from and writes responses to one connection
///
/// Owns one pooled buffer for its whole lifetime; the buffer goes back to
/// the pool when the handler is dropped. Reads and writes take `&mut self`
/// and are therefore strictly sequential.
pub struct IoHandler<T: Transport> {
    /// Buffered read half
    reader: BufReader<T>,

    /// Buffered write half
    writer: BufWriter<T>,

    /// Scratch buffer for reads, reused across calls
    buffer: PooledBuffer,

    /// Peer address for logging
    peer_addr: String,
}

impl<T: Transport> IoHandler<T> {
    /// Create a handler with default stream buffer sizes
    pub fn new(conn: T, pool: &Arc<BufferPool>) -> Result<Self> {
        Self::with_capacity(conn, pool, DEFAULT_STREAM_BUFFER, DEFAULT_STREAM_BUFFER)
    }

    /// Create a handler with explicit reader/writer buffer sizes
    pub fn with_capacity(
        conn: T,
        pool: &Arc<BufferPool>,
        read_capacity: usize,
        write_capacity: usize,
    ) -> Result<Self> {
        let peer_addr = conn.peer_addr();
        let write_half = conn.try_clone()?;

        Ok(Self {
            reader: BufReader::with_capacity(read_capacity, conn),
            writer: BufWriter::with_capacity(write_capacity, write_half),
            buffer: pool.acquire(),
            peer_addr,
        })
    }

    /// Read whatever the peer has sent, up to the pooled buffer's size
    ///
    /// Returns exactly the bytes read, which may be a partial message. The
    /// slice borrows the handler's buffer and is valid until the next call.
    pub fn read(&mut self, ctx: &IoContext) -> Result<&[u8]> {
        let timeout = ctx.socket_timeout().map_err(RespError::ReadRequest)?;
        self.reader
            .get_ref()
            .set_read_timeout(timeout)
            .map_err(RespError::ReadRequest)?;

        let n = loop {
            match self.reader.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    if ctx.is_cancelled() {
                        return Err(RespError::ReadRequest(e));
                    }
                }
                Err(e) => return Err(RespError::ReadRequest(e)),
            }
        };

        if n == 0 {
            return Err(RespError::ConnectionClosed);
        }

        tracing::trace!("read {} bytes from {}", n, self.peer_addr);
        Ok(&self.buffer[..n])
    }

    /// Write all of `data` and flush
    ///
    /// Either every byte reached the transport or an error is returned.
    pub fn write(&mut self, ctx: &IoContext, data: &[u8]) -> Result<()> {
        let timeout = ctx.socket_timeout().map_err(RespError::WriteResponse)?;
        self.writer
            .get_ref()
            .set_write_timeout(timeout)
            .map_err(RespError::WriteResponse)?;

        self.writer
            .write_all(data)
            .and_then(|_| self.writer.flush())
            .map_err(RespError::WriteResponse)?;

        tracing::trace!("wrote {} bytes to {}", data.len(), self.peer_addr);
        Ok(())
    }

    /// Flush pending output and close the connection
    pub fn close(mut self) -> Result<()> {
        let flushed = self.writer.flush();
        let closed = self.writer.get_ref().shutdown();
        flushed.map_err(RespError::WriteResponse)?;
        closed?;
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Size of the pooled read buffer, the bound on one read
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
