//! Stream decoder
//!
//! Decodes one RESP value at a time from a byte stream into a generic
//! [`Value`]. This is the reply-reading path; unlike the command parser it
//! accepts any top-level type and treats `*0` as an empty array.

use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{RespError, Result};
use super::cursor::Cursor;
use super::value::{Value, WireValue};

/// Smallest refill requested from the stream
const READ_CHUNK: usize = 4096;

/// Parse one complete wire value from the front of `data`
///
/// Returns the value and the number of bytes it occupied. Fails with
/// [`RespError::Incomplete`] when `data` holds only a prefix of a value.
pub fn parse_frame(data: &[u8], max_depth: usize) -> Result<(WireValue, usize)> {
    let mut cursor = Cursor::new(data);
    let value = read_value(&mut cursor, 0, max_depth)?;
    Ok((value, cursor.position()))
}

fn read_value(cursor: &mut Cursor<'_>, depth: usize, max_depth: usize) -> Result<WireValue> {
    match cursor.next_byte()? {
        b'+' => Ok(WireValue::SimpleString(Bytes::copy_from_slice(cursor.read_line()?))),
        b'-' => Ok(WireValue::Error(Bytes::copy_from_slice(cursor.read_line()?))),
        b':' => Ok(WireValue::Integer(cursor.read_integer_line()?)),
        b'$' => Ok(WireValue::BulkString(cursor.read_bulk_body()?.map(Bytes::copy_from_slice))),
        b'*' => {
            if depth >= max_depth {
                return Err(RespError::NestingTooDeep(max_depth));
            }
            let count = cursor.read_length_line()?;
            if count == -1 {
                return Ok(WireValue::Array(None));
            }
            if count < 0 {
                return Err(RespError::InvalidLength(count.to_string()));
            }

            let count = count as usize;
            let mut items = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                items.push(read_value(cursor, depth + 1, max_depth)?);
            }
            Ok(WireValue::Array(Some(items)))
        }
        other => Err(RespError::UnknownType(other)),
    }
}

/// Incremental decoder over a readable stream
///
/// Lives for the duration of the stream. Bytes read ahead of the current
/// value are kept and used by the next call.
pub struct Decoder<R> {
    reader: R,
    buffer: BytesMut,
    max_depth: usize,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_depth(reader, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(reader: R, max_depth: usize) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            max_depth,
        }
    }

    /// Decode exactly one value, reading from the stream as needed
    ///
    /// EOF before a complete value fails with [`RespError::UnexpectedEof`].
    pub fn decode_one(&mut self) -> Result<Value> {
        self.decode_next()?.ok_or(RespError::UnexpectedEof)
    }

    /// Decode values until the stream ends cleanly on a value boundary
    pub fn decode_all(&mut self) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        while let Some(value) = self.decode_next()? {
            values.push(value);
        }
        Ok(values)
    }

    /// Decode the next value, or None if the stream ended with nothing
    /// buffered
    pub fn decode_next(&mut self) -> Result<Option<Value>> {
        loop {
            if !self.buffer.is_empty() {
                match parse_frame(&self.buffer, self.max_depth) {
                    Ok((wire, consumed)) => {
                        self.buffer.advance(consumed);
                        return Ok(Some(Value::from(wire)));
                    }
                    Err(RespError::Incomplete) => {}
                    Err(e) => return Err(e),
                }
            }

            if self.fill()? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                tracing::trace!("stream ended with {} undecoded bytes", self.buffer.len());
                return Err(RespError::UnexpectedEof);
            }
        }
    }

    /// Bytes read from the stream but not yet decoded
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read more bytes onto the end of the buffer
    ///
    /// The request grows with the undecoded backlog, so a large value is
    /// re-scanned a logarithmic number of times rather than once per chunk.
    fn fill(&mut self) -> Result<usize> {
        let start = self.buffer.len();
        let want = READ_CHUNK.max(start);
        self.buffer.resize(start + want, 0);
        loop {
            match self.reader.read(&mut self.buffer[start..]) {
                Ok(n) => {
                    self.buffer.truncate(start + n);
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer.truncate(start);
                    return Err(RespError::Io(e));
                }
            }
        }
    }
}
