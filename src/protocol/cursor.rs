//! Parse cursor
//!
//! A read position over an immutable byte buffer, plus the line-level
//! primitives shared by the parser and the decoder.

use crate::error::{RespError, Result};

/// Two-byte line terminator
pub const CRLF: &[u8; 2] = b"\r\n";

/// Largest accepted bulk string payload (512 MB)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Read position over a byte buffer
///
/// Invariant: `pos <= buf.len()`. The position only moves forward.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Look at the next byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Consume one byte
    pub fn next_byte(&mut self) -> Result<u8> {
        let byte = self.peek().ok_or(RespError::Incomplete)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Consume up to and including the next CRLF, returning the bytes
    /// before it
    pub fn read_line(&mut self) -> Result<&'a [u8]> {
        let rest = self.remaining();
        let end = rest
            .windows(2)
            .position(|w| w == CRLF)
            .ok_or(RespError::Incomplete)?;
        self.pos += end + 2;
        Ok(&rest[..end])
    }

    /// Consume exactly `n` bytes
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        let rest = self.remaining();
        if rest.len() < n {
            return Err(RespError::Incomplete);
        }
        self.pos += n;
        Ok(&rest[..n])
    }

    /// Consume a CRLF at the current position
    pub fn expect_crlf(&mut self) -> Result<()> {
        let rest = self.remaining();
        if rest.len() < 2 {
            return Err(RespError::Incomplete);
        }
        if &rest[..2] != CRLF {
            return Err(RespError::MissingTerminator);
        }
        self.pos += 2;
        Ok(())
    }

    /// Read a `:`-style integer line
    pub fn read_integer_line(&mut self) -> Result<i64> {
        let line = self.read_line()?;
        parse_i64(line).ok_or_else(|| RespError::InvalidInteger(lossy(line)))
    }

    /// Read a `$`/`*` length line; `-1` and other negatives are returned
    /// as-is for the caller to judge
    pub fn read_length_line(&mut self) -> Result<i64> {
        let line = self.read_line()?;
        parse_i64(line).ok_or_else(|| RespError::InvalidLength(lossy(line)))
    }

    /// Read a bulk string body after its `$` marker; None is the null bulk
    /// string
    pub fn read_bulk_body(&mut self) -> Result<Option<&'a [u8]>> {
        let len = self.read_length_line()?;
        if len == -1 {
            return Ok(None);
        }
        if len < 0 {
            return Err(RespError::InvalidLength(len.to_string()));
        }
        let len = usize::try_from(len).map_err(|_| RespError::InvalidLength(len.to_string()))?;
        if len > MAX_BULK_LEN {
            return Err(RespError::BulkTooLarge(len));
        }

        let payload = self.read_exact(len)?;
        self.expect_crlf().map_err(|e| match e {
            RespError::MissingTerminator => RespError::LengthMismatch,
            other => other,
        })?;
        Ok(Some(payload))
    }
}

/// Parse a strict base-10 i64: optional leading `-`, then one or more
/// ASCII digits. No `+`, whitespace or fraction.
pub fn parse_i64(bytes: &[u8]) -> Option<i64> {
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        return None;
    }

    // Accumulate as a negative number so i64::MIN does not overflow
    let mut acc: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        acc = acc.checked_mul(10)?.checked_sub(i64::from(b - b'0'))?;
    }

    if negative {
        Some(acc)
    } else {
        acc.checked_neg()
    }
}

/// Bytes to String, replacing invalid UTF-8
pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
