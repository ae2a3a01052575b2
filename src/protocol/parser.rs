//! Command parser
//!
//! Turns a raw request buffer, possibly holding several pipelined requests,
//! into an ordered list of commands.
//!
//! A parser is created per inbound chunk and holds no state across chunks.
//! A message split across two socket reads fails with
//! [`RespError::Incomplete`]. Callers that stream use
//! [`Parser::next_command`] and keep only the bytes after the last complete
//! command for the next chunk.

use bytes::Bytes;

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{RespError, Result};
use super::cursor::{lossy, Cursor};
use super::value::{Command, NIL_PLACEHOLDER};

/// Recursive-descent parser over one request buffer
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser with the default nesting ceiling
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    /// Create a parser that rejects arrays nested deeper than `max_depth`
    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            cursor: Cursor::new(data),
            max_depth,
        }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Parse every top-level command in the buffer
    ///
    /// Each top-level value must be a non-null, non-empty array. The first
    /// failure aborts the whole call and no partial list is returned.
    pub fn parse(mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        while let Some(command) = self.next_command()? {
            commands.push(command);
        }
        Ok(commands)
    }

    /// Parse the next top-level command, or None once the buffer is used up
    ///
    /// After a successful call [`Parser::position`] is the end of that
    /// command. Callers record it to know where an unfinished tail starts
    /// when a later call fails with [`RespError::Incomplete`].
    pub fn next_command(&mut self) -> Result<Option<Command>> {
        let marker = match self.cursor.peek() {
            Some(marker) => marker,
            None => return Ok(None),
        };
        if marker != b'*' {
            return Err(RespError::NotAnArray(marker));
        }

        let mut parts = self.read_array()?.into_iter();
        let name = parts.next().ok_or(RespError::EmptyCommand)?;
        Ok(Some(Command {
            name: lossy(&name),
            args: parts.collect(),
        }))
    }

    // =========================================================================
    // Value Readers
    // =========================================================================

    /// Read an array as the raw payloads of its elements
    ///
    /// Empty (`*0`) and null (`*-1`) arrays are errors here. Only the
    /// declared number of elements is consumed; anything after them is left
    /// in the buffer. Nested arrays are flattened into the result.
    pub fn read_array(&mut self) -> Result<Vec<Bytes>> {
        let mut out = Vec::new();
        self.read_array_into(0, &mut out)?;
        Ok(out)
    }

    fn read_array_into(&mut self, depth: usize, out: &mut Vec<Bytes>) -> Result<()> {
        if depth >= self.max_depth {
            return Err(RespError::NestingTooDeep(self.max_depth));
        }

        self.expect_marker(b'*')?;
        let count = match self.cursor.read_length_line()? {
            0 => return Err(RespError::EmptyCommand),
            -1 => return Err(RespError::NullCommand),
            n if n < 0 => return Err(RespError::InvalidLength(n.to_string())),
            n => n as usize,
        };

        // The count is untrusted; don't pre-allocate from it blindly
        out.reserve(count.min(1024));
        for _ in 0..count {
            self.read_element(depth, out)?;
        }
        Ok(())
    }

    fn read_element(&mut self, depth: usize, out: &mut Vec<Bytes>) -> Result<()> {
        let marker = self.cursor.peek().ok_or(RespError::Incomplete)?;
        match marker {
            b'+' => out.push(self.read_simple_string()?),
            b'-' => out.push(self.read_error()?),
            b':' => out.push(Bytes::from(self.read_integer()?.to_string())),
            b'$' => out.push(
                self.read_bulk_string()?
                    .unwrap_or_else(|| Bytes::from_static(NIL_PLACEHOLDER.as_bytes())),
            ),
            b'*' => self.read_array_into(depth + 1, out)?,
            other => return Err(RespError::UnknownType(other)),
        }
        Ok(())
    }

    /// `+<text>\r\n`
    pub fn read_simple_string(&mut self) -> Result<Bytes> {
        self.expect_marker(b'+')?;
        Ok(Bytes::copy_from_slice(self.cursor.read_line()?))
    }

    /// `-<text>\r\n`, returned without the marker
    pub fn read_error(&mut self) -> Result<Bytes> {
        self.expect_marker(b'-')?;
        Ok(Bytes::copy_from_slice(self.cursor.read_line()?))
    }

    /// `:<decimal>\r\n`
    pub fn read_integer(&mut self) -> Result<i64> {
        self.expect_marker(b':')?;
        self.cursor.read_integer_line()
    }

    /// `$<len>\r\n<payload>\r\n`; None for the null bulk string `$-1\r\n`
    pub fn read_bulk_string(&mut self) -> Result<Option<Bytes>> {
        self.expect_marker(b'$')?;
        Ok(self.cursor.read_bulk_body()?.map(Bytes::copy_from_slice))
    }

    fn expect_marker(&mut self, expected: u8) -> Result<()> {
        let marker = self.cursor.next_byte()?;
        if marker != expected {
            return Err(RespError::UnknownType(marker));
        }
        Ok(())
    }
}

/// Parse all pipelined commands in `data`
pub fn parse_commands(data: &[u8]) -> Result<Vec<Command>> {
    Parser::new(data).parse()
}
