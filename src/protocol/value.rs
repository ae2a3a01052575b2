//! Value definitions
//!
//! Wire-level values, decoded values and parsed commands.
//!
//! Payloads are held as raw bytes. Nothing on the wire promises UTF-8, so
//! text views are only produced on request.

use std::fmt;

use bytes::Bytes;

/// Text used for a null bulk string inside a command array
pub const NIL_PLACEHOLDER: &str = "(nil)";

/// A RESP wire primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Simple string: +OK\r\n
    SimpleString(Bytes),

    /// Error: -ERR message\r\n
    Error(Bytes),

    /// Integer: :123\r\n
    Integer(i64),

    /// Bulk string: $5\r\nhello\r\n, None is the null bulk string $-1\r\n
    BulkString(Option<Bytes>),

    /// Array: *2\r\n..., None is the null array *-1\r\n
    Array(Option<Vec<WireValue>>),
}

impl WireValue {
    /// `+OK`
    pub fn ok() -> Self {
        WireValue::SimpleString(Bytes::from_static(b"OK"))
    }

    pub fn simple(text: impl Into<Bytes>) -> Self {
        WireValue::SimpleString(text.into())
    }

    pub fn error(message: impl Into<Bytes>) -> Self {
        WireValue::Error(message.into())
    }

    pub fn bulk(payload: impl Into<Bytes>) -> Self {
        WireValue::BulkString(Some(payload.into()))
    }

    pub fn null_bulk() -> Self {
        WireValue::BulkString(None)
    }

    pub fn array(items: Vec<WireValue>) -> Self {
        WireValue::Array(Some(items))
    }

    pub fn null_array() -> Self {
        WireValue::Array(None)
    }

    /// True for either null sentinel
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::BulkString(None) | WireValue::Array(None))
    }
}

/// A generic value produced by the decoder
///
/// The wire format only yields strings, integers, arrays and the null
/// sentinels, so the set is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Simple string, error text or bulk string payload
    String(Bytes),

    /// Integer
    Integer(i64),

    /// Array, possibly empty
    Array(Vec<Value>),

    /// Null bulk string or null array
    Null,
}

impl Value {
    /// The payload, if this is a string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(&s[..]),
            _ => None,
        }
    }

    /// The payload as text, if this is a string holding valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::String(Bytes::copy_from_slice(b))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Bytes::from(s))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::String(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<WireValue> for Value {
    fn from(wire: WireValue) -> Self {
        match wire {
            WireValue::SimpleString(s) | WireValue::Error(s) => Value::String(s),
            WireValue::Integer(n) => Value::Integer(n),
            WireValue::BulkString(Some(s)) => Value::String(s),
            WireValue::Array(Some(items)) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            WireValue::BulkString(None) | WireValue::Array(None) => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", String::from_utf8_lossy(s)),
            Value::Integer(n) => write!(f, "(integer) {}", n),
            Value::Null => f.write_str(NIL_PLACEHOLDER),
            Value::Array(items) if items.is_empty() => f.write_str("(empty array)"),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
        }
    }
}

/// A parsed client command
///
/// Names are not unique across a pipelined batch and argument order is
/// significant. The name is a keyword and is held as text (invalid UTF-8
/// replaced); arguments keep their exact bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// First element of the command array
    pub name: String,

    /// Remaining elements, in positional order
    pub args: Vec<Bytes>,
}

impl Command {
    pub fn new<I, A>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Bytes>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Argument `index` as text, if present and valid UTF-8
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args
            .get(index)
            .and_then(|arg| std::str::from_utf8(arg).ok())
    }

    /// Upper-cased command name, for case-insensitive dispatch
    pub fn name_upper(&self) -> String {
        self.name.to_ascii_uppercase()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}
