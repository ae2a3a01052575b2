//! Value encoder
//!
//! Maps typed values to RESP wire bytes. Encoding is total over the types
//! implementing [`Encode`]; unsupported types do not compile.
//!
//! | Rust value            | Wire form                                   |
//! |-----------------------|---------------------------------------------|
//! | `bool`                | `+true\r\n` / `+false\r\n`                  |
//! | integers              | `:<n>\r\n`                                  |
//! | `str` / `String`      | `+<s>\r\n` or `$<len>\r\n<s>\r\n`           |
//! | `Bytes`               | as text, payload bytes kept exactly         |
//! | `[T]` / `Vec<T>`      | `*<count>\r\n` then each element            |
//! | `Option<T>`           | the inner value, or `$-1\r\n`               |
//! | `WireValue`           | its exact form, the flag is ignored         |

use std::fmt::Write as _;

use bytes::{BufMut, Bytes, BytesMut};

use super::cursor::CRLF;
use super::value::{Value, WireValue};

const NULL_BULK: &[u8] = b"$-1\r\n";
const NULL_ARRAY: &[u8] = b"*-1\r\n";

/// A value with a RESP wire representation
///
/// Output is always a well-formed frame. Simple strings and errors are
/// line-delimited and cannot carry CR or LF: text chosen as a simple string
/// through the flag falls back to a bulk string when it holds either byte,
/// and the explicit [`WireValue::SimpleString`] / [`WireValue::Error`] forms
/// have them replaced with spaces.
///
/// `[u8]` and `Vec<u8>` are arrays of integers like any other slice; use
/// [`Bytes`] for binary payloads.
pub trait Encode {
    /// Append the wire form of `self` to `out`
    ///
    /// `simple` selects simple strings instead of bulk strings for text.
    fn encode_into(&self, simple: bool, out: &mut BytesMut);
}

/// Encode `value` into a fresh buffer
pub fn encode<T: Encode + ?Sized>(value: &T, simple: bool) -> Bytes {
    let mut out = BytesMut::new();
    value.encode_into(simple, &mut out);
    out.freeze()
}

/// Encode `value`, appending to an existing buffer
pub fn encode_into<T: Encode + ?Sized>(value: &T, simple: bool, out: &mut BytesMut) {
    value.encode_into(simple, out);
}

// =============================================================================
// Wire Primitives
// =============================================================================

fn put_header(out: &mut BytesMut, marker: u8, n: i64) {
    out.put_u8(marker);
    // Writing into BytesMut only fails past usize::MAX bytes
    let _ = write!(out, "{}", n);
    out.put_slice(CRLF);
}

fn put_line(out: &mut BytesMut, marker: u8, text: &[u8]) {
    out.put_u8(marker);
    if is_line_safe(text) {
        out.put_slice(text);
    } else {
        out.extend(
            text.iter()
                .map(|&b| if b == b'\r' || b == b'\n' { b' ' } else { b }),
        );
    }
    out.put_slice(CRLF);
}

fn is_line_safe(text: &[u8]) -> bool {
    !text.iter().any(|&b| b == b'\r' || b == b'\n')
}

fn put_bulk(out: &mut BytesMut, payload: &[u8]) {
    put_header(out, b'$', payload.len() as i64);
    out.put_slice(payload);
    out.put_slice(CRLF);
}

fn put_text(out: &mut BytesMut, text: &[u8], simple: bool) {
    if simple && is_line_safe(text) {
        put_line(out, b'+', text);
    } else {
        put_bulk(out, text);
    }
}

// =============================================================================
// Encode Implementations
// =============================================================================

impl Encode for bool {
    fn encode_into(&self, _simple: bool, out: &mut BytesMut) {
        put_line(out, b'+', if *self { &b"true"[..] } else { &b"false"[..] });
    }
}

macro_rules! impl_encode_int {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode_into(&self, _simple: bool, out: &mut BytesMut) {
                    put_header(out, b':', i64::from(*self));
                }
            }
        )*
    };
}

impl_encode_int!(i8, i16, i32, i64, u8, u16, u32);

// Wider than i64 on some or all targets; written from their decimal form
macro_rules! impl_encode_wide_int {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode_into(&self, _simple: bool, out: &mut BytesMut) {
                    out.put_u8(b':');
                    let _ = write!(out, "{}", self);
                    out.put_slice(CRLF);
                }
            }
        )*
    };
}

impl_encode_wide_int!(isize, usize, u64, i128, u128);

impl Encode for str {
    fn encode_into(&self, simple: bool, out: &mut BytesMut) {
        put_text(out, self.as_bytes(), simple);
    }
}

impl Encode for String {
    fn encode_into(&self, simple: bool, out: &mut BytesMut) {
        put_text(out, self.as_bytes(), simple);
    }
}

impl Encode for Bytes {
    fn encode_into(&self, simple: bool, out: &mut BytesMut) {
        put_text(out, self, simple);
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_into(&self, simple: bool, out: &mut BytesMut) {
        (**self).encode_into(simple, out);
    }
}

impl<T: Encode> Encode for [T] {
    fn encode_into(&self, simple: bool, out: &mut BytesMut) {
        put_header(out, b'*', self.len() as i64);
        for item in self {
            item.encode_into(simple, out);
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_into(&self, simple: bool, out: &mut BytesMut) {
        self.as_slice().encode_into(simple, out);
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode_into(&self, simple: bool, out: &mut BytesMut) {
        match self {
            Some(value) => value.encode_into(simple, out),
            None => out.put_slice(NULL_BULK),
        }
    }
}

impl Encode for Value {
    fn encode_into(&self, simple: bool, out: &mut BytesMut) {
        match self {
            Value::String(s) => put_text(out, s, simple),
            Value::Integer(n) => put_header(out, b':', *n),
            Value::Array(items) => items.encode_into(simple, out),
            Value::Null => out.put_slice(NULL_BULK),
        }
    }
}

impl Encode for WireValue {
    fn encode_into(&self, _simple: bool, out: &mut BytesMut) {
        match self {
            WireValue::SimpleString(s) => put_line(out, b'+', s),
            WireValue::Error(s) => put_line(out, b'-', s),
            WireValue::Integer(n) => put_header(out, b':', *n),
            WireValue::BulkString(Some(s)) => put_bulk(out, s),
            WireValue::BulkString(None) => out.put_slice(NULL_BULK),
            WireValue::Array(Some(items)) => {
                put_header(out, b'*', items.len() as i64);
                for item in items {
                    item.encode_into(false, out);
                }
            }
            WireValue::Array(None) => out.put_slice(NULL_ARRAY),
        }
    }
}
