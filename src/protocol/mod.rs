//! Protocol Module
//!
//! RESP wire format codec.
//!
//! ## Wire Format
//!
//! ```text
//! +<text>\r\n                 simple string
//! -<text>\r\n                 error
//! :<decimal>\r\n              integer
//! $<len>\r\n<payload>\r\n     bulk string   ($-1\r\n is null)
//! *<count>\r\n<elements>      array         (*-1\r\n is null, *0\r\n empty)
//! ```
//!
//! ## Paths
//! - [`Parser`]: request buffer → commands. Top-level values must be
//!   non-empty arrays; several may be pipelined back to back.
//! - [`Decoder`]: byte stream → one generic [`Value`] per call.
//! - [`encode`]: typed value → wire bytes.

mod cursor;
mod decoder;
mod encoder;
mod parser;
mod value;

pub use cursor::{parse_i64, Cursor, CRLF, MAX_BULK_LEN};
pub use decoder::{parse_frame, Decoder};
pub use encoder::{encode, encode_into, Encode};
pub use parser::{parse_commands, Parser};
pub use value::{Command, Value, WireValue, NIL_PLACEHOLDER};
