//! # respio
//!
//! The RESP wire-protocol layer of an in-memory data-structure server:
//! - Recursive-descent parser from pipelined request bytes to commands
//! - Stream decoder and typed encoder for generic values
//! - Pooled, deadline-aware per-connection I/O
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one worker per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    IoHandler                                 │
//! │     (BufReader/BufWriter + pooled buffer + deadlines)        │
//! └──────────┬──────────────────────────────────▲───────────────┘
//!            │ bytes                             │ bytes
//!            ▼                                   │
//!   ┌─────────────┐    ┌──────────────────┐    ┌─────────────┐
//!   │   Parser    │───▶│  CommandHandler  │───▶│   Encoder   │
//!   │ (commands)  │    │    (external)    │    │  (values)   │
//!   └─────────────┘    └──────────────────┘    └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RespError, Result};
pub use config::Config;
pub use protocol::{encode, Command, Decoder, Parser, Value, WireValue};
pub use network::{CommandHandler, IoContext, IoHandler, Server};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of respio
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
