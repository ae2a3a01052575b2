//! Network Module
//!
//! Connection-facing I/O.
//!
//! ## Architecture
//! - Single acceptor thread with a non-blocking accept loop
//! - One worker thread per connection
//! - Workers share only the buffer pool and the connection registry
//! - Each worker owns an [`IoHandler`]: buffered reader and writer plus one
//!   pooled read buffer, held until the connection closes

mod connection;
mod context;
mod io_handler;
mod pool;
mod server;

pub use connection::{CommandHandler, Connection};
pub use context::{CancelToken, IoContext};
pub use io_handler::{IoHandler, Transport, DEFAULT_STREAM_BUFFER};
pub use pool::{BufferPool, PooledBuffer};
pub use server::{Server, ShutdownHandle};
