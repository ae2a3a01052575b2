//! TCP Server
//!
//! Accepts connections and runs each one on its own worker thread.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{RespError, Result};
use super::connection::{CommandHandler, Connection};
use super::io_handler::IoHandler;
use super::pool::BufferPool;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Reply sent to connections beyond `max_connections`
const MAX_CLIENTS_REPLY: &[u8] = b"-ERR max number of clients reached\r\n";

/// State shared between the accept loop and the workers
struct Shared {
    config: Config,
    handler: Arc<dyn CommandHandler>,
    pool: Arc<BufferPool>,
    shutdown: AtomicBool,
    next_id: AtomicU64,

    /// Live connections by id, kept so shutdown can unblock their workers
    connections: Mutex<HashMap<u64, TcpStream>>,
}

/// Signals a running [`Server`] to stop; cheap to clone
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
    }
}

/// TCP server speaking RESP
pub struct Server {
    shared: Arc<Shared>,
    listener: Option<TcpListener>,
    workers: Vec<JoinHandle<()>>,
}

impl Server {
    /// Create a new server with the given config and execution layer
    pub fn new(config: Config, handler: Arc<dyn CommandHandler>) -> Self {
        let pool = BufferPool::new(config.io_buffer_size, config.pool_capacity);
        Self {
            shared: Arc::new(Shared {
                config,
                handler,
                pool,
                shutdown: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
                connections: Mutex::new(HashMap::new()),
            }),
            listener: None,
            workers: Vec::new(),
        }
    }

    /// Bind the listen address; `run` binds on its own if this was skipped
    pub fn bind(&mut self) -> Result<SocketAddr> {
        self.shared.config.validate()?;
        let listener = TcpListener::bind(&self.shared.config.listen_addr)?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        tracing::info!("Listening on {}", addr);
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Address actually bound, once bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.shared.connections.lock().len()
    }

    /// The buffer pool shared by all connections
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.shared.pool
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| RespError::Config("listener not bound".to_string()))?;

        while !self.shared.shutdown.load(Ordering::Acquire) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.accept(stream) {
                        tracing::warn!("Failed to set up connection from {}: {}", addr, e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    self.reap_workers();
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down, closing {} connections", self.active_connections());
        drop(listener);
        for (_, stream) in self.shared.connections.lock().drain() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("Connection worker panicked");
            }
        }
        Ok(())
    }

    /// Register a new connection and spawn its worker
    fn accept(&mut self, stream: TcpStream) -> Result<()> {
        // Accepted sockets may inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;
        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut connections = self.shared.connections.lock();
            if connections.len() >= self.shared.config.max_connections {
                drop(connections);
                tracing::warn!("Rejecting connection: max_connections reached");
                let mut stream = stream;
                let _ = stream.write_all(MAX_CLIENTS_REPLY);
                return Ok(());
            }
            connections.insert(id, stream.try_clone()?);
        }

        let shared = Arc::clone(&self.shared);
        let worker = thread::Builder::new()
            .name(format!("respio-conn-{}", id))
            .spawn(move || serve(shared, id, stream));

        match worker {
            Ok(handle) => {
                self.track_worker(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.connections.lock().remove(&id);
                Err(RespError::Io(e))
            }
        }
    }
}

impl Server {
    /// Drop handles of workers that have already exited
    fn reap_workers(&mut self) {
        self.workers.retain(|w| !w.is_finished());
    }

    /// Track a new worker, reaping finished ones so a busy accept loop
    /// holds at most one handle per live connection plus the new one
    fn track_worker(&mut self, handle: JoinHandle<()>) {
        self.reap_workers();
        self.workers.push(handle);
    }
}

/// Worker body: serve one connection until it ends
fn serve(shared: Arc<Shared>, id: u64, stream: TcpStream) {
    let result = IoHandler::new(stream, &shared.pool).and_then(|io| {
        let mut conn = Connection::new(io, Arc::clone(&shared.handler), &shared.config);
        let peer = conn.peer_addr().to_string();
        conn.handle()?;
        if let Err(e) = conn.close() {
            tracing::trace!("Closing {}: {}", peer, e);
        }
        Ok(())
    });

    if let Err(e) = result {
        tracing::debug!("Connection {} ended with error: {}", id, e);
    }
    shared.connections.lock().remove(&id);
}
