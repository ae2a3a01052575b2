//! Configuration for respio
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{RespError, Result};

/// Default size of a pooled connection read buffer (16 KB)
pub const DEFAULT_IO_BUFFER_SIZE: usize = 16 * 1024;

/// Default upper bound on a single, possibly pipelined, request (32 MB)
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 32 * 1024 * 1024;

/// Default ceiling on array nesting
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Main configuration for a respio server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = no timeout)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = no timeout)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Buffer Configuration
    // -------------------------------------------------------------------------
    /// Size of each pooled read buffer, also the bound on a single read
    pub io_buffer_size: usize,

    /// How many idle buffers the pool keeps around
    pub pool_capacity: usize,

    /// Max bytes accumulated while waiting for a message to complete
    pub max_request_size: usize,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Max array nesting accepted by the parser
    pub max_nesting_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7379".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
            pool_capacity: 1024,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            max_nesting_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would make the server unusable
    pub fn validate(&self) -> Result<()> {
        if self.io_buffer_size == 0 {
            return Err(RespError::Config("io_buffer_size must be non-zero".to_string()));
        }
        if self.max_nesting_depth == 0 {
            return Err(RespError::Config("max_nesting_depth must be non-zero".to_string()));
        }
        if self.max_connections == 0 {
            return Err(RespError::Config("max_connections must be non-zero".to_string()));
        }
        if self.max_request_size < self.io_buffer_size {
            return Err(RespError::Config(format!(
                "max_request_size ({}) is smaller than io_buffer_size ({})",
                self.max_request_size, self.io_buffer_size
            )));
        }
        Ok(())
    }

    /// Read timeout as a Duration, None when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Write timeout as a Duration, None when disabled
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the pooled read buffer size (in bytes)
    pub fn io_buffer_size(mut self, size: usize) -> Self {
        self.config.io_buffer_size = size;
        self
    }

    /// Set how many idle buffers the pool retains
    pub fn pool_capacity(mut self, count: usize) -> Self {
        self.config.pool_capacity = count;
        self
    }

    /// Set the maximum accumulated request size (in bytes)
    pub fn max_request_size(mut self, size: usize) -> Self {
        self.config.max_request_size = size;
        self
    }

    /// Set the maximum array nesting depth
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.config.max_nesting_depth = depth;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
