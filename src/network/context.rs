//! I/O Context
//!
//! Carries an optional deadline and a cancellation flag into each blocking
//! read or write.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag
///
/// Clones observe the same flag. Cancelling cannot interrupt a syscall
/// already blocked; it is checked before each operation, and the deadline
/// bounds how long a blocked operation may take.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Deadline and cancellation for one read or write
#[derive(Debug, Clone, Default)]
pub struct IoContext {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl IoContext {
    /// No deadline, never cancelled
    pub fn background() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline_at(deadline)
    }

    /// Set the deadline `timeout` from now
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline_at(Instant::now() + timeout)
    }

    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Context built from an optional timeout, as read from config
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(t) => Self::with_timeout(t),
            None => Self::background(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Time left before the deadline; Some(ZERO) once it has passed
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The socket timeout to arm for the next operation
    ///
    /// Fails if the context is cancelled or its deadline already passed.
    pub fn socket_timeout(&self) -> io::Result<Option<Duration>> {
        if self.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "operation cancelled"));
        }
        match self.remaining() {
            Some(left) if left.is_zero() => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"))
            }
            other => Ok(other),
        }
    }
}
