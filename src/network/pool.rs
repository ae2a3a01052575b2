//! Buffer Pool
//!
//! A thread-safe free list of fixed-size read buffers shared by all
//! connections.
//!
//! A buffer is acquired once when a connection's I/O handler is built and
//! goes back to the pool only when the handler is dropped, so no other
//! connection can observe its contents while it is in use.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;

/// Shared pool of fixed-size byte buffers
pub struct BufferPool {
    /// Idle buffers, bounded by the pool capacity
    free: ArrayQueue<Box<[u8]>>,

    /// Length of every buffer handed out
    buffer_size: usize,

    /// Buffers allocated because the free list was empty
    allocated: AtomicUsize,
}

impl BufferPool {
    /// Create a pool of `buffer_size` buffers keeping at most `capacity`
    /// idle ones
    pub fn new(buffer_size: usize, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            free: ArrayQueue::new(capacity.max(1)),
            buffer_size,
            allocated: AtomicUsize::new(0),
        })
    }

    /// Take a buffer from the free list, allocating one if it is empty
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buf = self.free.pop().unwrap_or_else(|| {
            self.allocated.fetch_add(1, Ordering::Relaxed);
            vec![0u8; self.buffer_size].into_boxed_slice()
        });

        PooledBuffer {
            buf,
            pool: Arc::clone(self),
        }
    }

    fn release(&self, buf: Box<[u8]>) {
        // A full free list just drops the buffer
        if self.free.push(buf).is_err() {
            tracing::trace!("buffer pool full, dropping buffer");
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Idle buffers ready to hand out
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total buffers this pool has ever allocated
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}

/// A buffer on loan from a [`BufferPool`], returned on drop
pub struct PooledBuffer {
    buf: Box<[u8]>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.release(buf);
    }
}
