//! Buffer Pool Tests
//!
//! Tests verify reuse, bounded retention and exclusive ownership under
//! concurrent use.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use respio::network::BufferPool;

#[test]
fn test_buffers_have_configured_size() {
    let pool = BufferPool::new(1024, 2);
    assert_eq!(pool.buffer_size(), 1024);
    assert_eq!(pool.acquire().len(), 1024);
}

#[test]
fn test_released_buffer_is_reused() {
    let pool = BufferPool::new(128, 2);

    let first = pool.acquire();
    let first_ptr = first.as_ptr();
    drop(first);

    let second = pool.acquire();
    assert_eq!(second.as_ptr(), first_ptr);
    assert_eq!(pool.allocated(), 1);
}

#[test]
fn test_live_buffers_are_distinct() {
    let pool = BufferPool::new(128, 8);
    let held: Vec<_> = (0..8).map(|_| pool.acquire()).collect();

    let ptrs: HashSet<_> = held.iter().map(|b| b.as_ptr() as usize).collect();
    assert_eq!(ptrs.len(), 8);
    assert_eq!(pool.available(), 0);

    drop(held);
    assert_eq!(pool.available(), 8);
}

#[test]
fn test_retention_is_bounded_by_capacity() {
    let pool = BufferPool::new(16, 2);
    let held: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
    drop(held);

    assert_eq!(pool.available(), 2);
    assert_eq!(pool.allocated(), 5);
}

#[test]
fn test_concurrent_owners_never_see_each_others_bytes() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 500;

    let pool = BufferPool::new(256, THREADS);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let marker = t as u8 + 1;
                for _ in 0..ROUNDS {
                    let mut buf = pool.acquire();
                    buf.fill(marker);
                    thread::yield_now();
                    assert!(buf.iter().all(|&b| b == marker), "buffer shared across owners");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(pool.allocated() <= THREADS);
}
