//! A pool of packet buffers shared between threads.
//!
//! Receiving into a fresh allocation for every packet is wasteful under sustained traffic. The
//! pool hands out fixed-size buffers and takes them back when they are dropped. Buffers are not
//! cleared in between, a receive overwrites what it needs.
use core::{fmt, mem, ops};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The default capacity of each buffer, the largest packet written to a device.
pub const DEFAULT_BUFFER_SIZE: usize = 1600;

/// The default number of idle buffers kept around.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// A handle to a shared set of idle buffers.
///
/// Cloning the handle does not clone the buffers, all clones draw from the same set.
#[derive(Clone)]
pub struct Pool {
    shared: Arc<Shared>,
}

struct Shared {
    /// The length of every buffer handed out.
    buffer_size: usize,

    /// Buffers beyond this count are freed instead of returned.
    max_idle: usize,

    /// The idle buffers.
    free: Mutex<Vec<Box<[u8]>>>,
}

/// A buffer checked out of a [`Pool`].
///
/// Dereferences to its bytes and returns to the pool when dropped, on any path.
///
/// [`Pool`]: struct.Pool.html
pub struct Buffer {
    /// Empty only while being dropped.
    memory: Box<[u8]>,
    pool: Arc<Shared>,
}

impl Pool {
    /// Create a pool of buffers of `buffer_size` bytes that retains up to `max_idle` of them.
    ///
    /// No buffer is allocated up front.
    pub fn new(buffer_size: usize, max_idle: usize) -> Self {
        Pool {
            shared: Arc::new(Shared {
                buffer_size,
                max_idle,
                free: Mutex::new(Vec::with_capacity(max_idle)),
            }),
        }
    }

    /// Take a buffer from the pool.
    ///
    /// Allocates a new buffer when no idle one is available, this never waits for another
    /// buffer to be returned.
    pub fn acquire(&self) -> Buffer {
        let reused = self.shared.lock().pop();
        let memory = match reused {
            Some(memory) => memory,
            None => {
                net_trace!("pool: allocating buffer of {} bytes", self.shared.buffer_size);
                vec![0; self.shared.buffer_size].into_boxed_slice()
            },
        };

        Buffer {
            memory,
            pool: Arc::clone(&self.shared),
        }
    }

    /// The length of every buffer of this pool.
    pub fn buffer_size(&self) -> usize {
        self.shared.buffer_size
    }

    /// The number of buffers currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.shared.lock().len()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Pool::new(DEFAULT_BUFFER_SIZE, DEFAULT_MAX_IDLE)
    }
}

impl Shared {
    /// Lock the idle list.
    ///
    /// A thread panicking while holding the lock leaves the list itself intact, so poisoning is
    /// ignored.
    fn lock(&self) -> MutexGuard<Vec<Box<[u8]>>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, memory: Box<[u8]>) {
        // A foreign or resized buffer must not be handed out again.
        if memory.len() != self.buffer_size {
            return;
        }

        let mut free = self.lock();
        if free.len() < self.max_idle {
            free.push(memory);
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Pool")
            .field("buffer_size", &self.shared.buffer_size)
            .field("max_idle", &self.shared.max_idle)
            .field("idle", &self.idle())
            .finish()
    }
}

impl ops::Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.memory
    }
}

impl ops::DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.memory
    }
}

impl AsMut<[u8]> for Buffer {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.memory.len())
            .finish()
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Buffer) -> bool {
        self.memory == other.memory
    }
}

impl Eq for Buffer {}

impl Drop for Buffer {
    fn drop(&mut self) {
        let memory = mem::take(&mut self.memory);
        self.pool.release(memory);
    }
}

#[cfg(test)]
mod test {
    use std::thread;
    use super::*;

    #[test]
    fn reuse() {
        let pool = Pool::new(16, 2);
        assert_eq!(pool.idle(), 0);

        let mut buffer = pool.acquire();
        assert_eq!(buffer.len(), 16);
        buffer[0] = 0xab;
        drop(buffer);
        assert_eq!(pool.idle(), 1);

        // Not cleared on reuse.
        let buffer = pool.acquire();
        assert_eq!(buffer[0], 0xab);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn exhaustion_allocates() {
        let pool = Pool::new(8, 2);
        let buffers: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
        assert_eq!(pool.idle(), 0);
        drop(buffers);
        // Only `max_idle` are retained.
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn clones_share() {
        let pool = Pool::default();
        let other = pool.clone();
        drop(other.acquire());
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.buffer_size(), DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn threads() {
        let pool = Pool::new(64, 4);
        let workers: Vec<_> = (0..8u8).map(|id| {
            let pool = pool.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let mut buffer = pool.acquire();
                    buffer.iter_mut().for_each(|byte| *byte = id);
                    assert!(buffer.iter().all(|&byte| byte == id));
                }
            })
        }).collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert!(pool.idle() <= 4);
        assert!(pool.idle() >= 1);
    }
}
