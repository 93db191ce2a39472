use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Capacity of a freshly allocated buffer.
pub const INITIAL_CAPACITY: usize = 1024;

/// Buffers that grew past this are dropped on release instead of pooled.
pub const MAX_POOLED_CAPACITY: usize = 16 << 10;

/// Upper bound on idle buffers kept by the pool.
const MAX_IDLE: usize = 64;

static POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

/// A byte buffer borrowed from the process-wide pool.
///
/// Dropping the buffer releases it: its length is reset and it returns to the
/// pool unless its capacity exceeds [`MAX_POOLED_CAPACITY`].
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    /// Takes an empty buffer from the pool, allocating one if none is idle.
    pub fn get() -> Self {
        let pooled = POOL.lock().ok().and_then(|mut free| free.pop());
        Buffer {
            bytes: pooled.unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY)),
        }
    }

    /// Explicit form of drop.
    pub fn release(self) {}
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.bytes.capacity() > MAX_POOLED_CAPACITY {
            return;
        }
        let mut bytes = std::mem::take(&mut self.bytes);
        bytes.clear();
        if let Ok(mut free) = POOL.lock() {
            if free.len() < MAX_IDLE {
                free.push(bytes);
            }
        }
    }
}

impl Deref for Buffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.bytes
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_empty_presized_buffer() {
        let buf = Buffer::get();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= INITIAL_CAPACITY);
    }

    #[test]
    fn released_buffer_comes_back_cleared() {
        let mut buf = Buffer::get();
        buf.extend_from_slice(b"hello");
        buf.release();
        let again = Buffer::get();
        assert!(again.is_empty());
    }

    #[test]
    fn oversized_buffers_are_not_retained() {
        let mut big = Buffer::get();
        big.reserve(MAX_POOLED_CAPACITY * 2);
        big.release();
        // Other tests share the pool, so only check that nothing pooled is
        // over the ceiling.
        let free = POOL.lock().unwrap();
        assert!(free.iter().all(|b| b.capacity() <= MAX_POOLED_CAPACITY));
    }
}
