//! Recycled line buffers for formatted log records.
//!
//! Producers take a buffer when composing a record; the flush path hands it
//! back once the line has reached the file. Buffers that grew past
//! [`LINE_CAPACITY`] are shrunk on return so one oversized record does not pin
//! memory for the lifetime of the process.

use crossbeam_queue::SegQueue;

/// Capacity a pooled buffer starts with and is shrunk back to.
const LINE_CAPACITY: usize = 256;

/// Upper bound on idle buffers kept around. Anything returned past this is
/// dropped.
const MAX_POOLED: usize = 4096;

static POOL: SegQueue<String> = SegQueue::new();

/// Recycles the `String` each record is formatted into.
///
/// # Memory Management
///
/// - New buffers start at [`LINE_CAPACITY`] bytes
/// - Returned buffers are cleared and shrunk back to [`LINE_CAPACITY`]
/// - At most [`MAX_POOLED`] idle buffers are kept
///
/// # Example
///
/// ```rust, ignore
/// let mut line = Pool::get();
/// write!(line, "{}:{}", "app", 42).ok();
/// // ... hand the line to the file ...
/// Pool::put(line);
/// ```
pub(crate) struct Pool;

impl Pool {
    /// An empty buffer, reused if one is idle.
    ///
    /// # Performance
    ///
    /// One lock-free pop; allocates only when the pool is empty.
    #[inline(always)]
    pub(crate) fn get() -> String {
        POOL.pop()
            .unwrap_or_else(|| String::with_capacity(LINE_CAPACITY))
    }

    /// Returns a buffer once its line has been written.
    ///
    /// # Performance
    ///
    /// One lock-free push. Buffers grown past [`LINE_CAPACITY`] pay for a
    /// reallocation here rather than pinning memory while idle.
    #[inline(always)]
    pub(crate) fn put(mut s: String) {
        if POOL.len() >= MAX_POOLED {
            return;
        }
        s.clear();
        if s.capacity() > LINE_CAPACITY {
            s.shrink_to(LINE_CAPACITY);
        }
        POOL.push(s);
    }
}
