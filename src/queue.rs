//! Bounded, blocking multi-producer/multi-consumer FIFO queue.
//!
//! Every state transition happens under a single mutex. Producers park on a
//! "not full" condition variable, consumers on a "not empty" one, and each
//! side only broadcasts to the other when someone is actually parked there.
//!
//! # Entry points
//!
//! The queue offers separate calls per waiting contract instead of one
//! parameterized call:
//!
//! | contract              | get                       | put                       |
//! |-----------------------|---------------------------|---------------------------|
//! | block indefinitely    | [`get`], [`get_many`]     | [`put`], [`put_many`]     |
//! | one bounded wait      | [`timed_get`], [`timed_get_many`] | [`timed_put`], [`timed_put_many`] |
//! | repeated bounded wait | [`timed_get_passes`], [`timed_get_many_passes`] | [`timed_put_passes`], [`timed_put_many_passes`] |
//!
//! # Interruption
//!
//! [`close`] is the only way to abort a blocked call. Closing wakes every
//! waiter; readers still drain what is left, writers fail immediately and get
//! their item back.
//!
//! # Example
//!
//! ```
//! use rotq::BoundedBlockingQueue;
//!
//! let queue = BoundedBlockingQueue::new(2).unwrap();
//! queue.put("a").unwrap();
//! queue.put("b").unwrap();
//! assert_eq!(queue.get_many(8).unwrap(), vec!["a", "b"]);
//! ```
//!
//! [`get`]: BoundedBlockingQueue::get
//! [`get_many`]: BoundedBlockingQueue::get_many
//! [`put`]: BoundedBlockingQueue::put
//! [`put_many`]: BoundedBlockingQueue::put_many
//! [`timed_get`]: BoundedBlockingQueue::timed_get
//! [`timed_get_many`]: BoundedBlockingQueue::timed_get_many
//! [`timed_put`]: BoundedBlockingQueue::timed_put
//! [`timed_put_many`]: BoundedBlockingQueue::timed_put_many
//! [`timed_get_passes`]: BoundedBlockingQueue::timed_get_passes
//! [`timed_get_many_passes`]: BoundedBlockingQueue::timed_get_many_passes
//! [`timed_put_passes`]: BoundedBlockingQueue::timed_put_passes
//! [`timed_put_many_passes`]: BoundedBlockingQueue::timed_put_many_passes
//! [`close`]: BoundedBlockingQueue::close

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Maximum number of items a queue may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Bounded(NonZeroUsize),
    Unbounded,
}

impl Capacity {
    /// Whether `incoming` more items fit next to `len` already queued.
    fn admits(&self, len: usize, incoming: usize) -> bool {
        match self {
            Capacity::Bounded(cap) => len.saturating_add(incoming) <= cap.get(),
            Capacity::Unbounded => true,
        }
    }

    /// Whether a batch of `size` items could ever fit.
    fn holds(&self, size: usize) -> bool {
        self.admits(0, size)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Bounded(cap) => write!(f, "{}", cap),
            Capacity::Unbounded => f.write_str("unbounded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("queue capacity must be positive")]
    ZeroCapacity,
    #[error("queue closed")]
    Closed,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// A rejected put. The item (or batch) is handed back to the caller.
#[derive(PartialEq, Eq, thiserror::Error)]
pub enum PutError<T> {
    #[error("queue closed")]
    Closed(T),
    #[error("timed out waiting for free capacity")]
    Timeout(T),
    #[error("batch is larger than the queue capacity")]
    Oversized(T),
}

impl<T> PutError<T> {
    pub fn into_inner(self) -> T {
        match self {
            PutError::Closed(item) | PutError::Timeout(item) | PutError::Oversized(item) => item,
        }
    }
}

impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PutError::Closed(_) => f.write_str("Closed(..)"),
            PutError::Timeout(_) => f.write_str("Timeout(..)"),
            PutError::Oversized(_) => f.write_str("Oversized(..)"),
        }
    }
}

/// Result of a multi-pass timed wait.
///
/// The three variants map onto the `(signaled, obtained)` pair reported by
/// [`pair`](PassOutcome::pair):
///
/// - [`Done`](PassOutcome::Done) is `(true, true)`: the transfer happened.
/// - [`Exhausted`](PassOutcome::Exhausted) is `(true, false)`: every pass timed
///   out. An ordinary outcome, not an error.
/// - [`Interrupted`](PassOutcome::Interrupted) is `(false, false)`: the wait was
///   aborted by [`close`](BoundedBlockingQueue::close). Callers must not assume
///   the queue changed.
///
/// `R` carries whatever the caller offered and did not get rid of: the item
/// for puts, nothing for gets.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome<T, R = ()> {
    Done(T),
    Exhausted(R),
    Interrupted(R),
}

impl<T, R> PassOutcome<T, R> {
    pub fn signaled(&self) -> bool {
        !matches!(self, PassOutcome::Interrupted(_))
    }

    pub fn obtained(&self) -> bool {
        matches!(self, PassOutcome::Done(_))
    }

    /// `(signaled, obtained)`.
    pub fn pair(&self) -> (bool, bool) {
        (self.signaled(), self.obtained())
    }

    pub fn done(self) -> Option<T> {
        match self {
            PassOutcome::Done(value) => Some(value),
            _ => None,
        }
    }

    fn from_wait(result: Result<T, Halt>, rejected: R) -> Self {
        match result {
            Ok(value) => PassOutcome::Done(value),
            Err(Halt::TimedOut) => PassOutcome::Exhausted(rejected),
            Err(Halt::Closed) => PassOutcome::Interrupted(rejected),
        }
    }
}

/// Why a wait ended without the operation going through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    Closed,
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Reader,
    Writer,
}

struct State<T> {
    items: VecDeque<T>,
    waiting_readers: usize,
    waiting_writers: usize,
    closed: bool,
}

impl<T> State<T> {
    fn waiters(&mut self, side: Side) -> &mut usize {
        match side {
            Side::Reader => &mut self.waiting_readers,
            Side::Writer => &mut self.waiting_writers,
        }
    }

    fn pop_front(&mut self, max: usize) -> Option<Vec<T>> {
        if self.items.is_empty() {
            return None;
        }
        let n = max.min(self.items.len());
        Some(self.items.drain(..n).collect())
    }
}

/// Thread-safe FIFO with a capacity bound and blocking, timed, multi-pass and
/// bulk transfer.
///
/// Share it between threads behind an [`Arc`](std::sync::Arc).
pub struct BoundedBlockingQueue<T> {
    capacity: Capacity,
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedBlockingQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    ///
    /// A zero capacity is a configuration error.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(QueueError::ZeroCapacity)?;
        Ok(Self::with_capacity(Capacity::Bounded(capacity)))
    }

    pub fn unbounded() -> Self {
        Self::with_capacity(Capacity::Unbounded)
    }

    pub fn with_capacity(capacity: Capacity) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::new(),
                waiting_readers: 0,
                waiting_writers: 0,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of consumers currently parked waiting for an item.
    pub fn waiting_readers(&self) -> usize {
        self.lock().waiting_readers
    }

    /// Number of producers currently parked waiting for free capacity.
    pub fn waiting_writers(&self) -> usize {
        self.lock().waiting_writers
    }

    /// Closes the queue and wakes every parked thread.
    ///
    /// Blocked puts fail with [`PutError::Closed`]; blocked gets fail with
    /// [`QueueError::Closed`] unless items are still queued, which remain
    /// readable. Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        log::debug!(
            "closing queue with {} item(s), {} reader(s) and {} writer(s) waiting",
            state.items.len(),
            state.waiting_readers,
            state.waiting_writers
        );
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Removes and returns the head, blocking while the queue is empty.
    pub fn get(&self) -> Result<T, QueueError> {
        let (state, result) = self.wait_for(self.lock(), Side::Reader, None, |s| s.items.pop_front());
        self.wake_writers(&state);
        result.map_err(|_| QueueError::Closed)
    }

    /// Blocks until the queue is non-empty, then removes between 1 and `max_n`
    /// items. A partial batch is a normal outcome.
    pub fn get_many(&self, max_n: usize) -> Result<Vec<T>, QueueError> {
        check_batch_size(max_n)?;
        let (state, result) = self.wait_for(self.lock(), Side::Reader, None, |s| s.pop_front(max_n));
        self.wake_writers(&state);
        result.map_err(|_| QueueError::Closed)
    }

    /// Waits up to `timeout` for an item. `Ok(None)` means the wait timed out.
    pub fn timed_get(&self, timeout: Duration) -> Result<Option<T>, QueueError> {
        let (state, result) = self.wait_for(
            self.lock(),
            Side::Reader,
            deadline(timeout),
            |s| s.items.pop_front(),
        );
        self.wake_writers(&state);
        timed(result)
    }

    /// Waits up to `timeout` for the queue to become non-empty, then removes
    /// between 1 and `max_n` items. `Ok(None)` means the wait timed out.
    pub fn timed_get_many(&self, timeout: Duration, max_n: usize) -> Result<Option<Vec<T>>, QueueError> {
        check_batch_size(max_n)?;
        let (state, result) = self.wait_for(
            self.lock(),
            Side::Reader,
            deadline(timeout),
            |s| s.pop_front(max_n),
        );
        self.wake_writers(&state);
        timed(result)
    }

    /// Repeats a `timeout`-bounded wait up to `passes` times while the queue
    /// stays empty. `passes == 0` performs a single pass.
    pub fn timed_get_passes(&self, timeout: Duration, passes: u32) -> PassOutcome<T> {
        let (state, result) =
            self.wait_passes(self.lock(), Side::Reader, timeout, passes, |s| s.items.pop_front());
        self.wake_writers(&state);
        PassOutcome::from_wait(result, ())
    }

    /// Batch counterpart of [`timed_get_passes`](Self::timed_get_passes).
    pub fn timed_get_many_passes(
        &self,
        timeout: Duration,
        passes: u32,
        max_n: usize,
    ) -> Result<PassOutcome<Vec<T>>, QueueError> {
        check_batch_size(max_n)?;
        let (state, result) =
            self.wait_passes(self.lock(), Side::Reader, timeout, passes, |s| s.pop_front(max_n));
        self.wake_writers(&state);
        Ok(PassOutcome::from_wait(result, ()))
    }

    /// Appends `item`, blocking while the queue is full.
    pub fn put(&self, item: T) -> Result<(), PutError<T>> {
        let capacity = self.capacity;
        let (mut state, result) = self.wait_for(self.lock(), Side::Writer, None, |s| {
            (!s.closed && capacity.admits(s.items.len(), 1)).then_some(())
        });
        match result {
            Ok(()) => {
                self.push_back(&mut state, item);
                Ok(())
            }
            Err(_) => Err(PutError::Closed(item)),
        }
    }

    /// Appends the whole batch in one step, blocking until all of it fits.
    ///
    /// The capacity bound is never exceeded: a batch larger than the capacity
    /// can never fit and is rejected with [`PutError::Oversized`].
    pub fn put_many<I>(&self, items: I) -> Result<(), PutError<Vec<T>>>
    where
        I: IntoIterator<Item = T>,
    {
        let batch = self.batch(items)?;
        let capacity = self.capacity;
        let size = batch.len();
        let (mut state, result) = self.wait_for(self.lock(), Side::Writer, None, |s| {
            (!s.closed && capacity.admits(s.items.len(), size)).then_some(())
        });
        match result {
            Ok(()) => {
                self.extend_back(&mut state, batch);
                Ok(())
            }
            Err(_) => Err(PutError::Closed(batch)),
        }
    }

    /// Appends `item`, waiting up to `timeout` for free capacity.
    pub fn timed_put(&self, timeout: Duration, item: T) -> Result<(), PutError<T>> {
        let capacity = self.capacity;
        let (mut state, result) = self.wait_for(self.lock(), Side::Writer, deadline(timeout), |s| {
            (!s.closed && capacity.admits(s.items.len(), 1)).then_some(())
        });
        match result {
            Ok(()) => {
                self.push_back(&mut state, item);
                Ok(())
            }
            Err(Halt::TimedOut) => Err(PutError::Timeout(item)),
            Err(Halt::Closed) => Err(PutError::Closed(item)),
        }
    }

    /// Appends the whole batch, waiting up to `timeout` for it to fit.
    pub fn timed_put_many<I>(&self, timeout: Duration, items: I) -> Result<(), PutError<Vec<T>>>
    where
        I: IntoIterator<Item = T>,
    {
        let batch = self.batch(items)?;
        let capacity = self.capacity;
        let size = batch.len();
        let (mut state, result) = self.wait_for(self.lock(), Side::Writer, deadline(timeout), |s| {
            (!s.closed && capacity.admits(s.items.len(), size)).then_some(())
        });
        match result {
            Ok(()) => {
                self.extend_back(&mut state, batch);
                Ok(())
            }
            Err(Halt::TimedOut) => Err(PutError::Timeout(batch)),
            Err(Halt::Closed) => Err(PutError::Closed(batch)),
        }
    }

    /// Repeats a `timeout`-bounded wait for free capacity up to `passes` times.
    /// On failure the item comes back inside the outcome.
    pub fn timed_put_passes(&self, timeout: Duration, passes: u32, item: T) -> PassOutcome<(), T> {
        let capacity = self.capacity;
        let (mut state, result) = self.wait_passes(self.lock(), Side::Writer, timeout, passes, |s| {
            (!s.closed && capacity.admits(s.items.len(), 1)).then_some(())
        });
        if result.is_ok() {
            self.push_back(&mut state, item);
            return PassOutcome::Done(());
        }
        PassOutcome::from_wait(result, item)
    }

    /// Batch counterpart of [`timed_put_passes`](Self::timed_put_passes).
    ///
    /// Only an oversized batch is reported through `Err`.
    pub fn timed_put_many_passes<I>(
        &self,
        timeout: Duration,
        passes: u32,
        items: I,
    ) -> Result<PassOutcome<(), Vec<T>>, PutError<Vec<T>>>
    where
        I: IntoIterator<Item = T>,
    {
        let batch = self.batch(items)?;
        let capacity = self.capacity;
        let size = batch.len();
        let (mut state, result) = self.wait_passes(self.lock(), Side::Writer, timeout, passes, |s| {
            (!s.closed && capacity.admits(s.items.len(), size)).then_some(())
        });
        if result.is_ok() {
            self.extend_back(&mut state, batch);
            return Ok(PassOutcome::Done(()));
        }
        Ok(PassOutcome::from_wait(result, batch))
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn batch<I>(&self, items: I) -> Result<Vec<T>, PutError<Vec<T>>>
    where
        I: IntoIterator<Item = T>,
    {
        let batch: Vec<T> = items.into_iter().collect();
        if !self.capacity.holds(batch.len()) {
            return Err(PutError::Oversized(batch));
        }
        Ok(batch)
    }

    fn push_back(&self, state: &mut State<T>, item: T) {
        state.items.push_back(item);
        self.wake_readers(state);
    }

    fn extend_back(&self, state: &mut State<T>, batch: Vec<T>) {
        if batch.is_empty() {
            return;
        }
        state.items.extend(batch);
        self.wake_readers(state);
    }

    fn wake_readers(&self, state: &State<T>) {
        if state.waiting_readers > 0 {
            self.not_empty.notify_all();
        }
    }

    fn wake_writers(&self, state: &State<T>) {
        if state.waiting_writers > 0 {
            self.not_full.notify_all();
        }
    }

    /// Parks on the condition variable for `side` until `attempt` succeeds, the
    /// queue closes, or `deadline` passes.
    ///
    /// `attempt` runs under the lock before every park, and again after every
    /// wakeup, so a stolen item simply sends the thread back to sleep until the
    /// deadline. The waiting counter is restored on every exit path; a
    /// poisoned lock is recovered rather than propagated.
    fn wait_for<'a, R>(
        &'a self,
        mut state: MutexGuard<'a, State<T>>,
        side: Side,
        deadline: Option<Instant>,
        mut attempt: impl FnMut(&mut State<T>) -> Option<R>,
    ) -> (MutexGuard<'a, State<T>>, Result<R, Halt>) {
        let cond = match side {
            Side::Reader => &self.not_empty,
            Side::Writer => &self.not_full,
        };
        loop {
            if let Some(value) = attempt(&mut state) {
                return (state, Ok(value));
            }
            if state.closed {
                return (state, Err(Halt::Closed));
            }

            *state.waiters(side) += 1;
            state = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        *state.waiters(side) -= 1;
                        return (state, Err(Halt::TimedOut));
                    }
                    cond.wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => cond.wait(state).unwrap_or_else(PoisonError::into_inner),
            };
            *state.waiters(side) -= 1;
        }
    }

    /// Runs up to `passes` (at least one) waits of `timeout` each, stopping at
    /// the first pass that is not a plain timeout.
    fn wait_passes<'a, R>(
        &'a self,
        mut state: MutexGuard<'a, State<T>>,
        side: Side,
        timeout: Duration,
        passes: u32,
        mut attempt: impl FnMut(&mut State<T>) -> Option<R>,
    ) -> (MutexGuard<'a, State<T>>, Result<R, Halt>) {
        for _ in 0..passes.max(1) {
            let (next, result) = self.wait_for(state, side, deadline(timeout), &mut attempt);
            state = next;
            match result {
                Err(Halt::TimedOut) => continue,
                result => return (state, result),
            }
        }
        (state, Err(Halt::TimedOut))
    }
}

impl<T> fmt::Debug for BoundedBlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("BoundedBlockingQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.items.len())
            .field("waiting_readers", &state.waiting_readers)
            .field("waiting_writers", &state.waiting_writers)
            .field("closed", &state.closed)
            .finish()
    }
}

/// `None` when the deadline is too far out to represent, which waits forever.
fn deadline(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

fn check_batch_size(max_n: usize) -> Result<(), QueueError> {
    if max_n == 0 {
        return Err(QueueError::InvalidArgument("batch size must be positive"));
    }
    Ok(())
}

fn timed<R>(result: Result<R, Halt>) -> Result<Option<R>, QueueError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Halt::TimedOut) => Ok(None),
        Err(Halt::Closed) => Err(QueueError::Closed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// Spins until `cond` holds, failing the test after a few seconds.
    fn wait_until(cond: impl Fn() -> bool) {
        let start = Instant::now();
        while !cond() {
            assert!(start.elapsed() < Duration::from_secs(5), "condition never held");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = BoundedBlockingQueue::new(8).unwrap();
        queue.put('a').unwrap();
        queue.put('b').unwrap();
        queue.put('c').unwrap();

        assert_eq!(queue.get().unwrap(), 'a');
        assert_eq!(queue.get().unwrap(), 'b');
        assert_eq!(queue.get().unwrap(), 'c');
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = BoundedBlockingQueue::<u8>::new(0).unwrap_err();
        assert_eq!(err, QueueError::ZeroCapacity);
    }

    #[test]
    fn test_unbounded_never_blocks() {
        let queue = BoundedBlockingQueue::unbounded();
        for i in 0..10_000 {
            queue.put(i).unwrap();
        }
        assert_eq!(queue.len(), 10_000);
        assert_eq!(queue.capacity(), Capacity::Unbounded);
        assert_eq!(queue.capacity().to_string(), "unbounded");
    }

    #[test]
    fn test_put_blocks_when_full() {
        let queue = Arc::new(BoundedBlockingQueue::new(2).unwrap());
        queue.put(1).unwrap();
        queue.put(2).unwrap();

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                let start = Instant::now();
                queue.put(3).unwrap();
                start.elapsed()
            })
        };

        wait_until(|| queue.waiting_writers() == 1);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.get().unwrap(), 1);
        let blocked_for = producer.join().unwrap();
        assert!(blocked_for >= Duration::from_millis(100), "blocked for {:?}", blocked_for);

        assert_eq!(queue.get().unwrap(), 2);
        assert_eq!(queue.get().unwrap(), 3);
        assert_eq!(queue.waiting_writers(), 0);
    }

    #[test]
    fn test_get_blocks_until_put() {
        let queue = Arc::new(BoundedBlockingQueue::new(1).unwrap());

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.get().unwrap())
        };

        wait_until(|| queue.waiting_readers() == 1);
        queue.put("hello").unwrap();

        assert_eq!(consumer.join().unwrap(), "hello");
        assert_eq!(queue.waiting_readers(), 0);
    }

    #[test]
    fn test_timed_get_times_out() {
        let queue = BoundedBlockingQueue::<u32>::new(4).unwrap();

        let start = Instant::now();
        let got = queue.timed_get(Duration::from_millis(100)).unwrap();
        let elapsed = start.elapsed();

        assert_eq!(got, None);
        assert!(elapsed >= Duration::from_millis(100), "returned after {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(600), "returned after {:?}", elapsed);
        assert_eq!(queue.waiting_readers(), 0);
    }

    #[test]
    fn test_timed_get_returns_item() {
        let queue = Arc::new(BoundedBlockingQueue::new(4).unwrap());

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                queue.put(7).unwrap();
            })
        };

        let got = queue.timed_get(Duration::from_secs(5)).unwrap();
        producer.join().unwrap();
        assert_eq!(got, Some(7));
    }

    #[test]
    fn test_timed_get_passes_obtains_during_second_pass() {
        let queue = Arc::new(BoundedBlockingQueue::new(4).unwrap());

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(75));
                queue.put("late").unwrap();
            })
        };

        let outcome = queue.timed_get_passes(Duration::from_millis(50), 3);
        producer.join().unwrap();

        assert_eq!(outcome.pair(), (true, true));
        assert_eq!(outcome.done(), Some("late"));
    }

    #[test]
    fn test_timed_get_passes_exhausted() {
        let queue = BoundedBlockingQueue::<u8>::new(4).unwrap();

        let start = Instant::now();
        let outcome = queue.timed_get_passes(Duration::from_millis(50), 3);

        assert_eq!(outcome, PassOutcome::Exhausted(()));
        assert_eq!(outcome.pair(), (true, false));
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn test_timed_get_passes_zero_is_single_pass() {
        let queue = BoundedBlockingQueue::<u8>::new(4).unwrap();

        let start = Instant::now();
        let outcome = queue.timed_get_passes(Duration::from_millis(50), 0);
        let elapsed = start.elapsed();

        assert_eq!(outcome.pair(), (true, false));
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(100) + Duration::from_millis(400));

        queue.put(9).unwrap();
        assert_eq!(queue.timed_get_passes(Duration::from_millis(50), 0), PassOutcome::Done(9));
    }

    #[test]
    fn test_get_many_partial_batch() {
        let queue = BoundedBlockingQueue::new(16).unwrap();
        queue.put_many([1, 2, 3]).unwrap();

        let start = Instant::now();
        let batch = queue.get_many(10).unwrap();

        assert_eq!(batch, vec![1, 2, 3]);
        assert!(queue.is_empty());
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_get_many_caps_batch() {
        let queue = BoundedBlockingQueue::new(16).unwrap();
        queue.put_many(0..6).unwrap();

        assert_eq!(queue.get_many(4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(queue.get_many(4).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_batch_size_zero_is_invalid() {
        let queue = BoundedBlockingQueue::<u8>::new(4).unwrap();

        assert!(matches!(queue.get_many(0), Err(QueueError::InvalidArgument(_))));
        assert!(matches!(
            queue.timed_get_many(Duration::from_millis(1), 0),
            Err(QueueError::InvalidArgument(_))
        ));
        assert!(matches!(
            queue.timed_get_many_passes(Duration::from_millis(1), 2, 0),
            Err(QueueError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_timed_get_many_times_out() {
        let queue = BoundedBlockingQueue::<u8>::new(4).unwrap();
        assert_eq!(queue.timed_get_many(Duration::from_millis(20), 4).unwrap(), None);

        queue.put_many([1, 2]).unwrap();
        assert_eq!(
            queue.timed_get_many(Duration::from_millis(20), 4).unwrap(),
            Some(vec![1, 2])
        );
    }

    #[test]
    fn test_timed_get_many_passes() {
        let queue = BoundedBlockingQueue::<u8>::new(4).unwrap();
        let outcome = queue.timed_get_many_passes(Duration::from_millis(10), 2, 4).unwrap();
        assert_eq!(outcome.pair(), (true, false));

        queue.put_many([5, 6, 7]).unwrap();
        let outcome = queue.timed_get_many_passes(Duration::from_millis(10), 2, 2).unwrap();
        assert_eq!(outcome, PassOutcome::Done(vec![5, 6]));
    }

    #[test]
    fn test_put_many_waits_for_whole_batch() {
        let queue = Arc::new(BoundedBlockingQueue::new(3).unwrap());
        queue.put_many([1, 2, 3]).unwrap();

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || queue.put_many([4, 5]).unwrap())
        };

        wait_until(|| queue.waiting_writers() == 1);
        assert_eq!(queue.get().unwrap(), 1);

        // one free slot is not enough for a batch of two
        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.waiting_writers(), 1);

        assert_eq!(queue.get().unwrap(), 2);
        producer.join().unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.get_many(8).unwrap(), vec![3, 4, 5]);
    }

    #[test]
    fn test_put_many_oversized_rejected() {
        let queue = BoundedBlockingQueue::new(2).unwrap();

        let err = queue.put_many(vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, PutError::Oversized(_)));
        assert_eq!(err.into_inner(), vec![1, 2, 3]);
        assert!(queue.is_empty());

        let err = queue.timed_put_many_passes(Duration::from_millis(1), 1, [1, 2, 3]).unwrap_err();
        assert!(matches!(err, PutError::Oversized(_)));
    }

    #[test]
    fn test_put_many_empty_batch() {
        let queue = BoundedBlockingQueue::<u8>::new(1).unwrap();
        queue.put(1).unwrap();
        queue.put_many(Vec::new()).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_timed_put_returns_item_on_timeout() {
        let queue = BoundedBlockingQueue::new(1).unwrap();
        queue.put("first").unwrap();

        let start = Instant::now();
        let err = queue.timed_put(Duration::from_millis(50), "second").unwrap_err();

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(matches!(err, PutError::Timeout("second")));
        assert_eq!(queue.waiting_writers(), 0);

        let err = queue.timed_put_many(Duration::from_millis(10), ["x"]).unwrap_err();
        assert_eq!(err.into_inner(), vec!["x"]);
    }

    #[test]
    fn test_timed_put_passes() {
        let queue = Arc::new(BoundedBlockingQueue::new(1).unwrap());
        queue.put(0).unwrap();

        let outcome = queue.timed_put_passes(Duration::from_millis(20), 2, 1);
        assert_eq!(outcome, PassOutcome::Exhausted(1));

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                queue.get().unwrap()
            })
        };

        let outcome = queue.timed_put_passes(Duration::from_millis(20), 5, 2);
        assert_eq!(consumer.join().unwrap(), 0);
        assert_eq!(outcome.pair(), (true, true));
        assert_eq!(queue.get().unwrap(), 2);

        let outcome = queue
            .timed_put_many_passes(Duration::from_millis(10), 1, [3])
            .unwrap();
        assert_eq!(outcome, PassOutcome::Done(()));
    }

    #[test]
    fn test_close_wakes_blocked_reader() {
        let queue = Arc::new(BoundedBlockingQueue::<u32>::new(4).unwrap());

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.get())
        };

        wait_until(|| queue.waiting_readers() == 1);
        queue.close();

        assert_eq!(consumer.join().unwrap(), Err(QueueError::Closed));
        assert_eq!(queue.waiting_readers(), 0);
        assert!(queue.is_closed());
    }

    #[test]
    fn test_close_wakes_blocked_writer() {
        let queue = Arc::new(BoundedBlockingQueue::new(1).unwrap());
        queue.put(1).unwrap();

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || queue.put(2))
        };

        wait_until(|| queue.waiting_writers() == 1);
        queue.close();

        let err = producer.join().unwrap().unwrap_err();
        assert_eq!(err.into_inner(), 2);
        assert_eq!(queue.waiting_writers(), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_close_interrupts_multi_pass_wait() {
        let queue = Arc::new(BoundedBlockingQueue::<u32>::new(4).unwrap());

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.timed_get_passes(Duration::from_secs(1), 10))
        };

        wait_until(|| queue.waiting_readers() == 1);
        queue.close();

        let outcome = consumer.join().unwrap();
        assert_eq!(outcome, PassOutcome::Interrupted(()));
        assert_eq!(outcome.pair(), (false, false));
    }

    #[test]
    fn test_closed_queue_drains_remaining_items() {
        let queue = BoundedBlockingQueue::new(4).unwrap();
        queue.put_many([1, 2]).unwrap();
        queue.close();

        assert!(matches!(queue.put(3), Err(PutError::Closed(3))));
        assert_eq!(queue.get().unwrap(), 1);
        assert_eq!(queue.timed_get(Duration::from_millis(10)).unwrap(), Some(2));
        assert_eq!(queue.get(), Err(QueueError::Closed));
        assert_eq!(queue.timed_get(Duration::from_millis(10)), Err(QueueError::Closed));
    }

    #[test]
    fn test_multiple_producers_multiple_consumers() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 250;

        let queue = Arc::new(BoundedBlockingQueue::new(8).unwrap());
        let received = Arc::new(AtomicUsize::new(0));
        let sum = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.put(p * PER_PRODUCER + i).unwrap();
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                let received = received.clone();
                let sum = sum.clone();
                thread::spawn(move || {
                    while let Ok(batch) = queue.get_many(3) {
                        received.fetch_add(batch.len(), Ordering::Relaxed);
                        sum.fetch_add(batch.iter().sum::<usize>(), Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for handle in producers {
            handle.join().unwrap();
        }
        wait_until(|| received.load(Ordering::Relaxed) == PRODUCERS * PER_PRODUCER);
        queue.close();
        for handle in consumers {
            handle.join().unwrap();
        }

        let total = PRODUCERS * PER_PRODUCER;
        assert_eq!(sum.load(Ordering::Relaxed), total * (total - 1) / 2);
        assert_eq!(queue.waiting_readers(), 0);
        assert_eq!(queue.waiting_writers(), 0);
    }

    #[test]
    fn test_per_producer_order_preserved() {
        let queue = Arc::new(BoundedBlockingQueue::new(4).unwrap());

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    queue.put(i).unwrap();
                }
            })
        };

        let mut last = None;
        for _ in 0..500 {
            let value = queue.get().unwrap();
            if let Some(prev) = last {
                assert!(value > prev);
            }
            last = Some(value);
        }
        producer.join().unwrap();
    }
}
