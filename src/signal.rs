//! Flag-polling delivery of process signals.
//!
//! A signal handler must not unwind, allocate or take locks. The only thing
//! [`SignalNotifier::notify`] does is a single atomic compare-and-swap, which
//! is async-signal-safe. Ordinary code then picks the signal number up as a
//! plain value through [`ShutdownSignal::poll`], [`wait`](ShutdownSignal::wait)
//! or [`check`](ShutdownSignal::check).
//!
//! The host installs the handler itself, e.g. with `signal-hook`:
//!
//! ```rust, ignore
//! let shutdown = ShutdownSignal::new();
//! let notifier = shutdown.notifier();
//! unsafe { signal_hook::low_level::register(SIGTERM, move || notifier.notify(SIGTERM)) }?;
//!
//! while shutdown.check().is_ok() {
//!     if let Ok(Some(job)) = jobs.timed_get(Duration::from_millis(100)) {
//!         handle(job);
//!     }
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};

use crossbeam_utils::Backoff;

/// No signal pending.
const NONE: i32 = 0;

/// Back-off ceiling once spinning and yielding are exhausted.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("interrupted by signal {signo}")]
pub struct Interrupted {
    pub signo: i32,
}

/// Cloneable, async-signal-safe handle that raises a [`ShutdownSignal`].
#[derive(Debug, Clone)]
pub struct SignalNotifier(Arc<AtomicI32>);

impl SignalNotifier {
    /// Records `signo` unless a signal is already pending. Non-positive
    /// numbers are ignored.
    pub fn notify(&self, signo: i32) {
        if signo <= NONE {
            return;
        }
        let _ = self
            .0
            .compare_exchange(NONE, signo, Ordering::AcqRel, Ordering::Relaxed);
    }
}

/// Receiving side of a signal raised through a [`SignalNotifier`].
#[derive(Debug, Default)]
pub struct ShutdownSignal(Arc<AtomicI32>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifier(&self) -> SignalNotifier {
        SignalNotifier(self.0.clone())
    }

    /// The pending signal number, without consuming it.
    pub fn pending(&self) -> Option<i32> {
        match self.0.load(Ordering::Acquire) {
            NONE => None,
            signo => Some(signo),
        }
    }

    /// Takes the pending signal, if any, re-arming the flag.
    pub fn poll(&self) -> Option<i32> {
        match self.0.swap(NONE, Ordering::AcqRel) {
            NONE => None,
            signo => Some(signo),
        }
    }

    /// `Err` while a signal is pending. Does not consume it, so every loop
    /// polling the same signal sees it.
    pub fn check(&self) -> Result<(), Interrupted> {
        match self.pending() {
            Some(signo) => Err(Interrupted { signo }),
            None => Ok(()),
        }
    }

    /// Blocks until a signal is pending or `timeout` elapses, then takes it.
    ///
    /// Spins, then yields, then sleeps in short steps; `None` waits forever.
    pub fn wait(&self, timeout: Option<Duration>) -> Option<i32> {
        let start = Instant::now();
        let backoff = Backoff::new();
        loop {
            if let Some(signo) = self.poll() {
                return Some(signo);
            }

            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    return None;
                }
            }

            if backoff.is_completed() {
                std::thread::sleep(IDLE_SLEEP);
            } else {
                backoff.snooze();
            }
        }
    }
}
