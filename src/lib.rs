//! Blocking transfer and buffered logging building blocks.
//!
//! - [`BoundedBlockingQueue`]: multi-producer/multi-consumer FIFO with a
//!   capacity bound and blocking, timed, multi-pass and bulk transfer.
//! - [`RotatingLogWriter`]: records are cached by the calling threads and
//!   flushed by a background worker into files rotated by age and size.
//! - [`Settings`]: rc-file / key-value configuration for both.
//! - [`ShutdownSignal`]: async-signal-safe signal delivery as plain values.
//!
//! The writer can also serve as the [`log`] backend through [`install`].

use std::sync::Arc;

pub mod config;
pub mod level;
mod logger;
mod pool;
pub mod queue;
pub mod signal;
mod writer;

pub use config::{ConfigError, Settings};
pub use level::{Level, ParseLevelError};
pub use logger::{
    DEFAULT_FLUSH_INTERVAL, DEFAULT_SEPARATOR, ErrorHandler, FlushInterval, MAX_CACHE_SIZE,
    MAX_FILE_SIZE, MAX_ITEM_LENGTH, RETAINED_CACHE_FACTOR, ROTATION_INTERVAL, RotatingLogWriter,
    RotatingLogWriterBuilder, WriterBuilderError, WriterError, WriterStats,
};
pub use queue::{BoundedBlockingQueue, Capacity, PassOutcome, PutError, QueueError};
pub use signal::{Interrupted, ShutdownSignal, SignalNotifier};

/// Keeps the installed writer alive. Dropping it stops the writer, which
/// flushes what is cached and closes the file; later `log` calls are dropped.
pub struct LoggerGuard {
    writer: Arc<RotatingLogWriter>,
}

impl LoggerGuard {
    pub fn writer(&self) -> &RotatingLogWriter {
        &self.writer
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        self.writer.stop();
    }
}

/// Forwards `log` records into the writer. `log::Level::Trace` maps to ALL.
struct Bridge {
    writer: Arc<RotatingLogWriter>,
}

impl log::Log for Bridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Level::from(metadata.level()).passes(self.writer.threshold())
    }

    fn log(&self, record: &log::Record) {
        self.writer.record(record.level().into(), *record.args());
    }

    /// Flush failures go to the writer's error channel. A stopped writer has
    /// nothing left to flush.
    fn flush(&self) {
        match self.writer.flush() {
            Ok(()) | Err(WriterError::Closed) => {}
            Err(err) => self.writer.report(&err),
        }
    }
}

/// Installs `writer` as the global [`log`] backend and sets the max level
/// from its threshold.
///
/// ```rust, no_run
/// let writer = rotq::RotatingLogWriter::open("/var/log/app", "svc", "api", rotq::Level::Info, false)?;
/// let _guard = rotq::install(writer)?;
/// log::info!("ready");
/// # Ok::<(), rotq::WriterBuilderError>(())
/// ```
pub fn install(writer: RotatingLogWriter) -> Result<LoggerGuard, WriterBuilderError> {
    let writer = Arc::new(writer);
    let level = writer.threshold();
    log::set_boxed_logger(Box::new(Bridge {
        writer: writer.clone(),
    }))?;
    log::set_max_level(level.into());

    Ok(LoggerGuard { writer })
}
