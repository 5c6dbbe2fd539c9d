//! Buffered, asynchronously flushed log writer with size and time rotation.
//!
//! Calling threads format records and append them to an in-memory cache; a
//! dedicated worker thread drains the cache to the current file every flush
//! interval. The file is rotated when it gets too old or too large.
//!
//! # Architecture
//!
//! ```text
//! [Producer Threads] → [record()] → [Cache] → [Worker] → [<path>/<base>_<app>_<ts>.log]
//!       ↓                 ↓            ↓          ↓
//!   Filter + format    Push under   Mutex-     Park for the flush interval,
//!   (caller thread)    the lock     guarded    then drain + rotate
//! ```
//!
//! # Backpressure
//!
//! When the cache grows past its limit, the inserting thread flushes it
//! synchronously before returning. Bursty callers pay the I/O cost directly
//! instead of letting the cache grow without bound.
//!
//! # Errors
//!
//! Opening the first file fails fast. Any I/O failure after that is reported
//! to the error handler and the writer keeps serving: records that could not
//! be written stay cached for the next cycle.

use std::fmt::{self, Write as _};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_utils::sync::{Parker, Unparker};
use time::{OffsetDateTime, UtcOffset};

use crate::level::Level;
use crate::pool::Pool;
use crate::writer::CappedWriter;

/// Size past which the current file is rotated.
pub const MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Longest message kept per record. Longer messages are truncated.
pub const MAX_ITEM_LENGTH: usize = 2 * 1024;

/// Cached record count past which the inserting thread flushes synchronously.
pub const MAX_CACHE_SIZE: usize = 1024;

/// While the sink is failing, at most this many times `max_cache_size` records
/// are kept. The oldest ones beyond that are dropped and counted.
pub const RETAINED_CACHE_FACTOR: usize = 4;

/// Age past which the current file is rotated.
pub const ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

pub const DEFAULT_SEPARATOR: char = ':';

/// Timestamp layout shared by log lines and file names, e.g. `2024-01-15T14-30-45`.
const TIMESTAMP_FMT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]");

/// Called with every error the writer swallows (worker cycles, overflow
/// flushes, teardown).
pub type ErrorHandler = Arc<dyn Fn(&WriterError) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("open file error -- {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write file error -- {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("log writer stopped")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum WriterBuilderError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Open(#[from] WriterError),
    #[error("{0}")]
    SetLogger(#[from] log::SetLoggerError),
}

/// Flush period shared between the owner and the worker.
///
/// Cloning yields another handle to the same cell. Updates are relaxed
/// stores: the worker sees a new value at the start of its next cycle at the
/// latest, so a change takes effect within one (old) interval.
#[derive(Debug, Clone)]
pub struct FlushInterval(Arc<AtomicU64>);

impl FlushInterval {
    pub fn new(interval: Duration) -> Self {
        Self(Arc::new(AtomicU64::new(as_millis(interval))))
    }

    pub fn get(&self) -> Duration {
        Duration::from_millis(self.0.load(Ordering::Relaxed))
    }

    /// Sub-millisecond intervals are rounded up to one millisecond.
    pub fn set(&self, interval: Duration) {
        self.0.store(as_millis(interval), Ordering::Relaxed);
    }
}

impl Default for FlushInterval {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_INTERVAL)
    }
}

fn as_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Point-in-time view of a writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterStats {
    pub file_name: PathBuf,
    pub file_open: bool,
    /// Formatted bytes written to the current file since it was opened.
    pub bytes_written: u64,
    pub cached: usize,
    pub flushes: u64,
    pub rotations: u64,
    /// Records whose message was cut at the item length limit.
    pub truncated: u64,
    /// Records discarded because the cache hit its retention limit while the
    /// file could not be written.
    pub dropped: u64,
    /// The last flush failed; the caller-side overflow flush is suspended
    /// until a flush succeeds again.
    pub failing: bool,
}

struct LogRecord {
    timestamp: OffsetDateTime,
    line: String,
}

struct Options {
    dir: PathBuf,
    base_name: String,
    app_name: String,
    threshold: Level,
    echo: bool,
    separator: char,
    max_file_size: u64,
    max_item_length: usize,
    max_cache_size: usize,
    rotation_interval: Duration,
    flush_interval: FlushInterval,
}

/// Everything behind the lock: the cache and the only open file handle.
struct Sink {
    cache: Vec<LogRecord>,
    file: Option<BufWriter<File>>,
    file_name: PathBuf,
    file_start: OffsetDateTime,
    bytes_written: u64,
    flushes: u64,
    rotations: u64,
    dropped: u64,
    failing: bool,
    closed: bool,
}

struct Shared {
    opts: Options,
    offset: UtcOffset,
    pid: u32,
    sink: Mutex<Sink>,
    running: AtomicBool,
    truncated: AtomicU64,
    on_error: Option<ErrorHandler>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    /// Formats `timestamp<sep>app<sep>pid<sep>tid<sep>LEVEL<sep>message\n`.
    fn compose(&self, level: Level, args: fmt::Arguments<'_>) -> LogRecord {
        let now = self.now();
        let sep = self.opts.separator;
        let mut line = Pool::get();

        // SAFETY: TIMESTAMP_FMT only emits ASCII digits, '-' and 'T', so the
        // bytes appended to the String's buffer are valid UTF-8.
        unsafe {
            now.format_into(line.as_mut_vec(), TIMESTAMP_FMT).ok();
        }
        write!(
            line,
            "{sep}{}{sep}{}{sep}{}{sep}{}{sep}",
            self.opts.app_name,
            self.pid,
            thread_id(),
            level,
        )
        .ok();
        let mut capped = CappedWriter::new(&mut line, self.opts.max_item_length);
        capped.write_fmt(args).ok();
        if capped.truncated() {
            self.truncated.fetch_add(1, Ordering::Relaxed);
        }
        line.push('\n');

        LogRecord {
            timestamp: now,
            line,
        }
    }

    fn file_name(&self, at: OffsetDateTime) -> PathBuf {
        let stamp = at.format(TIMESTAMP_FMT).unwrap_or_default();
        self.opts.dir.join(format!(
            "{}_{}_{}.log",
            self.opts.base_name, self.opts.app_name, stamp
        ))
    }

    /// Writes every cached record in order, rotating whenever a record is due.
    ///
    /// On failure the failed record and everything after it stay cached, and
    /// the error is returned. Already written records are gone from the cache.
    fn flush_locked(&self, sink: &mut Sink) -> Result<(), WriterError> {
        sink.flushes += 1;

        let mut pending = mem::take(&mut sink.cache).into_iter();
        let mut failed = None;
        for record in pending.by_ref() {
            if let Err(err) = self.write_record(sink, &record) {
                failed = Some((record, err));
                break;
            }
            Pool::put(record.line);
        }
        if let Some((record, err)) = failed {
            sink.cache.push(record);
            sink.cache.extend(pending);
            sink.failing = true;
            self.shed(sink);
            return Err(err);
        }

        let result = match sink.file.as_mut() {
            Some(file) => file.flush().map_err(|source| WriterError::Write {
                path: sink.file_name.clone(),
                source,
            }),
            None => Ok(()),
        };
        sink.failing = result.is_err();
        result
    }

    /// Drops the oldest cached records beyond the retention limit.
    fn shed(&self, sink: &mut Sink) {
        let limit = self
            .opts
            .max_cache_size
            .saturating_mul(RETAINED_CACHE_FACTOR);
        if sink.cache.len() <= limit {
            return;
        }
        let excess = sink.cache.len() - limit;
        for record in sink.cache.drain(..excess) {
            Pool::put(record.line);
        }
        sink.dropped += excess as u64;
    }

    fn write_record(&self, sink: &mut Sink, record: &LogRecord) -> Result<(), WriterError> {
        let len = record.line.len() as u64;
        let expired = record.timestamp - sink.file_start >= self.opts.rotation_interval;
        let full = sink.bytes_written > 0
            && sink.bytes_written.saturating_add(len) > self.opts.max_file_size;
        if sink.file.is_none() || expired || full {
            self.rotate(sink, record.timestamp)?;
        }

        let Some(file) = sink.file.as_mut() else {
            return Err(WriterError::Closed);
        };
        file.write_all(record.line.as_bytes())
            .map_err(|source| WriterError::Write {
                path: sink.file_name.clone(),
                source,
            })?;
        sink.bytes_written += len;
        Ok(())
    }

    /// Closes the current file and opens the one named after `at`.
    ///
    /// Same-second rotations map to the same name and truncate it.
    fn rotate(&self, sink: &mut Sink, at: OffsetDateTime) -> Result<(), WriterError> {
        if let Some(mut old) = sink.file.take() {
            old.flush().map_err(|source| WriterError::Write {
                path: sink.file_name.clone(),
                source,
            })?;
        }

        let path = self.file_name(at);
        let file = create(&path)?;
        sink.file = Some(BufWriter::new(file));
        sink.file_name = path;
        sink.file_start = at;
        sink.bytes_written = 0;
        sink.rotations += 1;
        Ok(())
    }

    /// Side error channel. Must be called without the sink lock held.
    fn report(&self, err: &WriterError) {
        match &self.on_error {
            Some(handler) => handler(err),
            None => {
                let record = self.compose(Level::Error, format_args!("{}", err));
                io::stderr().write_all(record.line.as_bytes()).ok();
                Pool::put(record.line);
            }
        }
    }
}

fn create(path: &Path) -> Result<File, WriterError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| WriterError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Small per-thread number stamped into every line, assigned on first use.
fn thread_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static ID: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    ID.with(|id| *id)
}

/// Configures and opens a [`RotatingLogWriter`].
///
/// ```rust, no_run
/// use std::time::Duration;
/// use rotq::{Level, RotatingLogWriter};
///
/// let writer = RotatingLogWriter::builder("/var/log/app", "access", "gateway")
///     .with_threshold(Level::Debug)
///     .with_rotation_interval(Duration::from_secs(600))
///     .open()
///     .unwrap();
/// writer.info(format_args!("listening on port {}", 8080));
/// ```
pub struct RotatingLogWriterBuilder {
    opts: Options,
    on_error: Option<ErrorHandler>,
}

impl RotatingLogWriterBuilder {
    /// Most verbose level that is kept. Defaults to [`Level::Info`].
    ///
    /// Records above the threshold are rejected before formatting, so a
    /// filtered call costs one comparison.
    pub fn with_threshold(mut self, threshold: Level) -> Self {
        self.opts.threshold = threshold;
        self
    }

    /// Also write every kept record to stderr, synchronously, from the caller.
    ///
    /// # Performance
    ///
    /// Echo puts a stderr write on the hot path. Leave it off outside
    /// development.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.opts.echo = echo;
        self
    }

    /// Character between the fields of a line. Defaults to
    /// [`DEFAULT_SEPARATOR`]; a newline is rejected by [`open`](Self::open).
    ///
    /// # Example
    ///
    /// ```rust, no_run
    /// // 2024-01-15T14-30-45|gateway|4242|1|INFO|ready
    /// let writer = rotq::RotatingLogWriter::builder("/var/log/app", "access", "gateway")
    ///     .with_separator('|')
    ///     .open()?;
    /// # Ok::<(), rotq::WriterBuilderError>(())
    /// ```
    pub fn with_separator(mut self, separator: char) -> Self {
        self.opts.separator = separator;
        self
    }

    /// Size in bytes a file may reach before the next record rotates it.
    /// Defaults to [`MAX_FILE_SIZE`]; must be positive.
    ///
    /// A file that is still empty takes its first record whatever its size.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.opts.max_file_size = bytes;
        self
    }

    /// Longest message, in bytes, kept per record. Defaults to
    /// [`MAX_ITEM_LENGTH`]. Longer messages are cut on a char boundary and
    /// counted in [`WriterStats::truncated`].
    pub fn with_max_item_length(mut self, bytes: usize) -> Self {
        self.opts.max_item_length = bytes;
        self
    }

    /// Cached record count past which the inserting thread flushes. Defaults
    /// to [`MAX_CACHE_SIZE`]; must be positive.
    ///
    /// # Performance
    ///
    /// Smaller caches bound memory but make producers do the I/O more often.
    /// While the file cannot be written, up to [`RETAINED_CACHE_FACTOR`] times
    /// this many records are kept.
    pub fn with_max_cache_size(mut self, records: usize) -> Self {
        self.opts.max_cache_size = records;
        self
    }

    /// Age after which a file is rotated, measured from when the file was
    /// started. Defaults to [`ROTATION_INTERVAL`]; must be non-zero.
    pub fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.opts.rotation_interval = interval;
        self
    }

    /// Share a flush interval cell; keep a clone to retune it at runtime.
    ///
    /// # Example
    ///
    /// ```rust, no_run
    /// use std::time::Duration;
    /// use rotq::{FlushInterval, RotatingLogWriter};
    ///
    /// let interval = FlushInterval::new(Duration::from_secs(5));
    /// let writer = RotatingLogWriter::builder("/var/log/app", "access", "gateway")
    ///     .with_flush_interval(interval.clone())
    ///     .open()?;
    ///
    /// // picked up by the worker within one old interval
    /// interval.set(Duration::from_millis(500));
    /// # Ok::<(), rotq::WriterBuilderError>(())
    /// ```
    pub fn with_flush_interval(mut self, interval: FlushInterval) -> Self {
        self.opts.flush_interval = interval;
        self
    }

    /// Replace the default error channel (an ERROR line on stderr).
    ///
    /// The handler runs on whichever thread hit the error: the worker, a
    /// producer doing an overflow flush, or the thread calling `stop`. It is
    /// never called with the writer's lock held.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&WriterError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Validates the options, opens the first file and starts the worker
    /// thread (`<app>-log-flush`).
    ///
    /// # Errors
    ///
    /// [`WriterBuilderError::InvalidArgument`] for an empty name, a zero limit
    /// or a newline separator; [`WriterBuilderError::Open`] when the first file
    /// cannot be created.
    pub fn open(self) -> Result<RotatingLogWriter, WriterBuilderError> {
        let opts = self.opts;
        if opts.base_name.is_empty() || opts.app_name.is_empty() {
            return Err(WriterBuilderError::InvalidArgument("base and app names must not be empty"));
        }
        if opts.max_file_size == 0 {
            return Err(WriterBuilderError::InvalidArgument("max file size must be positive"));
        }
        if opts.max_cache_size == 0 {
            return Err(WriterBuilderError::InvalidArgument("max cache size must be positive"));
        }
        if opts.rotation_interval.is_zero() {
            return Err(WriterBuilderError::InvalidArgument("rotation interval must be positive"));
        }
        if opts.separator == '\n' {
            return Err(WriterBuilderError::InvalidArgument("separator must not be a newline"));
        }

        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        let start = OffsetDateTime::now_utc().to_offset(offset);
        let mut shared = Shared {
            opts,
            offset,
            pid: std::process::id(),
            sink: Mutex::new(Sink {
                cache: Vec::new(),
                file: None,
                file_name: PathBuf::new(),
                file_start: start,
                bytes_written: 0,
                flushes: 0,
                rotations: 0,
                dropped: 0,
                failing: false,
                closed: false,
            }),
            running: AtomicBool::new(true),
            truncated: AtomicU64::new(0),
            on_error: self.on_error,
        };

        let file_name = shared.file_name(start);
        let file = create(&file_name)?;
        {
            let sink = shared.sink.get_mut().unwrap_or_else(PoisonError::into_inner);
            sink.file = Some(BufWriter::new(file));
            sink.file_name = file_name;
        }

        let shared = Arc::new(shared);
        let parker = Parker::new();
        let unparker = parker.unparker().clone();
        let handle = std::thread::Builder::new()
            .name(format!("{}-log-flush", shared.opts.app_name))
            .spawn({
                let shared = shared.clone();
                move || flush_loop(&shared, &parker)
            })
            .map_err(|source| WriterError::Open {
                path: shared.opts.dir.clone(),
                source,
            })?;

        Ok(RotatingLogWriter {
            shared,
            worker: Mutex::new(Some(Worker { handle, unparker })),
        })
    }
}

/// Worker body: park for the flush interval (re-read every cycle), then drain
/// the cache. An unpark from `stop()` ends the park early, so shutdown does not
/// wait out the interval. Errors are reported and never end the loop.
fn flush_loop(shared: &Shared, parker: &Parker) {
    while shared.running.load(Ordering::Acquire) {
        parker.park_timeout(shared.opts.flush_interval.get());
        if !shared.running.load(Ordering::Acquire) {
            break;
        }

        let result = {
            let mut sink = shared.lock();
            shared.flush_locked(&mut sink)
        };
        if let Err(err) = result {
            shared.report(&err);
        }
    }
}

struct Worker {
    handle: JoinHandle<()>,
    unparker: Unparker,
}

/// Asynchronously flushed, rotating, append-only log writer.
///
/// Records are filtered against the threshold, formatted on the calling thread
/// and cached; a background worker persists the cache every flush interval.
/// Files are named `<path>/<base_name>_<app_name>_<YYYY-MM-DDThh-mm-ss>.log`
/// and rotated after [`ROTATION_INTERVAL`] or [`MAX_FILE_SIZE`] bytes (both
/// configurable).
///
/// Dropping the writer stops it: the worker is joined, the cache is flushed
/// one last time and the file is closed.
pub struct RotatingLogWriter {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl RotatingLogWriter {
    pub fn builder(
        path: impl Into<PathBuf>,
        base_name: impl Into<String>,
        app_name: impl Into<String>,
    ) -> RotatingLogWriterBuilder {
        RotatingLogWriterBuilder {
            opts: Options {
                dir: path.into(),
                base_name: base_name.into(),
                app_name: app_name.into(),
                threshold: Level::Info,
                echo: false,
                separator: DEFAULT_SEPARATOR,
                max_file_size: MAX_FILE_SIZE,
                max_item_length: MAX_ITEM_LENGTH,
                max_cache_size: MAX_CACHE_SIZE,
                rotation_interval: ROTATION_INTERVAL,
                flush_interval: FlushInterval::default(),
            },
            on_error: None,
        }
    }

    /// Opens a writer with default limits.
    pub fn open(
        path: impl Into<PathBuf>,
        base_name: impl Into<String>,
        app_name: impl Into<String>,
        threshold: Level,
        echo: bool,
    ) -> Result<Self, WriterBuilderError> {
        Self::builder(path, base_name, app_name)
            .with_threshold(threshold)
            .with_echo(echo)
            .open()
    }

    pub fn threshold(&self) -> Level {
        self.shared.opts.threshold
    }

    pub fn flush_interval(&self) -> FlushInterval {
        self.shared.opts.flush_interval.clone()
    }

    /// Filters, formats and caches one record.
    ///
    /// Below-threshold records cost a comparison. If the cache grows past its
    /// limit the cache is flushed on this thread before returning; errors from
    /// that flush go to the error handler, never to the caller. Records offered
    /// after [`stop`](Self::stop) are discarded.
    ///
    /// While the sink is failing, only the worker retries; callers just cache,
    /// and the oldest records past [`RETAINED_CACHE_FACTOR`] times the cache
    /// limit are dropped.
    pub fn record(&self, level: Level, args: fmt::Arguments<'_>) {
        if !level.passes(self.shared.opts.threshold) {
            return;
        }
        if !self.shared.running.load(Ordering::Relaxed) {
            return;
        }

        let record = self.shared.compose(level, args);
        if self.shared.opts.echo {
            io::stderr().write_all(record.line.as_bytes()).ok();
        }

        let mut sink = self.shared.lock();
        if sink.closed {
            return;
        }
        sink.cache.push(record);
        if sink.cache.len() <= self.shared.opts.max_cache_size {
            return;
        }
        if sink.failing {
            self.shared.shed(&mut sink);
            return;
        }
        let result = self.shared.flush_locked(&mut sink);
        drop(sink);
        if let Err(err) = result {
            self.shared.report(&err);
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.record(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.record(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.record(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.record(Level::Debug, args);
    }

    /// Drains the cache to disk on the calling thread.
    ///
    /// Unlike worker cycles, the error is returned to the caller. Records that
    /// could not be written stay cached.
    pub fn flush(&self) -> Result<(), WriterError> {
        let mut sink = self.shared.lock();
        if sink.closed {
            return Err(WriterError::Closed);
        }
        self.shared.flush_locked(&mut sink)
    }

    /// Hands `err` to the error channel configured for this writer.
    pub(crate) fn report(&self, err: &WriterError) {
        self.shared.report(err);
    }

    pub fn stats(&self) -> WriterStats {
        let sink = self.shared.lock();
        WriterStats {
            file_name: sink.file_name.clone(),
            file_open: sink.file.is_some(),
            bytes_written: sink.bytes_written,
            cached: sink.cache.len(),
            flushes: sink.flushes,
            rotations: sink.rotations,
            truncated: self.shared.truncated.load(Ordering::Relaxed),
            dropped: sink.dropped,
            failing: sink.failing,
        }
    }

    /// Stops the worker, flushes the cache one last time and closes the file.
    ///
    /// Returns once the worker has exited. Only the first call does anything.
    pub fn stop(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return;
        };

        self.shared.running.store(false, Ordering::Release);
        worker.unparker.unpark();
        worker.handle.join().ok();

        let mut sink = self.shared.lock();
        let mut result = self.shared.flush_locked(&mut sink);
        if let Some(mut file) = sink.file.take() {
            if let Err(source) = file.flush() {
                result = result.and(Err(WriterError::Write {
                    path: sink.file_name.clone(),
                    source,
                }));
            }
        }
        sink.closed = true;
        drop(sink);

        if let Err(err) = result {
            self.shared.report(&err);
        }
    }
}

impl Drop for RotatingLogWriter {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for RotatingLogWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingLogWriter")
            .field("dir", &self.shared.opts.dir)
            .field("base_name", &self.shared.opts.base_name)
            .field("app_name", &self.shared.opts.app_name)
            .field("threshold", &self.shared.opts.threshold)
            .finish_non_exhaustive()
    }
}
