use std::cell::RefCell;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

use crate::clock::{epoch_millis, WallClock};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::queue::TaskQueue;
use crate::registry::{BufferRecord, BufferRegistry};
use crate::writer;

/// Upper bound on a rendered record, prefix and trailing newline included.
/// Longer messages are truncated, never split across records.
pub const MAX_RECORD_LEN: usize = 2048;

/// State shared between producers and the writer thread: the level
/// threshold, the thread-id → buffer registry, the pending-task queue and
/// the capture-once wall clock.
pub(crate) struct Shared {
    level: AtomicU8,
    ring_capacity: usize,
    pid: u32,
    clock: WallClock,
    dropped: AtomicU64,
    pub(crate) registry: BufferRegistry,
    pub(crate) queue: TaskQueue,
}

/// Asynchronous multi-producer logger.
///
/// Producer threads render records into their own lock-free ring buffer
/// and enqueue an O(1) flush task; a single background writer thread
/// drains the queue in timestamp order and appends to the log file.
/// Producers never block on I/O, and a full ring drops the record (with a
/// diagnostic) instead of stalling.
///
/// Records are plain text, one line each:
///
/// ```text
/// 2026/08/30 14:03:59 [info] 4912#3 my_app::worker#87: queue depth 12
/// ```
///
/// # Shutdown
///
/// [`shutdown`](Logger::shutdown) (also run on drop) is cooperative: the
/// writer finishes everything already queued before exiting, so records
/// logged before the call are never lost to shutdown itself.
///
/// # Diagnostics
///
/// Failures after `init` (a full ring buffer, a failed write) are
/// reported through the `log` facade and never propagated to the caller.
/// Because of that, `mlog` must not itself be installed as the global
/// `log` backend.
///
/// # Examples
///
/// ```
/// use mlog::{log_info, Level, Logger};
///
/// let path = std::env::temp_dir().join("mlog_doc_example.log");
/// let mut logger = Logger::init(Level::Info, &path, 1 << 16).unwrap();
/// log_info!(logger, "starting up, {} workers", 4);
/// logger.shutdown();
/// # std::fs::remove_file(path).ok();
/// ```
pub struct Logger {
    shared: Arc<Shared>,
    writer: Option<JoinHandle<()>>,
}

impl Logger {
    /// Opens `path` for append and starts the writer thread.
    ///
    /// `ring_capacity` is the size in bytes of each producer thread's ring
    /// buffer and must be a power of two.
    ///
    /// # Errors
    ///
    /// * [`Error::CapacityNotPowerOfTwo`] when the capacity is invalid
    /// * [`Error::OpenFile`] when the log file cannot be opened
    /// * [`Error::SpawnWriter`] when the writer thread cannot start
    pub fn init(level: Level, path: impl AsRef<Path>, ring_capacity: usize) -> Result<Logger> {
        if !ring_capacity.is_power_of_two() {
            return Err(Error::CapacityNotPowerOfTwo(ring_capacity));
        }

        let path = path.as_ref();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| Error::OpenFile {
                path: path.to_path_buf(),
                source,
            })?;

        let shared = Arc::new(Shared {
            level: AtomicU8::new(level as u8),
            ring_capacity,
            pid: std::process::id(),
            clock: WallClock::new(),
            dropped: AtomicU64::new(0),
            registry: BufferRegistry::new(),
            queue: TaskQueue::new(),
        });

        let writer = writer::spawn(file, Arc::clone(&shared)).map_err(Error::SpawnWriter)?;

        Ok(Logger {
            shared,
            writer: Some(writer),
        })
    }

    /// Fire-and-forget log call; prefer the [`log_error!`], [`log_warn!`],
    /// [`log_info!`] and [`log_debug!`] macros, which fill in the call
    /// site.
    ///
    /// Below-threshold levels return immediately. A record that does not
    /// fit in the calling thread's ring buffer is dropped and counted, not
    /// blocked on.
    ///
    /// [`log_error!`]: crate::log_error
    /// [`log_warn!`]: crate::log_warn
    /// [`log_info!`]: crate::log_info
    /// [`log_debug!`]: crate::log_debug
    pub fn log(&self, level: Level, site: &str, line: u32, args: fmt::Arguments<'_>) {
        if !level.passes(self.level()) {
            return;
        }

        let shared = &self.shared;
        let record = thread_record(shared);
        let now = shared.clock.now();

        let mut cur = RecordCursor::new();
        if shared.clock.format_prefix_into(&mut cur, &now).is_err() {
            log::error!("mlog: failed to render timestamp, dropping record");
            return;
        }
        // A full cursor truncates the message; the error that write!
        // surfaces for the unwritten tail is deliberately ignored.
        let _ = write!(
            cur,
            " [{}] {}#{} {}#{}: ",
            level,
            record.pid(),
            record.tid(),
            site,
            line
        );
        let _ = cur.write_fmt(args);
        cur.finish_line();
        let bytes = cur.as_bytes();

        let remaining = record.ring().remaining();
        if remaining < bytes.len() {
            shared.dropped.fetch_add(1, Ordering::Relaxed);
            log::error!(
                "mlog: ring buffer full for tid {}: need {} bytes, {} free, dropping record",
                record.tid(),
                bytes.len(),
                remaining
            );
            return;
        }

        let written = record.ring().put(bytes);
        record.acquire();
        if let Err(record) = shared
            .queue
            .post(epoch_millis(&now), written, Arc::clone(&record))
        {
            // Writer already stopped; the bytes stay unread in the ring and
            // the record is torn down by the usual release paths.
            shared.registry.release(&record);
            shared.dropped.fetch_add(1, Ordering::Relaxed);
            log::warn!("mlog: writer stopped, dropping record from tid {}", record.tid());
        }
    }

    /// Current level threshold.
    pub fn level(&self) -> Level {
        Level::from_u8(self.shared.level.load(Ordering::Relaxed))
    }

    /// Replaces the level threshold, effective for subsequent calls on all
    /// threads.
    pub fn set_level(&self, level: Level) {
        self.shared.level.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` would currently be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level.passes(self.level())
    }

    /// Number of records dropped because a ring buffer was full or the
    /// writer had already stopped.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Number of thread buffer records currently registered.
    pub fn active_buffers(&self) -> usize {
        self.shared.registry.len()
    }

    /// Stops the writer after it drains everything already queued, then
    /// joins it. Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        self.shared.queue.stop();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                log::error!("mlog: writer thread panicked");
            }
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Fixed-size render target for one record. Writes past the end are
/// silently truncated; [`finish_line`](RecordCursor::finish_line)
/// guarantees the trailing newline survives truncation.
struct RecordCursor {
    buf: [u8; MAX_RECORD_LEN],
    len: usize,
}

impl RecordCursor {
    fn new() -> Self {
        Self {
            buf: [0u8; MAX_RECORD_LEN],
            len: 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    fn finish_line(&mut self) {
        if self.len < MAX_RECORD_LEN {
            self.buf[self.len] = b'\n';
            self.len += 1;
            return;
        }
        // Truncated record: back up over UTF-8 continuation bytes so the
        // newline never lands inside a multi-byte character, keeping the
        // emitted line valid UTF-8.
        let mut at = MAX_RECORD_LEN - 1;
        while at > 0 && self.buf[at] & 0xc0 == 0x80 {
            at -= 1;
        }
        self.buf[at] = b'\n';
        self.len = at + 1;
    }
}

impl io::Write for RecordCursor {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        let n = src.len().min(MAX_RECORD_LEN - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&src[..n]);
        self.len += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Process-unique integer id for the calling thread, assigned on first
    /// use and stable for the thread's lifetime.
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);

    /// The calling thread's cached buffer record, so the registry lock
    /// stays off the per-call hot path.
    static THREAD_SLOT: RefCell<Option<ThreadSlot>> = const { RefCell::new(None) };
}

pub(crate) fn thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// Thread-local handle pairing a buffer record with the logger it belongs
/// to. The `Drop` impl is the once-per-thread termination hook: it releases
/// the implicit "owner alive" reference when the thread exits (or when the
/// thread switches to a different logger instance), letting whoever holds
/// the last reference tear the record down.
struct ThreadSlot {
    shared: Weak<Shared>,
    record: Arc<BufferRecord>,
}

impl Drop for ThreadSlot {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.registry.release(&self.record);
        }
    }
}

/// Fetches the calling thread's buffer record, creating and registering it
/// on the thread's first log call through this logger.
fn thread_record(shared: &Arc<Shared>) -> Arc<BufferRecord> {
    THREAD_SLOT.with(|cell| {
        let mut slot = cell.borrow_mut();
        match slot.as_ref() {
            Some(existing) if Weak::as_ptr(&existing.shared) == Arc::as_ptr(shared) => {
                Arc::clone(&existing.record)
            }
            _ => {
                let record = Arc::new(BufferRecord::new(
                    thread_id(),
                    shared.pid,
                    shared.ring_capacity,
                ));
                shared.registry.register(Arc::clone(&record));
                // Replacing the slot drops any record that belonged to a
                // previous logger instance, releasing its owner reference.
                *slot = Some(ThreadSlot {
                    shared: Arc::downgrade(shared),
                    record: Arc::clone(&record),
                });
                record
            }
        }
    })
}

/// Logs at [`Level::Error`], capturing `module_path!()` and `line!()` as
/// the call site.
///
/// # Examples
///
/// ```
/// # use mlog::{log_error, Level, Logger};
/// # let path = std::env::temp_dir().join("mlog_doc_error.log");
/// # let mut logger = Logger::init(Level::Info, &path, 1 << 16).unwrap();
/// log_error!(logger, "connect failed: {}", "timed out");
/// # logger.shutdown();
/// # std::fs::remove_file(path).ok();
/// ```
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::Level::Error, module_path!(), line!(), format_args!($($arg)+))
    };
}

/// Logs at [`Level::Warn`]; see [`log_error!`](crate::log_error).
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::Level::Warn, module_path!(), line!(), format_args!($($arg)+))
    };
}

/// Logs at [`Level::Info`]; see [`log_error!`](crate::log_error).
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::Level::Info, module_path!(), line!(), format_args!($($arg)+))
    };
}

/// Logs at [`Level::Debug`]; see [`log_error!`](crate::log_error).
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log($crate::Level::Debug, module_path!(), line!(), format_args!($($arg)+))
    };
}
