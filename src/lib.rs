//! # mlog
//!
//! An asynchronous multi-producer/single-consumer logging engine: any
//! number of producer threads emit log records without ever blocking on
//! I/O, and one dedicated writer thread serializes them, ordered by time,
//! into a single append-only log file.
//!
//! ## Key Features
//!
//! * Lock-free per-thread byte ring buffers on the producer hot path
//! * A reference-counting protocol that keeps a buffer alive until the
//!   writer has drained it, even after the owning thread has exited
//! * A time-ordered pending-task queue with near O(1) insertion
//! * A bounded recycling pool of task objects to avoid steady-state
//!   allocation
//! * Reject-and-report backpressure: a full ring drops the record and
//!   reports it instead of stalling the producer or growing memory
//!
//! ## Main Components
//!
//! * `Logger`: the producer-facing entry point; `init`, `log`, `set_level`,
//!   `shutdown`
//! * `RingBuffer`: bounded SPSC byte ring, one per producer thread
//! * `BufferRegistry`: thread-id index used for exit-time cleanup, never on
//!   the hot path
//! * `TaskQueue`: global timestamp-ordered queue of flush tasks plus the
//!   bounded shell pool
//!
//! ## Quick Start
//!
//! ```
//! use mlog::{log_error, log_info, Level, Logger};
//!
//! let path = std::env::temp_dir().join("mlog_quickstart.log");
//! let mut logger = Logger::init(Level::Info, &path, 1 << 20).unwrap();
//!
//! log_info!(logger, "listening on port {}", 8080);
//! log_error!(logger, "upstream {} unreachable", "10.0.0.7");
//!
//! // Drains everything already queued, then stops the writer.
//! logger.shutdown();
//! # std::fs::remove_file(path).ok();
//! ```

pub(crate) mod clock;
pub mod error;
pub mod level;
pub mod logger;
pub mod queue;
pub mod registry;
pub mod ring_buffer;
pub mod task;
pub(crate) mod writer;

pub use error::{Error, Result};
pub use level::Level;
pub use logger::{Logger, MAX_RECORD_LEN};
pub use queue::{PendingList, TaskQueue};
pub use registry::{BufferRecord, BufferRegistry};
pub use ring_buffer::RingBuffer;
pub use task::{Task, TaskPool, MAX_POOL_TASKS};
