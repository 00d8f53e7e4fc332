use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported synchronously by [`Logger::init`](crate::Logger::init).
///
/// Everything that can fail after `init` returns (a full ring buffer, a
/// short write in the writer thread) is reported on the diagnostic channel
/// via the `log` facade instead, and never crosses a thread boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The per-thread ring buffer capacity must be a power of two so the
    /// ring can mask indices instead of taking a modulo.
    #[error("ring buffer capacity {0} is not a power of two")]
    CapacityNotPowerOfTwo(usize),

    /// The log file could not be opened for append.
    #[error("failed to open log file {path:?}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The writer thread could not be started.
    #[error("failed to spawn writer thread: {0}")]
    SpawnWriter(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
