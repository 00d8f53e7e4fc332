use std::fmt;

/// Severity of a log record.
///
/// Levels are ordered by severity: `Error` is the most severe and `Debug`
/// the least. A record is emitted when its level is at or above the
/// logger's current threshold, so a threshold of `Info` passes `Error`,
/// `Warn` and `Info` records and filters out `Debug`.
///
/// # Examples
///
/// ```
/// # use mlog::Level;
/// assert!(Level::Error.passes(Level::Info));
/// assert!(!Level::Debug.passes(Level::Info));
/// assert_eq!(Level::Warn.as_str(), "warn");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    /// Lowercase name used in the on-disk record prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }

    /// Whether a record at this level passes the given threshold.
    #[inline]
    pub fn passes(&self, threshold: Level) -> bool {
        (*self as u8) <= (threshold as u8)
    }

    /// Reconstructs a level from its numeric value, used when the threshold
    /// is stored in an atomic.
    pub(crate) fn from_u8(value: u8) -> Level {
        match value {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            _ => Level::Debug,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
