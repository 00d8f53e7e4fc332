use std::io;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Wall-clock timestamp utilities for the record prefix and task ordering.
///
/// One clock read per log call serves both purposes: the rendered
/// `YYYY/MM/DD HH:MM:SS` prefix and the millisecond ordering key of the
/// pending-task queue.

/// Prefix timestamp layout, e.g. `2026/08/30 14:03:59`.
const PREFIX_FMT: &[FormatItem<'static>] =
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second]");

/// Local-time clock with the UTC offset captured once at construction.
///
/// The `time` crate refuses to query the local offset while the process is
/// multi-threaded, so the offset is resolved a single time in
/// [`Logger::init`](crate::Logger::init) and reused by every producer
/// thread. When the offset cannot be determined, timestamps fall back to
/// UTC.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WallClock {
    offset: UtcOffset,
}

impl WallClock {
    pub(crate) fn new() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self { offset }
    }

    /// Current local time.
    pub(crate) fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    /// Renders the record prefix timestamp into `out`.
    pub(crate) fn format_prefix_into(
        &self,
        out: &mut impl io::Write,
        now: &OffsetDateTime,
    ) -> Result<(), time::error::Format> {
        now.format_into(out, PREFIX_FMT)?;
        Ok(())
    }
}

/// Milliseconds since the Unix epoch, the ordering key of the pending
/// queue.
pub(crate) fn epoch_millis(now: &OffsetDateTime) -> u64 {
    let nanos = now.unix_timestamp_nanos();
    if nanos <= 0 {
        0
    } else {
        (nanos / 1_000_000) as u64
    }
}
