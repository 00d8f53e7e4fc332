use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::logger::{Shared, MAX_RECORD_LEN};
use crate::task::Task;

/// The single background thread that serializes records to the output
/// file.
///
/// Loop: wait on the queue until tasks are pending or shutdown is
/// requested, detach the whole batch, process it in timestamp order, then
/// recycle the shells. On shutdown the writer always finishes whatever was
/// already queued before exiting; the file closes when the writer drops.
pub(crate) struct Writer {
    file: File,
    shared: Arc<Shared>,
}

pub(crate) fn spawn(file: File, shared: Arc<Shared>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("mlog-writer".into())
        .spawn(move || Writer { file, shared }.run())
}

impl Writer {
    fn run(mut self) {
        loop {
            let (batch, running) = self.shared.queue.next_batch();
            if !batch.is_empty() {
                self.flush_batch(batch, running);
            }
            if !running {
                self.shared.queue.release_pool();
                break;
            }
        }
    }

    /// Writes out one detached batch, already in timestamp order.
    ///
    /// After the first short or failed write the remainder of the batch is
    /// abandoned: the affected records are not written (documented data
    /// loss, reported on the diagnostic channel), but their ring bytes are
    /// still consumed and their buffer references released so no record
    /// outlives its last reader.
    fn flush_batch(&mut self, mut batch: VecDeque<Box<Task>>, running: bool) {
        let mut scratch = [0u8; MAX_RECORD_LEN];
        let mut finished: Vec<Box<Task>> = Vec::new();
        let mut failed = false;

        while let Some(mut task) = batch.pop_front() {
            let record = match task.take_record() {
                Some(record) => record,
                None => continue,
            };

            if failed {
                record.ring().skip(task.msg_len());
                self.shared.registry.release(&record);
                continue;
            }

            let len = record.ring().get(&mut scratch[..task.msg_len()]);
            let result = self.file.write(&scratch[..len]);
            self.shared.registry.release(&record);

            match result {
                Ok(n) if n == len => {
                    if running {
                        finished.push(task);
                    }
                }
                Ok(n) => {
                    log::error!(
                        "mlog: short write for tid {} ({} of {} bytes), abandoning batch",
                        record.tid(),
                        n,
                        len
                    );
                    failed = true;
                }
                Err(err) => {
                    log::error!(
                        "mlog: write failed for tid {}: {}, abandoning batch",
                        record.tid(),
                        err
                    );
                    failed = true;
                }
            }
        }

        if !finished.is_empty() {
            self.shared.queue.recycle_batch(finished);
        }
    }
}
