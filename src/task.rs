use std::sync::Arc;

use crate::registry::BufferRecord;

/// Most shells the pool retains between bursts; completions beyond this are
/// freed immediately instead of cached.
pub const MAX_POOL_TASKS: usize = 1024;

/// A pending unit of work: flush `msg_len` bytes from one buffer record.
///
/// A task is bound when the producer enqueues it and consumed exactly once
/// by the writer. Between uses it lives in the [`TaskPool`] as a
/// reference-free shell (`record == None`).
pub struct Task {
    msec: u64,
    msg_len: usize,
    record: Option<Arc<BufferRecord>>,
}

impl Task {
    fn empty() -> Self {
        Self {
            msec: 0,
            msg_len: 0,
            record: None,
        }
    }

    /// Fills a shell for enqueue. The caller has already taken the buffer
    /// reference this task represents.
    pub fn bind(&mut self, msec: u64, msg_len: usize, record: Arc<BufferRecord>) {
        self.msec = msec;
        self.msg_len = msg_len;
        self.record = Some(record);
    }

    /// Enqueue timestamp in milliseconds, the queue ordering key.
    pub fn msec(&self) -> u64 {
        self.msec
    }

    /// Exact number of ring bytes this task covers.
    pub fn msg_len(&self) -> usize {
        self.msg_len
    }

    /// Detaches the buffer reference, leaving a reference-free shell.
    pub fn take_record(&mut self) -> Option<Arc<BufferRecord>> {
        self.record.take()
    }
}

/// Bounded stack of recycled task shells.
///
/// Pure allocation cache for the steady-state hot path: `obtain` pops a
/// shell or allocates a fresh one, `recycle` pushes it back while the pool
/// is below [`MAX_POOL_TASKS`] and drops it otherwise.
pub struct TaskPool {
    shells: Vec<Box<Task>>,
}

impl TaskPool {
    pub fn new() -> Self {
        Self { shells: Vec::new() }
    }

    pub fn obtain(&mut self) -> Box<Task> {
        self.shells
            .pop()
            .unwrap_or_else(|| Box::new(Task::empty()))
    }

    /// Returns a shell to the pool, or drops it when the pool is full.
    /// The shell must already be reference-free.
    pub fn recycle(&mut self, task: Box<Task>) {
        debug_assert!(task.record.is_none(), "recycled task still holds a buffer reference");
        if self.shells.len() < MAX_POOL_TASKS {
            self.shells.push(task);
        }
    }

    /// Frees every cached shell, used when the writer shuts down.
    pub fn clear(&mut self) {
        self.shells.clear();
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}
