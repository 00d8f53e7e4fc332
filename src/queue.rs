use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::registry::BufferRecord;
use crate::task::{Task, TaskPool, MAX_POOL_TASKS};

/// Pending tasks ordered ascending by enqueue timestamp.
///
/// Producer clocks are coarse and nearly monotonic across calls, so
/// insertion scans backward from the tail and lands after the first entry
/// whose timestamp is not newer. That keeps insertion near O(1) amortized
/// while still yielding a total order. Ties keep insertion order.
pub struct PendingList {
    tasks: VecDeque<Box<Task>>,
}

impl PendingList {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    pub fn push_ordered(&mut self, task: Box<Task>) {
        let mut at = self.tasks.len();
        while at > 0 {
            if self.tasks[at - 1].msec() <= task.msec() {
                break;
            }
            at -= 1;
        }
        self.tasks.insert(at, task);
    }

    /// Detaches the whole list for exclusive processing, leaving it empty.
    pub fn drain_all(&mut self) -> VecDeque<Box<Task>> {
        mem::take(&mut self.tasks)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for PendingList {
    fn default() -> Self {
        Self::new()
    }
}

struct QueueState {
    pending: PendingList,
    pool: TaskPool,
    running: bool,
}

/// The global task queue shared by all producers and the writer thread.
///
/// One mutex guards the pending list, the shell pool and the running flag
/// together; the condvar wakes the writer when work arrives or shutdown is
/// requested. Producers hold the lock only for the O(1) ordered insertion.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    signal: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: PendingList::new(),
                pool: TaskPool::new(),
                running: true,
            }),
            signal: Condvar::new(),
        }
    }

    /// Enqueues a flush task and wakes the writer.
    ///
    /// Once the queue has stopped, the writer's final drain has happened or
    /// is imminent, so a late task would never be consumed; the buffer
    /// reference is handed back for the caller to release.
    pub fn post(
        &self,
        msec: u64,
        msg_len: usize,
        record: Arc<BufferRecord>,
    ) -> Result<(), Arc<BufferRecord>> {
        let mut state = self.state.lock();
        if !state.running {
            return Err(record);
        }
        let mut task = state.pool.obtain();
        task.bind(msec, msg_len, record);
        state.pending.push_ordered(task);
        self.signal.notify_one();
        Ok(())
    }

    /// Blocks until tasks are pending or the queue stops, then detaches the
    /// entire pending list. Returns the batch and whether the queue is
    /// still running.
    pub fn next_batch(&self) -> (VecDeque<Box<Task>>, bool) {
        let mut state = self.state.lock();
        while state.pending.is_empty() && state.running {
            self.signal.wait(&mut state);
        }
        let batch = state.pending.drain_all();
        (batch, state.running)
    }

    /// Returns finished shells to the pool under a single lock; shells past
    /// the pool bound are dropped on the way out.
    pub fn recycle_batch(&self, shells: Vec<Box<Task>>) {
        let mut state = self.state.lock();
        for shell in shells {
            if state.pool.len() >= MAX_POOL_TASKS {
                break;
            }
            state.pool.recycle(shell);
        }
    }

    /// Requests cooperative shutdown: the writer finishes whatever is
    /// already queued, then exits.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.running = false;
        self.signal.notify_one();
    }

    /// Frees every pooled shell, the writer's last act before exiting.
    pub fn release_pool(&self) {
        let mut state = self.state.lock();
        state.pool.clear();
    }

    pub fn pool_len(&self) -> usize {
        self.state.lock().pool.len()
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
