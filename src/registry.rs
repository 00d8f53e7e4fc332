use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ring_buffer::RingBuffer;

/// Per-thread buffer record with its manual reference count.
///
/// A record is created lazily on a thread's first log call and is shared
/// between the owning producer and the writer thread. Two reference systems
/// cooperate here:
///
/// * the `Arc` keeps the memory valid for whoever still holds a handle, so
///   there is no use-after-free window;
/// * the explicit [`refs`] count decides the record's *logical* lifetime:
///   one implicit reference while the owning thread is alive, plus one per
///   pending task reading from the ring. The 1→0 transition (observed by
///   exactly one decrementer) removes the record from the registry, after
///   which the last `Arc` drop releases the ring storage.
///
/// ACTIVE (owner running, refs >= 1) → DRAINING (owner exited, refs > 0
/// from pending tasks) → removed. Either the owning thread's exit hook or
/// the writer's release path performs the removal, never both.
///
/// [`refs`]: BufferRecord::acquire
#[derive(Debug)]
pub struct BufferRecord {
    tid: u64,
    pid: u32,
    ring: RingBuffer,
    refs: AtomicUsize,
}

impl BufferRecord {
    /// Creates a record with the implicit "owner alive" reference.
    pub fn new(tid: u64, pid: u32, ring_capacity: usize) -> Self {
        Self {
            tid,
            pid,
            ring: RingBuffer::new(ring_capacity),
            refs: AtomicUsize::new(1),
        }
    }

    pub fn tid(&self) -> u64 {
        self.tid
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Takes an additional reference, one per enqueued task. Returns the
    /// previous count.
    pub fn acquire(&self) -> usize {
        self.refs.fetch_add(1, Ordering::AcqRel)
    }
}

/// Index from thread id to its buffer record.
///
/// The registry is never touched on the producer's per-call hot path;
/// producers cache their own record in a thread-local slot. It exists for
/// exit-time cleanup and identity lookup, and it serializes the teardown
/// decision: the atomic decrement in [`release`](BufferRegistry::release)
/// elects exactly one caller, and that caller mutates the map under the
/// registry lock, so the owning thread's exit hook and the writer can race
/// to decrement without ever double-freeing.
pub struct BufferRegistry {
    records: Mutex<HashMap<u64, Arc<BufferRecord>>>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a freshly created record under its thread id.
    pub fn register(&self, record: Arc<BufferRecord>) {
        let mut records = self.records.lock();
        records.insert(record.tid(), record);
    }

    pub fn lookup(&self, tid: u64) -> Option<Arc<BufferRecord>> {
        let records = self.records.lock();
        records.get(&tid).cloned()
    }

    /// Drops one reference; the caller that observes the count hit zero
    /// unregisters the record, releasing its ring storage once every
    /// outstanding `Arc` handle is gone.
    pub fn release(&self, record: &BufferRecord) {
        let prev = record.refs.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev >= 1, "buffer record over-released");
        if prev == 1 {
            let mut records = self.records.lock();
            records.remove(&record.tid());
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}
