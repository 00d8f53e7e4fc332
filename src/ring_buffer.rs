use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Bounded single-producer/single-consumer byte ring buffer, one per
/// producer thread.
///
/// The ring uses free-running head/tail indices masked on access, so the
/// capacity must be a power of two. There is no internal locking: only the
/// owning thread calls [`put`](RingBuffer::put) and only the writer thread
/// calls [`get`](RingBuffer::get) or [`skip`](RingBuffer::skip), and the
/// surrounding reference-count protocol keeps the ring alive while either
/// side still needs it.
///
/// Callers are expected to check [`remaining`](RingBuffer::remaining)
/// before `put` and treat a shortfall as a capacity error rather than
/// blocking; `put` itself never overwrites unread bytes.
#[derive(Debug)]
pub struct RingBuffer {
    data: UnsafeCell<Box<[u8]>>,
    mask: usize,
    /// Total bytes ever written; wraps freely, masked on access.
    head: AtomicUsize,
    /// Total bytes ever read; invariant `head - tail <= capacity`.
    tail: AtomicUsize,
}

// SAFETY: RingBuffer is SPSC by protocol. The producer only writes bytes in
// [tail, head + n) and publishes them with a release store of `head`; the
// consumer only reads bytes below `head` observed with an acquire load and
// publishes consumption with a release store of `tail`. The byte ranges the
// two sides touch are always disjoint.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates a ring with the given capacity in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of two. `Logger::init` validates
    /// the configured capacity before any ring is created.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two(), "capacity must be a power of two");
        Self {
            data: UnsafeCell::new(vec![0u8; capacity].into_boxed_slice()),
            mask: capacity - 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Number of unread bytes currently buffered.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free space left for `put`.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Appends as many bytes of `src` as fit and returns how many were
    /// written. Only the owning producer thread may call this.
    pub fn put(&self, src: &[u8]) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let free = self.capacity() - head.wrapping_sub(tail);
        let n = src.len().min(free);
        if n == 0 {
            return 0;
        }

        let off = head & self.mask;
        let first = n.min(self.capacity() - off);
        // SAFETY: the producer owns [head, head + free) exclusively; the
        // two copies below stay inside that window and do not overlap the
        // consumer's unread range.
        unsafe {
            let buf = (*self.data.get()).as_mut_ptr();
            ptr::copy_nonoverlapping(src.as_ptr(), buf.add(off), first);
            ptr::copy_nonoverlapping(src.as_ptr().add(first), buf, n - first);
        }
        self.head.store(head.wrapping_add(n), Ordering::Release);
        n
    }

    /// Pops up to `out.len()` bytes in FIFO order and returns how many were
    /// copied. Only the writer thread may call this.
    pub fn get(&self, out: &mut [u8]) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let n = out.len().min(head.wrapping_sub(tail));
        if n == 0 {
            return 0;
        }

        let off = tail & self.mask;
        let first = n.min(self.capacity() - off);
        // SAFETY: [tail, head) holds published bytes the producer no longer
        // touches.
        unsafe {
            let buf = (*self.data.get()).as_ptr();
            ptr::copy_nonoverlapping(buf.add(off), out.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(buf, out.as_mut_ptr().add(first), n - first);
        }
        self.tail.store(tail.wrapping_add(n), Ordering::Release);
        n
    }

    /// Discards up to `len` unread bytes without copying them, used when a
    /// record is abandoned after a write failure. Returns how many bytes
    /// were discarded. Only the writer thread may call this.
    pub fn skip(&self, len: usize) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let n = len.min(head.wrapping_sub(tail));
        self.tail.store(tail.wrapping_add(n), Ordering::Release);
        n
    }
}
