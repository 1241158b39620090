//! Lock-free single-producer single-consumer event queue.

use super::event::OrderEvent;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default event queue capacity (2^16 slots).
pub const DEFAULT_QUEUE_CAPACITY: usize = 65_536;

/// A fixed-capacity lock-free ring buffer with exactly one producer and one consumer.
///
/// The capacity must be a power of two so index wrap is a mask. `head` is owned by the
/// consumer and `tail` by the producer; each sits on its own cache line to avoid false
/// sharing between the two threads. One slot is kept empty to distinguish full from empty,
/// so a queue of capacity N holds at most N-1 elements.
///
/// The SPSC contract is the caller's responsibility: [`push`] may be called by one thread
/// at a time and [`pop`] by one thread at a time. Multiple producers must serialize their
/// pushes externally. A slot becomes visible to the consumer only through the release
/// store of `tail`, paired with the consumer's acquire load.
///
/// [`push`]: SpscQueue::push
/// [`pop`]: SpscQueue::pop
pub struct SpscQueue<T> {
    /// Consumer cursor, masked into the buffer
    head: CachePadded<AtomicUsize>,
    /// Producer cursor, masked into the buffer
    tail: CachePadded<AtomicUsize>,
    buffer: Box<[UnsafeCell<Option<T>>]>,
    mask: usize,
}

// SAFETY: the producer writes a slot strictly before the release store of `tail` that
// hands it to the consumer, and the consumer takes a slot strictly before the release
// store of `head` that hands it back. Under the SPSC contract no slot is ever accessed
// by both threads at once.
unsafe impl<T: Send> Sync for SpscQueue<T> {}
unsafe impl<T: Send> Send for SpscQueue<T> {}

impl<T> SpscQueue<T> {
    /// Create a queue with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or not a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "queue capacity must be a power of two, got {capacity}"
        );
        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(None))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            buffer,
            mask: capacity - 1,
        }
    }

    /// Enqueue a value. Producer side only.
    ///
    /// Returns the value back via `Err` when the queue is full, leaving the queue
    /// untouched; the caller decides whether to retry, drop or escalate.
    pub fn push(&self, value: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let next_tail = (tail + 1) & self.mask;

        if next_tail == self.head.load(Ordering::Acquire) {
            return Err(value); // Queue full
        }

        // SAFETY: `tail` is owned by the single producer and the slot at `tail` is not
        // visible to the consumer until the release store below.
        unsafe {
            *self.buffer[tail].get() = Some(value);
        }
        self.tail.store(next_tail, Ordering::Release);
        Ok(())
    }

    /// Dequeue the oldest value. Consumer side only.
    pub fn pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);

        if head == self.tail.load(Ordering::Acquire) {
            return None; // Queue empty
        }

        // SAFETY: `head` is owned by the single consumer and the producer will not touch
        // the slot at `head` until the release store below frees it.
        let value = unsafe { (*self.buffer[head].get()).take() };
        debug_assert!(value.is_some(), "occupied slot held no value");
        self.head.store((head + 1) & self.mask, Ordering::Release);
        value
    }

    /// True when no elements are queued. Observational; the answer may be stale by the
    /// time the caller acts on it.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Number of queued elements. Observational, like [`is_empty`].
    ///
    /// [`is_empty`]: SpscQueue::is_empty
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head) & self.mask
    }

    /// Maximum number of elements the queue can hold at once (one less than the slot
    /// count, see the type docs).
    pub fn capacity(&self) -> usize {
        self.mask
    }
}

/// The event queue carried between client threads and the engine worker.
pub type EventQueue = SpscQueue<OrderEvent>;
