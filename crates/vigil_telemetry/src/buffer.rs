//! Fixed-capacity ring buffer with oldest-overwrite eviction.
//!
//! [`RingBuffer`] stores the last `capacity` values pushed into it; once
//! full, each new value overwrites the oldest one. The element about to be
//! overwritten is first handed to a caller-supplied eviction hook, which
//! lets owners maintain derived running statistics without re-scanning the
//! buffer.
//!
//! Iteration is bounded against the buffer's *current* size, re-read at
//! every step. Under external locking that is released between steps this
//! trades strict consistency for liveness: a concurrent `add` may shift
//! which elements are seen, but iteration never fails, never loops
//! infinitely and never yields more than `capacity` elements. Callers that
//! need a stable view should copy out first with [`RingBuffer::to_vec`].

use crate::counter::{decrement_of, increment_of, ModularCounter};
use crate::error::TelemetryError;

type EvictHook<T> = Box<dyn FnMut(T) + Send>;

/// A fixed-capacity circular store of the last `capacity` values.
pub struct RingBuffer<T> {
    capacity: usize,
    storage: Vec<Option<T>>,
    /// The position at which the next element will be written.
    head: ModularCounter,
    /// The position of the oldest element (if such an element exists).
    tail: ModularCounter,
    size: usize,
    default_filled: bool,
    on_evict: Option<EvictHook<T>>,
}

impl<T> RingBuffer<T> {
    /// Creates a new ring buffer.
    ///
    /// # Arguments
    ///
    /// * `capacity` - the size of the internal storage. Once it is full,
    ///   the oldest element will be overwritten.
    ///
    /// # Returns
    ///
    /// `Err(TelemetryError::InvalidArgument)` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, TelemetryError> {
        if capacity == 0 {
            return Err(TelemetryError::InvalidArgument(
                "ring buffer capacity must be greater than zero",
            ));
        }
        let mut storage = Vec::with_capacity(capacity);
        storage.resize_with(capacity, || None);
        Ok(Self {
            capacity,
            storage,
            head: ModularCounter::new(capacity)?,
            tail: ModularCounter::new(capacity)?,
            size: 0,
            default_filled: false,
            on_evict: None,
        })
    }

    /// Creates a ring buffer pre-filled with a default value.
    ///
    /// `head()` and `tail()` on the still-empty buffer return the default
    /// instead of failing with an empty-state error.
    pub fn with_default(capacity: usize, default: T) -> Result<Self, TelemetryError>
    where
        T: Clone,
    {
        let mut buffer = Self::new(capacity)?;
        for slot in &mut buffer.storage {
            *slot = Some(default.clone());
        }
        buffer.default_filled = true;
        Ok(buffer)
    }

    /// Installs the eviction hook.
    ///
    /// The hook receives each element that is overwritten by an `add` on a
    /// full buffer, in eviction order. Replaces any previously installed
    /// hook.
    pub fn set_on_evict<F>(&mut self, hook: F)
    where
        F: FnMut(T) + Send + 'static,
    {
        self.on_evict = Some(Box::new(hook));
    }

    /// Adds a value, overwriting the oldest element when full.
    ///
    /// Always succeeds. When the buffer is full the evicted element is
    /// passed to the eviction hook (if any) before being dropped.
    pub fn add(&mut self, value: T) {
        if self.size == self.capacity {
            let slot = self.tail.increment();
            if let Some(evicted) = self.storage[slot].take() {
                if let Some(hook) = self.on_evict.as_mut() {
                    hook(evicted);
                }
            }
        } else {
            self.size += 1;
        }
        let slot = self.head.increment();
        self.storage[slot] = Some(value);
    }

    /// The most recently added element.
    ///
    /// Fails with `EmptyState` if nothing was ever added, unless the buffer
    /// was constructed with [`RingBuffer::with_default`].
    pub fn head(&self) -> Result<&T, TelemetryError> {
        if self.size == 0 && !self.default_filled {
            return Err(TelemetryError::EmptyState("ring buffer has no elements"));
        }
        self.storage[decrement_of(self.head.get(), self.capacity)]
            .as_ref()
            .ok_or(TelemetryError::EmptyState("ring buffer has no elements"))
    }

    /// The oldest live element, same empty-state rule as [`RingBuffer::head`].
    pub fn tail(&self) -> Result<&T, TelemetryError> {
        if self.size == 0 && !self.default_filled {
            return Err(TelemetryError::EmptyState("ring buffer has no elements"));
        }
        self.storage[self.tail.get()]
            .as_ref()
            .ok_or(TelemetryError::EmptyState("ring buffer has no elements"))
    }

    /// Number of live elements, at most `capacity`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The fixed capacity this buffer was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when no live elements are present.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Resets head, tail and size to zero in constant time.
    ///
    /// Stored values are not touched; the next writes overwrite the stale
    /// slots. See [`RingBuffer::contains`] for the visible consequence.
    pub fn clear(&mut self) {
        self.head.reset();
        self.tail.reset();
        self.size = 0;
    }

    /// Linear scan over the backing storage.
    ///
    /// Stale slots left behind by `clear` are included in the scan, the
    /// accepted price of the O(1) `clear`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.storage.iter().flatten().any(|stored| stored == value)
    }

    /// Forward iteration, oldest to newest, starting at `tail`.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            index: self.tail.get(),
            yielded: 0,
        }
    }

    /// Reverse iteration, newest to oldest, starting one position behind
    /// `head`.
    pub fn iter_rev(&self) -> IterRev<'_, T> {
        IterRev {
            buffer: self,
            index: decrement_of(self.head.get(), self.capacity),
            yielded: 0,
        }
    }

    /// Copies the live elements out, oldest to newest.
    ///
    /// This is the sanctioned stable view for callers that cannot tolerate
    /// the weak iteration contract.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("size", &self.size)
            .field("head", &self.head.get())
            .field("tail", &self.tail.get())
            .field("on_evict", &self.on_evict.is_some())
            .finish()
    }
}

/// Forward iterator over a [`RingBuffer`].
///
/// The yield bound is re-read from the buffer at each step rather than
/// snapshotted at creation.
pub struct Iter<'a, T> {
    buffer: &'a RingBuffer<T>,
    index: usize,
    yielded: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.yielded >= self.buffer.size {
            return None;
        }
        let element = self.buffer.storage[self.index].as_ref()?;
        self.index = increment_of(self.index, self.buffer.capacity);
        self.yielded += 1;
        Some(element)
    }
}

/// Reverse iterator over a [`RingBuffer`], same bounding rule as [`Iter`].
pub struct IterRev<'a, T> {
    buffer: &'a RingBuffer<T>,
    index: usize,
    yielded: usize,
}

impl<'a, T> Iterator for IterRev<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.yielded >= self.buffer.size {
            return None;
        }
        let element = self.buffer.storage[self.index].as_ref()?;
        self.index = decrement_of(self.index, self.buffer.capacity);
        self.yielded += 1;
        Some(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(RingBuffer::<u32>::new(0).is_err());
    }

    #[test]
    fn test_empty_head_tail() {
        let buffer = RingBuffer::<u32>::new(3).unwrap();
        assert_eq!(
            buffer.head(),
            Err(TelemetryError::EmptyState("ring buffer has no elements"))
        );
        assert!(buffer.tail().is_err());
        assert_eq!(buffer.size(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_default_filled_head_tail() {
        let buffer = RingBuffer::with_default(3, 7u32).unwrap();
        assert_eq!(buffer.head(), Ok(&7));
        assert_eq!(buffer.tail(), Ok(&7));
        assert_eq!(buffer.size(), 0);
    }

    #[test]
    fn test_overwrite_oldest() {
        // The scenario from the module contract: capacity 3 receiving
        // [A, B, C, D] retains [B, C, D].
        let mut buffer = RingBuffer::new(3).unwrap();
        for value in ["A", "B", "C", "D"] {
            buffer.add(value);
        }
        assert_eq!(buffer.size(), 3);
        assert_eq!(buffer.head(), Ok(&"D"));
        assert_eq!(buffer.tail(), Ok(&"B"));
        assert_eq!(buffer.to_vec(), vec!["B", "C", "D"]);
    }

    #[test]
    fn test_size_is_bounded() {
        let mut buffer = RingBuffer::new(4).unwrap();
        for i in 0..100 {
            buffer.add(i);
            assert_eq!(buffer.size(), (i + 1).min(4) as usize);
        }
        assert_eq!(buffer.head(), Ok(&99));
        assert_eq!(buffer.tail(), Ok(&96));
    }

    #[test]
    fn test_forward_and_reverse_agree() {
        let mut buffer = RingBuffer::new(5).unwrap();
        for i in 0..8 {
            buffer.add(i);
        }
        let forward: Vec<i32> = buffer.iter().copied().collect();
        let mut reverse: Vec<i32> = buffer.iter_rev().copied().collect();
        reverse.reverse();
        assert_eq!(forward, reverse);
        assert_eq!(forward, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_eviction_hook_sees_overwritten_elements_in_order() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);

        let mut buffer = RingBuffer::new(2).unwrap();
        buffer.set_on_evict(move |value| sink.lock().unwrap().push(value));

        for i in 0..5 {
            buffer.add(i);
        }
        // Capacity 2, five adds: 0, 1 and 2 were overwritten in that order.
        assert_eq!(*evicted.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_clear_is_shallow() {
        let mut buffer = RingBuffer::new(3).unwrap();
        buffer.add(1);
        buffer.add(2);
        buffer.clear();

        assert_eq!(buffer.size(), 0);
        assert!(buffer.head().is_err());
        assert!(buffer.iter().next().is_none());
        // Stale slots are still visible to the linear contains scan.
        assert!(buffer.contains(&1));

        buffer.add(9);
        assert_eq!(buffer.head(), Ok(&9));
        assert_eq!(buffer.tail(), Ok(&9));
        assert_eq!(buffer.size(), 1);
    }

    #[test]
    fn test_clear_of_full_buffer_reverts_to_empty_state() {
        let mut buffer = RingBuffer::new(2).unwrap();
        buffer.add(1);
        buffer.add(2);
        buffer.clear();
        // Every slot still holds a stale value, yet the buffer reports
        // the empty state again.
        assert!(buffer.head().is_err());
        assert!(buffer.tail().is_err());

        // A default-filled buffer keeps answering after clear.
        let mut buffer = RingBuffer::with_default(2, 0).unwrap();
        buffer.add(1);
        buffer.add(2);
        buffer.clear();
        assert!(buffer.head().is_ok());
        assert!(buffer.tail().is_ok());
    }

    #[test]
    fn test_iteration_never_exceeds_capacity() {
        let mut buffer = RingBuffer::new(3).unwrap();
        for i in 0..10 {
            buffer.add(i);
        }
        assert_eq!(buffer.iter().count(), 3);
        assert_eq!(buffer.iter_rev().count(), 3);
    }

    #[test]
    fn test_contains() {
        let mut buffer = RingBuffer::new(3).unwrap();
        buffer.add(10);
        assert!(buffer.contains(&10));
        assert!(!buffer.contains(&11));
    }
}
