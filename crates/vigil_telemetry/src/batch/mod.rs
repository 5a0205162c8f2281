//! # Batch Accumulation
//!
//! A [`Batch`] saves up a fixed number of data points for one owning
//! entity. The moment the final slot fills, an immutable [`Snapshot`] of
//! the contents is built and handed to the batch's [`Broadcaster`], and the
//! write index resets so the next cycle overwrites the slots in place.
//!
//! ## Concurrency
//!
//! All operations on one batch instance are mutually exclusive: a single
//! short critical section guards the interior state. The broadcast itself
//! runs *after* the lock is released: the snapshot is copied out under the
//! lock, so a slow or failing subscriber can neither corrupt batch state
//! nor block producers beyond the copy.

mod broadcast;

pub use broadcast::Broadcaster;

use crate::error::TelemetryError;
use crate::types::EntityId;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// An immutable, point-in-time copy of a filled batch.
///
/// Snapshots are cheap to clone and safe to share across threads; the
/// values are in original write order and the length always equals the
/// producing batch's capacity.
#[derive(Debug, Serialize)]
pub struct Snapshot<T> {
    owner: EntityId,
    values: Arc<[T]>,
}

impl<T> Snapshot<T> {
    /// Builds a snapshot by copying a value slice.
    pub fn from_slice(owner: EntityId, values: &[T]) -> Self
    where
        T: Clone,
    {
        Self {
            owner,
            values: values.into(),
        }
    }

    /// The entity that produced these values.
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// The captured values, in write order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Number of captured values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the snapshot holds no values. A snapshot produced by a
    /// batch never is, as batch capacities are positive.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            values: Arc::clone(&self.values),
        }
    }
}

struct BatchState<T> {
    values: Vec<T>,
    index: usize,
    last_added: T,
}

/// A fixed-capacity, write-only accumulator for one owning entity.
///
/// Constructed with a dummy value so that [`Batch::peek_last_added`] is
/// total from the first moment; the "never empty" contract holds before
/// any real data point arrives.
pub struct Batch<T> {
    owner: EntityId,
    capacity: usize,
    broadcaster: Arc<Broadcaster<T>>,
    state: Mutex<BatchState<T>>,
}

impl<T: Clone> Batch<T> {
    /// Creates a batch publishing through the given broadcaster.
    ///
    /// # Arguments
    ///
    /// * `broadcaster` - where filled-batch snapshots are delivered
    /// * `owner` - the entity whose samples this batch accumulates
    /// * `capacity` - data points per fill cycle
    /// * `dummy` - seed for `peek_last_added` before any real data point
    ///
    /// # Returns
    ///
    /// `Err(TelemetryError::InvalidArgument)` if `capacity` is zero.
    pub fn new(
        broadcaster: Arc<Broadcaster<T>>,
        owner: EntityId,
        capacity: usize,
        dummy: T,
    ) -> Result<Self, TelemetryError> {
        if capacity == 0 {
            return Err(TelemetryError::InvalidArgument(
                "batch capacity must be greater than zero",
            ));
        }
        Ok(Self {
            owner,
            capacity,
            broadcaster,
            state: Mutex::new(BatchState {
                values: Vec::with_capacity(capacity),
                index: 0,
                last_added: dummy,
            }),
        })
    }

    /// Adds a data point to the batch.
    ///
    /// If this write fills the batch, a snapshot of the contents is built
    /// in write order and broadcast, and the write index resets to zero.
    /// The slot values themselves are not cleared; the next fill cycle
    /// overwrites them in place.
    pub fn add_data_point(&self, value: T) {
        let filled = {
            let mut state = self.state.lock();
            state.last_added = value.clone();
            let index = state.index;
            if index < state.values.len() {
                state.values[index] = value;
            } else {
                state.values.push(value);
            }
            state.index += 1;

            if state.index >= self.capacity {
                state.index = 0;
                Some(Snapshot::from_slice(self.owner, &state.values))
            } else {
                None
            }
        };

        // The snapshot was copied out under the lock; delivery happens
        // outside it so subscribers cannot stall producers on this batch.
        if let Some(snapshot) = filled {
            self.broadcaster.broadcast(&snapshot);
        }
    }

    /// The most recently added value.
    ///
    /// Always defined: before the first data point this returns the dummy
    /// the batch was constructed with, and a broadcast-triggering reset
    /// does not erase it.
    pub fn peek_last_added(&self) -> T {
        self.state.lock().last_added.clone()
    }

    /// Resets the write index to zero without broadcasting.
    ///
    /// Newly added data points overwrite the currently present values.
    pub fn clear(&self) {
        self.state.lock().index = 0;
    }

    /// The entity this batch accumulates for.
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Data points per fill cycle.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> std::fmt::Debug for Batch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("owner", &self.owner)
            .field("capacity", &self.capacity)
            .finish()
    }
}
