//! Per-entity batch ownership.
//!
//! Every tracked entity owns one batch per sample kind; the store hands
//! the host the right batch for an entity, creating it on first touch.
//! All batches created by one store publish through the same broadcaster,
//! so a single subscription observes every entity's snapshots.

use dashmap::DashMap;
use std::sync::Arc;
use vigil_telemetry::{Batch, Broadcaster, EntityId, TelemetryError};

/// A concurrent map of per-entity [`Batch`] instances sharing one
/// [`Broadcaster`].
pub struct TelemetryStore<T> {
    batches: DashMap<EntityId, Arc<Batch<T>>>,
    broadcaster: Arc<Broadcaster<T>>,
    capacity: usize,
    dummy: T,
}

impl<T: Clone + Send + Sync + 'static> TelemetryStore<T> {
    /// Creates a store whose batches hold `capacity` samples and are
    /// seeded with `dummy`.
    ///
    /// # Returns
    ///
    /// `Err(TelemetryError::InvalidArgument)` if `capacity` is zero;
    /// validated here once so per-entity creation cannot fail later.
    pub fn new(
        broadcaster: Arc<Broadcaster<T>>,
        capacity: usize,
        dummy: T,
    ) -> Result<Self, TelemetryError> {
        if capacity == 0 {
            return Err(TelemetryError::InvalidArgument(
                "batch capacity must be greater than zero",
            ));
        }
        Ok(Self {
            batches: DashMap::new(),
            broadcaster,
            capacity,
            dummy,
        })
    }

    /// The batch accumulating for `entity`, created on first touch.
    pub fn batch_for(&self, entity: EntityId) -> Arc<Batch<T>> {
        self.batches
            .entry(entity)
            .or_insert_with(|| {
                let batch = Batch::new(
                    Arc::clone(&self.broadcaster),
                    entity,
                    self.capacity,
                    self.dummy.clone(),
                )
                .expect("capacity was validated at store construction");
                Arc::new(batch)
            })
            .clone()
    }

    /// Drops the batch for a departed entity, if present.
    pub fn remove(&self, entity: EntityId) {
        self.batches.remove(&entity);
    }

    /// Number of entities currently holding a batch.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// True when no entity holds a batch.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The broadcaster every batch in this store publishes through.
    pub fn broadcaster(&self) -> &Arc<Broadcaster<T>> {
        &self.broadcaster
    }
}

impl<T> std::fmt::Debug for TelemetryStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryStore")
            .field("entities", &self.batches.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_zero_capacity_rejected() {
        let broadcaster = Arc::new(Broadcaster::new());
        assert!(TelemetryStore::new(broadcaster, 0, 0u32).is_err());
    }

    #[test]
    fn test_batch_created_once_per_entity() {
        let broadcaster = Arc::new(Broadcaster::new());
        let store = TelemetryStore::new(broadcaster, 4, 0u32).unwrap();

        let entity = EntityId::new();
        let first = store.batch_for(entity);
        let second = store.batch_for(entity);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);

        store.batch_for(EntityId::new());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_snapshots_carry_their_owner() {
        let broadcaster = Arc::new(Broadcaster::new());
        let owners = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&owners);
        broadcaster.subscribe(move |snapshot| sink.lock().push(snapshot.owner()));

        let store = TelemetryStore::new(broadcaster, 2, 0u32).unwrap();
        let alpha = EntityId::new();
        let beta = EntityId::new();

        store.batch_for(alpha).add_data_point(1);
        store.batch_for(beta).add_data_point(10);
        store.batch_for(alpha).add_data_point(2);

        let seen = owners.lock();
        assert_eq!(*seen, vec![alpha]);
    }

    #[test]
    fn test_remove_forgets_entity_state() {
        let broadcaster = Arc::new(Broadcaster::new());
        let store = TelemetryStore::new(broadcaster, 2, 0u32).unwrap();

        let entity = EntityId::new();
        store.batch_for(entity).add_data_point(1);
        store.remove(entity);
        assert!(store.is_empty());

        // A fresh batch starts a fresh cycle.
        assert_eq!(store.batch_for(entity).peek_last_added(), 0);
    }
}
