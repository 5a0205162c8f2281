//! # Spatial Proximity Index
//!
//! A balanced spatial partition over payload-tagged points, generic over
//! the coordinate dimensionality (`K` = 2 for horizontal-plane scans, 3
//! for full-space scans). One algorithm serves both: the index partitions
//! on the dimension of greatest spread, so a 2-D instance behaves like a
//! classic planar tree and a 3-D instance like a volume tree without two
//! divergent implementations.
//!
//! ## Access Pattern
//!
//! The index is rebuilt from scratch every scan cycle: construct, insert
//! all candidates, then repeatedly extract a seed, query its neighborhood
//! and remove the resulting cluster until the index is empty. Inserts
//! therefore append in O(1) and the balanced tree is built lazily at the
//! first query; an insert arriving after a query marks the tree dirty and
//! the next query rebuilds it. Removal tombstones entries rather than
//! restructuring; the whole index is discarded at cycle end.
//!
//! ## Identity
//!
//! Entries are keyed by [`NodeId`], not by coordinates: duplicate
//! coordinates with distinct identities are both retained, and removal
//! addresses identities. The index is a set, never a multiset. IDs are
//! scoped to the issuing index instance.

mod tree;

use crate::error::TelemetryError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identity of one entry within a [`SpatialIndex`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point stored in the index: identity, coordinates and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry<T, const K: usize> {
    /// Identity within the issuing index, used for removal.
    pub id: NodeId,
    /// Coordinates of the point.
    pub coords: [f64; K],
    /// Caller payload tagged onto the point.
    pub payload: T,
}

/// Activity counters for monitoring index behaviour.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IndexStats {
    /// Total entries ever inserted.
    pub inserted: usize,
    /// Total entries removed.
    pub removed: usize,
    /// Range queries served.
    pub queries: usize,
    /// Tree (re)builds performed.
    pub rebuilds: usize,
}

/// A proximity index over a dynamic point set.
///
/// See the module docs for the intended build-once-drain-completely
/// lifecycle. No internal locking: each scan cycle owns its index
/// exclusively.
///
/// # Examples
///
/// ```rust
/// use vigil_telemetry::SpatialIndex;
///
/// let mut index: SpatialIndex<&str, 2> = SpatialIndex::new();
/// index.insert([0.0, 0.0], "a");
/// index.insert([1.0, 0.0], "b");
/// index.insert([10.0, 10.0], "c");
///
/// let clusters = index.drain_clusters(2.0);
/// assert_eq!(clusters.len(), 2);
/// assert!(index.is_empty());
/// ```
pub struct SpatialIndex<T, const K: usize> {
    coords: Vec<[f64; K]>,
    payloads: Vec<T>,
    alive: Vec<bool>,
    live: usize,
    /// Every entry below this arena position is dead.
    scan_from: usize,
    root: Option<tree::TreeNode>,
    stats: IndexStats,
}

impl<T, const K: usize> SpatialIndex<T, K> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            coords: Vec::new(),
            payloads: Vec::new(),
            alive: Vec::new(),
            live: 0,
            scan_from: 0,
            root: None,
            stats: IndexStats::default(),
        }
    }

    /// Creates an empty index with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            coords: Vec::with_capacity(capacity),
            payloads: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            live: 0,
            scan_from: 0,
            root: None,
            stats: IndexStats::default(),
        }
    }

    /// Adds a point and returns its identity.
    ///
    /// O(1): the balanced tree is rebuilt lazily at the next query.
    /// Duplicate coordinates are retained as distinct entries.
    pub fn insert(&mut self, coords: [f64; K], payload: T) -> NodeId {
        let id = NodeId(self.coords.len() as u64);
        self.coords.push(coords);
        self.payloads.push(payload);
        self.alive.push(true);
        self.live += 1;
        self.stats.inserted += 1;
        self.root = None;
        id
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    /// True when no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Removes a batch of entries by identity.
    ///
    /// Identities that are absent (never issued by this index, or already
    /// removed) are silently ignored; failing here would break the drain
    /// loop's "remove whatever the query returned" pattern. Returns the
    /// number of entries actually removed.
    pub fn remove(&mut self, ids: &[NodeId]) -> usize {
        let mut removed = 0;
        for id in ids {
            let idx = id.0 as usize;
            if idx < self.alive.len() && self.alive[idx] {
                self.alive[idx] = false;
                self.live -= 1;
                removed += 1;
            }
        }
        self.stats.removed += removed;
        while self.scan_from < self.alive.len() && !self.alive[self.scan_from] {
            self.scan_from += 1;
        }
        removed
    }

    /// Activity counters.
    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    fn ensure_built(&mut self) {
        if self.root.is_some() {
            return;
        }
        let items: Vec<u32> = (0..self.coords.len())
            .filter(|&idx| self.alive[idx])
            .map(|idx| idx as u32)
            .collect();
        if items.is_empty() {
            return;
        }
        debug!(entries = items.len(), "rebuilding spatial partition");
        self.root = Some(tree::build(&self.coords, items));
        self.stats.rebuilds += 1;
    }
}

impl<T: Clone, const K: usize> SpatialIndex<T, K> {
    /// Returns one arbitrary live entry without removing it.
    ///
    /// Repeatable: calling this again on an unmodified index returns the
    /// same entry and has no side effects. Which entry is returned is
    /// otherwise unspecified.
    ///
    /// # Returns
    ///
    /// `Err(TelemetryError::EmptyState)` when the index is empty.
    pub fn get_any(&self) -> Result<IndexEntry<T, K>, TelemetryError> {
        (self.scan_from..self.alive.len())
            .find(|&idx| self.alive[idx])
            .map(|idx| self.entry_at(idx))
            .ok_or(TelemetryError::EmptyState("spatial index is empty"))
    }

    /// Every live entry within `radius` of `origin`, inclusive.
    ///
    /// An entry exactly at `origin` is always part of its own result.
    /// Results are in insertion order. Distance comparisons run on squared
    /// distances internally; `radius` is a true (non-negative) radius.
    pub fn range_search(&mut self, origin: [f64; K], radius: f64) -> Vec<IndexEntry<T, K>> {
        let radius = radius.max(0.0);
        self.ensure_built();
        self.stats.queries += 1;

        let mut hits: Vec<u32> = Vec::new();
        if let Some(root) = &self.root {
            tree::collect_in_range(
                root,
                &self.coords,
                &self.alive,
                &origin,
                radius,
                radius * radius,
                &mut hits,
            );
        }
        hits.sort_unstable();
        hits.into_iter()
            .map(|idx| self.entry_at(idx as usize))
            .collect()
    }

    /// Partitions the remaining entries into proximity clusters.
    ///
    /// Runs the drain cycle: pick a seed via [`SpatialIndex::get_any`],
    /// collect its neighborhood via [`SpatialIndex::range_search`], remove
    /// the whole cluster, repeat until empty. Every entry lands in exactly
    /// one cluster; each cluster member is within `radius` of the seed
    /// chosen for that cluster.
    pub fn drain_clusters(&mut self, radius: f64) -> Vec<Vec<IndexEntry<T, K>>> {
        let mut clusters = Vec::new();
        while let Ok(seed) = self.get_any() {
            let members = self.range_search(seed.coords, radius);
            let ids: Vec<NodeId> = members.iter().map(|member| member.id).collect();
            self.remove(&ids);
            clusters.push(members);
        }
        clusters
    }

    fn entry_at(&self, idx: usize) -> IndexEntry<T, K> {
        IndexEntry {
            id: NodeId(idx as u64),
            coords: self.coords[idx],
            payload: self.payloads[idx].clone(),
        }
    }
}

impl<T, const K: usize> Default for SpatialIndex<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const K: usize> std::fmt::Debug for SpatialIndex<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("live", &self.live)
            .field("total", &self.coords.len())
            .field("built", &self.root.is_some())
            .finish()
    }
}
