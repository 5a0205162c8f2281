//! # Vigil Telemetry Substrate
//!
//! Bounded, reusable data structures for a real-time behavioral-anomaly
//! detector. The host feeds high-frequency per-entity events (position
//! updates, timed actions) through these structures to answer two
//! recurring questions without unbounded memory growth:
//!
//! 1. *What happened most recently, bounded to N samples?*
//! 2. *Which entities are currently mutually close in space?*
//!
//! ## Core Structures
//!
//! - [`RingBuffer`] - fixed-capacity circular store of the last N values,
//!   with oldest-overwrite eviction and bidirectional iteration
//! - [`Batch`] - fixed-capacity accumulator that publishes an immutable
//!   [`Snapshot`] through a [`Broadcaster`] once full, then resets in place
//! - [`SpatialIndex`] - balanced spatial partition (2-D or 3-D) supporting
//!   insertion, arbitrary-element extraction, radius queries and bulk
//!   removal, draining a point set into proximity clusters in one pass
//! - [`ModularCounter`] - wrap-around index arithmetic backing the ring
//!   buffer
//! - [`SummaryStats`] - running aggregates for the consistency checks that
//!   consume batch snapshots
//!
//! ## Concurrency Model
//!
//! - `Batch` operations on one instance are mutually exclusive; the
//!   broadcast runs outside the critical section so slow subscribers never
//!   stall producers.
//! - `RingBuffer` offers weak, mutation-tolerant iteration: bounds are
//!   re-read per step, never snapshotted. Callers needing a stable view
//!   copy out first.
//! - `SpatialIndex` is single-writer within one scan cycle and carries no
//!   internal locking.
//! - `Snapshot` values are immutable and safely shared across threads.
//!
//! ## Quick Start Example
//!
//! ```rust
//! use vigil_telemetry::{Batch, Broadcaster, EntityId, SpatialIndex};
//! use std::sync::Arc;
//!
//! // Accumulate timed samples per entity, snapshot on every fourth.
//! let broadcaster = Arc::new(Broadcaster::new());
//! broadcaster.subscribe(|snapshot| {
//!     println!("{} filled: {:?}", snapshot.owner(), snapshot.values());
//! });
//! let batch = Batch::new(broadcaster, EntityId::new(), 4, 0u64)?;
//! batch.add_data_point(1250);
//!
//! // Cluster whatever is mutually close.
//! let mut index: SpatialIndex<EntityId, 2> = SpatialIndex::new();
//! index.insert([12.0, -3.5], EntityId::new());
//! let clusters = index.drain_clusters(4.5);
//! # Ok::<(), vigil_telemetry::TelemetryError>(())
//! ```
//!
//! Persistence is explicitly out of scope: every structure here is a pure
//! in-memory, process-lifetime structure with no durability guarantee.

pub mod batch;
pub mod buffer;
pub mod counter;
pub mod error;
pub mod spatial;
pub mod stats;
pub mod types;
pub mod utils;

// ============================================================================
// Public Surface
// ============================================================================

pub use batch::{Batch, Broadcaster, Snapshot};
pub use buffer::RingBuffer;
pub use counter::ModularCounter;
pub use error::TelemetryError;
pub use spatial::{IndexEntry, IndexStats, NodeId, SpatialIndex};
pub use stats::{abs_diff, variance, SummaryStats};
pub use types::{EntityId, Position};
pub use utils::{current_timestamp, current_timestamp_millis};
