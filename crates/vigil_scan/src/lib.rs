//! # Vigil Proximity Scan Engine
//!
//! The host-facing layer over the [`vigil_telemetry`] substrate. On a
//! fixed cadence the scanner pulls the current candidate entities from the
//! host, rebuilds a spatial index over their positions, drains it into
//! proximity clusters and reports every group that exceeds policy to the
//! scoring collaborator.
//!
//! ## Collaborators
//!
//! The engine owns none of the surrounding world state. Two narrow traits
//! connect it to the host:
//!
//! - [`CandidateProvider`] delivers the entities eligible for this cycle
//!   together with a mutual-observability predicate.
//! - [`ClusterSink`] receives each [`ProximityGroup`] that is larger than
//!   the configured allowance.
//!
//! ## Lifecycle
//!
//! [`ProximityScanner::run`] loops on a tokio interval until the stop
//! signal fires; the signal is honored between cycles, never mid-cycle.
//! A single cycle is also directly callable for embedding and tests.

pub mod config;
pub mod consistency;
pub mod logging;
pub mod scanner;
pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vigil_telemetry::{EntityId, Position};

pub use config::{LoggingSettings, ScanSettings, Zone};
pub use consistency::{ConsistencyChecker, ConsistencySignal, TimedSample};
pub use logging::setup_logging;
pub use scanner::ProximityScanner;
pub use store::TelemetryStore;

/// Errors emitted by the scan engine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    /// Configuration values that cannot be used (non-positive radius,
    /// zero group allowance, zero interval).
    #[error("invalid scan settings: {0}")]
    InvalidSettings(&'static str),
}

/// One entity eligible for the current scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The entity's identity.
    pub entity: EntityId,
    /// Its position at collection time.
    pub position: Position,
}

/// A proximity cluster that exceeded the configured group allowance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityGroup {
    /// The seed entity the cluster was grown from.
    pub seed: EntityId,
    /// Every member of the cluster, seed included.
    pub members: Vec<EntityId>,
    /// How many members beyond the allowance the group carries.
    pub overshoot: usize,
}

/// Supplies scan candidates and the observability relation between them.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    /// The entities eligible for this cycle, with current coordinates.
    async fn candidates(&self) -> Vec<Candidate>;

    /// Whether two candidates can observe each other.
    ///
    /// Applied between a cluster seed and each of its neighbors before the
    /// neighbor counts toward the group. The default accepts every pair.
    fn mutually_observable(&self, _a: &Candidate, _b: &Candidate) -> bool {
        true
    }
}

/// Receives the proximity groups a scan cycle found.
#[async_trait]
pub trait ClusterSink: Send + Sync {
    /// Called once per offending group, within the producing cycle.
    async fn report(&self, group: ProximityGroup);
}
