//! The periodic proximity scan cycle.
//!
//! Each cycle rebuilds a fresh 2-D spatial index over the horizontal
//! coordinates of the eligible candidates and drains it: pick a seed,
//! query its neighborhood, keep the neighbors that pass the mutual
//! observability predicate and the full 3-D distance recheck, remove the
//! cluster, repeat until the index is empty. Neighbors failing the
//! recheck stay in the index and may anchor or join a later cluster.
//!
//! The horizontal index intentionally ignores the vertical axis; the
//! recheck against the true squared radius restores full-space semantics
//! for the final membership decision.

use crate::{Candidate, CandidateProvider, ClusterSink, ProximityGroup, ScanError, ScanSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};
use vigil_telemetry::{NodeId, SpatialIndex};

/// Drives the scan cycle against a candidate provider and reports
/// oversized groups to a cluster sink.
pub struct ProximityScanner<P, S> {
    settings: ScanSettings,
    provider: Arc<P>,
    sink: Arc<S>,
}

impl<P, S> ProximityScanner<P, S>
where
    P: CandidateProvider,
    S: ClusterSink,
{
    /// Creates a scanner after validating the settings.
    pub fn new(settings: ScanSettings, provider: Arc<P>, sink: Arc<S>) -> Result<Self, ScanError> {
        settings.validate()?;
        Ok(Self {
            settings,
            provider,
            sink,
        })
    }

    /// The settings this scanner runs with.
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Runs scan cycles on the configured interval until `stop` fires.
    ///
    /// The stop signal is honored between cycles only; an in-flight cycle
    /// always completes.
    pub async fn run(&self, mut stop: oneshot::Receiver<()>) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.settings.interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            interval_ms = self.settings.interval_ms,
            radius = self.settings.proximity_radius,
            "proximity scanner started"
        );

        loop {
            tokio::select! {
                _ = &mut stop => {
                    info!("proximity scanner stopping");
                    break;
                }
                _ = interval.tick() => {
                    let reported = self.run_cycle().await;
                    debug!(groups = reported, "scan cycle complete");
                }
            }
        }
    }

    /// Runs one full scan cycle and returns the number of groups reported.
    pub async fn run_cycle(&self) -> usize {
        let candidates = self.provider.candidates().await;
        let radius = self.settings.proximity_radius;
        let radius_sq = radius * radius;
        let allowed = self.settings.allowed_group_size;

        // Fresh index per cycle; payloads are offsets into the candidate
        // list so the predicate can see full candidate state.
        let mut index: SpatialIndex<usize, 2> = SpatialIndex::with_capacity(candidates.len());
        for (offset, candidate) in candidates.iter().enumerate() {
            if self
                .settings
                .exclusion_zones
                .iter()
                .any(|zone| zone.contains(candidate.position))
            {
                continue;
            }
            index.insert(candidate.position.xz(), offset);
        }

        let mut reported = 0;
        while let Ok(seed_entry) = index.get_any() {
            let seed = &candidates[seed_entry.payload];
            let neighborhood = index.range_search(seed_entry.coords, radius);

            // The planar query ignored the vertical axis and the
            // observability relation; both are applied here. The seed
            // always qualifies, so the drain advances every iteration.
            let mut member_ids: Vec<NodeId> = Vec::with_capacity(neighborhood.len());
            let mut members: Vec<&Candidate> = Vec::with_capacity(neighborhood.len());
            for entry in &neighborhood {
                let other = &candidates[entry.payload];
                if entry.id == seed_entry.id
                    || (seed.position.distance_squared(other.position) <= radius_sq
                        && self.provider.mutually_observable(seed, other))
                {
                    member_ids.push(entry.id);
                    members.push(other);
                }
            }
            index.remove(&member_ids);

            if members.len() <= allowed {
                continue;
            }

            let group = ProximityGroup {
                seed: seed.entity,
                members: members.iter().map(|member| member.entity).collect(),
                overshoot: members.len() - allowed,
            };
            debug!(
                seed = %group.seed,
                size = group.members.len(),
                overshoot = group.overshoot,
                "proximity group exceeds allowance"
            );
            self.sink.report(group).await;
            reported += 1;
        }

        reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use vigil_telemetry::{EntityId, Position};

    struct FixedProvider {
        candidates: Vec<Candidate>,
    }

    #[async_trait]
    impl CandidateProvider for FixedProvider {
        async fn candidates(&self) -> Vec<Candidate> {
            self.candidates.clone()
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        groups: Mutex<Vec<ProximityGroup>>,
    }

    #[async_trait]
    impl ClusterSink for CollectingSink {
        async fn report(&self, group: ProximityGroup) {
            self.groups.lock().push(group);
        }
    }

    fn candidate(x: f64, y: f64, z: f64) -> Candidate {
        Candidate {
            entity: EntityId::new(),
            position: Position::new(x, y, z),
        }
    }

    fn scanner_with(
        settings: ScanSettings,
        candidates: Vec<Candidate>,
    ) -> (
        ProximityScanner<FixedProvider, CollectingSink>,
        Arc<CollectingSink>,
    ) {
        let provider = Arc::new(FixedProvider { candidates });
        let sink = Arc::new(CollectingSink::default());
        let scanner = ProximityScanner::new(settings, provider, Arc::clone(&sink)).unwrap();
        (scanner, sink)
    }

    #[tokio::test]
    async fn test_pair_is_reported_single_is_not() {
        let settings = ScanSettings {
            proximity_radius: 2.0,
            ..ScanSettings::default()
        };
        let candidates = vec![
            candidate(0.0, 0.0, 0.0),
            candidate(1.0, 0.0, 0.0),
            candidate(10.0, 0.0, 10.0),
        ];
        let expected_pair: Vec<EntityId> =
            candidates.iter().take(2).map(|c| c.entity).collect();

        let (scanner, sink) = scanner_with(settings, candidates);
        let reported = scanner.run_cycle().await;

        assert_eq!(reported, 1);
        let groups = sink.groups.lock();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].overshoot, 1);
        let mut members = groups[0].members.clone();
        members.sort_by_key(|id| id.0);
        let mut expected = expected_pair;
        expected.sort_by_key(|id| id.0);
        assert_eq!(members, expected);
    }

    #[tokio::test]
    async fn test_vertical_offset_splits_planar_neighbors() {
        // Same horizontal spot, 30 units apart vertically: the planar
        // index sees one neighborhood but the 3-D recheck rejects the
        // pairing, so no group forms.
        let settings = ScanSettings {
            proximity_radius: 2.0,
            ..ScanSettings::default()
        };
        let candidates = vec![candidate(0.0, 0.0, 0.0), candidate(0.0, 30.0, 0.0)];

        let (scanner, sink) = scanner_with(settings, candidates);
        let reported = scanner.run_cycle().await;

        assert_eq!(reported, 0);
        assert!(sink.groups.lock().is_empty());
    }

    #[tokio::test]
    async fn test_exclusion_zone_filters_candidates() {
        let settings = ScanSettings {
            proximity_radius: 5.0,
            exclusion_zones: vec![crate::Zone::new(-10.0, -10.0, 10.0, 10.0)],
            ..ScanSettings::default()
        };
        // Both candidates sit inside the exclusion zone.
        let candidates = vec![candidate(0.0, 0.0, 0.0), candidate(1.0, 0.0, 1.0)];

        let (scanner, sink) = scanner_with(settings, candidates);
        let reported = scanner.run_cycle().await;

        assert_eq!(reported, 0);
        assert!(sink.groups.lock().is_empty());
    }

    #[tokio::test]
    async fn test_allowed_size_suppresses_reports() {
        let settings = ScanSettings {
            proximity_radius: 5.0,
            allowed_group_size: 3,
            ..ScanSettings::default()
        };
        let candidates = vec![
            candidate(0.0, 0.0, 0.0),
            candidate(1.0, 0.0, 0.0),
            candidate(2.0, 0.0, 0.0),
        ];

        let (scanner, sink) = scanner_with(settings, candidates);
        let reported = scanner.run_cycle().await;

        // Three members, allowance three: within policy.
        assert_eq!(reported, 0);
        assert!(sink.groups.lock().is_empty());
    }

    #[tokio::test]
    async fn test_overshoot_arithmetic() {
        let settings = ScanSettings {
            proximity_radius: 10.0,
            allowed_group_size: 2,
            ..ScanSettings::default()
        };
        let candidates: Vec<Candidate> =
            (0..5).map(|i| candidate(i as f64, 0.0, 0.0)).collect();

        let (scanner, sink) = scanner_with(settings, candidates);
        scanner.run_cycle().await;

        let groups = sink.groups.lock();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 5);
        assert_eq!(groups[0].overshoot, 3);
    }

    #[tokio::test]
    async fn test_run_stops_on_signal() {
        let settings = ScanSettings {
            interval_ms: 10,
            ..ScanSettings::default()
        };
        let (scanner, _sink) = scanner_with(settings, Vec::new());

        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        // With the signal already fired the loop must exit promptly.
        tokio::time::timeout(Duration::from_secs(1), scanner.run(rx))
            .await
            .expect("scanner should stop once signalled");
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = ScanSettings {
            allowed_group_size: 0,
            ..ScanSettings::default()
        };
        let provider = Arc::new(FixedProvider { candidates: vec![] });
        let sink = Arc::new(CollectingSink::default());
        assert!(ProximityScanner::new(settings, provider, sink).is_err());
    }
}
