//! Snapshot consistency analysis.
//!
//! Humans are noisy: the time between repeated manual actions varies by
//! tens of milliseconds at best. A window of timed samples whose
//! inter-sample offsets barely deviate from their mean is therefore a
//! strong automation signal. The [`ConsistencyChecker`] consumes batch
//! snapshots of timed samples and emits a [`ConsistencySignal`] whenever a
//! window is implausibly regular.

use std::sync::Arc;
use tracing::debug;
use vigil_telemetry::{abs_diff, Broadcaster, EntityId, Snapshot, SummaryStats};

/// A sample carrying the moment it was captured.
pub trait TimedSample {
    /// Capture time in milliseconds since the Unix epoch.
    fn timestamp_ms(&self) -> u64;
}

impl TimedSample for u64 {
    fn timestamp_ms(&self) -> u64 {
        *self
    }
}

/// Verdict for one implausibly consistent snapshot window.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencySignal {
    /// The entity whose samples triggered the signal.
    pub owner: EntityId,
    /// Mean inter-sample offset in the window, milliseconds.
    pub mean: f64,
    /// Largest deviation of any offset extreme from the mean.
    pub max_offset: f64,
    /// Scaled severity; higher means more machine-like regularity.
    pub severity: u32,
}

/// Evaluates snapshot windows against a human-variation floor.
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    min_variation: f64,
    min_samples: usize,
}

/// Severity scale: a window with zero deviation maps to the top of the
/// range, one right at the variation floor maps to the bottom.
const SEVERITY_CEILING: f64 = 160.0;
const SEVERITY_SPAN: f64 = 159.0;

impl ConsistencyChecker {
    /// Creates a checker.
    ///
    /// # Arguments
    ///
    /// * `min_variation` - offsets deviating less than this (in
    ///   milliseconds) from the window mean are considered machine-like
    /// * `min_samples` - windows with fewer samples are never judged
    pub fn new(min_variation: f64, min_samples: usize) -> Self {
        Self {
            min_variation,
            min_samples,
        }
    }

    /// A checker tuned for manual click-speed actions.
    pub fn for_manual_actions() -> Self {
        Self::new(50.0, 5)
    }

    /// Judges one snapshot window; `None` means within human variation.
    pub fn evaluate<T: TimedSample>(&self, snapshot: &Snapshot<T>) -> Option<ConsistencySignal> {
        if snapshot.len() < self.min_samples {
            return None;
        }

        let mut stats = SummaryStats::new();
        for window in snapshot.values().windows(2) {
            stats.accept(abs_diff(
                window[1].timestamp_ms() as f64,
                window[0].timestamp_ms() as f64,
            ));
        }

        let mean = stats.mean()?;
        let max_offset = abs_diff(stats.min()?, mean).max(abs_diff(stats.max()?, mean));

        // Offsets hugging the mean tighter than any human manages.
        if max_offset + 1.0 < self.min_variation {
            let severity =
                (SEVERITY_CEILING - SEVERITY_SPAN * (max_offset / self.min_variation)) as u32;
            return Some(ConsistencySignal {
                owner: snapshot.owner(),
                mean,
                max_offset,
                severity,
            });
        }
        None
    }

    /// Subscribes this checker to a broadcaster, forwarding every signal
    /// into `on_signal`.
    pub fn attach<T, F>(self, broadcaster: &Arc<Broadcaster<T>>, on_signal: F)
    where
        T: TimedSample + Send + Sync + 'static,
        F: Fn(ConsistencySignal) + Send + Sync + 'static,
    {
        broadcaster.subscribe(move |snapshot: &Snapshot<T>| {
            if let Some(signal) = self.evaluate(snapshot) {
                debug!(
                    owner = %signal.owner,
                    mean = signal.mean,
                    max_offset = signal.max_offset,
                    severity = signal.severity,
                    "snapshot window is implausibly consistent"
                );
                on_signal(signal);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn snapshot(timestamps: &[u64]) -> Snapshot<u64> {
        Snapshot::from_slice(EntityId::new(), timestamps)
    }

    #[test]
    fn test_machine_regularity_is_flagged() {
        let checker = ConsistencyChecker::new(50.0, 5);
        // Perfectly even 500 ms cadence.
        let signal = checker
            .evaluate(&snapshot(&[1000, 1500, 2000, 2500, 3000]))
            .expect("perfectly even offsets must flag");
        assert_eq!(signal.mean, 500.0);
        assert_eq!(signal.max_offset, 0.0);
        assert_eq!(signal.severity, 160);
    }

    #[test]
    fn test_human_jitter_passes() {
        let checker = ConsistencyChecker::new(50.0, 5);
        // Offsets 400, 640, 480, 590: spread far beyond the floor.
        assert_eq!(
            checker.evaluate(&snapshot(&[1000, 1400, 2040, 2520, 3110])),
            None
        );
    }

    #[test]
    fn test_short_windows_are_never_judged() {
        let checker = ConsistencyChecker::new(50.0, 5);
        assert_eq!(checker.evaluate(&snapshot(&[1000, 1500, 2000])), None);
    }

    #[test]
    fn test_severity_scales_with_offset() {
        let checker = ConsistencyChecker::new(50.0, 5);
        // Offsets 500, 500, 500, 530: mean 507.5, max offset 22.5.
        let looser = checker
            .evaluate(&snapshot(&[1000, 1500, 2000, 2500, 3030]))
            .expect("offsets within the floor must flag");
        assert!(looser.max_offset > 0.0);
        assert!(looser.severity < 160);
        assert!(looser.severity > 0);
    }

    #[test]
    fn test_attach_forwards_signals() {
        let broadcaster: Arc<Broadcaster<u64>> = Arc::new(Broadcaster::new());
        let signals = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&signals);
        ConsistencyChecker::new(50.0, 5)
            .attach(&broadcaster, move |signal| sink.lock().push(signal));

        broadcaster.broadcast(&snapshot(&[1000, 1500, 2000, 2500, 3000]));
        broadcaster.broadcast(&snapshot(&[1000, 1400, 2040, 2520, 3110]));

        assert_eq!(signals.lock().len(), 1);
    }
}
