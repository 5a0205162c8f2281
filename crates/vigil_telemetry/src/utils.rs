//! Shared utility functions.

// ============================================================================
// Timestamps
// ============================================================================

/// Returns the current Unix timestamp in seconds.
///
/// All telemetry producers should use this function for timestamp
/// generation so sampled times stay comparable across call sites.
///
/// # Panics
///
/// Panics if the system clock is set to a time before the Unix epoch
/// (January 1, 1970). This should never happen in practice on modern
/// systems.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Returns the current Unix timestamp in milliseconds.
///
/// Millisecond resolution is what timed-action samples carry; see
/// [`current_timestamp`] for the clock caveats.
pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_are_consistent() {
        let secs = current_timestamp();
        let millis = current_timestamp_millis();
        // Millis and secs read back-to-back must describe the same moment
        // to within a couple of seconds.
        assert!(millis / 1000 >= secs);
        assert!(millis / 1000 - secs < 2);
    }
}
