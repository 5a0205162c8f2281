//! Scan engine configuration
//!
//! This module defines the configuration structures for the proximity scan
//! engine: scan cadence, cluster radius, group-size policy, exclusion
//! zones and logging options. The root structure serializes to/from TOML
//! for configuration files.

use crate::ScanError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vigil_telemetry::Position;

/// Main configuration structure for the proximity scanner.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ScanSettings {
    /// Scan period in milliseconds.
    ///
    /// Controls how often the candidate set is re-indexed and drained.
    /// Lower values catch shorter-lived groupings but cost more CPU.
    pub interval_ms: u64,

    /// Cluster radius in world units.
    ///
    /// Two entities closer than this (inclusive) end up in the same
    /// proximity group.
    pub proximity_radius: f64,

    /// Largest group size that is still acceptable.
    ///
    /// Groups at or under this size are never reported. Must be greater
    /// than zero.
    pub allowed_group_size: usize,

    /// Horizontal regions exempt from scanning.
    ///
    /// Candidates inside any of these zones are filtered out before
    /// insertion into the spatial index.
    pub exclusion_zones: Vec<Zone>,

    /// Optional logging configuration.
    pub logging: Option<LoggingSettings>,
}

/// An axis-aligned horizontal rectangle, spanning all heights.
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct Zone {
    /// Western boundary.
    pub min_x: f64,
    /// Southern boundary.
    pub min_z: f64,
    /// Eastern boundary.
    pub max_x: f64,
    /// Northern boundary.
    pub max_z: f64,
}

impl Zone {
    /// Creates a zone from two opposite corners, in either order.
    pub fn new(x1: f64, z1: f64, x2: f64, z2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_z: z1.min(z2),
            max_x: x1.max(x2),
            max_z: z1.max(z2),
        }
    }

    /// Whether a position falls inside this zone, boundaries inclusive.
    /// The vertical axis is ignored.
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.z >= self.min_z
            && position.z <= self.max_z
    }
}

/// Logging system configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingSettings {
    /// Logging level filter.
    ///
    /// Valid values: "trace", "debug", "info", "warn", "error".
    pub level: String,

    /// Enable JSON-formatted log output.
    ///
    /// When true, logs are output in structured JSON format, useful for
    /// log aggregation systems.
    pub json_format: bool,
}

impl ScanSettings {
    /// Validates value constraints not expressible in the types.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.allowed_group_size == 0 {
            return Err(ScanError::InvalidSettings(
                "allowed_group_size must be greater than zero",
            ));
        }
        if self.proximity_radius <= 0.0 {
            return Err(ScanError::InvalidSettings(
                "proximity_radius must be positive",
            ));
        }
        if self.interval_ms == 0 {
            return Err(ScanError::InvalidSettings(
                "interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Loads settings from a TOML file.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings: ScanSettings = toml::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for ScanSettings {
    /// Defaults suitable for a mid-size world scan.
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            proximity_radius: 4.5,
            allowed_group_size: 1,
            exclusion_zones: Vec::new(),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            }),
        }
    }
}
