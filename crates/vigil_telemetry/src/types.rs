//! # Core Type Definitions
//!
//! The fundamental types shared by every structure in the telemetry
//! substrate: entity identity and world positions.
//!
//! ## Design Principles
//!
//! - **Type Safety**: `EntityId` wraps a UUID so entity identities cannot be
//!   confused with other identifiers flowing through the host.
//! - **Precision**: Double-precision coordinates, so derived distances stay
//!   accurate in large worlds.
//! - **Serialization**: Boundary-crossing values support JSON/TOML transport
//!   via serde.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tracked entity.
///
/// This is a wrapper around UUID that provides type safety and ensures
/// entity IDs cannot be confused with other kinds of IDs in the host
/// system.
///
/// # Examples
///
/// ```rust
/// use vigil_telemetry::EntityId;
///
/// // Create a new random entity ID
/// let entity_id = EntityId::new();
///
/// // Convert to string for logging/display
/// println!("Entity ID: {}", entity_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Creates a new random entity ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an entity ID from a string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice containing a valid UUID
    ///
    /// # Returns
    ///
    /// Returns `Ok(EntityId)` if the string is a valid UUID, otherwise
    /// returns `Err(uuid::Error)` with details about the parsing failure.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::str::FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a 3D position in the observed world.
///
/// Uses double-precision floating point so position deltas stay meaningful
/// far from the origin.
///
/// # Examples
///
/// ```rust
/// use vigil_telemetry::Position;
///
/// let spawn_point = Position::new(0.0, 0.0, 0.0);
/// let entity_pos = Position::new(100.5, 64.0, -200.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (typically east-west axis)
    pub x: f64,
    /// Y coordinate (typically vertical axis)
    pub y: f64,
    /// Z coordinate (typically north-south axis)
    pub z: f64,
}

impl Position {
    /// Creates a new position with the specified coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to another position.
    ///
    /// Prefer this over [`Position::distance`] for comparisons so the root
    /// extraction is skipped.
    pub fn distance_squared(&self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: Position) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// The horizontal projection `[x, z]`, as fed to a 2-D spatial index.
    pub fn xz(&self) -> [f64; 2] {
        [self.x, self.z]
    }

    /// The full coordinates `[x, y, z]`, as fed to a 3-D spatial index.
    pub fn xyz(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}
