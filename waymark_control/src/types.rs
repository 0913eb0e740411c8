// Core spatial and identifier types shared across the control layer.
//
// Defines discrete voxel coordinates (`VoxelCoord`), continuous entity
// positions (`Vec3`), axis-aligned boxes (`Aabb`), and the small enums that
// script bindings pass to the host (`Hand`, `Face`). All plain-data types
// derive `Serialize`/`Deserialize` so configs, fixtures, and logs can carry
// them.
//
// Voxel coordinates are always derived from continuous positions by flooring
// (`VoxelCoord::containing`), never by rounding. A voxel's center is at
// `+0.5` on every axis.
//
// See also: `host.rs` for the collaborator traits that consume these types,
// `pathfinding.rs` for the search over `VoxelCoord`s.

use crate::error::ControlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position in the 3D voxel grid. Each component is in voxel units.
///
/// Axis conventions follow the host game:
/// - X: east  (positive) / west  (negative)
/// - Y: up    (positive) / down  (negative)
/// - Z: south (positive) / north (negative)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The voxel containing a continuous position.
    pub fn containing(pos: Vec3) -> Self {
        Self::new(
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            pos.z.floor() as i32,
        )
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn up(self, n: i32) -> Self {
        self.offset(0, n, 0)
    }

    pub const fn down(self, n: i32) -> Self {
        self.offset(0, -n, 0)
    }

    /// Manhattan distance between two coordinates.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        ((self.x - other.x).unsigned_abs())
            + ((self.y - other.y).unsigned_abs())
            + ((self.z - other.z).unsigned_abs())
    }

    /// Straight-line distance between the two voxel corners.
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        let dz = f64::from(self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Center point of the voxel.
    pub fn center(self) -> Vec3 {
        Vec3::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        )
    }

    /// The voxel's minimum corner as a continuous point.
    pub fn corner(self) -> Vec3 {
        Vec3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }
}

impl fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A continuous position or displacement in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_sq(self, other: Self) -> f64 {
        let d = self - other;
        d.x * d.x + d.y * d.y + d.z * d.z
    }

    pub fn distance(self, other: Self) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Length of the horizontal (XZ) component.
    pub fn horizontal_length(self) -> f64 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    /// Midpoint between two positions.
    pub fn midpoint(self, other: Self) -> Self {
        Self::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Axis-aligned bounding box in world units. `min` is inclusive, `max`
/// exclusive for intersection purposes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The box of an upright entity whose feet are centered at `feet`.
    pub fn of_entity(feet: Vec3, width: f64, height: f64) -> Self {
        let half = width / 2.0;
        Self::new(
            Vec3::new(feet.x - half, feet.y, feet.z - half),
            Vec3::new(feet.x + half, feet.y + height, feet.z + half),
        )
    }

    /// The unit cube occupied by a voxel.
    pub fn of_voxel(coord: VoxelCoord) -> Self {
        let min = coord.corner();
        Self::new(min, min + Vec3::new(1.0, 1.0, 1.0))
    }

    pub fn offset(self, by: Vec3) -> Self {
        Self::new(self.min + by, self.max + by)
    }

    /// Strict overlap test; boxes that only share a face do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

// ---------------------------------------------------------------------------
// Identifiers and binding enums
// ---------------------------------------------------------------------------

/// Host-assigned identifier of a non-player entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

/// Which hand an interaction uses. Interactions try `Main` before `Off`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    Main,
    Off,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Main, Hand::Off];
}

/// A face of a voxel, used to say which side of a block is clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Face {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Face {
    /// Parse a side name as scripts spell it (`"up"`, `"North"`, ...).
    pub fn from_name(name: &str) -> Result<Self, ControlError> {
        match name.to_ascii_lowercase().as_str() {
            "down" => Ok(Face::Down),
            "up" => Ok(Face::Up),
            "north" => Ok(Face::North),
            "south" => Ok(Face::South),
            "west" => Ok(Face::West),
            "east" => Ok(Face::East),
            _ => Err(ControlError::UnknownSide(name.to_string())),
        }
    }

    /// The face whose outward normal is closest to the direction `d`.
    pub fn facing(d: Vec3) -> Self {
        let candidates = [
            (Face::Down, -d.y),
            (Face::Up, d.y),
            (Face::North, -d.z),
            (Face::South, d.z),
            (Face::West, -d.x),
            (Face::East, d.x),
        ];
        let mut best = Face::North;
        let mut best_dot = f64::NEG_INFINITY;
        for (face, dot) in candidates {
            if dot > best_dot {
                best = face;
                best_dot = dot;
            }
        }
        best
    }
}
