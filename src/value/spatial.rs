//! Spatial points.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 2D or 3D point in a coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Spatial reference id
    pub srid: i32,
    /// X (longitude)
    pub x: f64,
    /// Y (latitude)
    pub y: f64,
    /// Z (height), 3D points only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Point {
    /// WGS-84 2D
    pub const WGS84_2D: i32 = 4326;
    /// WGS-84 3D
    pub const WGS84_3D: i32 = 4979;
    /// Cartesian 2D
    pub const CARTESIAN_2D: i32 = 7203;
    /// Cartesian 3D
    pub const CARTESIAN_3D: i32 = 9157;

    /// A 2D point.
    pub fn new_2d(srid: i32, x: f64, y: f64) -> Self {
        Self { srid, x, y, z: None }
    }

    /// A 3D point.
    pub fn new_3d(srid: i32, x: f64, y: f64, z: f64) -> Self {
        Self { srid, x, y, z: Some(z) }
    }

    /// Whether the point has a z coordinate.
    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "point({{srid: {}, x: {}, y: {}, z: {}}})", self.srid, self.x, self.y, z),
            None => write!(f, "point({{srid: {}, x: {}, y: {}}})", self.srid, self.x, self.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points() {
        let p = Point::new_2d(Point::CARTESIAN_2D, 1.0, 2.5);
        assert!(!p.is_3d());
        assert_eq!(p.to_string(), "point({srid: 7203, x: 1, y: 2.5})");
        assert!(Point::new_3d(Point::WGS84_3D, 15.9, 45.8, 120.0).is_3d());
    }
}
