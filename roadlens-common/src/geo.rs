//! Geometry utilities over WGS84 coordinates
//!
//! Pure functions shared by survey ingestion and the reconciliation
//! engine: bounding boxes, haversine path lengths, and containment tests.
//! All distances are meters, all coordinates are decimal degrees.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG)
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A single WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Compute the bounding box of a point sequence.
    ///
    /// Returns `None` for an empty sequence (an empty path has no extent).
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min_lat: first.lat,
            min_lon: first.lon,
            max_lat: first.lat,
            max_lon: first.lon,
        };
        for p in &points[1..] {
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.min_lon = bbox.min_lon.min(p.lon);
            bbox.max_lat = bbox.max_lat.max(p.lat);
            bbox.max_lon = bbox.max_lon.max(p.lon);
        }
        Some(bbox)
    }

    /// Containment test with a symmetric margin in degrees.
    ///
    /// GPS traces wobble; callers pass a margin rather than testing the
    /// raw box edge.
    pub fn contains(&self, point: GeoPoint, margin_deg: f64) -> bool {
        point.lat >= self.min_lat - margin_deg
            && point.lat <= self.max_lat + margin_deg
            && point.lon >= self.min_lon - margin_deg
            && point.lon <= self.max_lon + margin_deg
    }
}

/// Great-circle distance between two points (haversine formula)
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Total length of a polyline in meters.
///
/// Zero for paths with fewer than two points.
pub fn path_length_m(path: &[GeoPoint]) -> f64 {
    path.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

/// Whether `point` lies within `tolerance_m` of the polyline.
///
/// Uses a local equirectangular projection around the query point, which
/// is accurate to well under a meter at the sub-kilometer tolerances the
/// platform uses.
pub fn point_near_path(point: GeoPoint, path: &[GeoPoint], tolerance_m: f64) -> bool {
    if path.is_empty() {
        return false;
    }
    if path.len() == 1 {
        return haversine_m(point, path[0]) <= tolerance_m;
    }
    let project = |p: GeoPoint| -> (f64, f64) {
        let x = (p.lon - point.lon).to_radians() * point.lat.to_radians().cos() * EARTH_RADIUS_M;
        let y = (p.lat - point.lat).to_radians() * EARTH_RADIUS_M;
        (x, y)
    };
    path.windows(2).any(|w| {
        let (ax, ay) = project(w[0]);
        let (bx, by) = project(w[1]);
        segment_distance_sq(ax, ay, bx, by) <= tolerance_m * tolerance_m
    })
}

/// Squared distance from the origin to segment (a, b) in the projected plane
fn segment_distance_sq(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (-(ax * dx + ay * dy) / len_sq).clamp(0.0, 1.0)
    };
    let px = ax + t * dx;
    let py = ay + t * dy;
    px * px + py * py
}
