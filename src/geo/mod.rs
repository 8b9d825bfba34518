//! Geometry and time math behind the globe and map views.
//!
//! Everything in here is a pure function of primitives (or small `Copy`
//! structs built from them). Nothing touches the network, the datastore or
//! any rendering surface.

pub mod cluster;
pub mod places;
pub mod projection;
pub mod solar;
pub mod viewport;

use serde::{Deserialize, Serialize};

pub use self::cluster::{cluster_by_country, cluster_news, precision_for_scale, Cluster};
pub use self::places::{assign_country, canonical_country, resolve_location, Placement, GLOBAL};
pub use self::projection::{equirectangular, lat_lng_to_vector3, mercator, CameraFocus};
pub use self::solar::{day_factor, subsolar_point, terminator};
pub use self::viewport::{PanZoom, Viewport};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Hermite interpolation between `edge0` and `edge1`, same as GLSL `smoothstep`.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Wraps a longitude into [-180, 180).
pub fn normalize_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}
