use std::f64::consts::PI;

use super::GeoPoint;

/// Latitude limit of the Web Mercator square.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_78;
/// Camera distance from the globe centre when focused on a location.
pub const FOCUS_DISTANCE: f64 = 1.8;
/// Fraction of the remaining distance covered per frame while focusing.
pub const FOCUS_LERP: f64 = 0.05;
/// Distance at which a focus animation counts as finished.
pub const FOCUS_EPSILON: f64 = 0.01;

/// Position on a sphere of `radius` for the given coordinates.
///
/// Y-up frame with the north pole on +Y and Greenwich on +X, matching the
/// texture seam of the globe mesh.
pub fn lat_lng_to_vector3(lat: f64, lng: f64, radius: f64) -> [f64; 3] {
    let phi = (90.0 - lat).to_radians();
    let theta = (lng + 180.0).to_radians();

    [
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    ]
}

/// Inverse of [`lat_lng_to_vector3`] for any non-zero vector.
pub fn vector3_to_lat_lng(v: [f64; 3]) -> GeoPoint {
    let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    let lat = 90.0 - (v[1] / r).clamp(-1.0, 1.0).acos().to_degrees();
    let lng = super::normalize_lng(v[2].atan2(-v[0]).to_degrees() - 180.0);
    GeoPoint::new(lat, lng)
}

/// Plate carrée projection onto a `width` x `height` canvas.
pub fn equirectangular(lat: f64, lng: f64, width: f64, height: f64) -> (f64, f64) {
    let x = (lng + 180.0) * width / 360.0;
    let y = (90.0 - lat) * height / 180.0;
    (x, y)
}

/// Inverse of [`equirectangular`].
pub fn equirectangular_inverse(x: f64, y: f64, width: f64, height: f64) -> GeoPoint {
    GeoPoint::new(90.0 - y * 180.0 / height, x * 360.0 / width - 180.0)
}

/// Mercator projection onto a canvas of the given size, centred vertically.
pub fn mercator(lat: f64, lng: f64, width: f64, height: f64) -> (f64, f64) {
    let x = (lng + 180.0) * (width / 360.0);
    let lat_rad = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let merc_n = (PI / 4.0 + lat_rad / 2.0).tan().ln();
    let y = height / 2.0 - width * merc_n / (2.0 * PI);
    (x, y)
}

/// Texture coordinates for an equirectangular texture, v growing southward.
pub fn texture_uv(lat: f64, lng: f64) -> (f64, f64) {
    ((lng + 180.0) / 360.0, 1.0 - (lat + 90.0) / 180.0)
}

/// Smooth camera move toward a point above a location on the globe.
#[derive(Debug, Clone, Copy)]
pub struct CameraFocus {
    pub position: [f64; 3],
    pub target: Option<[f64; 3]>,
}

impl CameraFocus {
    pub fn new(position: [f64; 3]) -> Self {
        Self {
            position,
            target: None,
        }
    }

    /// Starts moving toward the location at `lat`/`lng`.
    pub fn focus_on(&mut self, lat: f64, lng: f64) {
        self.target = Some(lat_lng_to_vector3(lat, lng, FOCUS_DISTANCE));
    }

    pub fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    /// Advances one frame. Returns `true` on the frame the animation completes.
    pub fn step(&mut self) -> bool {
        let Some(target) = self.target else {
            return false;
        };

        for (p, t) in self.position.iter_mut().zip(target) {
            *p += (t - *p) * FOCUS_LERP;
        }

        if distance(self.position, target) < FOCUS_EPSILON {
            self.target = None;
            return true;
        }
        false
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn test_vector3_axes() {
        let north = lat_lng_to_vector3(90.0, 0.0, 1.0);
        assert_close(north[1], 1.0, 1e-12);

        let greenwich = lat_lng_to_vector3(0.0, 0.0, 2.0);
        assert_close(greenwich[0], 2.0, 1e-12);
        assert_close(greenwich[1], 0.0, 1e-12);
        assert_close(greenwich[2], 0.0, 1e-12);

        let east = lat_lng_to_vector3(0.0, 90.0, 1.0);
        assert_close(east[2], -1.0, 1e-12);
    }

    #[test]
    fn test_vector3_is_on_sphere_and_inverts() {
        for &(lat, lng) in &[(37.5665, 126.978), (-33.8688, 151.2093), (51.5074, -0.1278)] {
            let v = lat_lng_to_vector3(lat, lng, 1.03);
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert_close(r, 1.03, 1e-12);
            let back = vector3_to_lat_lng(v);
            assert_close(back.lat, lat, 1e-9);
            assert_close(back.lng, lng, 1e-9);
        }
    }

    #[test]
    fn test_equirectangular_corners() {
        assert_eq!(equirectangular(90.0, -180.0, 360.0, 180.0), (0.0, 0.0));
        assert_eq!(equirectangular(-90.0, 180.0, 360.0, 180.0), (360.0, 180.0));
        assert_eq!(equirectangular(0.0, 0.0, 1000.0, 500.0), (500.0, 250.0));

        let back = equirectangular_inverse(750.0, 125.0, 1000.0, 500.0);
        assert_close(back.lat, 45.0, 1e-12);
        assert_close(back.lng, 90.0, 1e-12);
    }

    #[test]
    fn test_mercator_is_finite_at_poles() {
        let (x, y) = mercator(0.0, 0.0, 800.0, 600.0);
        assert_close(x, 400.0, 1e-9);
        assert_close(y, 300.0, 1e-9);

        let (_, top) = mercator(90.0, 0.0, 800.0, 800.0);
        assert!(top.is_finite());
        assert_close(top, 0.0, 1e-3);
    }

    #[test]
    fn test_texture_uv() {
        assert_eq!(texture_uv(90.0, -180.0), (0.0, 0.0));
        assert_eq!(texture_uv(-90.0, 180.0), (1.0, 1.0));
    }

    #[test]
    fn test_camera_focus_converges() {
        let mut camera = CameraFocus::new([0.0, 0.0, 2.5]);
        assert!(!camera.step());

        camera.focus_on(48.8566, 2.3522);
        assert!(camera.is_animating());

        let mut frames = 0;
        while !camera.step() {
            frames += 1;
            assert!(frames < 1_000, "focus never settled");
        }
        assert!(!camera.is_animating());

        let target = lat_lng_to_vector3(48.8566, 2.3522, FOCUS_DISTANCE);
        assert!(distance(camera.position, target) < FOCUS_EPSILON);
    }
}
