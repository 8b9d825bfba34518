//! Sub-solar point, day/night factor and terminator line.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use std::f64::consts::PI;

use super::{normalize_lng, smoothstep, GeoPoint};

/// Axial tilt used for the seasonal swing of the sub-solar latitude.
pub const AXIAL_TILT_DEG: f64 = 23.45;
/// Day of year of the June solstice.
pub const SOLSTICE_DAY: f64 = 172.0;
/// Lower edge of the twilight band, as a cosine of the sun angle.
pub const TWILIGHT_LOW: f64 = -0.15;
/// Upper edge of the twilight band.
pub const TWILIGHT_HIGH: f64 = 0.25;

/// Fractional UTC hours since midnight.
fn utc_hours(t: DateTime<Utc>) -> f64 {
    let seconds = t.num_seconds_from_midnight() as f64 + t.nanosecond() as f64 / 1e9;
    seconds / 3600.0
}

fn days_in_year(year: i32) -> f64 {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|d| d.ordinal() as f64)
        .unwrap_or(365.0)
}

/// Elapsed part of the calendar year in [0, 1), including the elapsed part
/// of today. One full year is exactly one cycle, leap years included.
fn year_fraction(t: DateTime<Utc>) -> f64 {
    (t.ordinal0() as f64 + utc_hours(t) / 24.0) / days_in_year(t.year())
}

/// Seasonal phase in radians, zero at the June solstice.
fn seasonal_phase(t: DateTime<Utc>) -> f64 {
    (year_fraction(t) - (SOLSTICE_DAY - 1.0) / 365.0) * 2.0 * PI
}

/// The point on Earth directly under the sun at `t`.
///
/// Longitude moves 15° per hour westward with 12:00 UTC over Greenwich.
/// Latitude follows a cosine of the day of year peaking at the June solstice.
pub fn subsolar_point(t: DateTime<Utc>) -> GeoPoint {
    let lng = normalize_lng((12.0 - utc_hours(t)) * 15.0);
    let lat = AXIAL_TILT_DEG * seasonal_phase(t).cos();
    GeoPoint::new(lat, lng)
}

/// Cosine of the central angle between `point` and `sun` (spherical law of cosines).
pub fn cos_sun_angle(point: GeoPoint, sun: GeoPoint) -> f64 {
    let (phi1, phi2) = (point.lat.to_radians(), sun.lat.to_radians());
    let delta = (point.lng - sun.lng).to_radians();
    (phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta.cos()).clamp(-1.0, 1.0)
}

/// Day factor for a given sun angle cosine: 0 is full night, 1 is full day.
pub fn day_factor_from_cos(cos_angle: f64) -> f64 {
    smoothstep(TWILIGHT_LOW, TWILIGHT_HIGH, cos_angle)
}

/// Day factor in [0, 1] for the point (`lat`, `lng`) at instant `t`.
pub fn day_factor(lat: f64, lng: f64, t: DateTime<Utc>) -> f64 {
    day_factor_from_cos(cos_sun_angle(GeoPoint::new(lat, lng), subsolar_point(t)))
}

/// City lights fade in as the day factor drops.
pub fn city_light_intensity(lat: f64, lng: f64, t: DateTime<Utc>) -> f64 {
    1.0 - day_factor(lat, lng, t)
}

/// Orange rim along the terminator, strongest where the sun sits on the horizon.
pub fn twilight_glow(cos_angle: f64) -> f64 {
    let zone = (1.0 - (cos_angle * 2.5).abs()).max(0.0);
    zone * (1.0 - day_factor_from_cos(cos_angle) * 0.5)
}

/// Radius in texture pixels of a city light, weighted by population.
pub fn light_radius(population: u64) -> f64 {
    ((population.max(1) as f64).log10() * 3.0).clamp(5.0, 20.0)
}

/// The terminator as a closed polyline of `[lng, lat]` pairs.
///
/// Walks the great circle lying 90° from the sub-solar point, one vertex per
/// bearing step.
pub fn terminator(t: DateTime<Utc>, steps: usize) -> Vec<[f64; 2]> {
    let sun = subsolar_point(t);
    let (phi1, lambda1) = (sun.lat.to_radians(), sun.lng.to_radians());
    let steps = steps.max(3);

    (0..=steps)
        .map(|i| {
            let bearing = 2.0 * PI * i as f64 / steps as f64;
            let phi2 = (phi1.cos() * bearing.cos()).clamp(-1.0, 1.0).asin();
            let lambda2 =
                lambda1 + (bearing.sin() * phi1.cos()).atan2(-phi1.sin() * phi2.sin());
            [normalize_lng(lambda2.to_degrees()), phi2.to_degrees()]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().unwrap()
    }

    #[test]
    fn test_subsolar_longitude_follows_utc_clock() {
        assert!((subsolar_point(at(2024, 3, 20, 12, 0)).lng).abs() < 1e-9);
        assert!((subsolar_point(at(2024, 3, 20, 18, 0)).lng + 90.0).abs() < 1e-9);
        assert!((subsolar_point(at(2024, 3, 20, 6, 0)).lng - 90.0).abs() < 1e-9);
        assert!((subsolar_point(at(2024, 3, 20, 0, 0)).lng + 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_subsolar_latitude_peaks_at_solstices() {
        // Ordinal 172 at midnight is the June peak.
        let june = subsolar_point(Utc.with_ymd_and_hms(2023, 6, 21, 0, 0, 0).unwrap());
        assert!((june.lat - AXIAL_TILT_DEG).abs() < 0.01);

        let december = subsolar_point(at(2023, 12, 20, 12, 0));
        assert!(december.lat < -23.0);

        let equinox = subsolar_point(at(2023, 3, 21, 12, 0));
        assert!(equinox.lat.abs() < 2.0);
    }

    #[test]
    fn test_day_factor_at_subsolar_point_and_antipode() {
        for t in [at(2024, 1, 5, 3, 17), at(2024, 6, 21, 12, 0), at(2024, 9, 30, 22, 45)] {
            let sun = subsolar_point(t);
            assert!((day_factor(sun.lat, sun.lng, t) - 1.0).abs() < 1e-9);
            let anti = day_factor(-sun.lat, normalize_lng(sun.lng + 180.0), t);
            assert!(anti.abs() < 1e-9);
        }
    }

    #[test]
    fn test_day_factor_bounded_everywhere() {
        let t = at(2024, 12, 21, 7, 30);
        for lat in (-90..=90).step_by(5) {
            for lng in (-180..=180).step_by(10) {
                let f = day_factor(lat as f64, lng as f64, t);
                assert!((0.0..=1.0).contains(&f), "{lat},{lng} -> {f}");
            }
        }
    }

    #[test]
    fn test_poles_saturate_near_solstice() {
        let t = at(2024, 6, 20, 0, 0);
        assert_eq!(day_factor(90.0, 0.0, t), 1.0);
        assert_eq!(day_factor(-90.0, 0.0, t), 0.0);
        assert_eq!(city_light_intensity(-90.0, 0.0, t), 1.0);
    }

    #[test]
    fn test_day_factor_continuous_across_seam_and_midnight() {
        let mut t = at(2024, 12, 31, 23, 0);
        let end = at(2025, 1, 1, 1, 0);
        while t < end {
            let next = t + Duration::minutes(1);
            for &(lat, lng) in &[(0.0, 179.9), (0.0, -179.9), (45.0, 180.0), (-30.0, 0.0)] {
                let delta = (day_factor(lat, lng, t) - day_factor(lat, lng, next)).abs();
                assert!(delta < 0.02, "jump of {delta} at {t} for {lat},{lng}");
            }
            t = next;
        }
    }

    #[test]
    fn test_subsolar_latitude_continuous_across_leap_new_year() {
        for (last, first) in [
            (at(2024, 12, 31, 23, 59), at(2025, 1, 1, 0, 0)),
            (at(2023, 12, 31, 23, 59), at(2024, 1, 1, 0, 0)),
        ] {
            let step = (subsolar_point(last).lat - subsolar_point(first).lat).abs();
            assert!(step < 1e-3, "latitude jumped {step} at {first}");
        }
    }

    #[test]
    fn test_year_fraction_spans_actual_year_length() {
        assert_eq!(days_in_year(2024), 366.0);
        assert_eq!(days_in_year(2025), 365.0);
        assert_eq!(year_fraction(at(2024, 1, 1, 0, 0)), 0.0);
        assert!((year_fraction(at(2024, 12, 31, 12, 0)) - 365.5 / 366.0).abs() < 1e-12);
    }

    #[test]
    fn test_terminator_points_sit_on_the_horizon() {
        let t = at(2024, 4, 2, 9, 12);
        let sun = subsolar_point(t);
        let line = terminator(t, 72);
        assert_eq!(line.len(), 73);
        for [lng, lat] in line {
            let cos = cos_sun_angle(GeoPoint::new(lat, lng), sun);
            assert!(cos.abs() < 1e-9, "cos {cos} at {lat},{lng}");
        }
    }

    #[test]
    fn test_light_radius_and_glow() {
        assert_eq!(light_radius(0), 5.0);
        assert_eq!(light_radius(37_000_000), 20.0);
        assert!((light_radius(100_000) - 15.0).abs() < 1e-9);
        assert_eq!(twilight_glow(1.0), 0.0);
        assert!(twilight_glow(0.0) > 0.5);
    }
}
