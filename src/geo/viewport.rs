//! Pan/zoom transform for the 2D map.
//!
//! Screen coordinates relate to map coordinates by
//! `screen = map * scale + pan`, where the map occupies
//! `[0, width] x [0, height]` at scale 1.

use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 8.0;
/// Wheel delta to zoom exponent ratio.
pub const WHEEL_ZOOM_RATE: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanZoom {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for PanZoom {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: MIN_SCALE,
        }
    }
}

impl PanZoom {
    pub fn new(x: f64, y: f64, scale: f64) -> Self {
        Self { x, y, scale }
    }

    /// Keeps the map covering the viewport.
    ///
    /// At scale 1 or below panning is disabled and the offset is exactly zero.
    /// Above that each axis offset stays within `[extent * (1 - scale), 0]`.
    pub fn clamp(self, viewport: Viewport) -> Self {
        let scale = self.scale.min(MAX_SCALE);
        if scale <= MIN_SCALE {
            return Self::new(0.0, 0.0, scale.max(MIN_SCALE));
        }

        let min_x = viewport.width * (1.0 - scale);
        let min_y = viewport.height * (1.0 - scale);
        Self::new(self.x.clamp(min_x, 0.0), self.y.clamp(min_y, 0.0), scale)
    }

    pub fn screen_to_map(&self, screen: (f64, f64)) -> (f64, f64) {
        ((screen.0 - self.x) / self.scale, (screen.1 - self.y) / self.scale)
    }

    pub fn map_to_screen(&self, map: (f64, f64)) -> (f64, f64) {
        (map.0 * self.scale + self.x, map.1 * self.scale + self.y)
    }

    /// Rescales to `new_scale` keeping the map point under `cursor` fixed.
    ///
    /// The anchor holds unless the clamp has to pull the map back inside the
    /// viewport, which can only happen when zooming out.
    pub fn zoom_at(self, cursor: (f64, f64), new_scale: f64, viewport: Viewport) -> Self {
        let new_scale = new_scale.clamp(MIN_SCALE, MAX_SCALE);
        let anchor = self.screen_to_map(cursor);
        Self::new(
            cursor.0 - anchor.0 * new_scale,
            cursor.1 - anchor.1 * new_scale,
            new_scale,
        )
        .clamp(viewport)
    }

    /// Mouse wheel zoom. Negative deltas zoom in.
    pub fn on_wheel(self, delta: f64, cursor: (f64, f64), viewport: Viewport) -> Self {
        let factor = (-delta * WHEEL_ZOOM_RATE).exp();
        self.zoom_at(cursor, self.scale * factor, viewport)
    }

    /// Drag by a screen-space offset.
    pub fn pan_by(self, dx: f64, dy: f64, viewport: Viewport) -> Self {
        Self::new(self.x + dx, self.y + dy, self.scale).clamp(viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport {
        width: 960.0,
        height: 480.0,
    };

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn covers_viewport(t: PanZoom) -> bool {
        let (left, top) = t.map_to_screen((0.0, 0.0));
        let (right, bottom) = t.map_to_screen((VIEW.width, VIEW.height));
        left <= 1e-9 && top <= 1e-9 && right >= VIEW.width - 1e-9 && bottom >= VIEW.height - 1e-9
    }

    #[test]
    fn test_clamp_at_or_below_unit_scale_is_zero() {
        for scale in [0.25, 0.5, 1.0] {
            let t = PanZoom::new(-120.0, 75.0, scale).clamp(VIEW);
            assert_eq!((t.x, t.y), (0.0, 0.0));
        }
    }

    #[test]
    fn test_clamp_keeps_content_covering() {
        for scale in [1.1, 2.0, 3.7, 8.0] {
            for &(x, y) in &[(500.0, 500.0), (-10_000.0, -10_000.0), (-300.0, 20.0), (0.0, 0.0)] {
                let t = PanZoom::new(x, y, scale).clamp(VIEW);
                assert!(covers_viewport(t), "{t:?}");
            }
        }
    }

    #[test]
    fn test_clamp_limits_scale() {
        assert_eq!(PanZoom::new(0.0, 0.0, 20.0).clamp(VIEW).scale, MAX_SCALE);
    }

    #[test]
    fn test_zoom_in_keeps_point_under_cursor() {
        let starts = [
            PanZoom::default(),
            PanZoom::new(-200.0, -100.0, 2.0).clamp(VIEW),
            PanZoom::new(-2000.0, -900.0, 5.5).clamp(VIEW),
        ];
        let cursors = [(0.0, 0.0), (480.0, 240.0), (959.0, 10.0), (123.4, 456.7)];

        for start in starts {
            for cursor in cursors {
                for factor in [1.05, 1.5, 2.0, 8.0] {
                    let before = start.screen_to_map(cursor);
                    let after = start.zoom_at(cursor, start.scale * factor, VIEW);
                    assert!(after.scale <= MAX_SCALE);
                    let mapped = after.screen_to_map(cursor);
                    assert_close(mapped.0, before.0, 1e-6);
                    assert_close(mapped.1, before.1, 1e-6);
                    assert!(covers_viewport(after));
                }
            }
        }
    }

    #[test]
    fn test_zoom_out_from_centre_keeps_anchor() {
        let start = PanZoom::new(-1440.0, -720.0, 4.0).clamp(VIEW);
        let cursor = (480.0, 240.0);
        let before = start.screen_to_map(cursor);
        let after = start.zoom_at(cursor, 2.0, VIEW);
        let mapped = after.screen_to_map(cursor);
        assert_close(mapped.0, before.0, 1e-9);
        assert_close(mapped.1, before.1, 1e-9);
    }

    /// Whether `pan` at `scale` already satisfies the clamp.
    fn within_bounds(x: f64, y: f64, scale: f64) -> bool {
        if scale <= MIN_SCALE {
            return x == 0.0 && y == 0.0;
        }
        let (min_x, min_y) = (VIEW.width * (1.0 - scale), VIEW.height * (1.0 - scale));
        (min_x..=0.0).contains(&x) && (min_y..=0.0).contains(&y)
    }

    #[test]
    fn test_zoom_out_anchor_or_cover_from_many_starts() {
        let starts = [
            PanZoom::new(0.0, 0.0, 8.0).clamp(VIEW),
            PanZoom::new(-6720.0, -3360.0, 8.0).clamp(VIEW),
            PanZoom::new(-3000.0, -1500.0, 6.0).clamp(VIEW),
            PanZoom::new(-100.0, -900.0, 4.0).clamp(VIEW),
            PanZoom::new(-2880.0, 0.0, 4.0).clamp(VIEW),
            PanZoom::new(-480.0, -240.0, 2.0).clamp(VIEW),
            PanZoom::new(-10.0, -5.0, 1.2).clamp(VIEW),
        ];
        let cursors = [(0.0, 0.0), (480.0, 240.0), (959.0, 479.0), (10.0, 470.0), (700.0, 35.5)];

        let mut anchored = 0;
        let mut clamped = 0;
        for start in starts {
            for cursor in cursors {
                for factor in [0.95, 0.75, 0.5, 0.3, 0.1] {
                    let new_scale = (start.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
                    let anchor = start.screen_to_map(cursor);
                    let free_x = cursor.0 - anchor.0 * new_scale;
                    let free_y = cursor.1 - anchor.1 * new_scale;

                    let after = start.zoom_at(cursor, start.scale * factor, VIEW);
                    assert_close(after.scale, new_scale, 1e-12);
                    assert!(covers_viewport(after), "{start:?} at {cursor:?} x{factor} -> {after:?}");

                    if within_bounds(free_x, free_y, new_scale) {
                        let mapped = after.screen_to_map(cursor);
                        assert_close(mapped.0, anchor.0, 1e-6);
                        assert_close(mapped.1, anchor.1, 1e-6);
                        anchored += 1;
                    } else {
                        clamped += 1;
                    }
                }
            }
        }
        assert!(anchored > 0 && clamped > 0, "anchored {anchored}, clamped {clamped}");
    }

    #[test]
    fn test_zoom_out_to_unit_resets_pan() {
        let start = PanZoom::new(-500.0, -200.0, 3.0).clamp(VIEW);
        let after = start.zoom_at((100.0, 100.0), 0.5, VIEW);
        assert_eq!(after, PanZoom::new(0.0, 0.0, MIN_SCALE));
    }

    #[test]
    fn test_wheel_direction() {
        let start = PanZoom::default();
        let zoomed_in = start.on_wheel(-300.0, (480.0, 240.0), VIEW);
        assert!(zoomed_in.scale > 1.0);
        let zoomed_out = zoomed_in.on_wheel(300.0, (480.0, 240.0), VIEW);
        assert_close(zoomed_out.scale, 1.0, 1e-9);
    }

    #[test]
    fn test_pan_by_is_clamped() {
        let start = PanZoom::new(0.0, 0.0, 2.0);
        let dragged = start.pan_by(50.0, -10_000.0, VIEW);
        assert_eq!(dragged.x, 0.0);
        assert_eq!(dragged.y, VIEW.height * (1.0 - 2.0));
        assert_eq!(PanZoom::default().pan_by(40.0, 40.0, VIEW), PanZoom::default());
    }
}
