//! Normalized geometry and the zoom view transform.
//!
//! Normalized coordinates put `(0.0, 0.0)` at the top-left and
//! `(1.0, 1.0)` at the bottom-right of the recorded frame.

use serde::{Deserialize, Serialize};

use crate::timeline::{ZoomSegment, MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL};

/// A 2D normalized point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const CENTER: Point2D = Point2D { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates lie in `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    /// Copy with both coordinates clamped into `[0, 1]`.
    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }
}

/// A normalized rectangle, used by mask and highlight regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedRect {
    /// Non-empty and entirely inside the unit square.
    pub fn is_normalized(&self) -> bool {
        self.w > 0.0
            && self.h > 0.0
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.w <= 1.0
            && self.y + self.h <= 1.0
    }
}

/// Crop applied to a frame: magnification plus the top-left of the
/// visible viewport in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub x_px: f64,
    pub y_px: f64,
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        scale: 1.0,
        x_px: 0.0,
        y_px: 0.0,
    };

    /// Viewport size in frame pixels.
    pub fn viewport_size(&self, frame_width: f64, frame_height: f64) -> (f64, f64) {
        (frame_width / self.scale, frame_height / self.scale)
    }
}

/// Compute the crop for the active zoom, if any.
///
/// The viewport is centered on the zoom target and then pushed back
/// inside the frame. The export filter graph evaluates the same clamp
/// per frame in magnified pixels (`magnified_offset`).
pub fn compute_view_transform(
    zoom: Option<&ZoomSegment>,
    frame_width: f64,
    frame_height: f64,
) -> ViewTransform {
    let Some(zoom) = zoom else {
        return ViewTransform::IDENTITY;
    };

    let scale = zoom.level.clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL);
    let target = zoom.target().clamped();

    ViewTransform {
        scale,
        x_px: clamped_axis_offset(target.x, frame_width, scale),
        y_px: clamped_axis_offset(target.y, frame_height, scale),
    }
}

fn clamped_axis_offset(target: f64, frame: f64, scale: f64) -> f64 {
    let viewport = frame / scale;
    (target * frame - viewport / 2.0)
        .min(frame - viewport)
        .max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_zoom_is_identity() {
        assert_eq!(
            compute_view_transform(None, 1920.0, 1080.0),
            ViewTransform::IDENTITY
        );
    }

    #[test]
    fn test_centered_zoom() {
        let zoom = ZoomSegment::manual("z", 0, 1000, 2.0);
        let t = compute_view_transform(Some(&zoom), 1920.0, 1080.0);
        assert_eq!(t.scale, 2.0);
        assert_eq!(t.x_px, 480.0);
        assert_eq!(t.y_px, 270.0);
        assert_eq!(t.viewport_size(1920.0, 1080.0), (960.0, 540.0));
    }

    #[test]
    fn test_target_near_corner_is_pushed_inside() {
        let zoom = ZoomSegment::manual("z", 0, 1000, 2.0).with_target(0.25, 0.75);
        let t = compute_view_transform(Some(&zoom), 1920.0, 1080.0);
        // 0.25 * 1920 - 480 = 0, 0.75 * 1080 - 270 = 540 (the max)
        assert_eq!(t.x_px, 0.0);
        assert_eq!(t.y_px, 540.0);

        let zoom = ZoomSegment::manual("z", 0, 1000, 4.0).with_target(1.0, 0.0);
        let t = compute_view_transform(Some(&zoom), 1920.0, 1080.0);
        assert_eq!(t.x_px, 1440.0);
        assert_eq!(t.y_px, 0.0);
    }

    #[test]
    fn test_level_is_clamped() {
        let zoom = ZoomSegment::manual("z", 0, 1000, 9.0);
        assert_eq!(compute_view_transform(Some(&zoom), 100.0, 100.0).scale, 4.0);
        let zoom = ZoomSegment::manual("z", 0, 1000, 0.5);
        let t = compute_view_transform(Some(&zoom), 100.0, 100.0);
        assert_eq!(t, ViewTransform::IDENTITY);
    }

    #[test]
    fn test_rect_must_fit_the_frame() {
        let inside = NormalizedRect {
            x: 0.5,
            y: 0.0,
            w: 0.5,
            h: 0.3,
        };
        assert!(inside.is_normalized());
        assert!(!NormalizedRect { x: 0.6, ..inside }.is_normalized());
        assert!(!NormalizedRect { w: 0.0, ..inside }.is_normalized());
        assert!(!NormalizedRect { y: -0.1, ..inside }.is_normalized());
    }

    proptest! {
        #[test]
        fn prop_viewport_never_leaves_frame(
            level in 1.0f64..=4.0,
            tx in 0.0f64..=1.0,
            ty in 0.0f64..=1.0,
            width in 2u32..4096,
            height in 2u32..4096,
        ) {
            let zoom = ZoomSegment::manual("z", 0, 10, level).with_target(tx, ty);
            let (w, h) = (f64::from(width), f64::from(height));
            let t = compute_view_transform(Some(&zoom), w, h);
            prop_assert!(t.x_px >= 0.0);
            prop_assert!(t.y_px >= 0.0);
            prop_assert!(t.x_px <= w - w / t.scale);
            prop_assert!(t.y_px <= h - h / t.scale);
        }
    }
}
