//! World-to-pixel projection for pose markers.

/// Length of the heading arrow in pixels
pub const ARROW_LENGTH: f64 = 10.0;

/// Agent pose in world coordinates (position in world units, heading in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }
}

/// A point in pixel coordinates of a scaled map buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// Static map parameters needed for projection
#[derive(Debug, Clone)]
pub struct MapGeometry {
    /// World units per pixel at zoom ratio 1
    pub resolution: f64,
    /// World coordinate of the map reference pixel
    pub origin: (f64, f64),
}

/// Project a world pose onto a scaled map buffer.
///
/// Returns the marker center and the arrow tip that represents the heading.
/// World y grows upward while image rows grow downward, so the y coordinate
/// is measured from the bottom of the buffer. The caller guarantees
/// `resolution > 0`; non-finite pose values propagate into the result.
pub fn project(
    pose: &Pose,
    map: &MapGeometry,
    zoom: f64,
    image_height_px: u32,
) -> (PixelPoint, PixelPoint) {
    let center_x = (pose.x - map.origin.0) * zoom / map.resolution;
    let center_y = f64::from(image_height_px) - (pose.y - map.origin.1) / map.resolution * zoom;

    let tip_x = center_x + ARROW_LENGTH * pose.theta.cos();
    let tip_y = center_y - ARROW_LENGTH * pose.theta.sin();

    (
        PixelPoint {
            x: center_x,
            y: center_y,
        },
        PixelPoint { x: tip_x, y: tip_y },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn test_map() -> MapGeometry {
        MapGeometry {
            resolution: 0.1,
            origin: (-5.0, -5.0),
        }
    }

    #[test]
    fn origin_pose_maps_to_bottom_left() {
        let map = test_map();
        let pose = Pose::new(-5.0, -5.0, 0.0);

        let (center, tip) = project(&pose, &map, 1.0, 100);

        assert!((center.x - 0.0).abs() < EPS);
        assert!((center.y - 100.0).abs() < EPS);
        // Heading 0 points along +x in pixel space
        assert!((tip.x - ARROW_LENGTH).abs() < EPS);
        assert!((tip.y - 100.0).abs() < EPS);
    }

    #[test]
    fn quarter_turn_points_straight_up() {
        let map = test_map();
        let pose = Pose::new(0.0, 0.0, FRAC_PI_2);

        let (center, tip) = project(&pose, &map, 1.0, 100);

        assert!((tip.x - center.x).abs() < EPS);
        assert!((tip.y - (center.y - ARROW_LENGTH)).abs() < EPS);
    }

    #[test]
    fn zoom_scales_the_center_but_not_the_arrow() {
        let map = test_map();
        let pose = Pose::new(0.0, 0.0, 0.0);

        let (center_1x, tip_1x) = project(&pose, &map, 1.0, 100);
        let (center_2x, tip_2x) = project(&pose, &map, 2.0, 200);

        assert!((center_2x.x - 2.0 * center_1x.x).abs() < EPS);
        // Arrow length is a fixed pixel constant regardless of zoom
        assert!((tip_1x.x - center_1x.x - ARROW_LENGTH).abs() < EPS);
        assert!((tip_2x.x - center_2x.x - ARROW_LENGTH).abs() < EPS);
    }
}
