use nalgebra::Vector3;

/// Orthonormal local frame of the guidance path at one path position.
///
/// World convention: `+Y` is up, a path that has not turned points along
/// `+Z`, and `right = up × forward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathFrame {
    pub forward: Vector3<f64>,
    pub right: Vector3<f64>,
    pub up: Vector3<f64>,
    pub curvature: f64,
}

/// Source of path frames. Implemented by the track/spline collaborator.
pub trait FrameSampler {
    fn sample_frame(&self, path_position: f64) -> PathFrame;
}

impl PathFrame {
    /// Builds a frame from a forward direction and an approximate up
    /// direction. Up is re-derived so the three axes are orthonormal.
    pub fn from_forward_up(forward: Vector3<f64>, up: Vector3<f64>, curvature: f64) -> Self {
        let forward = forward
            .try_normalize(1e-9)
            .unwrap_or_else(|| Vector3::z());
        let right = up
            .cross(&forward)
            .try_normalize(1e-9)
            .unwrap_or_else(|| Self::fallback_right(&forward));
        let up = forward.cross(&right);

        Self {
            forward,
            right,
            up,
            curvature,
        }
    }

    /// Frame of a flat path heading `heading` radians to the right of `+Z`.
    pub fn planar(heading: f64, curvature: f64) -> Self {
        let forward = Vector3::new(heading.sin(), 0.0, heading.cos());
        Self::from_forward_up(forward, Vector3::y(), curvature)
    }

    fn fallback_right(forward: &Vector3<f64>) -> Vector3<f64> {
        // forward is (anti)parallel to the requested up
        Vector3::x()
            .cross(forward)
            .cross(forward)
            .try_normalize(1e-9)
            .unwrap_or_else(|| Vector3::x())
    }
}

impl Default for PathFrame {
    fn default() -> Self {
        Self::planar(0.0, 0.0)
    }
}
