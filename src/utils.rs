use crate::types::*;
use cgmath::{EuclideanSpace, Transform, Vector3};

/// Data space (mm, landmark trajectories) into tracking space (m, controller poses).
pub(crate) fn tracking_from_data(room: &Pose, scale: f64, point: Position) -> Position {
    room.transform_point(Position::from_vec(point.to_vec() * scale))
}

/// Inverse of [`tracking_from_data`]. `room_inverse` is the inverted room pose.
pub(crate) fn data_from_tracking(room_inverse: &Pose, scale: f64, point: Position) -> Position {
    Position::from_vec(room_inverse.transform_point(point).to_vec() / scale)
}

/// Drop a tracking-space point along the controller's Y axis onto the
/// controller's XZ plane. Returns the flattened point and the point in
/// controller space.
pub(crate) fn project_onto_plane(
    point: Position,
    controller: &Pose,
    controller_inverse: &Pose,
) -> (Position, Position) {
    let local = controller_inverse.transform_point(point);
    let normal = controller.transform_vector(Vector3::unit_y());
    (point + normal * -local.y, local)
}

/// Rectangle on the controller plane around all projected points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl ProjectionBounds {
    const MARGIN: f64 = 0.1;

    pub fn empty() -> Self {
        ProjectionBounds {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    /// Grow to contain a controller-space point.
    pub fn include(&mut self, local: Position) {
        self.min_x = self.min_x.min(local.x);
        self.max_x = self.max_x.max(local.x);
        self.min_z = self.min_z.min(local.z);
        self.max_z = self.max_z.max(local.z);
    }

    /// Closed outline (first corner repeated) in tracking space, with margin.
    pub fn outline(&self, controller: &Pose) -> [Position; 5] {
        let (x0, x1) = (self.min_x - Self::MARGIN, self.max_x + Self::MARGIN);
        let (z0, z1) = (self.min_z - Self::MARGIN, self.max_z + Self::MARGIN);
        [(x0, z1), (x1, z1), (x1, z0), (x0, z0), (x0, z1)]
            .map(|(x, z)| controller.transform_point(Position::new(x, 0.0, z)))
    }
}
