//! Distance and "angle" series between landmarks over the whole timeline.
//!
//! The angle series is the raw dot product of two direction vectors. It is not
//! divided by their lengths, so it is only an angle for unit directions.

use crate::error::{Error, Result};
use crate::landmark::Landmark;
use crate::types::*;
use cgmath::{InnerSpace, MetricSpace};
use tracing::debug;

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesId {
    Distance,
    Angle,
}

/// Which of the two lines of the angle selection is being picked next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleLine {
    First,
    Second,
}

impl AngleLine {
    /// Slot of the first endpoint of this line in the angle selection.
    pub fn first_slot(&self) -> usize {
        match self {
            AngleLine::First => 0,
            AngleLine::Second => 2,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Euclidean distance between two landmarks at every frame.
pub fn distance_series(a: &Landmark, b: &Landmark, frame_count: usize) -> Vec<f64> {
    a.positions()
        .iter()
        .zip(b.positions())
        .take(frame_count)
        .map(|(pa, pb)| pa.distance(*pb))
        .collect()
}

/// Dot product of `b - a` and `d - c` at every frame.
pub fn angle_series(
    a: &Landmark,
    b: &Landmark,
    c: &Landmark,
    d: &Landmark,
    frame_count: usize,
) -> Vec<f64> {
    a.positions()
        .iter()
        .zip(b.positions())
        .zip(c.positions().iter().zip(d.positions()))
        .take(frame_count)
        .map(|((pa, pb), (pc, pd))| (pb - pa).dot(pd - pc))
        .collect()
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// The two landmark selections and their cached series.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurements {
    distance: [Option<Index>; 2],
    angle: [Option<Index>; 4],
    distance_data: Vec<f64>,
    angle_data: Vec<f64>,
    frame_count: usize,
}

impl Measurements {
    pub fn new(frame_count: usize) -> Self {
        Measurements {
            distance: [None; 2],
            angle: [None; 4],
            distance_data: vec![0.0; frame_count],
            angle_data: vec![0.0; frame_count],
            frame_count,
        }
    }

    pub fn endpoints(&self, series: SeriesId) -> &[Option<Index>] {
        match series {
            SeriesId::Distance => &self.distance,
            SeriesId::Angle => &self.angle,
        }
    }

    pub fn series(&self, series: SeriesId) -> &[f64] {
        match series {
            SeriesId::Distance => &self.distance_data,
            SeriesId::Angle => &self.angle_data,
        }
    }

    /// Line of the angle selection that still needs endpoints, first line first.
    pub fn active_angle_line(&self) -> Option<AngleLine> {
        if self.angle[0].is_none() || self.angle[1].is_none() {
            Some(AngleLine::First)
        } else if self.angle[2].is_none() || self.angle[3].is_none() {
            Some(AngleLine::Second)
        } else {
            None
        }
    }

    /// Put `landmark` into `slot` of `series`. Setting the first endpoint of a
    /// line clears its second endpoint and zeroes the series.
    pub fn set_endpoint(
        &mut self,
        series: SeriesId,
        slot: usize,
        landmark: Index,
        landmarks: &[Landmark],
    ) -> Result<()> {
        if landmark >= landmarks.len() {
            return Err(Error::invalid(format!(
                "no landmark with index {} ({} placed)",
                landmark,
                landmarks.len()
            )));
        }
        let slots: &mut [Option<Index>] = match series {
            SeriesId::Distance => &mut self.distance,
            SeriesId::Angle => &mut self.angle,
        };
        if slot >= slots.len() {
            return Err(Error::invalid(format!(
                "{:?} selection has no slot {}",
                series, slot
            )));
        }
        slots[slot] = Some(landmark);
        if slot % 2 == 0 {
            slots[slot + 1] = None;
            self.clear_series(series);
        }
        self.recompute(landmarks);
        Ok(())
    }

    /// Refresh every series whose selection is complete. Incomplete selections
    /// keep their current data.
    pub fn recompute(&mut self, landmarks: &[Landmark]) {
        if let [Some(a), Some(b)] = self.distance {
            if let (Some(a), Some(b)) = (landmarks.get(a), landmarks.get(b)) {
                self.distance_data = distance_series(a, b, self.frame_count);
            }
        }
        if let [Some(a), Some(b), Some(c), Some(d)] = self.angle {
            if let (Some(a), Some(b), Some(c), Some(d)) =
                (landmarks.get(a), landmarks.get(b), landmarks.get(c), landmarks.get(d))
            {
                self.angle_data = angle_series(a, b, c, d, self.frame_count);
            }
        }
    }

    /// Forget every line that points at `removed` or at a landmark whose index
    /// shifts down because of the removal.
    pub fn on_landmark_removed(&mut self, removed: Index) {
        let stale = |slot: &Option<Index>| matches!(slot, Some(i) if *i >= removed);

        if self.distance.iter().any(stale) {
            debug!("distance selection cleared by removal of landmark {}", removed);
            self.distance = [None; 2];
            self.clear_series(SeriesId::Distance);
        }
        for line in self.angle.chunks_mut(2) {
            if line.iter().any(stale) {
                debug!("angle line cleared by removal of landmark {}", removed);
                line.fill(None);
                self.angle_data.iter_mut().for_each(|v| *v = 0.0);
            }
        }
    }

    fn clear_series(&mut self, series: SeriesId) {
        let data = match series {
            SeriesId::Distance => &mut self.distance_data,
            SeriesId::Angle => &mut self.angle_data,
        };
        data.clear();
        data.resize(self.frame_count, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Scene;
    use crate::object::{MeshHandle, RigidObject};
    use crate::track::{TrackEntry, TransformTrack};
    use approx::assert_abs_diff_eq;
    use cgmath::{Deg, Matrix3, Matrix4, Vector3};
    use std::path::PathBuf;

    const FRAMES: usize = 16;

    fn tumbling_object() -> RigidObject {
        let entries = (0..FRAMES)
            .map(|f| {
                let t = f as f64;
                let pose = Matrix4::from_translation(Vector3::new(t, -t * 0.5, 3.0))
                    * Matrix4::from(Matrix3::from_angle_z(Deg(17.0 * t)))
                    * Matrix4::from(Matrix3::from_angle_x(Deg(5.0 * t)));
                TrackEntry::visible(pose).unwrap()
            })
            .collect();
        RigidObject::new(
            MeshHandle {
                path: PathBuf::from("tumbler.obj"),
                scale: 1.0,
            },
            TransformTrack::from_entries(entries),
        )
    }

    fn landmarks(objects: &[RigidObject], picks: &[(Position, ObjectIndex)]) -> Vec<Landmark> {
        let scene = Scene {
            objects,
            reference: None,
            frame_count: FRAMES,
        };
        picks
            .iter()
            .enumerate()
            .map(|(i, (pick, attachment))| {
                Landmark::attach(&scene, *pick, *attachment, 5, i).unwrap()
            })
            .collect()
    }

    #[test]
    fn rigid_body_distance_is_constant() {
        let objects = vec![tumbling_object()];
        let marks = landmarks(
            &objects,
            &[
                (Position::new(1.0, 0.0, 0.0), Some(0)),
                (Position::new(0.0, 4.0, -2.0), Some(0)),
            ],
        );
        let series = distance_series(&marks[0], &marks[1], FRAMES);
        assert_eq!(series.len(), FRAMES);
        let expected = (1.0f64 + 16.0 + 4.0).sqrt();
        for d in series {
            assert_abs_diff_eq!(d, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn series_stop_at_the_shortest_trajectory() {
        let objects = vec![tumbling_object()];
        let marks = landmarks(
            &objects,
            &[
                (Position::new(0.0, 1.0, 0.0), Some(0)),
                (Position::new(1.0, 0.0, 0.0), Some(0)),
                (Position::new(0.0, 0.0, 1.0), None),
                (Position::new(2.0, 0.0, 0.0), None),
            ],
        );
        let angle = angle_series(&marks[0], &marks[1], &marks[2], &marks[3], FRAMES + 10);
        assert_eq!(angle.len(), FRAMES);
        let distance = distance_series(&marks[0], &marks[1], FRAMES + 10);
        assert_eq!(distance.len(), FRAMES);
        assert_eq!(angle_series(&marks[0], &marks[1], &marks[2], &marks[3], 3).len(), 3);
    }

    #[test]
    fn angle_series_is_an_unnormalized_dot_product() {
        let objects = vec![tumbling_object()];
        let marks = landmarks(
            &objects,
            &[
                (Position::new(0.0, 0.0, 0.0), None),
                (Position::new(2.0, 0.0, 0.0), None),
                (Position::new(0.0, 0.0, 0.0), None),
                (Position::new(3.0, 0.0, 0.0), None),
            ],
        );
        let series = angle_series(&marks[0], &marks[1], &marks[2], &marks[3], FRAMES);
        // parallel directions of length 2 and 3: a cosine would be 1
        for v in series {
            assert_abs_diff_eq!(v, 6.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn distance_series_fills_once_both_endpoints_are_set() {
        let objects = vec![tumbling_object()];
        let marks = landmarks(
            &objects,
            &[
                (Position::new(0.0, 0.0, 0.0), None),
                (Position::new(0.0, 3.0, 4.0), None),
            ],
        );
        let mut m = Measurements::new(FRAMES);
        m.set_endpoint(SeriesId::Distance, 0, 0, &marks).unwrap();
        assert_eq!(m.endpoints(SeriesId::Distance), &[Some(0), None]);
        assert!(m.series(SeriesId::Distance).iter().all(|v| *v == 0.0));
        m.set_endpoint(SeriesId::Distance, 1, 1, &marks).unwrap();
        assert!(m.series(SeriesId::Distance).iter().all(|v| (*v - 5.0).abs() < 1e-12));

        // re-picking the first endpoint starts the line over
        m.set_endpoint(SeriesId::Distance, 0, 1, &marks).unwrap();
        assert_eq!(m.endpoints(SeriesId::Distance), &[Some(1), None]);
        assert!(m.series(SeriesId::Distance).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn angle_lines_are_picked_in_order() {
        let objects = vec![tumbling_object()];
        let picks: Vec<_> = (0..4)
            .map(|i| (Position::new(i as f64, 0.0, 0.0), None))
            .collect();
        let marks = landmarks(&objects, &picks);
        let mut m = Measurements::new(FRAMES);
        assert_eq!(m.active_angle_line(), Some(AngleLine::First));
        m.set_endpoint(SeriesId::Angle, 0, 0, &marks).unwrap();
        m.set_endpoint(SeriesId::Angle, 1, 1, &marks).unwrap();
        assert_eq!(m.active_angle_line(), Some(AngleLine::Second));
        m.set_endpoint(SeriesId::Angle, 2, 2, &marks).unwrap();
        m.set_endpoint(SeriesId::Angle, 3, 3, &marks).unwrap();
        assert_eq!(m.active_angle_line(), None);
        assert!(m.series(SeriesId::Angle).iter().all(|v| (*v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn bad_endpoints_are_rejected() {
        let objects = vec![tumbling_object()];
        let marks = landmarks(&objects, &[(Position::new(0.0, 0.0, 0.0), None)]);
        let mut m = Measurements::new(FRAMES);
        assert!(m.set_endpoint(SeriesId::Distance, 0, 1, &marks).is_err());
        assert!(m.set_endpoint(SeriesId::Distance, 2, 0, &marks).is_err());
        assert!(m.set_endpoint(SeriesId::Angle, 4, 0, &marks).is_err());
    }

    #[test]
    fn removal_clears_lines_with_shifted_indices() {
        let objects = vec![tumbling_object()];
        let picks: Vec<_> = (0..5)
            .map(|i| (Position::new(i as f64, 1.0, 0.0), None))
            .collect();
        let marks = landmarks(&objects, &picks);
        let mut m = Measurements::new(FRAMES);
        m.set_endpoint(SeriesId::Distance, 0, 0, &marks).unwrap();
        m.set_endpoint(SeriesId::Distance, 1, 3, &marks).unwrap();
        m.set_endpoint(SeriesId::Angle, 0, 0, &marks).unwrap();
        m.set_endpoint(SeriesId::Angle, 1, 1, &marks).unwrap();
        m.set_endpoint(SeriesId::Angle, 2, 4, &marks).unwrap();
        m.set_endpoint(SeriesId::Angle, 3, 1, &marks).unwrap();

        m.on_landmark_removed(2);

        // landmark 3 became landmark 2: the distance line must not follow it silently
        assert_eq!(m.endpoints(SeriesId::Distance), &[None, None]);
        assert!(m.series(SeriesId::Distance).iter().all(|v| *v == 0.0));
        // first angle line only uses 0 and 1, which did not move
        assert_eq!(m.endpoints(SeriesId::Angle), &[Some(0), Some(1), None, None]);
        assert_eq!(m.active_angle_line(), Some(AngleLine::Second));
    }
}
