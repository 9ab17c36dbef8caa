use crate::error::{Error, Result};
use crate::object::RigidObject;
use crate::types::*;
use cgmath::Transform;
use std::ops::Range;

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Landmark colors, handed out round-robin.
pub const PALETTE: [Color; 20] = [
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [0.5, 1.0, 0.0],
    [0.0, 1.0, 0.5],
    [0.5, 0.0, 1.0],
    [0.0, 0.5, 1.0],
    [1.0, 1.0, 0.5],
    [1.0, 0.5, 1.0],
    [0.5, 1.0, 1.0],
    [0.0, 0.5, 0.0],
    [0.0, 0.0, 0.5],
    [0.5, 1.0, 0.0],
    [1.0, 0.5, 0.0],
    [0.5, 0.0, 1.0],
    [1.0, 0.0, 0.5],
    [0.0, 0.5, 1.0],
    [0.0, 1.0, 0.5],
];

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// "Fix object" mode: the world follows one object so that it appears frozen
/// at the pose it had when the mode was switched on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFrame {
    pub object: Index,
    pub fix_pose: Pose,
    fix_inverse: Pose,
}

impl ReferenceFrame {
    /// Freeze `object` at its pose at `frame`.
    pub fn capture(objects: &[RigidObject], object: Index, frame: usize) -> Result<Self> {
        let entry = objects
            .get(object)
            .ok_or_else(|| Error::invalid(format!("no object with index {}", object)))?
            .pose(frame)?;
        Ok(ReferenceFrame {
            object,
            fix_pose: entry.pose,
            fix_inverse: entry.inverse,
        })
    }

    /// Transform taking raw data coordinates at `frame` into the corrected world.
    pub fn correction(&self, objects: &[RigidObject], frame: usize) -> Result<Pose> {
        let entry = reference_object(objects, self.object)?.pose(frame)?;
        Ok(self.fix_pose * entry.inverse)
    }

    /// Inverse of [`ReferenceFrame::correction`].
    pub fn undo_correction(&self, objects: &[RigidObject], frame: usize) -> Result<Pose> {
        let entry = reference_object(objects, self.object)?.pose(frame)?;
        Ok(entry.pose * self.fix_inverse)
    }
}

fn reference_object(objects: &[RigidObject], index: Index) -> Result<&RigidObject> {
    objects
        .get(index)
        .ok_or_else(|| Error::invalid(format!("reference object {} does not exist", index)))
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Everything a landmark needs to know to move between local and world space.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub objects: &'a [RigidObject],
    pub reference: Option<&'a ReferenceFrame>,
    /// Common frame count of all objects.
    pub frame_count: usize,
}

impl<'a> Scene<'a> {
    fn object(&self, index: Index) -> Result<&'a RigidObject> {
        self.objects.get(index).ok_or_else(|| {
            Error::invalid(format!(
                "cannot attach to object {}, only {} loaded",
                index,
                self.objects.len()
            ))
        })
    }

    /// Express a world point at `frame` in the local space of `attachment`.
    /// The reference correction is undone before the object pose.
    pub fn to_local(
        &self,
        world: Position,
        attachment: ObjectIndex,
        frame: usize,
    ) -> Result<Position> {
        let mut point = world;
        if let Some(reference) = self.reference {
            point = reference
                .undo_correction(self.objects, frame)?
                .transform_point(point);
        }
        if let Some(index) = attachment {
            point = self.object(index)?.pose(frame)?.inverse.transform_point(point);
        }
        Ok(point)
    }

    /// World position at `frame` of a point given in the local space of `attachment`.
    pub fn to_world(
        &self,
        local: Position,
        attachment: ObjectIndex,
        frame: usize,
    ) -> Result<Position> {
        let mut point = local;
        if let Some(index) = attachment {
            point = self.object(index)?.pose(frame)?.pose.transform_point(point);
        }
        if let Some(reference) = self.reference {
            point = reference.correction(self.objects, frame)?.transform_point(point);
        }
        Ok(point)
    }

    /// World position at every frame of the timeline.
    pub fn replay(&self, local: Position, attachment: ObjectIndex) -> Result<Vec<Position>> {
        (0..self.frame_count)
            .map(|frame| self.to_world(local, attachment, frame))
            .collect()
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A user placed point, optionally welded to a rigid object, with its world
/// trajectory cached for every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    local: Position,
    attachment: ObjectIndex,
    color: usize,
    positions: Vec<Position>,
}

impl Landmark {
    /// Place a landmark at `world` as seen at `frame` and weld it to `attachment`.
    pub fn attach(
        scene: &Scene,
        world: Position,
        attachment: ObjectIndex,
        frame: usize,
        color: usize,
    ) -> Result<Self> {
        let local = scene.to_local(world, attachment, frame)?;
        let positions = scene.replay(local, attachment)?;
        Ok(Landmark {
            local,
            attachment,
            color: color % PALETTE.len(),
            positions,
        })
    }

    /// Move the landmark to `world` at `frame`, keeping its attachment.
    pub fn move_to(&mut self, scene: &Scene, world: Position, frame: usize) -> Result<()> {
        let local = scene.to_local(world, self.attachment, frame)?;
        self.positions = scene.replay(local, self.attachment)?;
        self.local = local;
        Ok(())
    }

    /// Recompute the trajectory, e.g. after the reference frame changed.
    pub fn refresh(&mut self, scene: &Scene) -> Result<()> {
        self.positions = scene.replay(self.local, self.attachment)?;
        Ok(())
    }

    pub fn local(&self) -> Position {
        self.local
    }

    pub fn attachment(&self) -> ObjectIndex {
        self.attachment
    }

    pub fn color_index(&self) -> usize {
        self.color
    }

    pub fn color(&self) -> Color {
        PALETTE[self.color]
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position_at(&self, frame: usize) -> Option<&Position> {
        self.positions.get(frame)
    }

    /// Part of the trajectory inside `window`, clipped to the timeline.
    pub fn trail(&self, window: Range<usize>) -> &[Position] {
        let end = window.end.min(self.positions.len());
        let start = window.start.min(end);
        &self.positions[start..end]
    }
}
