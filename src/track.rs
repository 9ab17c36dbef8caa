use crate::error::{Error, Result};
use crate::types::*;
use cgmath::SquareMatrix;

/////////////////////////////////////////////////////////////////////////////////////////////////

/// One frame of a rigid object's motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackEntry {
    pub pose: Pose,
    /// Kept alongside the pose so conversions into object space never invert at runtime.
    pub inverse: Pose,
    pub visible: bool,
}

impl TrackEntry {
    /// Entry used for missing or malformed data: identity pose, not visible.
    pub fn hidden() -> Self {
        TrackEntry {
            pose: Pose::identity(),
            inverse: Pose::identity(),
            visible: false,
        }
    }

    /// Visible entry, or `None` if the pose cannot be inverted.
    pub fn visible(pose: Pose) -> Option<Self> {
        let inverse = pose.invert()?;
        Some(TrackEntry {
            pose,
            inverse,
            visible: true,
        })
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Per-object sequence of poses, one per animation frame. Allocated once at
/// load time and never resized.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformTrack {
    entries: Box<[TrackEntry]>,
}

impl TransformTrack {
    pub fn from_entries(entries: Vec<TrackEntry>) -> Self {
        TransformTrack {
            entries: entries.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pose and visibility at `frame`.
    pub fn at(&self, frame: usize) -> Result<&TrackEntry> {
        self.entries.get(frame).ok_or(Error::IndexOutOfRange {
            frame,
            len: self.entries.len(),
        })
    }

    /// Number of frames that were missing or could not be parsed.
    pub fn hidden_frames(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.visible).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackEntry> {
        self.entries.iter()
    }
}

/// Length of the timeline every track can play: the shortest track wins.
pub fn common_frame_count<'a>(tracks: impl IntoIterator<Item = &'a TransformTrack>) -> usize {
    tracks
        .into_iter()
        .map(TransformTrack::len)
        .min()
        .unwrap_or(0)
}
