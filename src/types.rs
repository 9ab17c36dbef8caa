use cgmath::{Matrix4, Point3, Vector3};

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Index = usize;
pub type ObjectIndex = Option<Index>; // None if the landmark is fixed in room space
pub type Pose = Matrix4<f64>;
pub type Position = Point3<f64>;
pub type Direction = Vector3<f64>;
pub type Color = [f32; 3];

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Order in which the 16 values of a track line fill the 4x4 pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixLayout {
    /// `m[row][col] = values[row * 4 + col]`
    #[default]
    RowMajor,
    /// `m[row][col] = values[col * 4 + row]` (what `glMultMatrix` expects)
    ColumnMajor,
}

/// Interaction mode of the pointing controller. Modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    /// Trigger grabs and rotates the room.
    #[default]
    Navigate,
    MoveLight,
    AddLandmark,
    MoveLandmark,
    DeleteLandmark,
    /// Flatten landmark trails onto the controller plane while the trigger is held.
    ProjectLandmarks,
}

impl ToolMode {
    /// Modes in which the joystick pushes the tool tip instead of moving the room.
    pub fn moves_tool_tip(&self) -> bool {
        matches!(
            self,
            ToolMode::MoveLight
                | ToolMode::AddLandmark
                | ToolMode::MoveLandmark
                | ToolMode::DeleteLandmark
        )
    }

    /// Entering one of these modes pauses playback.
    pub fn pauses_playback(&self) -> bool {
        matches!(
            self,
            ToolMode::AddLandmark
                | ToolMode::MoveLandmark
                | ToolMode::DeleteLandmark
                | ToolMode::ProjectLandmarks
        )
    }
}

/// Menu page shown on the off hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Main,
    Distance,
    Angle,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Main, Page::Distance, Page::Angle];

    pub fn next(self) -> Page {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Page {
        Self::ALL[(self as usize + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}
