use crate::parse::TrackFormat;

/// Tunables of a review session. The defaults are the values the tool has
/// always shipped with; the binary lets the command line override them.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Manifest file inside the session directory.
    pub manifest_name: String,
    pub track_format: TrackFormat,
    /// Uniform scale from data units (mm) to room units (m).
    pub display_scale: f64,
    pub scale_step: f64,
    /// Mesh-only scale.
    pub object_scale: f64,
    pub speed: f64,
    pub speed_step: f64,
    /// Tool tip offset along the controller's -Z axis, in metres.
    pub tool_distance: f64,
    pub tool_step: f64,
    /// Landmarks closer than this to the tool tip (metres) can be hovered.
    pub hover_radius: f64,
    /// Joystick translation per tick, relative to the display scale.
    pub navigation_gain: f64,
}

impl SessionConfig {
    /// Smallest display scale a session accepts. Zero would make the tool
    /// tip impossible to map back into data space.
    pub fn min_display_scale(&self) -> f64 {
        self.scale_step.max(f64::EPSILON)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            manifest_name: "Data.csv".to_string(),
            track_format: TrackFormat::default(),
            display_scale: 0.0328,
            scale_step: 0.01,
            object_scale: 1.0,
            speed: 1.0,
            speed_step: 0.1,
            tool_distance: -0.8,
            tool_step: 0.01,
            hover_radius: 0.15,
            navigation_gain: 0.25,
        }
    }
}
