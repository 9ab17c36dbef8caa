use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::landmark::{Landmark, ReferenceFrame, Scene, PALETTE};
use crate::measurement::{AngleLine, Measurements, SeriesId};
use crate::object::{RenderContext, RigidObject};
use crate::parse::load_manifest_from_file;
use crate::playback::Playback;
use crate::track::common_frame_count;
use crate::types::*;
use crate::utils::{self, ProjectionBounds};
use cgmath::{EuclideanSpace, Matrix4, SquareMatrix, Transform};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, warn};

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Color of the hovered or grabbed landmark.
pub const HIGHLIGHT: Color = [1.0, 0.0, 0.0];

/// Everything the core reacts to. Produced by the input layer (or a test),
/// consumed by [`Session::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectNextObject,
    SelectPrevObject,
    /// `pick` is in data space, see [`Session::pick_point`].
    AddLandmark { pick: Position },
    MoveLandmark { index: Index, pick: Position },
    DeleteLandmark { index: Index },
    /// Grab (or release) a landmark for moving.
    SelectLandmark(Option<Index>),
    SetMeasurementEndpoint {
        series: SeriesId,
        slot: usize,
        landmark: Index,
    },
    /// Pin the angle line the next picks go to; `None` fills the lines in order.
    SetAngleLine(Option<AngleLine>),
    ToggleReferenceObject(bool),
    AdjustSpeed(f64),
    AdjustScale(f64),
    AdjustTrail(i64),
    StepFrame(i64),
    SeekFrame(f64),
    Play,
    Pause,
    TogglePlay,
    SetToolMode(ToolMode),
    SetPage(Page),
    SetMenuVisible(bool),
    Trigger(bool),
    SetHeadlight(bool),
    SetTransparent(bool),
    /// Tracking-space light position.
    PlaceLight(Position),
    AdjustToolDistance(f64),
    TranslateRoom(Direction),
    /// Pre-multiplied onto the room pose.
    RotateRoom(Pose),
    ControllerPose(Pose),
    HeadPose(Pose),
}

/// Poses reported by the VR host, in tracking space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPoses {
    /// Where the data sits in the room.
    pub room: Pose,
    pub controller: Pose,
    pub head: Pose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Position,
    pub follow_head: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub scale: f64,
    /// Frames of trail behind each landmark; `None` draws the whole trajectory.
    pub trail: Option<usize>,
    pub transparent: bool,
    pub tool_mode: ToolMode,
    pub page: Page,
    pub menu_visible: bool,
    pub tool_distance: f64,
    pub current_object: ObjectIndex,
    pub angle_line: Option<AngleLine>,
}

/// Per-frame drawing data for one landmark. Positions are in data space, use
/// [`Session::to_tracking`] to place them in the room.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkView<'a> {
    pub index: Index,
    pub position: Position,
    pub color: Color,
    pub highlighted: bool,
    pub trail: &'a [Position],
}

/// Line between the endpoints of a measurement, in tracking space. The far
/// end follows the tool tip until the second endpoint is picked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub series: SeriesId,
    pub from: Position,
    pub to: Position,
}

/// Landmarks flattened onto the controller plane, in tracking space.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub markers: Vec<Position>,
    pub trails: Vec<Vec<Position>>,
    pub outline: Option<[Position; 5]>,
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// State of one review session: the loaded objects, the user's landmarks and
/// measurements, playback and the tracked VR poses.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    objects: Vec<RigidObject>,
    landmarks: Vec<Landmark>,
    next_color: usize,
    measurements: Measurements,
    playback: Playback,
    reference: Option<ReferenceFrame>,
    view: ViewSettings,
    poses: TrackedPoses,
    light: Light,
    trigger_held: bool,
    hover: Option<Index>,
    selected: Option<Index>,
    frame_count: usize,
}

impl Session {
    /// Load every object listed in the manifest of `dir`.
    pub fn load(dir: &Path, config: SessionConfig) -> Result<Self> {
        let entries = load_manifest_from_file(&dir.join(&config.manifest_name))?;
        if entries.is_empty() {
            return Err(Error::EmptySession(dir.to_path_buf()));
        }
        let objects = entries
            .iter()
            .map(|entry| {
                RigidObject::load(
                    &entry.mesh,
                    &entry.transform,
                    &config.track_format,
                    config.object_scale,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Session::new(objects, config)
    }

    pub fn new(objects: Vec<RigidObject>, config: SessionConfig) -> Result<Self> {
        let frame_count = common_frame_count(objects.iter().map(RigidObject::track));
        if frame_count == 0 {
            return Err(Error::EmptyTimeline);
        }
        info!("{} objects, {} common frames", objects.len(), frame_count);

        Ok(Session {
            objects,
            landmarks: Vec::new(),
            next_color: 0,
            measurements: Measurements::new(frame_count),
            playback: Playback::new(frame_count, config.speed),
            reference: None,
            view: ViewSettings {
                scale: config.display_scale.max(config.min_display_scale()),
                trail: None,
                transparent: false,
                tool_mode: ToolMode::Navigate,
                page: Page::Main,
                menu_visible: false,
                tool_distance: config.tool_distance,
                current_object: None,
                angle_line: None,
            },
            poses: TrackedPoses {
                room: Pose::identity(),
                controller: Pose::identity(),
                head: Pose::identity(),
            },
            light: Light {
                position: Position::new(0.0, 4.0, 0.0),
                follow_head: true,
            },
            trigger_held: false,
            hover: None,
            selected: None,
            frame_count,
            config,
        })
    }

    ////////////////////////////////////////////////////////////// ACTIONS //////////////////////////////////////////////////////////////

    pub fn apply(&mut self, actions: impl IntoIterator<Item = Action>) -> Result<()> {
        for action in actions {
            self.dispatch(action)?;
        }
        Ok(())
    }

    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        match &action {
            Action::ControllerPose(_) | Action::HeadPose(_) | Action::RotateRoom(_) => {}
            other => debug!("{:?}", other),
        }

        match action {
            Action::SelectNextObject => {
                let count = self.objects.len();
                self.view.current_object = match self.view.current_object {
                    None if count > 0 => Some(0),
                    Some(i) if i + 1 < count => Some(i + 1),
                    _ => None,
                };
            }
            Action::SelectPrevObject => {
                self.view.current_object = match self.view.current_object {
                    None => self.objects.len().checked_sub(1),
                    Some(0) => None,
                    Some(i) => Some(i - 1),
                };
            }
            Action::AddLandmark { pick } => self.add_landmark(pick)?,
            Action::MoveLandmark { index, pick } => self.move_landmark(index, pick)?,
            Action::DeleteLandmark { index } => self.delete_landmark(index)?,
            Action::SelectLandmark(index) => {
                if let Some(i) = index {
                    self.landmark(i)?;
                }
                self.selected = index;
            }
            Action::SetMeasurementEndpoint {
                series,
                slot,
                landmark,
            } => self
                .measurements
                .set_endpoint(series, slot, landmark, &self.landmarks)?,
            Action::SetAngleLine(line) => self.view.angle_line = line,
            Action::ToggleReferenceObject(on) => self.toggle_reference(on)?,
            Action::AdjustSpeed(delta) => self.playback.adjust_speed(delta),
            Action::AdjustScale(delta) => {
                self.view.scale = (self.view.scale + delta).max(self.config.min_display_scale());
            }
            Action::AdjustTrail(delta) => {
                let last = self.frame_count as i64 - 1;
                let trail = self.view.trail.map_or(-1, |t| t as i64) + delta;
                self.view.trail = match trail.clamp(-1, last) {
                    t if t < 0 => None,
                    t => Some(t as usize),
                };
            }
            Action::StepFrame(delta) => self.playback.step(delta),
            Action::SeekFrame(frame) => self.playback.seek(frame),
            Action::Play => self.playback.play(),
            Action::Pause => self.playback.pause(),
            Action::TogglePlay => self.playback.toggle(),
            Action::SetToolMode(mode) => {
                if mode.pauses_playback() {
                    self.playback.pause();
                }
                self.view.tool_mode = mode;
            }
            Action::SetPage(page) => self.view.page = page,
            Action::SetMenuVisible(visible) => self.view.menu_visible = visible,
            Action::Trigger(held) => self.trigger_held = held,
            Action::SetHeadlight(on) => {
                self.light.follow_head = on;
                if on && self.view.tool_mode == ToolMode::MoveLight {
                    self.view.tool_mode = ToolMode::Navigate;
                }
            }
            Action::SetTransparent(on) => self.view.transparent = on,
            Action::PlaceLight(position) => {
                self.light.position = position;
                self.light.follow_head = false;
            }
            Action::AdjustToolDistance(delta) => self.view.tool_distance += delta,
            Action::TranslateRoom(offset) => {
                self.poses.room = Matrix4::from_translation(offset) * self.poses.room;
            }
            Action::RotateRoom(delta) => self.poses.room = delta * self.poses.room,
            Action::ControllerPose(pose) => self.poses.controller = pose,
            Action::HeadPose(pose) => self.poses.head = pose,
        }
        Ok(())
    }

    fn add_landmark(&mut self, pick: Position) -> Result<()> {
        let scene = Scene {
            objects: &self.objects,
            reference: self.reference.as_ref(),
            frame_count: self.frame_count,
        };
        let attachment = self.view.current_object;
        let frame = self.frame_index();
        let landmark = Landmark::attach(&scene, pick, attachment, frame, self.next_color)?;
        self.next_color = (self.next_color + 1) % PALETTE.len();
        self.landmarks.push(landmark);
        info!(
            "landmark {} added on {}",
            self.landmarks.len() - 1,
            attachment.map_or("room", |i| self.objects[i].name())
        );
        Ok(())
    }

    fn move_landmark(&mut self, index: Index, pick: Position) -> Result<()> {
        let frame = self.frame_index();
        let scene = Scene {
            objects: &self.objects,
            reference: self.reference.as_ref(),
            frame_count: self.frame_count,
        };
        let landmark = self
            .landmarks
            .get_mut(index)
            .ok_or_else(|| Error::invalid(format!("no landmark with index {}", index)))?;
        landmark.move_to(&scene, pick, frame)?;
        self.selected = None;
        self.measurements.recompute(&self.landmarks);
        Ok(())
    }

    fn delete_landmark(&mut self, index: Index) -> Result<()> {
        self.landmark(index)?;
        self.measurements.on_landmark_removed(index);
        self.landmarks.remove(index);
        self.hover = None;
        self.selected = None;
        info!("landmark {} deleted", index);
        Ok(())
    }

    fn toggle_reference(&mut self, on: bool) -> Result<()> {
        self.reference = match (on, self.view.current_object) {
            (true, Some(object)) => {
                Some(ReferenceFrame::capture(&self.objects, object, self.frame_index())?)
            }
            (true, None) => {
                warn!("no object selected, reference frame stays off");
                None
            }
            (false, _) => None,
        };
        let scene = Scene {
            objects: &self.objects,
            reference: self.reference.as_ref(),
            frame_count: self.frame_count,
        };
        for landmark in self.landmarks.iter_mut() {
            landmark.refresh(&scene)?;
        }
        self.measurements.recompute(&self.landmarks);
        Ok(())
    }

    /// Advance one frame of the host loop: playback, headlight and hover.
    pub fn tick(&mut self) {
        self.playback.tick();
        if self.light.follow_head {
            self.light.position = Position::from_vec(self.poses.head.w.truncate());
        }
        self.update_hover();
    }

    fn update_hover(&mut self) {
        let picking = matches!(
            self.view.tool_mode,
            ToolMode::MoveLandmark | ToolMode::DeleteLandmark
        ) || matches!(self.view.page, Page::Distance | Page::Angle);
        if !picking {
            self.hover = None;
            return;
        }

        let tip = self.tool_tip();
        let frame = self.frame_index();
        let mut best = self.config.hover_radius;
        self.hover = None;
        for (i, landmark) in self.landmarks.iter().enumerate() {
            let Some(position) = landmark.position_at(frame) else {
                continue;
            };
            let d = cgmath::MetricSpace::distance(self.to_tracking(*position), tip);
            if d < best {
                best = d;
                self.hover = Some(i);
            }
        }
    }

    ////////////////////////////////////////////////////////////// QUERIES //////////////////////////////////////////////////////////////

    pub fn scene(&self) -> Scene<'_> {
        Scene {
            objects: &self.objects,
            reference: self.reference.as_ref(),
            frame_count: self.frame_count,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn objects(&self) -> &[RigidObject] {
        &self.objects
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    fn landmark(&self, index: Index) -> Result<&Landmark> {
        self.landmarks
            .get(index)
            .ok_or_else(|| Error::invalid(format!("no landmark with index {}", index)))
    }

    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn reference(&self) -> Option<&ReferenceFrame> {
        self.reference.as_ref()
    }

    pub fn view(&self) -> &ViewSettings {
        &self.view
    }

    pub fn poses(&self) -> &TrackedPoses {
        &self.poses
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn hover(&self) -> Option<Index> {
        self.hover
    }

    pub fn selected(&self) -> Option<Index> {
        self.selected
    }

    pub fn trigger_held(&self) -> bool {
        self.trigger_held
    }

    /// Common frame count of all loaded objects.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frame_index(&self) -> usize {
        self.playback.frame_index()
    }

    /// Angle line that trigger picks on the Angle page go to.
    pub fn angle_line(&self) -> Option<AngleLine> {
        self.view
            .angle_line
            .or_else(|| self.measurements.active_angle_line())
    }

    /// Tool tip in tracking space.
    pub fn tool_tip(&self) -> Position {
        self.poses
            .controller
            .transform_point(Position::new(0.0, 0.0, self.view.tool_distance))
    }

    /// Tool tip in data space, ready for [`Action::AddLandmark`] or [`Action::MoveLandmark`].
    pub fn pick_point(&self) -> Result<Position> {
        let room_inverse = self
            .poses
            .room
            .invert()
            .ok_or_else(|| Error::invalid("room pose is not invertible"))?;
        Ok(utils::data_from_tracking(&room_inverse, self.view.scale, self.tool_tip()))
    }

    /// Data space into tracking space under the current room pose and scale.
    pub fn to_tracking(&self, point: Position) -> Position {
        utils::tracking_from_data(&self.poses.room, self.view.scale, point)
    }

    /// Frames of each landmark's trajectory to draw as a trail.
    pub fn trail_window(&self) -> Range<usize> {
        let frame = self.frame_index();
        match self.view.trail {
            None => 0..self.frame_count,
            Some(trail) => frame.saturating_sub(trail)..frame,
        }
    }

    pub fn object_label(&self) -> String {
        let name = self
            .view
            .current_object
            .and_then(|i| self.objects.get(i))
            .map_or("", RigidObject::name);
        format!("Object: {}", name)
    }

    /// Text for the main menu page.
    pub fn status_lines(&self) -> Vec<String> {
        vec![
            format!("Frame: {}", self.frame_index() + 1),
            format!("Speed: {:.1}", self.playback.speed()),
            self.object_label(),
            format!("Scale: {:.4}", self.view.scale),
            match self.view.trail {
                None => "Trail: all".to_string(),
                Some(trail) => format!("Trail: {}", trail),
            },
        ]
    }

    /// Transform from data space to tracking space used to draw the objects.
    pub fn scene_root(&self) -> Result<Pose> {
        let mut root = self.poses.room * Matrix4::from_scale(self.view.scale);
        if let Some(reference) = &self.reference {
            root = root * reference.correction(&self.objects, self.frame_index())?;
        }
        Ok(root)
    }

    /// Draw every object at the current frame, the selected one highlighted.
    pub fn render(&self, ctx: &mut impl RenderContext) -> Result<()> {
        let root = self.scene_root()?;
        let frame = self.frame_index();
        for (i, object) in self.objects.iter().enumerate() {
            object.render(frame, &root, ctx, self.view.current_object == Some(i))?;
        }
        Ok(())
    }

    pub fn landmark_views(&self) -> Vec<LandmarkView<'_>> {
        let frame = self.frame_index();
        let window = self.trail_window();
        self.landmarks
            .iter()
            .enumerate()
            .filter_map(|(i, landmark)| {
                let position = *landmark.position_at(frame)?;
                let highlighted = (self.hover == Some(i) && self.selected.is_none())
                    || self.selected == Some(i);
                Some(LandmarkView {
                    index: i,
                    position,
                    color: if highlighted { HIGHLIGHT } else { landmark.color() },
                    highlighted,
                    trail: landmark.trail(window.clone()),
                })
            })
            .collect()
    }

    /// Lines of the distance selection and of both angle lines.
    pub fn measurement_segments(&self) -> Vec<Segment> {
        let frame = self.frame_index();
        let tip = self.tool_tip();
        let at = |index: Index| {
            self.landmarks
                .get(index)
                .and_then(|l| l.position_at(frame))
                .map(|p| self.to_tracking(*p))
        };

        let mut segments = Vec::new();
        for series in [SeriesId::Distance, SeriesId::Angle] {
            for line in self.measurements.endpoints(series).chunks(2) {
                let Some(from) = line[0].and_then(at) else {
                    continue;
                };
                let to = line[1].and_then(at).unwrap_or(tip);
                segments.push(Segment { series, from, to });
            }
        }
        segments
    }

    /// Landmarks and trails flattened onto the controller plane, while
    /// projecting with the trigger held.
    pub fn projection(&self) -> Result<Option<Projection>> {
        if self.view.tool_mode != ToolMode::ProjectLandmarks || !self.trigger_held {
            return Ok(None);
        }
        let controller = self.poses.controller;
        let controller_inverse = controller
            .invert()
            .ok_or_else(|| Error::invalid("controller pose is not invertible"))?;
        let flatten = |p: &Position| {
            utils::project_onto_plane(self.to_tracking(*p), &controller, &controller_inverse)
        };

        let frame = self.frame_index();
        let window = self.trail_window();
        let mut bounds = ProjectionBounds::empty();
        let mut markers = Vec::new();
        let mut trails = Vec::new();
        for landmark in &self.landmarks {
            if let Some(p) = landmark.position_at(frame) {
                markers.push(flatten(p).0);
            }
            let trail = landmark
                .trail(window.clone())
                .iter()
                .map(|p| {
                    let (projected, local) = flatten(p);
                    bounds.include(local);
                    projected
                })
                .collect();
            trails.push(trail);
        }

        Ok(Some(Projection {
            markers,
            trails,
            outline: (!bounds.is_empty()).then(|| bounds.outline(&controller)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MeshHandle;
    use crate::track::{TrackEntry, TransformTrack};
    use approx::assert_abs_diff_eq;
    use cgmath::{Deg, Matrix3, MetricSpace, Vector3};
    use std::path::PathBuf;

    fn object(name: &str, frames: usize, step: f64) -> RigidObject {
        let entries = (0..frames)
            .map(|f| {
                let t = f as f64;
                let pose = Matrix4::from_translation(Vector3::new(step * t, 0.0, 0.0))
                    * Matrix4::from(Matrix3::from_angle_y(Deg(3.0 * t)));
                TrackEntry::visible(pose).unwrap()
            })
            .collect();
        RigidObject::new(
            MeshHandle {
                path: PathBuf::from(format!("{}.obj", name)),
                scale: 1.0,
            },
            TransformTrack::from_entries(entries),
        )
    }

    fn session() -> Session {
        Session::new(
            vec![
                object("radius", 50, 1.0),
                object("ulna", 30, -2.0),
                object("humerus", 70, 0.5),
            ],
            SessionConfig::default(),
        )
        .unwrap()
    }

    fn add(session: &mut Session, x: f64) {
        session
            .dispatch(Action::AddLandmark {
                pick: Position::new(x, 1.0, 0.0),
            })
            .unwrap();
    }

    #[test]
    fn timeline_is_shortest_track() {
        let session = session();
        assert_eq!(session.frame_count(), 30);
        assert_eq!(session.measurements().series(SeriesId::Distance).len(), 30);
    }

    #[test]
    fn empty_timeline_is_rejected() {
        assert!(matches!(
            Session::new(vec![object("a", 0, 1.0)], SessionConfig::default()),
            Err(Error::EmptyTimeline)
        ));
        assert!(matches!(
            Session::new(Vec::new(), SessionConfig::default()),
            Err(Error::EmptyTimeline)
        ));
    }

    #[test]
    fn object_selection_cycles_through_none() {
        let mut session = session();
        assert_eq!(session.object_label(), "Object: ");
        session.dispatch(Action::SelectNextObject).unwrap();
        assert_eq!(session.object_label(), "Object: radius");
        session.dispatch(Action::SelectPrevObject).unwrap();
        assert_eq!(session.view().current_object, None);
        session.dispatch(Action::SelectPrevObject).unwrap();
        assert_eq!(session.view().current_object, Some(2));
        session.dispatch(Action::SelectNextObject).unwrap();
        assert_eq!(session.view().current_object, None);
    }

    #[test]
    fn landmarks_attach_to_the_current_object() {
        let mut session = session();
        session.dispatch(Action::SelectNextObject).unwrap();
        session.dispatch(Action::SeekFrame(12.0)).unwrap();
        let pick = Position::new(3.0, 2.0, 1.0);
        session.dispatch(Action::AddLandmark { pick }).unwrap();
        let landmark = &session.landmarks()[0];
        assert_eq!(landmark.attachment(), Some(0));
        assert_eq!(landmark.positions().len(), 30);
        assert_abs_diff_eq!(landmark.positions()[12].distance(pick), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn colors_keep_cycling_after_deletes() {
        let mut session = session();
        add(&mut session, 0.0);
        add(&mut session, 1.0);
        session.dispatch(Action::DeleteLandmark { index: 1 }).unwrap();
        add(&mut session, 2.0);
        assert_eq!(session.landmarks()[1].color_index(), 2);
    }

    #[test]
    fn deleting_invalidates_shifted_measurements() {
        let mut session = session();
        for x in 0..5 {
            add(&mut session, x as f64);
        }
        session
            .apply([
                Action::SetMeasurementEndpoint {
                    series: SeriesId::Distance,
                    slot: 0,
                    landmark: 0,
                },
                Action::SetMeasurementEndpoint {
                    series: SeriesId::Distance,
                    slot: 1,
                    landmark: 3,
                },
            ])
            .unwrap();
        assert!(session
            .measurements()
            .series(SeriesId::Distance)
            .iter()
            .all(|d| (*d - 3.0).abs() < 1e-9));

        session.dispatch(Action::DeleteLandmark { index: 2 }).unwrap();

        assert_eq!(session.landmarks().len(), 4);
        assert_eq!(session.measurements().endpoints(SeriesId::Distance), &[None, None]);
        assert!(session.measurement_segments().is_empty());
    }

    #[test]
    fn unknown_indices_are_invalid() {
        let mut session = session();
        add(&mut session, 0.0);
        assert!(session.dispatch(Action::DeleteLandmark { index: 1 }).is_err());
        assert!(session
            .dispatch(Action::MoveLandmark {
                index: 3,
                pick: Position::new(0.0, 0.0, 0.0)
            })
            .is_err());
        assert!(session.dispatch(Action::SelectLandmark(Some(1))).is_err());
        assert_eq!(session.landmarks().len(), 1);
    }

    #[test]
    fn moving_recomputes_measurements() {
        let mut session = session();
        add(&mut session, 0.0);
        add(&mut session, 1.0);
        session
            .apply([
                Action::SetMeasurementEndpoint {
                    series: SeriesId::Distance,
                    slot: 0,
                    landmark: 0,
                },
                Action::SetMeasurementEndpoint {
                    series: SeriesId::Distance,
                    slot: 1,
                    landmark: 1,
                },
                Action::SelectLandmark(Some(1)),
                Action::MoveLandmark {
                    index: 1,
                    pick: Position::new(0.0, 1.0, 4.0),
                },
            ])
            .unwrap();
        assert_eq!(session.selected(), None);
        assert!(session
            .measurements()
            .series(SeriesId::Distance)
            .iter()
            .all(|d| (*d - 4.0).abs() < 1e-9));
    }

    #[test]
    fn reference_needs_a_selected_object() {
        let mut session = session();
        add(&mut session, 1.0);
        session.dispatch(Action::ToggleReferenceObject(true)).unwrap();
        assert!(session.reference().is_none());

        session.dispatch(Action::SelectNextObject).unwrap();
        session.dispatch(Action::Pause).unwrap();
        session.dispatch(Action::SeekFrame(10.0)).unwrap();
        session.dispatch(Action::ToggleReferenceObject(true)).unwrap();
        let reference = session.reference().unwrap();
        assert_eq!(reference.object, 0);

        // the room-fixed landmark now moves against the frozen radius,
        // and sits where it was at the frame the reference was taken
        let positions = session.landmarks()[0].positions();
        assert_abs_diff_eq!(
            positions[10].distance(Position::new(1.0, 1.0, 0.0)),
            0.0,
            epsilon = 1e-9
        );
        assert!(positions[0].distance(positions[20]) > 1e-3);

        session.dispatch(Action::ToggleReferenceObject(false)).unwrap();
        let positions = session.landmarks()[0].positions();
        assert!(positions.iter().all(|p| *p == Position::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn trail_is_bounded_by_the_timeline() {
        let mut session = session();
        session.dispatch(Action::AdjustTrail(-1)).unwrap();
        assert_eq!(session.view().trail, None);
        session.dispatch(Action::AdjustTrail(5)).unwrap();
        assert_eq!(session.view().trail, Some(4));
        session.dispatch(Action::AdjustTrail(1000)).unwrap();
        assert_eq!(session.view().trail, Some(29));

        session.dispatch(Action::Pause).unwrap();
        session.dispatch(Action::SeekFrame(3.0)).unwrap();
        session.dispatch(Action::AdjustTrail(-27)).unwrap();
        assert_eq!(session.trail_window(), 1..3);
    }

    #[test]
    fn landmark_modes_pause_playback() {
        let mut session = session();
        assert!(session.playback().is_playing());
        session.dispatch(Action::SetToolMode(ToolMode::MoveLight)).unwrap();
        assert!(session.playback().is_playing());
        session.dispatch(Action::SetToolMode(ToolMode::AddLandmark)).unwrap();
        assert!(!session.playback().is_playing());
    }

    #[test]
    fn scale_and_speed_stay_positive() {
        let mut session = session();
        session.dispatch(Action::AdjustScale(-1.0)).unwrap();
        assert!(session.view().scale > 0.0);
        session.dispatch(Action::AdjustSpeed(-5.0)).unwrap();
        assert_eq!(session.playback().speed(), 0.0);
    }

    #[test]
    fn unusable_display_scale_is_raised_to_one_step() {
        for scale in [0.0, -0.5, f64::NAN] {
            let config = SessionConfig {
                display_scale: scale,
                ..SessionConfig::default()
            };
            let mut session = Session::new(vec![object("radius", 10, 1.0)], config).unwrap();
            assert_eq!(session.view().scale, 0.01);

            let pick = session.pick_point().unwrap();
            assert!(pick.x.is_finite() && pick.y.is_finite() && pick.z.is_finite());
            session.dispatch(Action::AddLandmark { pick }).unwrap();
            assert!(session.landmarks()[0]
                .positions()
                .iter()
                .all(|p| p.z.is_finite()));
        }
    }

    #[test]
    fn pinned_angle_line_overrides_selection_order() {
        let mut session = session();
        assert_eq!(session.angle_line(), Some(AngleLine::First));
        for x in 0..4 {
            add(&mut session, x as f64);
        }
        for slot in 0..4 {
            session
                .dispatch(Action::SetMeasurementEndpoint {
                    series: SeriesId::Angle,
                    slot,
                    landmark: slot,
                })
                .unwrap();
        }
        assert_eq!(session.angle_line(), None);

        session
            .dispatch(Action::SetAngleLine(Some(AngleLine::Second)))
            .unwrap();
        assert_eq!(session.angle_line(), Some(AngleLine::Second));
        session.dispatch(Action::SetAngleLine(None)).unwrap();
        assert_eq!(session.angle_line(), None);
    }

    #[test]
    fn pick_point_inverts_room_and_scale() {
        let mut session = session();
        session
            .dispatch(Action::TranslateRoom(Vector3::new(0.0, 1.0, 0.0)))
            .unwrap();
        session
            .dispatch(Action::ControllerPose(Matrix4::from_translation(Vector3::new(
                0.0, 1.5, 0.0,
            ))))
            .unwrap();
        let pick = session.pick_point().unwrap();
        let scale = session.view().scale;
        assert_abs_diff_eq!(pick.y, 0.5 / scale, epsilon = 1e-9);
        assert_abs_diff_eq!(pick.z, -0.8 / scale, epsilon = 1e-9);
        let round_trip = session.to_tracking(pick).distance(session.tool_tip());
        assert_abs_diff_eq!(round_trip, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn hover_finds_nearest_landmark_in_reach() {
        let mut session = session();
        session.dispatch(Action::Pause).unwrap();
        let near = session.pick_point().unwrap();
        session.dispatch(Action::AddLandmark { pick: near }).unwrap();
        add(&mut session, 1000.0);

        session.tick();
        assert_eq!(session.hover(), None, "navigation mode does not hover");

        session.dispatch(Action::SetToolMode(ToolMode::DeleteLandmark)).unwrap();
        session.tick();
        assert_eq!(session.hover(), Some(0));
        let views = session.landmark_views();
        assert!(views[0].highlighted);
        assert_eq!(views[0].color, HIGHLIGHT);
        assert!(!views[1].highlighted);
    }

    #[test]
    fn headlight_follows_head_until_light_is_placed() {
        let mut session = session();
        session
            .dispatch(Action::HeadPose(Matrix4::from_translation(Vector3::new(
                1.0, 1.7, 0.0,
            ))))
            .unwrap();
        session.tick();
        assert_eq!(session.light().position, Position::new(1.0, 1.7, 0.0));
        session
            .dispatch(Action::PlaceLight(Position::new(0.0, 3.0, 0.0)))
            .unwrap();
        session.tick();
        assert_eq!(session.light().position, Position::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn open_segment_follows_the_tool_tip() {
        let mut session = session();
        add(&mut session, 0.0);
        session
            .dispatch(Action::SetMeasurementEndpoint {
                series: SeriesId::Angle,
                slot: 0,
                landmark: 0,
            })
            .unwrap();
        let segments = session.measurement_segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].series, SeriesId::Angle);
        assert_eq!(segments[0].to, session.tool_tip());
    }

    #[test]
    fn projection_only_while_projecting_with_trigger() {
        let mut session = session();
        add(&mut session, 0.0);
        assert!(session.projection().unwrap().is_none());
        session
            .apply([
                Action::SetToolMode(ToolMode::ProjectLandmarks),
                Action::Trigger(true),
            ])
            .unwrap();
        let projection = session.projection().unwrap().unwrap();
        assert_eq!(projection.markers.len(), 1);
        assert_eq!(projection.trails[0].len(), 30);
        assert!(projection.outline.is_some());
    }
}
