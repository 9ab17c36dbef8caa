use bevy::prelude::*;
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use crate::input::{InputEvent, InputState};
use crate::measurement::{AngleLine, SeriesId};
use crate::object::{MeshHandle, RenderContext};
use crate::session::{Action, Session, HIGHLIGHT};
use crate::types::{Pose, Position, ToolMode};

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Desktop stand-in for the VR host. The orbit camera plays both head and
/// controller, so the tool tip sits in front of the view.
#[derive(Resource)]
pub struct ViewerState {
    pub session: Session,
    pub input: InputState,
    pub show_help: bool,
}

pub fn run_viewer(session: Session) {
    App::new()
        .insert_resource(ViewerState {
            session,
            input: InputState::default(),
            show_help: true,
        })
        .add_plugins(DefaultPlugins)
        .add_plugins(PanOrbitCameraPlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, (update_main, draw_scene, update_status_text).chain())
        .run();
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Component)]
struct StatusText;

#[derive(Component)]
struct HelpText;

fn setup(mut commands: Commands) {
    //// Orbit camera
    commands.spawn((
        Camera3dBundle {
            transform: Transform::from_xyz(0., 1.5, 6.).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        PanOrbitCamera::default(),
    ));

    commands.spawn((
        TextBundle::from_section(
            "Space play/pause, Left/Right step, Up/Down speed\n\
            PageUp/PageDown scale, [ ] trail, O/I next/prev object\n\
            1-6 tool mode, Enter trigger, WASD joystick\n\
            F fix current object, H headlight, T transparency\n\
            M menu, N/P menu page, L angle line, F1 hide this help\n",
            TextStyle {
                font_size: 15.,
                ..default()
            },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        }),
        HelpText,
    ));

    commands.spawn((
        TextBundle::from_section(
            "",
            TextStyle {
                font_size: 17.,
                color: Color::rgba(1.0, 1.0, 1.0, 0.7),
                ..default()
            },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        }),
        StatusText,
    ));
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn to_vec3(p: Position) -> Vec3 {
    Vec3::new(p.x as f32, p.y as f32, p.z as f32)
}

fn to_mat4(pose: &Pose) -> Mat4 {
    let cols: [[f64; 4]; 4] = (*pose).into();
    Mat4::from_cols_array_2d(&cols.map(|col| col.map(|v| v as f32)))
}

fn to_pose(m: Mat4) -> Pose {
    let cols = m.to_cols_array_2d().map(|col| col.map(f64::from));
    Pose::from(cols)
}

fn color_of(rgb: [f32; 3]) -> Color {
    Color::rgb(rgb[0], rgb[1], rgb[2])
}

/// Draws every object as a pose frame (red, green, blue axes) plus a box.
struct GizmoPainter<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    transparent: bool,
}

impl RenderContext for GizmoPainter<'_, '_, '_> {
    fn draw_mesh(&mut self, _mesh: &MeshHandle, model: &Pose, highlighted: bool) {
        let model = to_mat4(model);
        let origin = model.transform_point3(Vec3::ZERO);
        // axes in data units, 30 mm long
        let axis = |v: Vec3| model.transform_point3(v * 30.0);
        self.gizmos.line(origin, axis(Vec3::X), Color::RED);
        self.gizmos.line(origin, axis(Vec3::Y), Color::GREEN);
        self.gizmos.line(origin, axis(Vec3::Z), Color::BLUE);

        let alpha = if self.transparent { 0.3 } else { 1.0 };
        let color = if highlighted {
            Color::rgba(1.0, 1.0, 0.0, alpha)
        } else {
            Color::rgba(0.8, 0.8, 0.8, alpha)
        };
        let (scale, rotation, translation) = (model * Mat4::from_scale(Vec3::splat(10.0)))
            .to_scale_rotation_translation();
        let transform = Transform::from_translation(translation)
            .with_rotation(rotation)
            .with_scale(scale);
        self.gizmos.cuboid(transform, color);
    }
}

fn draw_scene(mut gizmos: Gizmos, viewer: Res<ViewerState>) {
    let session = &viewer.session;

    let mut painter = GizmoPainter {
        gizmos: &mut gizmos,
        transparent: session.view().transparent,
    };
    if let Err(e) = session.render(&mut painter) {
        warn!("{}", e);
    }

    //// Landmarks and their trails
    for landmark in session.landmark_views() {
        let radius = if landmark.highlighted { 0.02 } else { 0.01 };
        let position = to_vec3(session.to_tracking(landmark.position));
        gizmos.sphere(position, Quat::IDENTITY, radius, color_of(landmark.color));
        gizmos.linestrip(
            landmark.trail.iter().map(|p| to_vec3(session.to_tracking(*p))),
            color_of(landmark.color),
        );
    }

    //// Measurement lines
    for segment in session.measurement_segments() {
        let color = match segment.series {
            SeriesId::Distance => Color::RED,
            SeriesId::Angle => Color::BLUE,
        };
        gizmos.line(to_vec3(segment.from), to_vec3(segment.to), color);
    }

    match session.projection() {
        Ok(Some(projection)) => {
            for marker in &projection.markers {
                gizmos.sphere(to_vec3(*marker), Quat::IDENTITY, 0.005, Color::WHITE);
            }
            for trail in &projection.trails {
                gizmos.linestrip(trail.iter().map(|p| to_vec3(*p)), Color::GRAY);
            }
            if let Some(outline) = projection.outline {
                gizmos.linestrip(outline.map(to_vec3), Color::WHITE);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("{}", e),
    }

    //// Tool tip
    let tip_color = match session.view().tool_mode {
        ToolMode::Navigate => Color::WHITE,
        _ => color_of(HIGHLIGHT),
    };
    gizmos.sphere(to_vec3(session.tool_tip()), Quat::IDENTITY, 0.005, tip_color);
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn keyboard_actions(keyboard: &ButtonInput<KeyCode>, session: &Session) -> Vec<Action> {
    let config = session.config();
    let view = session.view();
    let mut actions = Vec::new();

    let toggles = [
        (KeyCode::Space, Action::TogglePlay),
        (KeyCode::ArrowLeft, Action::StepFrame(-1)),
        (KeyCode::ArrowRight, Action::StepFrame(1)),
        (KeyCode::ArrowUp, Action::AdjustSpeed(config.speed_step)),
        (KeyCode::ArrowDown, Action::AdjustSpeed(-config.speed_step)),
        (KeyCode::PageUp, Action::AdjustScale(config.scale_step)),
        (KeyCode::PageDown, Action::AdjustScale(-config.scale_step)),
        (KeyCode::BracketLeft, Action::AdjustTrail(-1)),
        (KeyCode::BracketRight, Action::AdjustTrail(1)),
        (KeyCode::KeyO, Action::SelectNextObject),
        (KeyCode::KeyI, Action::SelectPrevObject),
        (KeyCode::KeyF, Action::ToggleReferenceObject(session.reference().is_none())),
        (KeyCode::KeyH, Action::SetHeadlight(!session.light().follow_head)),
        (KeyCode::KeyT, Action::SetTransparent(!view.transparent)),
        (KeyCode::KeyL, Action::SetAngleLine(next_angle_line(view.angle_line))),
    ];
    for (key, action) in toggles {
        if keyboard.just_pressed(key) {
            actions.push(action);
        }
    }

    let modes = [
        (KeyCode::Digit1, ToolMode::Navigate),
        (KeyCode::Digit2, ToolMode::MoveLight),
        (KeyCode::Digit3, ToolMode::AddLandmark),
        (KeyCode::Digit4, ToolMode::MoveLandmark),
        (KeyCode::Digit5, ToolMode::DeleteLandmark),
        (KeyCode::Digit6, ToolMode::ProjectLandmarks),
    ];
    for (key, mode) in modes {
        if keyboard.just_pressed(key) {
            actions.push(Action::SetToolMode(mode));
        }
    }
    actions
}

/// Cycles the pinned angle line: in order, line 1, line 2, in order.
fn next_angle_line(line: Option<AngleLine>) -> Option<AngleLine> {
    match line {
        None => Some(AngleLine::First),
        Some(AngleLine::First) => Some(AngleLine::Second),
        Some(AngleLine::Second) => None,
    }
}

fn keyboard_events(keyboard: &ButtonInput<KeyCode>, menu_visible: bool) -> Vec<InputEvent> {
    let mut events = Vec::new();
    if keyboard.just_pressed(KeyCode::Enter) {
        events.push(InputEvent::TriggerDown);
    }
    if keyboard.just_released(KeyCode::Enter) {
        events.push(InputEvent::TriggerUp);
    }
    if keyboard.just_pressed(KeyCode::KeyM) {
        events.push(if menu_visible { InputEvent::MenuHide } else { InputEvent::MenuShow });
    }
    if keyboard.just_pressed(KeyCode::KeyN) {
        events.push(InputEvent::MenuNext);
    }
    if keyboard.just_pressed(KeyCode::KeyP) {
        events.push(InputEvent::MenuPrev);
    }

    let axis = |negative, positive| {
        keyboard.pressed(positive) as i32 as f64 - keyboard.pressed(negative) as i32 as f64
    };
    events.push(InputEvent::Joystick {
        x: axis(KeyCode::KeyA, KeyCode::KeyD),
        y: axis(KeyCode::KeyS, KeyCode::KeyW),
    });
    events
}

fn update_main(
    keyboard: Res<ButtonInput<KeyCode>>,
    camera: Query<&GlobalTransform, With<Camera>>,
    mut viewer: ResMut<ViewerState>,
) {
    if keyboard.just_pressed(KeyCode::F1) {
        viewer.show_help = !viewer.show_help;
    }
    let ViewerState { session, input, .. } = &mut *viewer;

    let mut events = Vec::new();
    if let Ok(camera) = camera.get_single() {
        let pose = to_pose(camera.compute_matrix());
        events.push(InputEvent::HeadPose(pose));
        events.push(InputEvent::ControllerPose(pose));
    }
    events.extend(keyboard_events(&keyboard, session.view().menu_visible));

    let mut actions = keyboard_actions(&keyboard, session);
    for event in events {
        match input.handle(session, event) {
            Ok(more) => actions.extend(more),
            Err(e) => warn!("{}", e),
        }
    }
    for action in actions {
        if let Err(e) = session.dispatch(action) {
            warn!("{}", e);
        }
    }

    let continuous = input.tick(session);
    if let Err(e) = session.apply(continuous) {
        warn!("{}", e);
    }
    session.tick();
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn update_status_text(
    mut query: Query<&mut Text, With<StatusText>>,
    mut help: Query<&mut Visibility, With<HelpText>>,
    viewer: Res<ViewerState>,
) {
    let session = &viewer.session;
    let mut t = session.status_lines().join("\n");
    t += &format!("\nTool: {:?}", session.view().tool_mode);
    if session.view().menu_visible {
        t += &format!("\nPage: {:?}", session.view().page);
        if let Some(line) = session.angle_line() {
            t += &format!("\nAngle line: {:?}", line);
        }
        let frame = session.frame_index();
        for series in [SeriesId::Distance, SeriesId::Angle] {
            if let Some(value) = session.measurements().series(series).get(frame) {
                t += &format!("\n{:?}: {:.3}", series, value);
            }
        }
    }
    for mut visibility in &mut help {
        *visibility = if viewer.show_help {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    for mut text in &mut query {
        text.sections[0].value = t.clone();
    }
}
