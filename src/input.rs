use crate::error::Result;
use crate::measurement::SeriesId;
use crate::session::{Action, Session};
use crate::types::*;
use cgmath::{SquareMatrix, Transform, Vector3};

/// Raw events of the VR host (or the desktop viewer standing in for it).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    HeadPose(Pose),
    ControllerPose(Pose),
    /// Joystick deflection, each axis in `-1..=1`. Held until the next event.
    Joystick { x: f64, y: f64 },
    TriggerDown,
    TriggerUp,
    MenuNext,
    MenuPrev,
    MenuShow,
    MenuHide,
}

/// Turns gestures into [`Action`]s. Only remembers what spans several
/// events: the joystick deflection and the controller pose of a room grab.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    joystick: (f64, f64),
    grab: Option<Pose>,
}

impl InputState {
    pub fn handle(&mut self, session: &Session, event: InputEvent) -> Result<Vec<Action>> {
        let view = session.view();
        let actions = match event {
            InputEvent::HeadPose(pose) => vec![Action::HeadPose(pose)],
            InputEvent::ControllerPose(pose) => vec![Action::ControllerPose(pose)],
            InputEvent::Joystick { x, y } => {
                self.joystick = (x, y);
                Vec::new()
            }
            InputEvent::TriggerDown => {
                let mut actions = vec![Action::Trigger(true)];
                actions.extend(self.__press(session)?);
                actions
            }
            InputEvent::TriggerUp => {
                self.grab = None;
                let mut actions = vec![Action::Trigger(false)];
                actions.extend(self.__release(session)?);
                actions
            }
            InputEvent::MenuNext if view.menu_visible => vec![Action::SetPage(view.page.next())],
            InputEvent::MenuPrev if view.menu_visible => vec![Action::SetPage(view.page.prev())],
            InputEvent::MenuNext | InputEvent::MenuPrev => Vec::new(),
            InputEvent::MenuShow => vec![Action::SetMenuVisible(true)],
            InputEvent::MenuHide => vec![Action::SetMenuVisible(false)],
        };
        Ok(actions)
    }

    fn __press(&mut self, session: &Session) -> Result<Option<Action>> {
        let hover = session.hover();
        let action = match session.view().page {
            Page::Distance => hover.map(|landmark| Action::SetMeasurementEndpoint {
                series: SeriesId::Distance,
                slot: 0,
                landmark,
            }),
            Page::Angle => hover.zip(session.angle_line()).map(|(landmark, line)| {
                Action::SetMeasurementEndpoint {
                    series: SeriesId::Angle,
                    slot: line.first_slot(),
                    landmark,
                }
            }),
            Page::Main => match session.view().tool_mode {
                ToolMode::Navigate => {
                    self.grab = Some(session.poses().controller);
                    None
                }
                ToolMode::AddLandmark => Some(Action::AddLandmark {
                    pick: session.pick_point()?,
                }),
                ToolMode::MoveLandmark => hover.map(|i| Action::SelectLandmark(Some(i))),
                ToolMode::DeleteLandmark => hover.map(|index| Action::DeleteLandmark { index }),
                ToolMode::MoveLight | ToolMode::ProjectLandmarks => None,
            },
        };
        Ok(action)
    }

    fn __release(&mut self, session: &Session) -> Result<Option<Action>> {
        let hover = session.hover();
        let action = match session.view().page {
            Page::Distance => hover.map(|landmark| Action::SetMeasurementEndpoint {
                series: SeriesId::Distance,
                slot: 1,
                landmark,
            }),
            Page::Angle => hover.zip(session.angle_line()).map(|(landmark, line)| {
                Action::SetMeasurementEndpoint {
                    series: SeriesId::Angle,
                    slot: line.first_slot() + 1,
                    landmark,
                }
            }),
            Page::Main => match session.selected() {
                Some(index) => Some(Action::MoveLandmark {
                    index,
                    pick: session.pick_point()?,
                }),
                None => None,
            },
        };
        Ok(action)
    }

    /// Continuous gestures, called once per host frame before [`Session::tick`].
    pub fn tick(&mut self, session: &Session) -> Vec<Action> {
        let mut actions = Vec::new();
        let config = session.config();
        let view = session.view();
        let controller = session.poses().controller;

        let (x, y) = self.joystick;
        if x != 0.0 || y != 0.0 {
            if view.tool_mode.moves_tool_tip() {
                actions.push(Action::AdjustToolDistance(-config.tool_step * y));
            } else {
                let gain = view.scale * config.navigation_gain;
                let sideways = controller.transform_vector(Vector3::unit_x()) * (-x * gain);
                let forward = controller.transform_vector(Vector3::unit_z()) * (y * gain);
                actions.push(Action::TranslateRoom(sideways + forward));
            }
        }

        if let Some(previous) = self.grab {
            if let Some(inverse) = previous.invert() {
                actions.push(Action::RotateRoom(controller * inverse));
            }
            self.grab = Some(controller);
        }

        if session.trigger_held() && view.tool_mode == ToolMode::MoveLight {
            actions.push(Action::PlaceLight(session.tool_tip()));
        }
        actions
    }
}
