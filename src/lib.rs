//! Landmark placement and distance/angle measurement on rigid-body motion
//! tracks, for reviewing XROMM-style bone animations in VR.
//!
//! A [`session::Session`] owns the loaded [`object::RigidObject`]s, the
//! user's [`landmark::Landmark`]s and their measurements. The host feeds it
//! [`session::Action`]s (usually produced by [`input::InputState`]) and draws
//! what the query methods return.

pub mod config;
pub mod error;
pub mod input;
pub mod landmark;
pub mod measurement;
pub mod object;
pub mod parse;
pub mod playback;
pub mod session;
pub mod track;
pub mod types;
pub mod utils;
#[cfg(feature = "visualize")]
pub mod visualize;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use session::{Action, Session};
