//! Error types for session loading and landmark editing.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that abort a call. Malformed track lines are not in here: they are
/// recovered while parsing (see [`crate::parse::LineIssue`]).
#[derive(Debug, Error)]
pub enum Error {
    /// A frame lookup beyond the end of a track.
    #[error("frame {frame} is out of range for a track of {len} frames")]
    IndexOutOfRange { frame: usize, len: usize },

    /// A caller passed something that cannot exist, e.g. a landmark attached
    /// to an object that was never loaded.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest line {line} is not a `mesh,transform` pair: {text:?}")]
    MalformedManifestLine { line: usize, text: String },

    #[error("mesh file {0} does not exist")]
    MissingMesh(PathBuf),

    #[error("session {0} does not list any objects")]
    EmptySession(PathBuf),

    /// At least one track has no frames, so there is nothing to play.
    #[error("the loaded tracks share no frames")]
    EmptyTimeline,
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
