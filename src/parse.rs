use crate::error::{Error, Result};
use crate::track::{TrackEntry, TransformTrack};
use crate::types::*;
use cgmath::Matrix4;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::str::Lines;
use std::sync::OnceLock;
use tracing::{info, trace, warn};

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// How the data lines of a transform file are read.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFormat {
    /// Case-sensitive token that marks a frame without data.
    pub missing_marker: String,
    pub layout: MatrixLayout,
}

impl Default for TrackFormat {
    fn default() -> Self {
        TrackFormat {
            missing_marker: "NaN".to_string(),
            layout: MatrixLayout::RowMajor,
        }
    }
}

/// Why a data line was recorded as a hidden frame.
#[derive(Debug, Clone, PartialEq)]
pub enum LineIssue {
    MissingMarker,
    FieldCount(usize),
    NotNumeric(String),
    NotFinite,
    Singular,
}

/// One entry of a session manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub mesh: PathBuf,
    pub transform: PathBuf,
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn __separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[,\s]+").expect("separator pattern is valid"))
}

/// Build a pose from 16 values in the given layout.
pub fn pose_from_values(values: &[f64; 16], layout: MatrixLayout) -> Pose {
    let v = |row: usize, col: usize| match layout {
        MatrixLayout::RowMajor => values[row * 4 + col],
        MatrixLayout::ColumnMajor => values[col * 4 + row],
    };
    // cgmath takes its arguments column by column
    #[rustfmt::skip]
    let pose = Matrix4::new(
        v(0, 0), v(1, 0), v(2, 0), v(3, 0),
        v(0, 1), v(1, 1), v(2, 1), v(3, 1),
        v(0, 2), v(1, 2), v(2, 2), v(3, 2),
        v(0, 3), v(1, 3), v(2, 3), v(3, 3),
    );
    pose
}

fn parse_line(line: &str, format: &TrackFormat) -> std::result::Result<TrackEntry, LineIssue> {
    let line = line.trim();
    if line == format.missing_marker {
        return Err(LineIssue::MissingMarker);
    }

    let fields: Vec<&str> = __separator()
        .split(line)
        .filter(|field| !field.is_empty())
        .collect();
    if fields.len() != 16 {
        return Err(LineIssue::FieldCount(fields.len()));
    }

    let mut values = [0.0; 16];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = field
            .parse::<f64>()
            .map_err(|_| LineIssue::NotNumeric(field.to_string()))?;
        if !value.is_finite() {
            return Err(LineIssue::NotFinite);
        }
    }

    TrackEntry::visible(pose_from_values(&values, format.layout)).ok_or(LineIssue::Singular)
}

fn parse_track(lines: Lines, format: &TrackFormat) -> TransformTrack {
    //// first line is a header
    let mut entries = Vec::new();
    for (i, line) in lines.skip(1).enumerate() {
        let entry = match parse_line(line, format) {
            Ok(entry) => entry,
            Err(issue) => {
                trace!("frame {}: {:?}, marked not visible", i, issue);
                TrackEntry::hidden()
            }
        };
        entries.push(entry);
    }
    TransformTrack::from_entries(entries)
}

//////////////////////////////////////////////////////////////// PUBLIC ////////////////////////////////////////////////////////////////////////////////

/// Load a transform track from a file path.
pub fn load_track_from_file(path: &Path, format: &TrackFormat) -> Result<TransformTrack> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let track = load_track_from_string(&contents, format);
    if track.hidden_frames() > 0 {
        warn!(
            "{}: {} of {} frames not visible",
            path.display(),
            track.hidden_frames(),
            track.len()
        );
    }
    Ok(track)
}

/// Load a transform track from a string. Never fails: bad lines become hidden frames.
pub fn load_track_from_string(track_string: &str, format: &TrackFormat) -> TransformTrack {
    // a trailing newline (or several) does not add frames
    parse_track(track_string.trim_end().lines(), format)
}

/// Read the `mesh,transform` pairs of a session manifest. Paths are resolved
/// against `base_dir`.
pub fn parse_manifest(manifest: &str, base_dir: &Path) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for (i, line) in manifest.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (mesh, transform) = match line.split_once(',') {
            Some((mesh, transform)) if !mesh.trim().is_empty() && !transform.trim().is_empty() => {
                (mesh.trim(), transform.trim())
            }
            _ => {
                return Err(Error::MalformedManifestLine {
                    line: i + 1,
                    text: line.to_string(),
                })
            }
        };
        entries.push(ManifestEntry {
            mesh: base_dir.join(mesh),
            transform: base_dir.join(transform),
        });
    }
    Ok(entries)
}

/// Load the manifest at `path`; entries are relative to its directory.
pub fn load_manifest_from_file(path: &Path) -> Result<Vec<ManifestEntry>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let entries = parse_manifest(&contents, base_dir)?;
    info!("{}: {} objects listed", path.display(), entries.len());
    Ok(entries)
}
