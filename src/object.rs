use crate::error::{Error, Result};
use crate::parse::{load_track_from_file, TrackFormat};
use crate::track::{TrackEntry, TransformTrack};
use crate::types::*;
use cgmath::Matrix4;
use std::path::{Path, PathBuf};
use tracing::info;

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Static mesh of a rigid object. Loading and uploading it is up to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshHandle {
    pub path: PathBuf,
    /// Uniform scale applied to the mesh only, never to the poses.
    pub scale: f64,
}

/// Drawing surface supplied by the host (OpenGL context, gizmo buffer, ...).
pub trait RenderContext {
    fn draw_mesh(&mut self, mesh: &MeshHandle, model: &Pose, highlighted: bool);
}

/// A bone or marker: a mesh moved around by a per-frame transform track.
#[derive(Debug, Clone)]
pub struct RigidObject {
    name: String,
    mesh: MeshHandle,
    track: TransformTrack,
}

impl RigidObject {
    pub fn new(mesh: MeshHandle, track: TransformTrack) -> Self {
        RigidObject {
            name: object_name(&mesh.path),
            mesh,
            track,
        }
    }

    /// Load one manifest entry. A missing mesh aborts, bad track lines do not.
    pub fn load(
        mesh_path: &Path,
        track_path: &Path,
        format: &TrackFormat,
        object_scale: f64,
    ) -> Result<Self> {
        if !mesh_path.is_file() {
            return Err(Error::MissingMesh(mesh_path.to_path_buf()));
        }
        let track = load_track_from_file(track_path, format)?;
        let object = RigidObject::new(
            MeshHandle {
                path: mesh_path.to_path_buf(),
                scale: object_scale,
            },
            track,
        );
        info!("Load {} ({} frames)", object.name, object.track.len());
        Ok(object)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &MeshHandle {
        &self.mesh
    }

    pub fn track(&self) -> &TransformTrack {
        &self.track
    }

    pub fn pose(&self, frame: usize) -> Result<&TrackEntry> {
        self.track.at(frame)
    }

    /// Draw the mesh at `frame` under `parent`. Nothing is drawn while the
    /// object is not visible.
    pub fn render(
        &self,
        frame: usize,
        parent: &Pose,
        ctx: &mut impl RenderContext,
        highlighted: bool,
    ) -> Result<()> {
        let entry = self.track.at(frame)?;
        if !entry.visible {
            return Ok(());
        }
        let model = *parent * entry.pose * Matrix4::from_scale(self.mesh.scale);
        ctx.draw_mesh(&self.mesh, &model, highlighted);
        Ok(())
    }
}

/// File stem of the mesh path, e.g. `radius` for `data/radius.obj`.
fn object_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector3};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, Pose, bool)>,
    }

    impl RenderContext for Recorder {
        fn draw_mesh(&mut self, mesh: &MeshHandle, model: &Pose, highlighted: bool) {
            self.calls
                .push((mesh.path.display().to_string(), *model, highlighted));
        }
    }

    fn object() -> RigidObject {
        let moved = Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0));
        RigidObject::new(
            MeshHandle {
                path: PathBuf::from("session/humerus.obj"),
                scale: 1.0,
            },
            TransformTrack::from_entries(vec![
                TrackEntry::visible(moved).unwrap(),
                TrackEntry::hidden(),
            ]),
        )
    }

    #[test]
    fn name_is_mesh_file_stem() {
        assert_eq!(object().name(), "humerus");
        assert_eq!(object_name(Path::new("a/b/scapula.left.obj")), "scapula.left");
    }

    #[test]
    fn render_skips_hidden_frames() {
        let object = object();
        let mut recorder = Recorder::default();
        object
            .render(0, &Pose::identity(), &mut recorder, true)
            .unwrap();
        object
            .render(1, &Pose::identity(), &mut recorder, false)
            .unwrap();
        assert_eq!(recorder.calls.len(), 1);
        let (_, model, highlighted) = &recorder.calls[0];
        assert_eq!(model.w.truncate(), Vector3::new(1.0, 0.0, 0.0));
        assert!(*highlighted);
    }

    #[test]
    fn render_past_end_is_an_error() {
        let mut recorder = Recorder::default();
        assert!(object()
            .render(2, &Pose::identity(), &mut recorder, false)
            .is_err());
    }

    #[test]
    fn missing_mesh_aborts_load() {
        let result = RigidObject::load(
            Path::new("does/not/exist.obj"),
            Path::new("does/not/exist.csv"),
            &TrackFormat::default(),
            1.0,
        );
        assert!(matches!(result, Err(Error::MissingMesh(_))));
    }
}
