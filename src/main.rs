use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use xromm_landmarks::measurement::SeriesId;
use xromm_landmarks::types::MatrixLayout;
use xromm_landmarks::{Session, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "xromm-landmarks")]
#[command(about = "Measure landmarks on rigid-body motion tracks", long_about = None)]
struct Args {
    /// Session directory containing the manifest, meshes and transform files
    session_dir: PathBuf,

    /// Manifest file name inside the session directory
    #[arg(long, default_value = "Data.csv")]
    manifest: String,

    /// Data-to-room scale
    #[arg(short, long, default_value = "0.0328")]
    scale: f64,

    /// Scale applied to the meshes only
    #[arg(long, default_value = "1.0")]
    object_scale: f64,

    /// Playback speed in frames per tick
    #[arg(long, default_value = "1.0")]
    speed: f64,

    /// Token marking a frame without data
    #[arg(long, default_value = "NaN")]
    missing_marker: String,

    /// Transform files store matrices column by column
    #[arg(long)]
    column_major: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> SessionConfig {
        let mut config = SessionConfig {
            manifest_name: self.manifest.clone(),
            display_scale: self.scale,
            object_scale: self.object_scale,
            speed: self.speed,
            ..SessionConfig::default()
        };
        config.track_format.missing_marker = self.missing_marker.clone();
        if self.column_major {
            config.track_format.layout = MatrixLayout::ColumnMajor;
        }
        config
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install logger: {}", e);
    }

    let session = match Session::load(&args.session_dir, args.config()) {
        Ok(session) => session,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    for object in session.objects() {
        info!(
            "{:<20} {} frames, {} hidden",
            object.name(),
            object.track().len(),
            object.track().hidden_frames()
        );
    }
    info!(
        "{} frames playable, {} samples per measurement series",
        session.frame_count(),
        session.measurements().series(SeriesId::Distance).len()
    );

    #[cfg(feature = "visualize")]
    xromm_landmarks::visualize::run_viewer(session);

    ExitCode::SUCCESS
}
